//! REST binding of [`PostsApi`](crate::PostsApi).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{NewPost, Post, PostId},
    error::ApiException,
    protocol::{post_path, PostRequest, POSTS_PATH},
};
use tracing::debug;

use crate::PostsApi;

pub struct HttpPostsApi {
    http: Client,
    base_url: String,
}

impl HttpPostsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: PostRequest) -> Result<Response> {
        let name = request.name();
        let builder = match &request {
            PostRequest::FetchPosts => self.http.get(self.url(POSTS_PATH)),
            PostRequest::CreatePost { draft } => self.http.post(self.url(POSTS_PATH)).json(draft),
            PostRequest::UpdatePost { post } => {
                self.http.put(self.url(&post_path(post.id))).json(post)
            }
            PostRequest::DeletePost { id } => self.http.delete(self.url(&post_path(*id))),
        };

        let response = builder
            .send()
            .await
            .with_context(|| format!("{name} request failed"))?;
        debug!(request = name, status = %response.status(), "posts service responded");
        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    };
    Err(ApiException::from_status(status.as_u16(), message).into())
}

#[async_trait]
impl PostsApi for HttpPostsApi {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let posts = self
            .send(PostRequest::FetchPosts)
            .await?
            .json()
            .await
            .context("failed to decode post list")?;
        Ok(posts)
    }

    async fn create_post(&self, draft: NewPost) -> Result<Post> {
        let post = self
            .send(PostRequest::CreatePost { draft })
            .await?
            .json()
            .await
            .context("failed to decode created post")?;
        Ok(post)
    }

    async fn update_post(&self, post: Post) -> Result<Post> {
        let post = self
            .send(PostRequest::UpdatePost { post })
            .await?
            .json()
            .await
            .context("failed to decode updated post")?;
        Ok(post)
    }

    async fn delete_post(&self, id: PostId) -> Result<PostId> {
        self.send(PostRequest::DeletePost { id }).await?;
        Ok(id)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
