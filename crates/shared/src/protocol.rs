use crate::domain::{NewPost, Post, PostId};

/// Fixed key under which the post collection is cached.
pub const POSTS_QUERY_KEY: &str = "posts";

pub const POSTS_PATH: &str = "/posts";

pub fn post_path(id: PostId) -> String {
    format!("{POSTS_PATH}/{}", id.0)
}

/// Requests issued against the posts service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostRequest {
    FetchPosts,
    CreatePost { draft: NewPost },
    UpdatePost { post: Post },
    DeletePost { id: PostId },
}

impl PostRequest {
    pub fn name(&self) -> &'static str {
        match self {
            PostRequest::FetchPosts => "fetch_posts",
            PostRequest::CreatePost { .. } => "create_post",
            PostRequest::UpdatePost { .. } => "update_post",
            PostRequest::DeletePost { .. } => "delete_post",
        }
    }
}
