use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{NewPost, Post, PostId};

pub mod cache;
pub mod controller;
pub mod error;
pub mod events;
pub mod transport;

pub use cache::{CacheEvent, CacheUpdate, DisplayState, QueryCache, QuerySnapshot, QueryStatus};
pub use controller::{FormMode, FormState, PendingMutation, PostListController};
pub use error::{CacheClosed, LoadError, MutationError, MutationKind};
pub use events::{ControllerEvent, ErrorCategory, Notification};
pub use transport::HttpPostsApi;

/// Remote side of the post list. Every method performs I/O and may fail.
#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<Post>>;
    /// The service assigns the id of the returned post.
    async fn create_post(&self, draft: NewPost) -> Result<Post>;
    /// Full-record replace.
    async fn update_post(&self, post: Post) -> Result<Post>;
    /// Returns the id that was deleted.
    async fn delete_post(&self, id: PostId) -> Result<PostId>;
}
