//! Post list controller: the fetch, the three mutation flows and the shared form.
//!
//! Mutations run as detached tasks. A task always runs to completion, and the
//! cache is only touched after the service has confirmed the write, so a
//! failure never needs a rollback.

use std::{future::Future, sync::Arc};

use shared::domain::{NewPost, Post, PostId, UserId, DEFAULT_USER_ID};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{
    cache::{CacheUpdate, DisplayState, QueryCache},
    error::{LoadError, MutationError, MutationKind},
    events::{ControllerEvent, Notification},
    PostsApi,
};

const EVENT_CAPACITY: usize = 256;

/// Completion of a mutation that has already been sent.
pub type PendingMutation<T> = JoinHandle<Result<T, MutationError>>;

/// Which action the shared title/body fields feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Creating,
    Editing(Post),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    mode: FormMode,
    title: String,
    body: String,
}

impl FormState {
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Editing(_))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    fn has_content(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }

    fn clear_drafts(&mut self) {
        self.title.clear();
        self.body.clear();
    }
}

pub struct PostListController {
    api: Arc<dyn PostsApi>,
    cache: QueryCache,
    form: FormState,
    default_user_id: UserId,
    events: broadcast::Sender<ControllerEvent>,
}

impl PostListController {
    /// Creates a controller with its own cache worker on the current runtime.
    pub fn new(api: Arc<dyn PostsApi>) -> Self {
        Self::with_cache(api, QueryCache::spawn())
    }

    pub fn with_cache(api: Arc<dyn PostsApi>, cache: QueryCache) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            cache,
            form: FormState::default(),
            default_user_id: DEFAULT_USER_ID,
            events,
        }
    }

    pub fn with_default_user_id(mut self, user_id: UserId) -> Self {
        self.default_user_id = user_id;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn set_draft_title(&mut self, title: impl Into<String>) {
        self.form.title = title.into();
    }

    pub fn set_draft_body(&mut self, body: impl Into<String>) {
        self.form.body = body.into();
    }

    /// Fetches the whole collection. Calling it again refetches and replaces
    /// the cached collection wholesale; the previous posts stay visible meanwhile.
    pub async fn load(&self) -> Result<Vec<Post>, LoadError> {
        self.cache.begin_fetch().await?;
        let result = self.api.fetch_posts().await.map_err(|err| {
            let err = LoadError::from_error(&err);
            error!(category = ?err.category, "failed to load posts: {err}");
            err
        });
        if let Ok(posts) = &result {
            info!(count = posts.len(), "loaded posts");
        }
        self.cache.resolve_fetch(result.clone()).await?;
        result
    }

    pub async fn display(&self) -> DisplayState {
        match self.cache.snapshot().await {
            Ok(snapshot) => snapshot.display(),
            Err(err) => DisplayState::Errored(err.to_string()),
        }
    }

    pub fn begin_edit(&mut self, post: Post) {
        debug!(post_id = %post.id, "editing post");
        self.form.title = post.title.clone();
        self.form.body = post.body.clone();
        self.form.mode = FormMode::Editing(post);
    }

    pub fn cancel_edit(&mut self) {
        self.form = FormState::default();
    }

    /// Runs whichever action the form mode selects.
    pub fn submit(&mut self) -> Option<PendingMutation<Post>> {
        match self.form.mode {
            FormMode::Creating => self.create(),
            FormMode::Editing(_) => self.update(),
        }
    }

    /// Sends the drafts as a new post. The drafts are cleared as soon as the
    /// request is issued, whatever its outcome; the form mode is left alone.
    pub fn create(&mut self) -> Option<PendingMutation<Post>> {
        if !self.form.has_content() {
            debug!("create ignored: title and body are required");
            return None;
        }

        let draft = NewPost {
            title: self.form.title.clone(),
            body: self.form.body.clone(),
            user_id: self.default_user_id,
        };
        info!(title = %draft.title, "creating post");
        self.form.clear_drafts();

        let api = Arc::clone(&self.api);
        Some(self.spawn_mutation(
            MutationKind::Create,
            async move { api.create_post(draft).await },
            |post: &Post| {
                (
                    CacheUpdate::Prepend(post.clone()),
                    ControllerEvent::PostCreated(post.clone()),
                )
            },
        ))
    }

    /// Sends the edited post with the drafts applied. Editing ends and the
    /// drafts are cleared as soon as the request is issued, whatever its outcome.
    pub fn update(&mut self) -> Option<PendingMutation<Post>> {
        let FormMode::Editing(editing) = &self.form.mode else {
            debug!("update ignored: no post is being edited");
            return None;
        };
        if !self.form.has_content() {
            debug!(post_id = %editing.id, "update ignored: title and body are required");
            return None;
        }

        let post = editing.with_content(self.form.title.clone(), self.form.body.clone());
        info!(post_id = %post.id, "updating post");
        self.form = FormState::default();

        let api = Arc::clone(&self.api);
        Some(self.spawn_mutation(
            MutationKind::Update,
            async move { api.update_post(post).await },
            |post: &Post| {
                (
                    CacheUpdate::Replace(post.clone()),
                    ControllerEvent::PostUpdated(post.clone()),
                )
            },
        ))
    }

    pub fn delete(&self, id: PostId) -> PendingMutation<PostId> {
        info!(post_id = %id, "deleting post");
        let api = Arc::clone(&self.api);
        self.spawn_mutation(
            MutationKind::Delete,
            async move { api.delete_post(id).await },
            |deleted: &PostId| {
                (
                    CacheUpdate::Remove(*deleted),
                    ControllerEvent::PostDeleted(*deleted),
                )
            },
        )
    }

    fn spawn_mutation<T, F>(
        &self,
        kind: MutationKind,
        call: F,
        confirm: fn(&T) -> (CacheUpdate, ControllerEvent),
    ) -> PendingMutation<T>
    where
        T: Send + 'static,
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let cache = self.cache.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match call.await {
                Ok(value) => {
                    let (update, event) = confirm(&value);
                    if let Err(err) = cache.apply(update).await {
                        error!(mutation = %kind, "confirmed write not cached: {err}");
                    }
                    info!(mutation = %kind, "post {kind} succeeded");
                    let _ = events.send(event);
                    Ok(value)
                }
                Err(err) => {
                    let err = MutationError::from_error(kind, &err);
                    error!(mutation = %kind, category = ?err.category, "{err}");
                    let _ = events.send(ControllerEvent::Notification(Notification::from(&err)));
                    Err(err)
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
