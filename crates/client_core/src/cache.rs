//! Query cache for the post collection.
//!
//! A single worker task owns the cached collection. Every change is sent to it
//! as a command and applied against the value it holds at that moment, so two
//! mutations completing at the same time can never overwrite each other.

use shared::{
    domain::{Post, PostId},
    protocol::POSTS_QUERY_KEY,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::error::{CacheClosed, LoadError};

const COMMAND_QUEUE_CAPACITY: usize = 256;
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    /// Nothing has been requested yet.
    Idle,
    Loading,
    Ready,
    Errored(LoadError),
}

/// What the view should show for the post list.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Loading,
    Errored(String),
    Ready(Vec<Post>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    pub key: &'static str,
    pub status: QueryStatus,
    pub posts: Option<Vec<Post>>,
    pub is_fetching: bool,
    pub version: u64,
}

impl QuerySnapshot {
    fn empty() -> Self {
        Self {
            key: POSTS_QUERY_KEY,
            status: QueryStatus::Idle,
            posts: None,
            is_fetching: false,
            version: 0,
        }
    }

    pub fn display(&self) -> DisplayState {
        match (&self.status, &self.posts) {
            (QueryStatus::Errored(err), _) => DisplayState::Errored(err.message.clone()),
            (_, Some(posts)) => DisplayState::Ready(posts.clone()),
            (_, None) => DisplayState::Loading,
        }
    }
}

/// Rule applied to the cached collection once the service confirms a write.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    Prepend(Post),
    Replace(Post),
    Remove(PostId),
}

impl CacheUpdate {
    pub fn apply(&self, posts: &[Post]) -> Vec<Post> {
        match self {
            CacheUpdate::Prepend(post) => {
                let mut next = Vec::with_capacity(posts.len() + 1);
                next.push(post.clone());
                next.extend_from_slice(posts);
                next
            }
            CacheUpdate::Replace(updated) => posts
                .iter()
                .map(|post| {
                    if post.id == updated.id {
                        updated.clone()
                    } else {
                        post.clone()
                    }
                })
                .collect(),
            CacheUpdate::Remove(id) => posts
                .iter()
                .filter(|post| post.id != *id)
                .cloned()
                .collect(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CacheUpdate::Prepend(_) => "prepend",
            CacheUpdate::Replace(_) => "replace",
            CacheUpdate::Remove(_) => "remove",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Updated(QuerySnapshot),
}

enum CacheCommand {
    BeginFetch {
        reply: oneshot::Sender<QuerySnapshot>,
    },
    Resolve {
        result: Result<Vec<Post>, LoadError>,
        reply: oneshot::Sender<QuerySnapshot>,
    },
    Apply {
        update: CacheUpdate,
        reply: oneshot::Sender<QuerySnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<QuerySnapshot>,
    },
}

/// Handle to the cache worker. Cloning is cheap; all clones share one collection.
#[derive(Clone)]
pub struct QueryCache {
    commands: mpsc::Sender<CacheCommand>,
    events: broadcast::Sender<CacheEvent>,
}

impl QueryCache {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        tokio::spawn(run_worker(rx, events.clone()));
        Self { commands, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Result<QuerySnapshot, CacheClosed> {
        self.request(|reply| CacheCommand::Snapshot { reply }).await
    }

    pub async fn begin_fetch(&self) -> Result<QuerySnapshot, CacheClosed> {
        self.request(|reply| CacheCommand::BeginFetch { reply }).await
    }

    pub async fn resolve_fetch(
        &self,
        result: Result<Vec<Post>, LoadError>,
    ) -> Result<QuerySnapshot, CacheClosed> {
        self.request(|reply| CacheCommand::Resolve { result, reply }).await
    }

    pub async fn apply(&self, update: CacheUpdate) -> Result<QuerySnapshot, CacheClosed> {
        self.request(|reply| CacheCommand::Apply { update, reply }).await
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<QuerySnapshot>) -> CacheCommand,
    ) -> Result<QuerySnapshot, CacheClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| CacheClosed)?;
        rx.await.map_err(|_| CacheClosed)
    }
}

async fn run_worker(mut rx: mpsc::Receiver<CacheCommand>, events: broadcast::Sender<CacheEvent>) {
    let mut state = QuerySnapshot::empty();
    // Overlapping loads share one query; it stays fetching until the last resolves.
    let mut fetches_in_flight = 0usize;

    while let Some(cmd) = rx.recv().await {
        let (changed, reply) = match cmd {
            CacheCommand::Snapshot { reply } => (false, reply),
            CacheCommand::BeginFetch { reply } => {
                fetches_in_flight += 1;
                state.is_fetching = true;
                if state.posts.is_none() {
                    state.status = QueryStatus::Loading;
                }
                (true, reply)
            }
            CacheCommand::Resolve { result, reply } => {
                fetches_in_flight = fetches_in_flight.saturating_sub(1);
                state.is_fetching = fetches_in_flight > 0;
                match result {
                    Ok(posts) => {
                        debug!(key = state.key, count = posts.len(), "query resolved");
                        state.posts = Some(posts);
                        state.status = QueryStatus::Ready;
                    }
                    Err(err) => {
                        debug!(key = state.key, error = %err, "query failed");
                        state.status = QueryStatus::Errored(err);
                    }
                }
                (true, reply)
            }
            CacheCommand::Apply { update, reply } => match state.posts.as_deref() {
                Some(posts) => {
                    let next = update.apply(posts);
                    debug!(
                        key = state.key,
                        rule = update.name(),
                        before = posts.len(),
                        after = next.len(),
                        "applied cache update"
                    );
                    state.posts = Some(next);
                    (true, reply)
                }
                None => {
                    debug!(
                        key = state.key,
                        rule = update.name(),
                        "no cached collection; skipping cache update"
                    );
                    (false, reply)
                }
            },
        };

        if changed {
            state.version += 1;
            let _ = events.send(CacheEvent::Updated(state.clone()));
        }
        let _ = reply.send(state.clone());
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
