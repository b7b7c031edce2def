use super::*;
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use client_core::{
    ErrorCategory, MutationError, MutationKind, Notification, PostsApi, QueryCache,
};
use shared::domain::{NewPost, UserId};
use tokio::sync::Mutex;

fn post(id: i64, title: &str, body: &str) -> Post {
    Post {
        id: PostId(id),
        title: title.to_string(),
        body: body.to_string(),
        user_id: UserId(1),
    }
}

#[test]
fn parses_commands_with_arguments() {
    assert_eq!(
        ShellCommand::parse("title  Hello world "),
        Ok(ShellCommand::Title("Hello world".into()))
    );
    assert_eq!(ShellCommand::parse("edit 4"), Ok(ShellCommand::Edit(PostId(4))));
    assert_eq!(ShellCommand::parse("rm 2"), Ok(ShellCommand::Delete(PostId(2))));
    assert_eq!(ShellCommand::parse("body"), Ok(ShellCommand::Body(String::new())));
    assert_eq!(ShellCommand::parse("save"), Ok(ShellCommand::Submit));
}

#[test]
fn rejects_bad_input() {
    assert!(ShellCommand::parse("edit four").is_err());
    assert!(ShellCommand::parse("   ").is_err());
    let err = ShellCommand::parse("frobnicate").expect_err("unknown");
    assert!(err.contains("frobnicate"));
}

#[test]
fn renders_each_display_state() {
    assert_eq!(render_posts(&DisplayState::Loading), "Loading...");
    assert_eq!(
        render_posts(&DisplayState::Errored("boom".into())),
        "Error: boom"
    );
    assert_eq!(render_posts(&DisplayState::Ready(Vec::new())), "(no posts)");
    assert_eq!(
        render_posts(&DisplayState::Ready(vec![post(2, "B", "b"), post(1, "A", "a")])),
        "#2 B\n    b\n#1 A\n    a"
    );
}

#[test]
fn renders_form_mode() {
    assert_eq!(
        render_form(&FormState::default()),
        "[new post] title=\"\" body=\"\""
    );
}

#[test]
fn renders_mutation_events() {
    assert_eq!(
        render_event(&ControllerEvent::PostCreated(post(7, "G", "g"))),
        "created post #7"
    );
    assert_eq!(
        render_event(&ControllerEvent::PostDeleted(PostId(3))),
        "deleted post #3"
    );

    let err = MutationError {
        kind: MutationKind::Delete,
        category: ErrorCategory::Unknown,
        message: "teapot".into(),
    };
    assert_eq!(
        render_event(&ControllerEvent::Notification(Notification::from(&err))),
        "Could not delete post (unexpected error): teapot"
    );
}

/// Answers writes only after `delay`, so input can end while they are in flight.
struct SlowPostsApi {
    posts: Mutex<Vec<Post>>,
    delay: Duration,
}

#[async_trait]
impl PostsApi for SlowPostsApi {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        Ok(self.posts.lock().await.clone())
    }

    async fn create_post(&self, draft: NewPost) -> Result<Post> {
        tokio::time::sleep(self.delay).await;
        let mut posts = self.posts.lock().await;
        let post = Post {
            id: PostId(posts.len() as i64 + 1),
            title: draft.title,
            body: draft.body,
            user_id: draft.user_id,
        };
        posts.insert(0, post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: Post) -> Result<Post> {
        tokio::time::sleep(self.delay).await;
        Ok(post)
    }

    async fn delete_post(&self, id: PostId) -> Result<PostId> {
        tokio::time::sleep(self.delay).await;
        self.posts.lock().await.retain(|post| post.id != id);
        Ok(id)
    }
}

fn slow_controller(posts: Vec<Post>) -> (PostListController, QueryCache) {
    let api = SlowPostsApi {
        posts: Mutex::new(posts),
        delay: Duration::from_millis(200),
    };
    let cache = QueryCache::spawn();
    let controller = PostListController::with_cache(Arc::new(api), cache.clone());
    (controller, cache)
}

#[tokio::test]
async fn end_of_input_waits_for_in_flight_create() {
    let (controller, cache) = slow_controller(vec![post(1, "A", "a")]);
    let mut events = controller.subscribe_events();

    run_with_input(controller, "title B\nbody b\nsubmit\n".as_bytes())
        .await
        .expect("shell");

    let snapshot = cache.snapshot().await.expect("snapshot");
    assert_eq!(
        snapshot.posts,
        Some(vec![post(2, "B", "b"), post(1, "A", "a")])
    );
    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::PostCreated(post(2, "B", "b"))
    );
}

#[tokio::test]
async fn quit_waits_for_in_flight_delete() {
    let (controller, cache) = slow_controller(vec![post(2, "B", "b"), post(1, "A", "a")]);
    let mut events = controller.subscribe_events();

    run_with_input(controller, "delete 2\nquit\nlist\n".as_bytes())
        .await
        .expect("shell");

    let snapshot = cache.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.posts, Some(vec![post(1, "A", "a")]));
    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::PostDeleted(PostId(2))
    );
}
