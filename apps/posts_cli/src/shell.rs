//! Line-oriented stand-in for the post list view.

use std::fmt::Write as _;

use client_core::{
    CacheEvent, ControllerEvent, DisplayState, FormMode, FormState, PendingMutation,
    PostListController,
};
use shared::domain::{Post, PostId};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
    task::{JoinHandle, JoinSet},
};

pub const HELP: &str = "\
commands:
  list              show the posts
  reload            refetch the posts
  title <text>      set the title field
  body <text>       set the body field
  edit <id>         edit a post (fills the fields)
  cancel            stop editing
  submit            create a post, or update the one being edited
  delete <id>       delete a post
  help              show this text
  quit              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Reload,
    Title(String),
    Body(String),
    Edit(PostId),
    Cancel,
    Submit,
    Delete(PostId),
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "list" | "ls" => Ok(Self::List),
            "reload" => Ok(Self::Reload),
            "title" => Ok(Self::Title(rest.to_string())),
            "body" => Ok(Self::Body(rest.to_string())),
            "edit" => parse_id(rest).map(Self::Edit),
            "cancel" => Ok(Self::Cancel),
            "submit" | "save" => Ok(Self::Submit),
            "delete" | "rm" => parse_id(rest).map(Self::Delete),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}'; type 'help'")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Reload => "reload",
            Self::Title(_) => "title",
            Self::Body(_) => "body",
            Self::Edit(_) => "edit",
            Self::Cancel => "cancel",
            Self::Submit => "submit",
            Self::Delete(_) => "delete",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

fn parse_id(raw: &str) -> Result<PostId, String> {
    raw.parse::<i64>()
        .map(PostId)
        .map_err(|_| format!("expected a numeric post id, got '{raw}'"))
}

pub fn render_posts(display: &DisplayState) -> String {
    match display {
        DisplayState::Loading => "Loading...".to_string(),
        DisplayState::Errored(message) => format!("Error: {message}"),
        DisplayState::Ready(posts) if posts.is_empty() => "(no posts)".to_string(),
        DisplayState::Ready(posts) => {
            let mut out = String::new();
            for post in posts {
                let _ = writeln!(out, "#{} {}", post.id, post.title);
                let _ = writeln!(out, "    {}", post.body);
            }
            out.trim_end().to_string()
        }
    }
}

pub fn render_form(form: &FormState) -> String {
    let action = match form.mode() {
        FormMode::Creating => "new post".to_string(),
        FormMode::Editing(post) => format!("editing #{}", post.id),
    };
    format!("[{action}] title={:?} body={:?}", form.title(), form.body())
}

pub fn render_event(event: &ControllerEvent) -> String {
    match event {
        ControllerEvent::PostCreated(post) => format!("created post #{}", post.id),
        ControllerEvent::PostUpdated(post) => format!("updated post #{}", post.id),
        ControllerEvent::PostDeleted(id) => format!("deleted post #{id}"),
        ControllerEvent::Notification(notification) => notification.summary(),
    }
}

async fn find_post(controller: &PostListController, id: PostId) -> Option<Post> {
    match controller.display().await {
        DisplayState::Ready(posts) => posts.into_iter().find(|post| post.id == id),
        _ => None,
    }
}

pub async fn run(controller: PostListController) -> anyhow::Result<()> {
    run_with_input(controller, BufReader::new(tokio::io::stdin())).await
}

/// Drives the controller from `input` until `quit` or end of input. Writes
/// still in flight at that point are awaited before returning.
pub async fn run_with_input<R>(mut controller: PostListController, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let printer = spawn_printer(&controller);
    let mut in_flight = JoinSet::new();

    // A failed load leaves the list blocked behind the error until `reload`.
    let _ = controller.load().await;
    println!("{HELP}");

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match ShellCommand::parse(&line) {
            Ok(cmd) => cmd,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        tracing::debug!(command = cmd.name(), "shell command");

        match cmd {
            ShellCommand::List => println!("{}", render_posts(&controller.display().await)),
            ShellCommand::Reload => {
                let _ = controller.load().await;
            }
            ShellCommand::Title(text) => {
                controller.set_draft_title(text);
                println!("{}", render_form(controller.form()));
            }
            ShellCommand::Body(text) => {
                controller.set_draft_body(text);
                println!("{}", render_form(controller.form()));
            }
            ShellCommand::Edit(id) => match find_post(&controller, id).await {
                Some(post) => {
                    controller.begin_edit(post);
                    println!("{}", render_form(controller.form()));
                }
                None => println!("no post #{id} in the list"),
            },
            ShellCommand::Cancel => {
                controller.cancel_edit();
                println!("{}", render_form(controller.form()));
            }
            ShellCommand::Submit => match controller.submit() {
                Some(pending) => track(&mut in_flight, pending),
                None => println!("title and body are required"),
            },
            ShellCommand::Delete(id) => track(&mut in_flight, controller.delete(id)),
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
        }
    }

    if !in_flight.is_empty() {
        tracing::info!(pending = in_flight.len(), "waiting for in-flight writes");
    }
    while in_flight.join_next().await.is_some() {}

    // Closing the controller's event channel lets the printer drain and stop.
    drop(controller);
    let _ = printer.await;
    Ok(())
}

fn track<T: Send + 'static>(in_flight: &mut JoinSet<()>, pending: PendingMutation<T>) {
    in_flight.spawn(async move {
        if let Err(err) = pending.await {
            tracing::error!("mutation task did not finish: {err}");
        }
    });
}

/// Prints controller events, and the list whenever a settled cache value changes.
fn spawn_printer(controller: &PostListController) -> JoinHandle<()> {
    let mut events = controller.subscribe_events();
    let mut updates = controller.cache().subscribe();
    tokio::spawn(async move {
        let mut cache_open = true;
        loop {
            // Cache updates first: a confirmed write is cached before its event is sent.
            tokio::select! {
                biased;
                update = updates.recv(), if cache_open => match update {
                    Ok(CacheEvent::Updated(snapshot)) if !snapshot.is_fetching => {
                        println!("{}", render_posts(&snapshot.display()));
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => cache_open = false,
                },
                event = events.recv() => match event {
                    Ok(event) => println!("{}", render_event(&event)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event printer fell behind");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
