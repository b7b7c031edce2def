use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{DisplayState, HttpPostsApi, PostListController};
use shared::domain::{PostId, UserId};
use tracing_subscriber::EnvFilter;

mod config;
mod shell;

use config::{load_settings, normalize_base_url};

#[derive(Parser, Debug)]
#[command(about = "List, create, edit and delete posts on a REST service")]
struct Cli {
    /// Config file (defaults to ./posts.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the posts.
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Edit a post; omitted fields keep their current value.
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Interactive session (the default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        settings.api_base_url = normalize_base_url(url)?;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    tracing::info!(api = %settings.api_base_url, "using posts service");

    let api = HttpPostsApi::with_timeout(&settings.api_base_url, settings.request_timeout())?;
    let mut controller = PostListController::new(Arc::new(api))
        .with_default_user_id(UserId(settings.default_user_id));

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => shell::run(controller).await?,
        Command::List => {
            controller.load().await?;
            println!("{}", shell::render_posts(&controller.display().await));
        }
        Command::Create { title, body } => {
            controller.load().await?;
            controller.set_draft_title(title);
            controller.set_draft_body(body);
            let pending = controller
                .create()
                .ok_or_else(|| anyhow!("title and body must not be blank"))?;
            let post = pending.await.context("create task failed")??;
            println!("created post #{}", post.id);
        }
        Command::Update { id, title, body } => {
            controller.load().await?;
            let DisplayState::Ready(posts) = controller.display().await else {
                bail!("post list is unavailable");
            };
            let post = posts
                .into_iter()
                .find(|post| post.id == PostId(id))
                .with_context(|| format!("post #{id} not found"))?;
            controller.begin_edit(post);
            if let Some(title) = title {
                controller.set_draft_title(title);
            }
            if let Some(body) = body {
                controller.set_draft_body(body);
            }
            let pending = controller
                .update()
                .ok_or_else(|| anyhow!("title and body must not be blank"))?;
            let post = pending.await.context("update task failed")??;
            println!("updated post #{}", post.id);
        }
        Command::Delete { id } => {
            let deleted = controller
                .delete(PostId(id))
                .await
                .context("delete task failed")??;
            println!("deleted post #{deleted}");
        }
    }

    Ok(())
}
