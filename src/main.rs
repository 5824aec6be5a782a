use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use jobboard::config::{self, Config};
use jobboard::notice::NoticeLevel;
use jobboard::service::http::HttpNotificationService;
use jobboard::session::{EnvSession, FileSession, SessionProvider, StaticSession};
use jobboard::store::{MarkAllOutcome, MarkOutcome, NotificationStore, NotificationView};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let cfg = config::load()?;

    init_tracing(args.log_json || cfg.log_json);

    let session = session_for(&cfg);
    if session.token().is_none() {
        anyhow::bail!("not logged in: set JOBBOARD_TOKEN or JOBBOARD_TOKEN_FILE");
    }

    let service = HttpNotificationService::new(&cfg.api_url, cfg.http_options())
        .context("failed to create notification client")?;
    let store = NotificationStore::new(Arc::new(service), session);

    let result = match args.command {
        cli::Commands::List { unread } => list(&store, unread).await,
        cli::Commands::Watch { interval_ms } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| cfg.poll_interval());
            watch(&store, interval).await
        }
        cli::Commands::Read { id } => read(&store, &id).await,
        cli::Commands::ReadAll => read_all(&store).await,
    };

    store.dispose();
    result
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "jobboard=info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn session_for(cfg: &Config) -> Arc<dyn SessionProvider> {
    if let Some(token) = &cfg.token {
        Arc::new(StaticSession::new(token.clone()))
    } else if let Some(path) = &cfg.token_file {
        Arc::new(FileSession::new(path.clone()))
    } else {
        Arc::new(EnvSession::new("JOBBOARD_TOKEN"))
    }
}

async fn list(store: &NotificationStore, unread_only: bool) -> anyhow::Result<()> {
    store.refresh().await?;

    let views = store.views();
    println!("{} notification(s), {} unread", views.len(), store.unread_count());
    for view in views
        .iter()
        .filter(|v| !unread_only || !v.notification.read)
    {
        print_view(view);
    }
    Ok(())
}

async fn watch(store: &NotificationStore, interval: Duration) -> anyhow::Result<()> {
    let mut notices = store.subscribe();
    store.start_polling(interval)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut last_unread = None;
    let mut redraw = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                break;
            }
            notice = notices.recv() => match notice {
                Ok(n) => match n.level {
                    NoticeLevel::Success => println!("ok: {}", n.message),
                    NoticeLevel::Error => eprintln!("error: {}", n.message),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "notice receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = redraw.tick() => {
                for view in store.views() {
                    if seen.insert(view.notification.id.clone()) {
                        print_view(&view);
                    }
                }
                let unread = store.unread_count();
                if last_unread != Some(unread) {
                    println!("-- {} unread --", unread);
                    last_unread = Some(unread);
                }
            }
        }
    }

    store.stop_polling();
    Ok(())
}

async fn read(store: &NotificationStore, id: &str) -> anyhow::Result<()> {
    store.refresh().await?;

    match store.mark_as_read(id).await? {
        MarkOutcome::Marked => println!("marked {} as read", id),
        MarkOutcome::AlreadyRead => println!("{} was already read", id),
        MarkOutcome::NotFoundLocally => println!("marked {} as read (not in current list)", id),
        MarkOutcome::NoSession | MarkOutcome::Disposed => anyhow::bail!("no active session"),
    }
    println!("{} unread", store.unread_count());
    Ok(())
}

async fn read_all(store: &NotificationStore) -> anyhow::Result<()> {
    store.refresh().await?;

    match store.mark_all_as_read().await? {
        MarkAllOutcome::Completed { marked, failed: 0 } => {
            println!("marked {} notification(s) as read", marked);
            Ok(())
        }
        MarkAllOutcome::Completed { marked, failed } => {
            anyhow::bail!("marked {} notification(s), {} failed", marked, failed)
        }
        MarkAllOutcome::NoSession | MarkAllOutcome::Disposed => {
            anyhow::bail!("no active session")
        }
    }
}

fn print_view(view: &NotificationView) {
    let n = &view.notification;
    let marker = if n.read { " " } else { "*" };
    println!("{} {} {}  ({})", marker, view.category.icon(), n.title, view.age);
    if !n.message.is_empty() {
        println!("      {}", n.message);
    }
    if let Some(job) = &n.related_job {
        match job.title() {
            Some(title) => println!("      job: {} ({})", title, job.id()),
            None => println!("      job: {}", job.id()),
        }
    }
    println!("      id: {}", n.id);
}
