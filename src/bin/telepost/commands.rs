use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use spdlog::info;

use telepost::attachments::AttachmentOutcome;
use telepost::channel::telegram::TelegramChannel;
use telepost::channel::Channel;
use telepost::config::Config;
use telepost::deferred_store::DeferredPostStore;
use telepost::markup::{channel_length, to_channel_markup};
use telepost::post::Post;
use telepost::publisher::PostPublisher;
use telepost::scheduler::Scheduler;

const LOCAL_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Accepts RFC 3339, or a date and time without offset taken as local time.
pub(crate) fn parse_due_time(buf: &str) -> Result<DateTime<Utc>> {
    let buf = buf.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(buf) {
        return Ok(at.with_timezone(&Utc));
    }

    let naive = LOCAL_TIME_FORMATS.iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(buf, fmt).ok())
        .ok_or_else(|| anyhow!("Invalid time '{}'. Use RFC 3339 or YYYY-MM-DD HH:MM[:SS]", buf))?;

    let local = Local.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("'{}' is ambiguous or does not exist in the local time zone", buf))?;

    Ok(local.with_timezone(&Utc))
}

/// Relative paths that don't exist from the current directory are taken from the vault.
pub(crate) fn resolve_doc_path(path: &Path, vault_dir: &Path) -> PathBuf {
    if path.is_relative() && !path.exists() {
        vault_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

pub(crate) struct App {
    config: Config,
    publisher: Arc<PostPublisher>,
    scheduler: Scheduler,
}

impl App {
    pub(crate) fn new(config: Config) -> Result<Self> {
        let telegram = TelegramChannel::new(&config.telegram.bot_token, config.telegram.api_url.as_deref())
            .context("Error creating Telegram client")?;
        let channel: Arc<dyn Channel> = Arc::new(telegram);

        let publisher = Arc::new(PostPublisher::new(
            channel,
            config.media_dir(),
            config.defaults.max_length,
            &config.telegram.default_channel,
        ));
        let store = Arc::new(DeferredPostStore::new(&config.paths.scheduled_dir));
        let scheduler = Scheduler::new(publisher.clone(), store, config.sweep_interval());

        Ok(Self { config, publisher, scheduler })
    }

    async fn read_post(&self, file: &Path) -> Result<Post> {
        let path = resolve_doc_path(file, &self.config.paths.vault_dir);
        Ok(Post::parse(&path).await?)
    }

    pub(crate) async fn publish(&self, file: &Path) -> Result<()> {
        let post = self.read_post(file).await?;
        let report = self.publisher.publish(&post).await?;

        println!("Published '{}' to {}", post.metadata.title, report.chat);
        if !report.attachments.results.is_empty() {
            println!("Attachments sent: {}/{}", report.attachments.sent(), report.attachments.results.len());
        }
        for failure in report.attachments.failures() {
            let reason = match &failure.outcome {
                AttachmentOutcome::Missing => "file not found".to_string(),
                AttachmentOutcome::Unreadable(e) => e.clone(),
                AttachmentOutcome::Failed(e) => e.to_string(),
                AttachmentOutcome::Sent => continue,
            };
            println!("  {} ({}): {}", failure.reference, failure.path.display(), reason);
        }
        Ok(())
    }

    pub(crate) async fn schedule(&self, file: &Path, time: &str) -> Result<()> {
        let at = parse_due_time(time)?;
        let post = self.read_post(file).await?;
        let id = self.scheduler.schedule(&post, at).await?;

        println!("Scheduled '{}' for {} ({})", post.metadata.title, at.with_timezone(&Local), id);
        Ok(())
    }

    pub(crate) async fn check(&self, file: &Path) -> Result<()> {
        let post = self.read_post(file).await?;
        let length = channel_length(&to_channel_markup(&post.content));
        self.publisher.validate(&post)?;

        println!("'{}' is ready: {} of {} characters, channel {}, {} attachment(s)",
                 post.metadata.title,
                 length,
                 self.config.defaults.max_length,
                 post.channel_or(&self.config.telegram.default_channel),
                 post.metadata.attachments.len());
        Ok(())
    }

    pub(crate) async fn list(&self) -> Result<()> {
        let pending = self.scheduler.pending().await?;
        if pending.is_empty() {
            println!("No scheduled posts");
            return Ok(());
        }

        for record in pending {
            println!("{}  {}  {}  {}",
                     record.due.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                     record.id,
                     record.post.channel_or(&self.config.telegram.default_channel),
                     record.post.metadata.title);
        }
        Ok(())
    }

    pub(crate) async fn sweep(&self) -> Result<()> {
        let Some(report) = self.scheduler.sweep(Utc::now()).await else {
            return Ok(());
        };

        println!("Delivered {}, failed {}", report.delivered.len(), report.failed.len());
        for (id, reason) in report.failed {
            println!("  {}: {}", id, reason);
        }
        Ok(())
    }

    pub(crate) async fn run(&self) -> Result<()> {
        info!("Scheduled posts are read from {}", self.config.paths.scheduled_dir.display());
        self.scheduler.start();

        tokio::signal::ctrl_c().await
            .context("Error waiting for Ctrl-C")?;

        info!("Shutting down");
        self.scheduler.shutdown().await;
        Ok(())
    }
}
