//! Service wiring: storage, article store, image pipeline and mail queue.

use std::sync::Arc;

use anyhow::{Context, Result};
use inkwell_core::{Config, MailQueueRole};
use inkwell_db::{setup_database, ArticleStore, InMemoryArticleStore, PgArticleStore};
use inkwell_mail::{
    email_queue_for_role, DrainWorker, EmailQueue, LocalEmailQueue, PipeEndpoint, PipeListener,
    SmtpEmailSender,
};
use inkwell_storage::create_storage;
use inkwell_worker::{ArticleImageUpdater, ImagePipeline};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub struct Services {
    pub state: Arc<AppState>,
    pub background: Vec<JoinHandle<()>>,
}

pub async fn initialize_services(config: &Config, shutdown: CancellationToken) -> Result<Services> {
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;
    let articles = setup_article_store(config).await?;

    let completion = Arc::new(ArticleImageUpdater::new(articles.clone(), storage.clone()));
    let pipeline = ImagePipeline::start(storage, completion, &config.upload, shutdown.clone());
    let mut background = vec![pipeline.worker];

    let (email, mail_tasks) = setup_email_queue(config, shutdown)?;
    background.extend(mail_tasks);

    let state = Arc::new(AppState {
        uploads: pipeline.service,
        articles,
        email,
        mail_role: config.mail.role,
    });

    Ok(Services { state, background })
}

/// Postgres when `DATABASE_URL` is set, otherwise an in-process store.
async fn setup_article_store(config: &Config) -> Result<Arc<dyn ArticleStore>> {
    if config.database_url().is_some() {
        let pool = setup_database(config).await?;
        return Ok(Arc::new(PgArticleStore::new(pool)));
    }

    tracing::warn!("DATABASE_URL not set, using in-memory article store");
    Ok(Arc::new(InMemoryArticleStore::new()))
}

/// Pick the email queue for this process's role.
///
/// As the owner, the API also accepts messages from other processes and, when
/// SMTP is configured, delivers them itself.
fn setup_email_queue(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<(Arc<dyn EmailQueue>, Vec<JoinHandle<()>>)> {
    let local = Arc::new(LocalEmailQueue::new());
    let email = email_queue_for_role(&config.mail, local.clone());
    let mut tasks = Vec::new();

    if config.mail.role == MailQueueRole::Client {
        tracing::info!(pipe = %config.mail.pipe_name, "Forwarding email to the mail queue owner");
        return Ok((email, tasks));
    }

    let listener = PipeListener::new(
        PipeEndpoint::new(config.mail.pipe_name.clone()),
        local.clone(),
        config.mail.max_instances,
        config.mail.listener_backoff,
    );
    tasks.push(tokio::spawn(listener.run(shutdown.clone())));

    if config.validate_smtp().is_ok() {
        let sender = SmtpEmailSender::from_config(&config.smtp)
            .context("Failed to configure SMTP sender")?;
        let drain = DrainWorker::new(
            local,
            Arc::new(sender),
            config.mail.drain_interval,
            config.mail.dedup_retention,
        );
        tasks.push(tokio::spawn(drain.run(shutdown)));
    } else {
        tracing::warn!("SMTP not configured, queued email will not be delivered");
    }

    Ok((email, tasks))
}
