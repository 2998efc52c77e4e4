//! Test helpers: build the router over local storage, an in-memory article
//! store and an owned email queue.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use inkwell_api::setup::routes;
use inkwell_api::AppState;
use inkwell_core::models::Article;
use inkwell_core::{Config, MailQueueRole};
use inkwell_db::InMemoryArticleStore;
use inkwell_mail::{LocalEmailQueue, OwningEmailQueue};
use inkwell_storage::LocalStorage;
use inkwell_worker::{ArticleImageUpdater, ImagePipeline};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const MEDIA_BASE_URL: &str = "http://localhost:4000/media";

/// Article present in every test app.
pub const ARTICLE_ID: i64 = 42;

pub struct TestApp {
    pub server: TestServer,
    pub articles: Arc<InMemoryArticleStore>,
    pub emails: Arc<LocalEmailQueue>,
    pub state: Arc<AppState>,
    pub media_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub shutdown: CancellationToken,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn test_config(temp_dir: &TempDir) -> Config {
    let media_dir = temp_dir.path().join("media");
    let upload_dir = temp_dir.path().join("uploads");
    let vars: HashMap<&str, String> = HashMap::from([
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", media_dir.display().to_string()),
        ("LOCAL_STORAGE_BASE_URL", MEDIA_BASE_URL.to_string()),
        ("UPLOAD_TEMP_DIR", upload_dir.display().to_string()),
        ("MAX_FILE_SIZE_MB", "5".to_string()),
    ]);
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config(&temp_dir);
    let media_dir = temp_dir.path().join("media");
    let upload_dir = config.upload.temp_dir.clone();
    std::fs::create_dir_all(&upload_dir).expect("upload dir");

    let storage = Arc::new(
        LocalStorage::new(media_dir.clone(), MEDIA_BASE_URL.to_string())
            .await
            .expect("local storage"),
    );
    let articles = Arc::new(InMemoryArticleStore::with_articles([Article::new(
        ARTICLE_ID,
        "Hello, world",
    )]));
    let emails = Arc::new(LocalEmailQueue::new());

    let shutdown = CancellationToken::new();
    let completion = Arc::new(ArticleImageUpdater::new(articles.clone(), storage.clone()));
    let pipeline = ImagePipeline::start(storage, completion, &config.upload, shutdown.clone());

    let state = Arc::new(AppState {
        uploads: pipeline.service,
        articles: articles.clone(),
        email: Arc::new(OwningEmailQueue::new(emails.clone())),
        mail_role: MailQueueRole::Server,
    });

    let app = routes::setup_routes(&config, state.clone());
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        articles,
        emails,
        state,
        media_dir,
        upload_dir,
        shutdown,
        _temp_dir: temp_dir,
    }
}

/// Bytes with a JPEG signature, padded to `len`.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len.max(4), 0x42);
    data
}

pub fn image_form(data: Vec<u8>, filename: &str, mime: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type(mime.to_string());
    MultipartForm::new().add_part("file", part)
}
