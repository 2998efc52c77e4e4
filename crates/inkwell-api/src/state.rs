use std::sync::Arc;

use inkwell_core::MailQueueRole;
use inkwell_db::ArticleStore;
use inkwell_mail::EmailQueue;
use inkwell_worker::ImageUploadService;

/// Shared handler state.
pub struct AppState {
    pub uploads: ImageUploadService,
    pub articles: Arc<dyn ArticleStore>,
    pub email: Arc<dyn EmailQueue>,
    pub mail_role: MailQueueRole,
}
