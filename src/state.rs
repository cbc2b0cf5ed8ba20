use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::activity::ActivityBus;
use crate::attachments::{AttachmentStore, LocalAttachmentStore};
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub activity_bus: ActivityBus,
    pub attachments: Arc<dyn AttachmentStore>,
}

impl AppState {
    /// State backed by the local attachment store from `config`.
    pub fn new(db: DbPool, config: Config) -> Self {
        let attachments = LocalAttachmentStore::new(
            config.uploads_path(),
            config.storage.public_url.clone(),
        );
        Self::with_attachments(db, config, Arc::new(attachments))
    }

    pub fn with_attachments(
        db: DbPool,
        config: Config,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        let activity_bus = ActivityBus::new(config.activity.channel_capacity);
        Self {
            db,
            config,
            activity_bus,
            attachments,
        }
    }
}
