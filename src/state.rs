use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::JwtService;
use crate::config::Config;
use crate::models::{Notification, NotificationType};
use crate::realtime::{Hub, Push};
use crate::repos::NotificationRepo;
use crate::uploads::UploadStore;
use crate::utils::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    config: Arc<Config>,
    jwt_service: JwtService,
    hub: Hub,
    uploads: UploadStore,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let jwt_service = JwtService::new(&config);
        let uploads = UploadStore::new(config.upload_dir.clone());

        Self {
            db,
            config: Arc::new(config),
            jwt_service,
            hub: Hub::default(),
            uploads,
        }
    }

    /// State over a pool that only connects on first use.
    pub fn lazy(config: Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_lazy(&config.database_url)?;
        Ok(Self::new(pool, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Stores a notification and pushes it to the user's open streams.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        content: &str,
    ) -> Result<Notification, AppError> {
        let notification = NotificationRepo::new(self.db.clone())
            .create(user_id, kind, content)
            .await?;
        self.hub
            .publish(user_id, Push::Notification(notification.clone()));
        Ok(notification)
    }

    /// Fan-out variant of [`AppState::notify`]; one insert for all recipients.
    pub async fn notify_many(
        &self,
        user_ids: &[Uuid],
        kind: NotificationType,
        content: &str,
    ) -> Result<usize, AppError> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let notifications = NotificationRepo::new(self.db.clone())
            .create_many(user_ids, kind, content)
            .await?;
        let count = notifications.len();
        for notification in notifications {
            self.hub
                .publish(notification.user_id, Push::Notification(notification));
        }
        Ok(count)
    }
}
