use tracing_subscriber::fmt::init;

use sproutlearn_api::{
    config::Config,
    services::{
        email_service::EmailService, notification_service::NotificationService,
        notification_worker::NotificationWorker, AppState,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load().expect("Failed to load configuration");

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to MongoDB");

    let redis_client =
        redis::Client::open(config.redis_uri.clone()).expect("Failed to create Redis client");

    let app_state = AppState::new(config.clone(), mongo_client, redis_client)
        .await
        .expect("Failed to initialize app state");

    let notification_service = NotificationService::new(app_state.mongo.clone());
    let email_service = EmailService::new(config.smtp.clone());

    let worker = NotificationWorker::new(
        notification_service,
        email_service,
        config.notifications.worker_interval_secs,
    );

    worker.run().await?;

    Ok(())
}
