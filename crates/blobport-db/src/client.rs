//! Client construction.

use blobport_core::MongoConfig;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::{Client, Database};

use crate::error::DbResult;

/// Connect to MongoDB and select the target database.
///
/// Retryable writes are disabled: standalone servers reject them, and every
/// write this tool issues is a plain single-document update.
pub async fn connect(config: &MongoConfig) -> DbResult<Database> {
    let mut options = ClientOptions::builder()
        .hosts(vec![ServerAddress::Tcp {
            host: config.host.clone(),
            port: Some(config.port),
        }])
        .retry_writes(false)
        .build();

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }

    let client = Client::with_options(options)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "connected to MongoDB"
    );
    Ok(client.database(&config.database))
}
