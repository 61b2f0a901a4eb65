//! Database access: entities, domain models and the repository layer, plus
//! connection setup and table creation for the Postgres store.

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::{info, warn};

use crate::db::entities::{tag, todo, todo_tag};
use crate::server::config::ServerConfig;

pub mod entities;
pub mod models;
pub mod repositories;

/// Connects to Postgres, retrying a fixed number of times with a fixed delay.
/// The last connection error is returned once every attempt has failed.
pub async fn connect_with_retry(config: &ServerConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.database_url());
    opt.max_connections(config.db_max_connections)
        .sqlx_logging(false);

    let max_attempts = config.db_connect_retries;
    let interval = config.connect_retry_interval();
    let mut attempt = 1;
    loop {
        match Database::connect(opt.clone()).await {
            Ok(db) => {
                info!(attempt, "Successfully connected to database.");
                return Ok(db);
            }
            Err(e) if attempt < max_attempts => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    retry_in_secs = interval.as_secs(),
                    "Failed to connect to database, retrying."
                );
                tokio::time::sleep(interval).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Creates the `todos`, `tags` and `todo_tags` tables when they are missing.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table_for(db, todo::Entity).await?;
    create_table_for(db, tag::Entity).await?;
    create_table_for(db, todo_tag::Entity).await?;
    info!("Database schema is up to date.");
    Ok(())
}

async fn create_table_for<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
