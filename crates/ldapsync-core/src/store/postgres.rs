//! `PostgreSQL` store for Greenlight's `users` table

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgSslMode};
use sqlx::{Connection, Row};
use tracing::{debug, info, instrument, warn};

use super::{ManagedUsers, StoreConnector, StoredUserRecord, UserStore};
use crate::config::{FetchMode, SslMode, StoreSettings};
use crate::error::StoreError;
use crate::mapping::Projection;
use crate::sync::UpdateBatch;

// NULL columns are loaded as empty strings so they compare unequal to any
// resolved value.
const SELECT_ROWS: &str = r"
    SELECT
        COALESCE(name, '') AS name,
        COALESCE(email, '') AS email,
        COALESCE(username, '') AS username,
        COALESCE(image, '') AS image,
        external_id
    FROM
        users
    WHERE
        provider = $1 AND external_id IS NOT NULL
";

const SELECT_IDENTIFIERS: &str = r"
    SELECT
        external_id
    FROM
        users
    WHERE
        provider = $1 AND external_id IS NOT NULL
";

// Columns absent from a record keep their stored value.
const UPDATE_USER: &str = r"
    UPDATE
        users
    SET
        name = COALESCE($1, name),
        email = COALESCE($2, email),
        username = COALESCE($3, username),
        image = COALESCE($4, image),
        updated_at = NOW()
    WHERE
        external_id = $5
";

/// Connects to `PostgreSQL` with the configured credentials
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    settings: StoreSettings,
}

impl PostgresConnector {
    /// Create a connector
    #[must_use]
    pub const fn new(settings: StoreSettings) -> Self {
        Self { settings }
    }

    fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = match self.settings.ssl_mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
        };

        PgConnectOptions::new()
            .host(&self.settings.host)
            .port(self.settings.port)
            .username(&self.settings.username)
            .password(&self.settings.password)
            .database(&self.settings.database)
            .ssl_mode(ssl_mode)
    }
}

#[async_trait]
impl StoreConnector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn UserStore>, StoreError> {
        debug!(
            host = %self.settings.host,
            port = self.settings.port,
            database = %self.settings.database,
            "Connecting to PostgreSQL"
        );

        let conn = PgConnection::connect_with(&self.connect_options())
            .await
            .map_err(|e| StoreError::Connect(Box::new(e)))?;

        Ok(Box::new(PostgresStore {
            conn,
            provider: self.settings.provider.clone(),
            fetch_mode: self.settings.fetch_mode,
            projection: Projection::GREENLIGHT,
        }))
    }
}

/// Open connection to the Greenlight database
pub struct PostgresStore {
    conn: PgConnection,
    provider: String,
    fetch_mode: FetchMode,
    projection: Projection,
}

impl PostgresStore {
    fn row_to_record(&self, row: &PgRow) -> Result<StoredUserRecord, sqlx::Error> {
        let identifier: String = row.try_get(self.projection.identifier_column())?;
        let mut record = StoredUserRecord::new(identifier);

        for column in self.projection.columns() {
            let value: String = row.try_get(column)?;
            record.insert(column, value);
        }

        Ok(record)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), fields(provider = %self.provider))]
    async fn fetch_managed_users(&mut self) -> Result<ManagedUsers, StoreError> {
        let fetch_err = |e: sqlx::Error| StoreError::Fetch(Box::new(e));

        let users = match self.fetch_mode {
            FetchMode::Rows => {
                let rows = sqlx::query(SELECT_ROWS)
                    .bind(&self.provider)
                    .fetch_all(&mut self.conn)
                    .await
                    .map_err(fetch_err)?;

                let records = rows
                    .iter()
                    .map(|row| self.row_to_record(row))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(fetch_err)?;

                ManagedUsers::from_rows(records)
            }
            FetchMode::Identifiers => {
                let ids = sqlx::query_scalar::<_, String>(SELECT_IDENTIFIERS)
                    .bind(&self.provider)
                    .fetch_all(&mut self.conn)
                    .await
                    .map_err(fetch_err)?;

                ManagedUsers::Identifiers(ids)
            }
        };

        debug!(amount = users.len(), "Fetched users from PostgreSQL");
        Ok(users)
    }

    #[instrument(skip(self, batch), fields(rows = batch.len()))]
    async fn apply_batch(&mut self, batch: &UpdateBatch) -> Result<(), StoreError> {
        let rows = batch.len();
        let commit_err = move |e: sqlx::Error| StoreError::Commit {
            rows,
            source: Box::new(e),
        };

        let mut tx = self.conn.begin().await.map_err(commit_err)?;

        for record in batch.iter() {
            let result = sqlx::query(UPDATE_USER)
                .bind(record.get("name"))
                .bind(record.get("email"))
                .bind(record.get("username"))
                .bind(record.get("image"))
                .bind(record.identifier())
                .execute(&mut *tx)
                .await;

            match result {
                Ok(done) => {
                    debug!(
                        user = %record.identifier(),
                        rows_affected = done.rows_affected(),
                        "Updated user row"
                    );
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        warn!(error = %rollback, "Rollback after failed update also failed");
                    }
                    return Err(commit_err(e));
                }
            }
        }

        tx.commit().await.map_err(commit_err)?;
        info!(updates = rows, "Database transaction committed");

        Ok(())
    }

    async fn close(self: Box<Self>) {
        match self.conn.close().await {
            Ok(()) => debug!("PostgreSQL connection closed"),
            Err(e) => warn!(error = %e, "Failed to close PostgreSQL connection"),
        }
    }
}
