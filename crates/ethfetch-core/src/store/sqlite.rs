use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::types::{RequesterId, TransactionRecord};

use super::TransactionStore;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS transactions (
        hash TEXT PRIMARY KEY NOT NULL,
        status INTEGER NOT NULL,
        block_hash TEXT NOT NULL,
        block_number INTEGER NOT NULL,
        from_address TEXT NOT NULL,
        to_address TEXT,
        contract_address TEXT,
        logs_count INTEGER NOT NULL,
        input TEXT NOT NULL,
        value TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        requester_id INTEGER NOT NULL,
        transaction_hash TEXT NOT NULL,
        requested_at TEXT NOT NULL,
        UNIQUE (requester_id, transaction_hash)
    )",
    "CREATE INDEX IF NOT EXISTS idx_user_transactions_requester
        ON user_transactions (requester_id)",
];

const COLUMNS: &str = "hash, status, block_hash, block_number, from_address, to_address, \
     contract_address, logs_count, input, value, created_at";

// Keeps every statement well under SQLite's bound-variable limit.
const SAVE_CHUNK: usize = 100;
const LOOKUP_CHUNK: usize = 500;

/// SQLite-backed [`TransactionStore`].
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open a pool for `url` (for example `sqlite://ethfetch.db`), creating
    /// the database file if needed. Call [`SqliteStore::ensure_schema`]
    /// before first use.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:");
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(if in_memory {
                SqliteJournalMode::Memory
            } else {
                SqliteJournalMode::Wal
            })
            .busy_timeout(Duration::from_secs(5));

        // Each connection to `:memory:` is its own database, so the pool
        // must hold exactly one connection for its whole lifetime.
        let pool_opts = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_opts.connect_with(opts).await?;
        info!(url, "connected to transaction store");
        Ok(Self { pool })
    }

    /// A private in-memory store with its schema in place.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect("sqlite::memory:").await?;
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("transaction store schema ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn save(&self, records: &[TransactionRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records
            .iter()
            .map(TransactionRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;
        for chunk in rows.chunks(SAVE_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> =
                QueryBuilder::new(format!("INSERT INTO transactions ({COLUMNS}) "));
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.hash.clone())
                    .push_bind(row.status)
                    .push_bind(row.block_hash.clone())
                    .push_bind(row.block_number)
                    .push_bind(row.from_address.clone())
                    .push_bind(row.to_address.clone())
                    .push_bind(row.contract_address.clone())
                    .push_bind(row.logs_count)
                    .push_bind(row.input.clone())
                    .push_bind(row.value.clone())
                    .push_bind(row.created_at);
            });
            qb.push(" ON CONFLICT (hash) DO NOTHING");
            qb.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(count = records.len(), "saved transaction records");
        Ok(())
    }

    async fn add_requester_hashes(
        &self,
        requester: RequesterId,
        hashes: &[String],
    ) -> Result<(), StoreError> {
        if hashes.is_empty() {
            return Ok(());
        }
        let requester_id = requester_column(requester)?;
        // A repeated request keeps the time of the first one.
        let requested_at = OffsetDateTime::now_utc();

        let mut tx = self.pool.begin().await?;
        for chunk in hashes.chunks(LOOKUP_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO user_transactions (requester_id, transaction_hash, requested_at) ",
            );
            qb.push_values(chunk, |mut b, hash| {
                b.push_bind(requester_id)
                    .push_bind(hash.clone())
                    .push_bind(requested_at);
            });
            qb.push(" ON CONFLICT (requester_id, transaction_hash) DO NOTHING");
            qb.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(requester = %requester, count = hashes.len(), "recorded requester hashes");
        Ok(())
    }

    async fn by_hashes(&self, hashes: &[String]) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut records = Vec::new();
        for chunk in hashes.chunks(LOOKUP_CHUNK) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {COLUMNS} FROM transactions WHERE hash IN ("
            ));
            let mut separated = qb.separated(", ");
            for hash in chunk {
                separated.push_bind(hash.clone());
            }
            separated.push_unseparated(")");

            let rows: Vec<TransactionRow> = qb.build_query_as().fetch_all(&self.pool).await?;
            for row in rows {
                records.push(TransactionRecord::try_from(row)?);
            }
        }
        Ok(records)
    }

    async fn for_requester(
        &self,
        requester: RequesterId,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE hash IN \
             (SELECT transaction_hash FROM user_transactions WHERE requester_id = ?) \
             ORDER BY created_at, hash"
        ))
        .bind(requester_column(requester)?)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    async fn all(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM transactions ORDER BY created_at, hash"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }
}

// ==============================================================================
// Row Mapping
// ==============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    hash: String,
    status: i64,
    block_hash: String,
    block_number: i64,
    from_address: String,
    to_address: Option<String>,
    contract_address: Option<String>,
    logs_count: i64,
    input: String,
    value: String,
    created_at: OffsetDateTime,
}

impl TryFrom<&TransactionRecord> for TransactionRow {
    type Error = StoreError;

    fn try_from(record: &TransactionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            hash: record.hash.clone(),
            status: i64::from(record.status),
            block_hash: record.block_hash.clone(),
            block_number: i64::try_from(record.block_number)
                .map_err(|_| StoreError::OutOfRange("block number"))?,
            from_address: record.from_address.clone(),
            to_address: record.to_address.clone(),
            contract_address: record.contract_address.clone(),
            logs_count: i64::from(record.logs_count),
            input: record.input.clone(),
            value: record.value.clone(),
            created_at: record.created_at,
        })
    }
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let corrupt = |column: &str, value: i64| {
            StoreError::CorruptRow(format!("{column}={value} for transaction {}", row.hash))
        };
        let status = u32::try_from(row.status).map_err(|_| corrupt("status", row.status))?;
        let block_number =
            u64::try_from(row.block_number).map_err(|_| corrupt("block_number", row.block_number))?;
        let logs_count =
            u32::try_from(row.logs_count).map_err(|_| corrupt("logs_count", row.logs_count))?;

        Ok(Self {
            hash: row.hash,
            status,
            block_hash: row.block_hash,
            block_number,
            from_address: row.from_address,
            to_address: row.to_address,
            contract_address: row.contract_address,
            logs_count,
            input: row.input,
            value: row.value,
            created_at: row.created_at,
        })
    }
}

fn requester_column(requester: RequesterId) -> Result<i64, StoreError> {
    i64::try_from(requester.0).map_err(|_| StoreError::OutOfRange("requester id"))
}
