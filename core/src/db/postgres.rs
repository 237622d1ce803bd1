// Catalog
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.


//! PostgreSQL backend, used in production.

use crate::db::{Conn, Db, DbError, DbResult, Executor, TxExecutor};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use derivative::Derivative;
use log::warn;
use sqlx::postgres::{PgConnectOptions, PgDatabaseError, PgPool, PgPoolOptions, Postgres};
use std::future::Future;
use std::time::Duration;

/// Default value for the `max_retries` configuration property.
const DEFAULT_MAX_RETRIES: u16 = 30;

/// Default value for the `acquire_timeout` configuration property.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Delay before the first retry of an operation against an unavailable database.
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Upper bound for the delay between retries, excluding jitter.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Upper bound, in milliseconds, of the random jitter added to every retry delay.
const RETRY_JITTER_MS: u64 = 250;

/// A PostgreSQL connection, either taken from the pool or running a transaction.
pub type PostgresExecutor = Conn<Postgres>;

/// Maps a PostgreSQL SQLSTATE `code` to the error it represents, if we know about it.
fn classify_sqlstate(code: &str) -> Option<DbError> {
    match code {
        "23503" /* foreign_key_violation */ => Some(DbError::NotFound),
        "23505" /* unique_violation */ => Some(DbError::AlreadyExists),
        "40001" /* serialization_failure */ => Some(DbError::Conflict),
        "53300" /* too_many_connections */ => Some(DbError::Unavailable),
        "57P03" /* cannot_connect_now */ => Some(DbError::Unavailable),
        _ => None,
    }
}

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.try_downcast_ref::<PgDatabaseError>() {
            Some(pg) => classify_sqlstate(pg.code()).unwrap_or_else(|| {
                DbError::BackendError(format!("pgsql error {}: {}", pg.code(), pg))
            }),
            None => DbError::BackendError(e.to_string()),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Options to establish a connection to a PostgreSQL database.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Host to connect to.
    pub host: String,

    /// Port to connect to.
    pub port: u16,

    /// Name of the database holding the catalog.
    pub database: String,

    /// Username to establish the connection with.
    pub username: String,

    /// Password to establish the connection with.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Minimum number of connections to keep open.
    pub min_connections: Option<u32>,

    /// Maximum number of connections to allow.
    pub max_connections: Option<u32>,

    /// How long to wait for a free connection before considering the database unavailable.
    pub acquire_timeout: Duration,

    /// How many times to retry an operation while the database is unavailable.
    pub max_retries: u16,
}

impl PostgresOptions {
    /// Reads the options from the `<prefix>_*` environment variables.
    ///
    /// `HOST`, `PORT`, `DATABASE`, `USERNAME` and `PASSWORD` are required.  `MIN_CONNECTIONS`,
    /// `MAX_CONNECTIONS`, `ACQUIRE_TIMEOUT_SECS` and `MAX_RETRIES` are optional.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        let acquire_timeout = get_optional_var::<u64>(prefix, "ACQUIRE_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT);
        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "DATABASE")?,
            username: get_required_var::<String>(prefix, "USERNAME")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            acquire_timeout,
            max_retries: get_optional_var::<u16>(prefix, "MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }

    /// Returns the sqlx options to open a single connection.
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
    }

    /// Returns the sqlx options to size the connection pool.
    fn pool_options(&self) -> PgPoolOptions {
        let mut options = PgPoolOptions::new().acquire_timeout(self.acquire_timeout);
        if let Some(min_connections) = self.min_connections {
            options = options.min_connections(min_connections);
        }
        if let Some(max_connections) = self.max_connections {
            options = options.max_connections(max_connections);
        }
        options
    }
}

/// Sequence of delays to wait between attempts to reach an unavailable database.
///
/// Delays double on every step up to `MAX_RETRY_DELAY` and the sequence ends after `retries`
/// steps.
struct Backoff {
    /// Delay to return on the next step.
    delay: Duration,

    /// Steps left in the sequence.
    retries: u16,
}

impl Backoff {
    /// Creates a sequence of `retries` delays.
    fn new(retries: u16) -> Self {
        Self { delay: FIRST_RETRY_DELAY, retries }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retries == 0 {
            return None;
        }
        self.retries -= 1;

        let delay = self.delay;
        self.delay = (self.delay * 2).min(MAX_RETRY_DELAY);
        Some(delay)
    }
}

/// Runs `op` until it succeeds, fails with an error other than unavailability, or the retries
/// given by `max_retries` are exhausted.
async fn with_retries<Op, OpFut, T>(max_retries: u16, op: Op) -> DbResult<T>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut backoff = Backoff::new(max_retries);
    loop {
        match op().await.map_err(map_sqlx_error) {
            Err(DbError::Unavailable) => match backoff.next() {
                Some(delay) => {
                    let jitter = Duration::from_millis(rand::random_range(0..RETRY_JITTER_MS));
                    let delay = delay + jitter;
                    warn!("Database unavailable; retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
                None => return Err(DbError::Unavailable),
            },
            result => return result,
        }
    }
}

/// A pool of connections to a PostgreSQL database.
pub struct PostgresDb {
    /// Shared connection pool.
    pool: PgPool,

    /// How many times to retry an operation while the database is unavailable.
    max_retries: u16,
}

impl PostgresDb {
    /// Creates a new connection pool based on a set of options.
    ///
    /// Connections are opened lazily on first use, so this does not fail if the database is down.
    pub fn connect(opts: PostgresOptions) -> DbResult<Self> {
        let pool = opts.pool_options().connect_lazy_with(opts.connect_options());
        Ok(Self { pool, max_retries: opts.max_retries })
    }

    /// Returns an executor of the specific type used by this database.
    pub async fn typed_ex(&self) -> DbResult<PostgresExecutor> {
        let conn = with_retries(self.max_retries, || self.pool.acquire()).await?;
        Ok(Conn::Pooled(conn))
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        Ok(Executor::Postgres(self.typed_ex().await?))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = with_retries(self.max_retries, || self.pool.begin()).await?;
        Ok(TxExecutor(Executor::Postgres(Conn::InTx(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Initializes the database with a `schema` made of multiple statements.
pub async fn run_schema(conn: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(&mut **conn).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test utilities for the PostgreSQL connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Connects to the test database configured via the `PGSQL_TEST_*` variables.
    ///
    /// Tables are created in the `pg_temp` schema so that they vanish on disconnection.  This only
    /// works if the pool keeps exactly one connection open, which this enforces.
    pub async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let mut opts = PostgresOptions::from_env("PGSQL_TEST").unwrap();
        opts.min_connections = Some(1);
        opts.max_connections = Some(1);
        let db = PostgresDb::connect(opts).unwrap();

        let mut conn = db.typed_ex().await.unwrap();
        sqlx::query("SET search_path TO pg_temp").execute(&mut *conn).await.unwrap();
        db
    }
}
