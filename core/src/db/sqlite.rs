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

//! SQLite backend, used for development and tests.

use crate::db::{Conn, Db, DbError, DbResult, Executor, TxExecutor};
use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqlitePool};

/// A SQLite connection, either taken from the pool or running a transaction.
pub type SqliteExecutor = Conn<Sqlite>;

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("FOREIGN KEY constraint failed") => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e if e.to_string().contains("is locked") => DbError::Unavailable,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Opens a connection pool against the SQLite database described by `conn_str`.
///
/// Use `:memory:` to get a fresh in-memory database shared by all connections in the pool.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    let pool = SqlitePool::connect(conn_str).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// A database instance backed by an SQLite database, either in memory or on disk.
pub struct SqliteDb {
    /// Shared SQLite connection pool.  This is a cloneable type that all concurrent
    /// transactions can use concurrently.
    pool: SqlitePool,
}

impl SqliteDb {
    /// Returns an executor of the specific type used by this database.
    pub async fn typed_ex(&self) -> DbResult<SqliteExecutor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Conn::Pooled(conn))
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        Ok(Executor::Sqlite(self.typed_ex().await?))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(Conn::InTx(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Initializes the database with a `schema` made of multiple statements.
pub async fn run_schema(conn: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(&mut **conn).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test utilities for the SQLite connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Initializes the test database.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::db::tests::{backend_tests, query_i64};
    use std::sync::Arc;

    backend_tests!(Arc::new(setup().await), Arc::new(setup().await));

    #[test]
    fn test_map_sqlx_error_known_conditions() {
        assert_eq!(DbError::NotFound, map_sqlx_error(sqlx::Error::RowNotFound));
        assert_eq!(
            DbError::AlreadyExists,
            map_sqlx_error(sqlx::Error::Protocol(
                "UNIQUE constraint failed: books.isbn".to_owned()
            ))
        );
        assert_eq!(
            DbError::NotFound,
            map_sqlx_error(sqlx::Error::Protocol("FOREIGN KEY constraint failed".to_owned()))
        );
        match map_sqlx_error(sqlx::Error::PoolClosed) {
            DbError::BackendError(_) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_run_schema_multiple_statements() {
        let db = setup().await;
        let mut ex = db.typed_ex().await.unwrap();
        run_schema(
            &mut ex,
            "CREATE TABLE first (i INTEGER);
            CREATE TABLE second (j INTEGER);
            INSERT INTO first (i) VALUES (1);
            INSERT INTO second (j) VALUES (2), (3);",
        )
        .await
        .unwrap();

        let mut ex = Executor::Sqlite(ex);
        assert_eq!(1, query_i64(&mut ex, "count", "SELECT COUNT(*) AS count FROM first").await);
        assert_eq!(2, query_i64(&mut ex, "count", "SELECT COUNT(*) AS count FROM second").await);
        drop(ex);
        db.close().await;
    }
}
