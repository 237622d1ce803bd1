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

//! Generic abstraction to access different database systems.
//!
//! The facilities in this module provide an abstraction over different database systems such as
//! PostgreSQL and SQLite.  The PostgreSQL backend is for production use and the SQLite backend is
//! for development and to support unit tests.
//!
//! Services implement their persistence layer as free functions that take an `Executor`, which may
//! be backed by the connection pool or by an open transaction.  Types that are stored as rows can
//! additionally implement the `Entity` trait to be managed via the generic operations in the
//! `repository` module.

use crate::model::{ModelError, Violations};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::Transaction;
use std::ops::{Deref, DerefMut};

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates that an update was based on a stale version of the entry.
    #[error("Entity was modified concurrently")]
    Conflict,

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

impl From<Violations> for DbError {
    fn from(e: Violations) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A connection to a database of type `D`, either taken from the pool or running a transaction.
///
/// Dereferences to the sqlx connection, so queries run on it by passing `&mut **conn`.
#[derive(Debug)]
pub enum Conn<D: sqlx::Database> {
    /// A connection taken from the pool.  Every statement commits on its own.
    Pooled(PoolConnection<D>),

    /// A connection running a transaction that is rolled back unless committed.
    InTx(Transaction<'static, D>),
}

impl<D: sqlx::Database> Conn<D> {
    /// Commits the transaction, if any.
    async fn commit(self) -> Result<(), sqlx::Error> {
        match self {
            Conn::Pooled(_) => Ok(()),
            Conn::InTx(tx) => tx.commit().await,
        }
    }
}

impl<D: sqlx::Database> Deref for Conn<D> {
    type Target = D::Connection;

    fn deref(&self) -> &D::Connection {
        match self {
            Conn::Pooled(conn) => &**conn,
            Conn::InTx(tx) => &**tx,
        }
    }
}

impl<D: sqlx::Database> DerefMut for Conn<D> {
    fn deref_mut(&mut self) -> &mut D::Connection {
        match self {
            Conn::Pooled(conn) => &mut **conn,
            Conn::InTx(tx) => &mut **tx,
        }
    }
}

/// A database executor that can talk to any of the supported backends.
///
/// sqlx needs to know the concrete backend to type-check queries, so callers destructure this and
/// issue the right statements for each variant.
#[derive(Debug)]
pub enum Executor {
    /// A PostgreSQL connection.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// A SQLite connection.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An executor backed by an open transaction.
///
/// The transaction is rolled back when this is dropped unless `commit` was called first.
#[derive(Debug)]
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor to issue statements within the transaction.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(conn) => conn.commit().await.map_err(postgres::map_sqlx_error),

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(conn) => conn.commit().await.map_err(sqlite::map_sqlx_error),
        }
    }
}

/// Abstraction over a pool of database connections.
#[async_trait]
pub trait Db {
    /// Obtains an executor that runs statements outside of any transaction.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.  It is rolled back unless the caller commits it.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the connection pool.
    async fn close(&self);
}
