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

//! Generic persistence operations for types that know their own primary key.
//!
//! Every mutating operation in this module runs inside a `UnitOfWork`.  A unit of work either owns
//! a transaction that it began itself, in which case the operation commits it on success and the
//! transaction rolls back on any failure, or it joins a transaction owned by the caller, in which
//! case committing and rolling back are left to that caller.

use crate::db::{Db, DbResult, Executor, TxExecutor};
use async_trait::async_trait;

/// Exposes the primary key of an entity.
pub trait Identifiable {
    /// Type of the primary key.
    type Id: Send + Sync;

    /// Returns the primary key of this entity.
    fn id(&self) -> &Self::Id;
}

/// Storage operations that a type must provide to be managed by this module.
#[async_trait]
pub trait Entity: Identifiable + Sized + Send + Sync {
    /// Looks up the entity with primary key `id`.
    async fn find(ex: &mut Executor, id: &Self::Id) -> DbResult<Option<Self>>;

    /// Stores a new `entity` and returns it as stored.
    async fn insert(ex: &mut Executor, entity: Self) -> DbResult<Self>;

    /// Overwrites an existing `entity` and returns it as stored.
    ///
    /// Implementations must fail with `DbError::Conflict` if the version carried by `entity` does
    /// not match the stored one, and must bump the version otherwise.
    async fn update(ex: &mut Executor, entity: Self) -> DbResult<Self>;

    /// Deletes the entity with primary key `id`.  Returns whether the entity existed.
    async fn delete(ex: &mut Executor, id: &Self::Id) -> DbResult<bool>;
}

/// Transaction scope held by a `UnitOfWork`.
enum Scope<'a> {
    /// The unit of work began this transaction and is responsible for finishing it.
    Owned(TxExecutor),

    /// The unit of work participates in a transaction owned by someone else.
    Joined(&'a mut TxExecutor),
}

/// Transactional scope in which repository operations run.
pub struct UnitOfWork<'a>(Scope<'a>);

impl UnitOfWork<'static> {
    /// Begins a new transaction on `db` and takes ownership of it.
    pub async fn begin(db: &(dyn Db + Send + Sync)) -> DbResult<Self> {
        Ok(Self(Scope::Owned(db.begin().await?)))
    }
}

impl<'a> UnitOfWork<'a> {
    /// Participates in the already-open transaction `tx`.
    pub fn join(tx: &'a mut TxExecutor) -> Self {
        Self(Scope::Joined(tx))
    }

    /// Returns the executor to issue queries within this unit of work.
    pub fn ex(&mut self) -> &mut Executor {
        match &mut self.0 {
            Scope::Owned(tx) => tx.ex(),
            Scope::Joined(tx) => tx.ex(),
        }
    }

    /// Finishes the unit of work successfully.
    ///
    /// This commits the transaction if the unit of work owns it and is a no-op otherwise.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            Scope::Owned(tx) => tx.commit().await,
            Scope::Joined(_) => Ok(()),
        }
    }
}

/// Outcome of a `create_or_update` operation.
#[derive(Debug, PartialEq)]
pub enum Saved<E> {
    /// The entity did not exist and was inserted.
    Created(E),

    /// The entity existed and was updated.
    Updated(E),
}

impl<E> Saved<E> {
    /// Returns true if the entity was inserted.
    pub fn is_created(&self) -> bool {
        matches!(self, Saved::Created(_))
    }

    /// Extracts the stored entity.
    pub fn into_inner(self) -> E {
        match self {
            Saved::Created(e) | Saved::Updated(e) => e,
        }
    }
}

/// Inserts a new `entity` within `uow`.
pub async fn persist<E: Entity>(mut uow: UnitOfWork<'_>, entity: E) -> DbResult<E> {
    let entity = E::insert(uow.ex(), entity).await?;
    uow.commit().await?;
    Ok(entity)
}

/// Updates an existing `entity` within `uow`, checking its version.
pub async fn merge<E: Entity>(mut uow: UnitOfWork<'_>, entity: E) -> DbResult<E> {
    let entity = E::update(uow.ex(), entity).await?;
    uow.commit().await?;
    Ok(entity)
}

/// Deletes the entity with primary key `id` within `uow`.  Deleting a missing entity succeeds.
pub async fn remove<E: Entity>(mut uow: UnitOfWork<'_>, id: &E::Id) -> DbResult<bool> {
    let existed = E::delete(uow.ex(), id).await?;
    uow.commit().await?;
    Ok(existed)
}

/// Stores `entity` within `uow`, updating it if its primary key already exists and inserting it
/// otherwise.
pub async fn create_or_update<E: Entity>(mut uow: UnitOfWork<'_>, entity: E) -> DbResult<Saved<E>> {
    let saved = match E::find(uow.ex(), entity.id()).await? {
        Some(_) => Saved::Updated(E::update(uow.ex(), entity).await?),
        None => Saved::Created(E::insert(uow.ex(), entity).await?),
    };
    uow.commit().await?;
    Ok(saved)
}
