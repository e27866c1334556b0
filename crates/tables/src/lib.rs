//! Named tables over a spreadsheet, mirrored in memory.
//!
//! Layers compose from the outside in: [`keyed::Keyed`] or [`cache::Cache`]
//! own an in-memory mirror of an origin, [`clock::Clock`] throttles version
//! checks, and [`source::Source`] is either a Google sheet or a plain
//! in-memory table.

pub mod cache;
pub mod clock;
pub mod google_sheets;
pub mod in_mem;
pub mod index;
pub mod keyed;
pub mod retry;
pub mod row;
pub mod source;

use async_trait::async_trait;
use std::{
    error::Error as StdError,
    sync::atomic::{AtomicU64, Ordering},
};

pub mod prelude {
    pub use crate::row::Row;
    pub use crate::{TableClear, TableExtend, TableFetch, TableUpdate, TableVersion};
}

/// Rows in origin order. `None` marks a blank or unreadable row, so the
/// position of every entry is its row number.
pub type Rows<E> = Vec<Option<E>>;

#[async_trait]
pub trait TableFetch<E: Send> {
    type Error: StdError + Send + Sync + 'static;

    async fn fetch(&mut self) -> Result<Rows<E>, Self::Error>;
}

#[async_trait]
pub trait TableExtend<E: Send + Sync> {
    type Error: StdError + Send + Sync + 'static;

    async fn extend(&mut self, entries: &[E]) -> Result<(), Self::Error>;

    async fn extend_one(&mut self, entry: &E) -> Result<(), Self::Error> {
        self.extend(std::slice::from_ref(entry)).await
    }
}

#[async_trait]
pub trait TableUpdate<E: Send + Sync> {
    type Error: StdError + Send + Sync + 'static;

    async fn update(&mut self, from_row: usize, entries: &[E]) -> Result<(), Self::Error>;

    async fn update_one(&mut self, row: usize, entry: &E) -> Result<(), Self::Error> {
        self.update(row, std::slice::from_ref(entry)).await
    }
}

#[async_trait]
pub trait TableClear {
    type Error: StdError + Send + Sync + 'static;

    async fn clear(&mut self) -> Result<(), Self::Error>;
}

#[async_trait]
pub trait TableVersion {
    type Error: StdError + Send + Sync + 'static;

    async fn version(&mut self) -> Result<u64, Self::Error>;
}

static VERSION: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_version() -> u64 {
    VERSION.fetch_add(1, Ordering::Relaxed)
}
