use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    google_sheets::{Error, Sheet},
    in_mem::InMemTable,
    prelude::*,
    Rows,
};

/// Origin of a table: a spreadsheet tab, or rows kept in memory when the bot
/// runs without a spreadsheet.
pub enum Source<E> {
    Sheet(Sheet<E>),
    Memory(InMemTable<E>),
}

// The in-memory arm can't fail, so `Infallible` is matched away.
macro_rules! memory {
    ($call: expr) => {
        match $call {
            Ok(value) => Ok(value),
            Err(never) => match never {},
        }
    };
}

#[async_trait]
impl<E> TableFetch<E> for Source<E>
where
    E: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Error = Error;

    async fn fetch(&mut self) -> Result<Rows<E>, Error> {
        match self {
            Source::Sheet(sheet) => sheet.fetch().await,
            Source::Memory(table) => memory!(table.fetch().await),
        }
    }
}

#[async_trait]
impl<E> TableExtend<E> for Source<E>
where
    E: Serialize + Clone + Send + Sync + 'static,
{
    type Error = Error;

    async fn extend(&mut self, entries: &[E]) -> Result<(), Error> {
        match self {
            Source::Sheet(sheet) => sheet.extend(entries).await,
            Source::Memory(table) => memory!(table.extend(entries).await),
        }
    }
}

#[async_trait]
impl<E> TableUpdate<E> for Source<E>
where
    E: Serialize + Clone + Send + Sync + 'static,
{
    type Error = Error;

    async fn update(&mut self, from_row: usize, entries: &[E]) -> Result<(), Error> {
        match self {
            Source::Sheet(sheet) => sheet.update(from_row, entries).await,
            Source::Memory(table) => memory!(table.update(from_row, entries).await),
        }
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> TableVersion for Source<E> {
    type Error = Error;

    async fn version(&mut self) -> Result<u64, Error> {
        match self {
            Source::Sheet(sheet) => sheet.version().await,
            Source::Memory(table) => memory!(table.version().await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_source_round_trip() {
        let mut source = Source::Memory(InMemTable::new(vec!["a".to_owned()]));
        let version = source.version().await.unwrap();

        source.extend_one(&"b".to_owned()).await.unwrap();
        source.update_one(0, &"z".to_owned()).await.unwrap();

        let rows = source.fetch().await.unwrap();
        assert_eq!(rows, vec![Some("z".to_owned()), Some("b".to_owned())]);
        assert_ne!(version, source.version().await.unwrap());
    }
}
