use std::convert::Infallible;

use async_trait::async_trait;

use crate::{next_version, prelude::*, Rows};

/// Rows held in memory. Serves as the mirror inside a cache and as a
/// stand-alone origin when no spreadsheet is configured.
#[derive(Debug)]
pub struct InMemTable<E> {
    rows: Rows<E>,
    version: u64,
}

impl<E> Default for InMemTable<E> {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl<E> InMemTable<E> {
    pub fn new(entries: Vec<E>) -> Self {
        Self::from_rows(entries.into_iter().map(Some).collect())
    }

    pub fn from_rows(rows: Rows<E>) -> Self {
        Self {
            rows,
            version: next_version(),
        }
    }

    /// Number of rows including holes.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Option::is_none)
    }

    pub fn get(&self, row: usize) -> Option<&E> {
        self.rows.get(row).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<&E>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(row, entry)| entry.as_ref().map(|e| Row::new(row, e)))
    }

    pub fn find<P>(&self, mut predicate: P) -> Option<Row<&E>>
    where
        P: FnMut(&E) -> bool,
    {
        self.iter().find(|row| predicate(row.entry))
    }

    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = Row<&'a E>> + 'a
    where
        P: FnMut(&E) -> bool + 'a,
    {
        self.iter().filter(move |row| predicate(row.entry))
    }

    pub fn replace(&mut self, rows: Rows<E>) {
        self.rows = rows;
        self.version = next_version();
    }

    pub fn push(&mut self, entries: impl IntoIterator<Item = E>) -> usize {
        let first = self.rows.len();
        self.rows.extend(entries.into_iter().map(Some));
        self.version = next_version();
        first
    }

    pub fn set(&mut self, from_row: usize, entries: impl IntoIterator<Item = E>) {
        for (offset, entry) in entries.into_iter().enumerate() {
            let row = from_row + offset;
            if row >= self.rows.len() {
                self.rows.resize_with(row + 1, || None);
            }
            self.rows[row] = Some(entry);
        }
        self.version = next_version();
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> TableFetch<E> for InMemTable<E> {
    type Error = Infallible;

    async fn fetch(&mut self) -> Result<Rows<E>, Self::Error> {
        Ok(self.rows.clone())
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> TableExtend<E> for InMemTable<E> {
    type Error = Infallible;

    async fn extend(&mut self, entries: &[E]) -> Result<(), Self::Error> {
        self.push(entries.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> TableUpdate<E> for InMemTable<E> {
    type Error = Infallible;

    async fn update(&mut self, from_row: usize, entries: &[E]) -> Result<(), Self::Error> {
        self.set(from_row, entries.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl<E: Send> TableClear for InMemTable<E> {
    type Error = Infallible;

    async fn clear(&mut self) -> Result<(), Self::Error> {
        self.rows.clear();
        self.version = next_version();
        Ok(())
    }
}

#[async_trait]
impl<E: Send> TableVersion for InMemTable<E> {
    type Error = Infallible;

    async fn version(&mut self) -> Result<u64, Self::Error> {
        Ok(self.version)
    }
}

impl<E: Clone, C: AsRef<[E]>> From<C> for InMemTable<E> {
    fn from(entries: C) -> Self {
        Self::new(entries.as_ref().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_keeps_version() {
        let mut table: InMemTable<u32> = [1, 2, 3].into();
        let version = table.version().await.unwrap();
        let rows = table.fetch().await.unwrap();

        assert_eq!(rows, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(version, table.version().await.unwrap());
    }

    #[tokio::test]
    async fn extend_appends_after_holes() {
        let mut table = InMemTable::from_rows(vec![Some(1), None]);
        let version = table.version().await.unwrap();

        table.extend(&[7, 8]).await.unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get(2), Some(&7));
        assert_eq!(table.get(1), None);
        assert_ne!(version, table.version().await.unwrap());
    }

    #[tokio::test]
    async fn update_grows_table() {
        let mut table: InMemTable<usize> = InMemTable::default();

        table.update_one(2, &5).await.unwrap();

        let rows: Vec<_> = table.iter().map(|r| (r.row, *r.entry)).collect();
        assert_eq!(rows, vec![(2, 5)]);
    }

    #[test]
    fn find_reports_row_number() {
        let table = InMemTable::from_rows(vec![None, Some("a"), Some("b")]);

        let found = table.find(|e| *e == "b").unwrap();
        assert_eq!(found.row, 2);
        assert_eq!(table.filter(|e| e.len() == 1).count(), 2);
    }
}
