use std::error::Error as StdError;

use log::{debug, info};
use pretty_type_name::pretty_type_name;
use tokio::time::Instant;

use crate::{in_mem::InMemTable, next_version, prelude::*};

/// In-memory mirror of an origin table.
///
/// Reads never touch the origin. Writes go to the origin first and are
/// applied to the mirror only once the origin accepted them, so a failed
/// write leaves the mirror as it was.
pub struct Cache<O, E> {
    origin: O,
    cache: InMemTable<E>,
    last_origin_version: u64,
}

impl<O, E> Cache<O, E> {
    pub fn new(origin: O) -> Self {
        Self {
            origin,
            cache: InMemTable::default(),
            last_origin_version: next_version(),
        }
    }

    pub fn read(&self) -> &InMemTable<E> {
        &self.cache
    }

    pub fn origin(&self) -> &O {
        &self.origin
    }

    pub fn mark_as_dirty(&mut self) {
        self.last_origin_version = next_version();
    }
}

impl<O, E, Err> Cache<O, E>
where
    Err: StdError + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    O: TableFetch<E, Error = Err>
        + TableExtend<E, Error = Err>
        + TableUpdate<E, Error = Err>
        + TableVersion<Error = Err>
        + Send,
{
    /// Re-reads the origin when its version moved. Returns whether the mirror
    /// was rebuilt.
    pub async fn refresh(&mut self) -> Result<bool, Err> {
        let new_version = self.origin.version().await?;
        if new_version == self.last_origin_version {
            return Ok(false);
        }

        info!(
            "Version of the origin ({}) changed from {} to {}",
            pretty_type_name::<O>(),
            self.last_origin_version,
            new_version
        );

        self.last_origin_version = new_version;
        self.rebuild().await?;
        Ok(true)
    }

    /// Re-reads the origin unconditionally.
    pub async fn reload(&mut self) -> Result<(), Err> {
        self.rebuild().await?;
        self.last_origin_version = self.origin.version().await?;
        Ok(())
    }

    async fn rebuild(&mut self) -> Result<(), Err> {
        let now = Instant::now();
        let rows = self.origin.fetch().await?;
        debug!(
            "Fetched {} rows of {} in {:?}",
            rows.len(),
            pretty_type_name::<E>(),
            now.elapsed()
        );

        self.cache.replace(rows);
        Ok(())
    }

    /// Appends entries and returns the row number of the first one.
    pub async fn extend(&mut self, entries: &[E]) -> Result<usize, Err> {
        self.origin.extend(entries).await?;
        Ok(self.cache.push(entries.iter().cloned()))
    }

    pub async fn extend_one(&mut self, entry: &E) -> Result<usize, Err> {
        self.extend(std::slice::from_ref(entry)).await
    }

    pub async fn update_one(&mut self, row: usize, entry: &E) -> Result<(), Err> {
        self.origin.update_one(row, entry).await?;
        self.cache.set(row, [entry.clone()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn memory(rows: &[u32]) -> Cache<Source<u32>, u32> {
        Cache::new(Source::Memory(rows.into()))
    }

    #[tokio::test]
    async fn refresh_pulls_origin_once() {
        let mut table = memory(&[0, 1, 2]);

        assert!(table.refresh().await.unwrap());
        assert!(!table.refresh().await.unwrap());

        let rows: Vec<_> = table.read().iter().map(|r| *r.entry).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn extend_reports_first_row() {
        let mut table = memory(&[5]);
        table.refresh().await.unwrap();

        let row = table.extend(&[6, 7]).await.unwrap();

        assert_eq!(row, 1);
        assert_eq!(table.read().get(2), Some(&7));
    }

    #[tokio::test]
    async fn reload_sees_origin_writes() {
        let mut table = memory(&[1]);
        table.refresh().await.unwrap();
        table.update_one(0, &9).await.unwrap();

        table.reload().await.unwrap();

        assert_eq!(table.read().get(0), Some(&9));
    }
}
