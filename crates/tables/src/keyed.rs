use std::{error::Error as StdError, hash::Hash};

use crate::{cache::Cache, in_mem::InMemTable, index::Index, prelude::*};

/// A cached table with a hashed lookup kept in step with every write.
pub struct Keyed<O, K, E> {
    inner: Cache<O, E>,
    by_key: Index<K, E>,
}

impl<O, K, E> Keyed<O, K, E>
where
    K: Hash + Eq + Clone,
{
    pub fn new(inner: Cache<O, E>, get_key: fn(&E) -> K) -> Self {
        let mut by_key = Index::new(get_key);
        by_key.rebuild(inner.read());
        Self { inner, by_key }
    }

    pub fn read(&self) -> &InMemTable<E> {
        self.inner.read()
    }

    pub fn get(&self, key: &K) -> Option<Row<&E>> {
        let row = self.by_key.row_of(key)?;
        self.inner.read().get(row).map(|entry| Row::new(row, entry))
    }

    pub fn get_cloned(&self, key: &K) -> Option<Row<E>>
    where
        E: Clone,
    {
        self.get(key).map(Into::into)
    }

    pub fn mark_as_dirty(&mut self) {
        self.inner.mark_as_dirty();
    }
}

impl<O, K, E, Err> Keyed<O, K, E>
where
    K: Hash + Eq + Clone,
    Err: StdError + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    O: TableFetch<E, Error = Err>
        + TableExtend<E, Error = Err>
        + TableUpdate<E, Error = Err>
        + TableVersion<Error = Err>
        + Send,
{
    pub async fn refresh(&mut self) -> Result<(), Err> {
        if self.inner.refresh().await? {
            self.by_key.rebuild(self.inner.read());
        }
        Ok(())
    }

    /// Re-reads the origin regardless of its version. Used right before a
    /// read-check-write on a row another process may have touched.
    pub async fn reload(&mut self) -> Result<(), Err> {
        self.inner.reload().await?;
        self.by_key.rebuild(self.inner.read());
        Ok(())
    }

    pub async fn extend_one(&mut self, entry: &E) -> Result<usize, Err> {
        let row = self.inner.extend_one(entry).await?;
        self.by_key.set(row, entry);
        Ok(row)
    }

    pub async fn update_one(&mut self, row: usize, entry: &E) -> Result<(), Err> {
        self.inner.update_one(row, entry).await?;
        self.by_key.set(row, entry);
        Ok(())
    }

    /// Overwrites the row holding the entry's key. Returns `None` when no row
    /// holds it.
    pub async fn update_by_key(&mut self, entry: &E) -> Result<Option<usize>, Err> {
        let Some(row) = self.by_key.row_of(&self.by_key.key_of(entry)) else {
            return Ok(None);
        };
        self.update_one(row, entry).await?;
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    #[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Account {
        id: String,
        balance: u32,
    }

    fn account(id: &str, balance: u32) -> Account {
        Account {
            id: id.to_owned(),
            balance,
        }
    }

    fn table(rows: Vec<Account>) -> Keyed<Source<Account>, String, Account> {
        Keyed::new(Cache::new(Source::Memory(rows.into())), |a: &Account| {
            a.id.clone()
        })
    }

    #[tokio::test]
    async fn lookup_after_refresh() {
        let mut accounts = table(vec![account("a", 1), account("b", 2)]);
        assert!(accounts.get(&"b".to_owned()).is_none());

        accounts.refresh().await.unwrap();

        let b = accounts.get_cloned(&"b".to_owned()).unwrap();
        assert_eq!(b.row, 1);
        assert_eq!(b.balance, 2);
    }

    #[tokio::test]
    async fn writes_keep_index_current() {
        let mut accounts = table(vec![account("a", 1)]);
        accounts.refresh().await.unwrap();

        let row = accounts.extend_one(&account("c", 3)).await.unwrap();
        assert_eq!(accounts.get(&"c".to_owned()).map(|r| r.row), Some(row));

        accounts.update_one(0, &account("z", 1)).await.unwrap();
        assert!(accounts.get(&"a".to_owned()).is_none());
        assert_eq!(accounts.get(&"z".to_owned()).map(|r| r.row), Some(0));
    }

    #[tokio::test]
    async fn update_by_key_finds_the_row() {
        let mut accounts = table(vec![account("a", 1), account("b", 2)]);
        accounts.refresh().await.unwrap();

        let row = accounts.update_by_key(&account("b", 20)).await.unwrap();
        assert_eq!(row, Some(1));
        assert_eq!(accounts.get(&"b".to_owned()).map(|r| r.balance), Some(20));

        let missing = accounts.update_by_key(&account("q", 0)).await.unwrap();
        assert_eq!(missing, None);
    }
}
