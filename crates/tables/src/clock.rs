use crate::{next_version, prelude::*, Rows};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::info;
use pretty_type_name::pretty_type_name;

/// Remembers the origin version for `ttl` so that every read does not cost a
/// round trip to the spreadsheet.
pub struct Clock<I> {
    inner: I,
    ttl: Duration,
    cached_version: u64,
    last_check: Option<DateTime<Utc>>,
}

impl<I> Clock<I> {
    pub fn new(inner: I, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached_version: next_version(),
            last_check: None,
        }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    /// Forget the cached version so the next check asks the origin.
    pub fn expire(&mut self) {
        self.last_check = None;
    }
}

#[async_trait]
impl<I: TableVersion + Send> TableVersion for Clock<I> {
    type Error = I::Error;

    async fn version(&mut self) -> Result<u64, Self::Error> {
        let now = Utc::now();
        let stale = self
            .last_check
            .map_or(true, |checked| now - checked >= self.ttl);

        if stale {
            info!(
                "Version ttl of the {} expired ({})",
                pretty_type_name::<I>(),
                self.ttl
            );

            self.cached_version = self.inner.version().await?;
            self.last_check = Some(now);
        }

        Ok(self.cached_version)
    }
}

#[async_trait]
impl<E: Send + 'static, I: TableFetch<E> + Send> TableFetch<E> for Clock<I> {
    type Error = I::Error;

    async fn fetch(&mut self) -> Result<Rows<E>, Self::Error> {
        self.inner.fetch().await
    }
}

#[async_trait]
impl<E: Send + Sync + 'static, I: TableExtend<E> + Send> TableExtend<E> for Clock<I> {
    type Error = I::Error;

    async fn extend(&mut self, entries: &[E]) -> Result<(), Self::Error> {
        self.inner.extend(entries).await
    }
}

#[async_trait]
impl<E: Send + Sync + 'static, I: TableUpdate<E> + Send> TableUpdate<E> for Clock<I> {
    type Error = I::Error;

    async fn update(&mut self, from_row: usize, entries: &[E]) -> Result<(), Self::Error> {
        self.inner.update(from_row, entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_mem::InMemTable;

    #[tokio::test]
    async fn version_is_cached_within_ttl() {
        let mut clock = Clock::new(InMemTable::<u8>::default(), Duration::hours(1));
        let first = clock.version().await.unwrap();

        clock.extend_one(&1).await.unwrap();
        assert_eq!(first, clock.version().await.unwrap());

        clock.expire();
        assert_ne!(first, clock.version().await.unwrap());
    }

    #[tokio::test]
    async fn zero_ttl_always_asks_origin() {
        let mut clock = Clock::new(InMemTable::<u8>::default(), Duration::zero());
        let first = clock.version().await.unwrap();

        clock.extend_one(&1).await.unwrap();
        assert_ne!(first, clock.version().await.unwrap());
    }
}
