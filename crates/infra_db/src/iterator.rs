//! Streaming result iteration
//!
//! [`ResultIterator`] walks a query's rows one at a time without
//! materializing the whole result. It owns a [`RowSource`]; for repositories
//! that is a [`CursorSource`], a server-side cursor declared inside a
//! read-only transaction on a connection taken from the pool.
//!
//! # Resource lifetime
//!
//! The connection stays checked out until the iterator reaches the end, hits
//! an error, or is closed. Dropping an unfinished iterator also returns the
//! connection (SQLx rolls the transaction back), but callers should drain or
//! [`close`](ResultIterator::close) it so the release is explicit.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut iter = repos.comment.find_iter(&criteria).await?;
//! while iter.next().await {
//!     let comment = iter.entity()?;
//!     tracing::debug!(comment_id = %comment.id, "comment fetched");
//! }
//! if let Some(err) = iter.err() {
//!     return Err(err.to_string().into());
//! }
//! ```

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use crate::error::DatabaseError;
use crate::query;

/// Default number of rows pulled from the cursor per round trip
pub const DEFAULT_FETCH_SIZE: u32 = 100;

/// Where an iterator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// Cursor live, no row materialized yet
    Open,
    /// A decoded row is available through `entity()`
    RowReady,
    /// All rows consumed; resources released
    Exhausted,
    /// Stopped on an error, available through `err()`; resources released
    Failed,
    /// Closed by the caller; resources released
    Closed,
}

impl fmt::Display for IteratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IteratorState::Open => "open",
            IteratorState::RowReady => "row ready",
            IteratorState::Exhausted => "exhausted",
            IteratorState::Failed => "failed",
            IteratorState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Supplies decoded rows to a [`ResultIterator`]
#[async_trait]
pub trait RowSource<E: Send>: Send {
    /// Reads up to `max` rows. Each row decodes independently so one bad row
    /// does not hide the rows before it. Fewer than `max` rows means the
    /// source is drained.
    async fn fetch(&mut self, max: u32) -> Result<Vec<Result<E, DatabaseError>>, DatabaseError>;

    /// Releases whatever the source holds. Called at most once.
    async fn release(&mut self) -> Result<(), DatabaseError>;
}

/// Server-side cursor over one query, held in its own transaction
pub struct CursorSource<E> {
    tx: Option<Transaction<'static, Postgres>>,
    cursor: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> CursorSource<E> {
    /// Begins a read-only transaction and declares the cursor
    ///
    /// `declare` must declare `cursor`, built with
    /// [`query::declare_cursor_prefix`]. No rows are read here.
    ///
    /// Cursor statements are never cached as prepared statements: the
    /// connection goes back to the pool afterwards, and a cached row
    /// description would outlive the query it was built for.
    pub async fn open(
        pool: &PgPool,
        cursor: String,
        mut declare: QueryBuilder<'_, Postgres>,
    ) -> Result<Self, DatabaseError> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        declare.build().persistent(false).execute(&mut *tx).await?;

        Ok(Self {
            tx: Some(tx),
            cursor,
            _entity: PhantomData,
        })
    }
}

#[async_trait]
impl<E> RowSource<E> for CursorSource<E>
where
    E: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send,
{
    async fn fetch(&mut self, max: u32) -> Result<Vec<Result<E, DatabaseError>>, DatabaseError> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| DatabaseError::iteration("cursor already released"))?;

        let sql = query::fetch_cursor(&self.cursor, max);
        let rows = sqlx::query(&sql)
            .persistent(false)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                E::from_row(row)
                    .map_err(|e| DatabaseError::iteration(format!("failed to decode row: {}", e)))
            })
            .collect())
    }

    async fn release(&mut self) -> Result<(), DatabaseError> {
        match self.tx.take() {
            // Commit drops the cursor and hands the connection back.
            Some(tx) => tx.commit().await.map_err(DatabaseError::from),
            None => Ok(()),
        }
    }
}

/// Lazy, single-pass cursor over a query's matching rows
///
/// `next()` returning `false` does not say *why* iteration stopped: check
/// [`err`](Self::err) after the loop.
pub struct ResultIterator<E: Send, S: RowSource<E> = CursorSource<E>> {
    source: S,
    buffer: VecDeque<Result<E, DatabaseError>>,
    current: Option<E>,
    state: IteratorState,
    error: Option<DatabaseError>,
    fetch_size: u32,
    drained: bool,
    released: bool,
    rows: u64,
    kind: &'static str,
}

impl<E: Send, S: RowSource<E>> ResultIterator<E, S> {
    pub fn new(source: S, fetch_size: u32, kind: &'static str) -> Self {
        Self {
            source,
            buffer: VecDeque::new(),
            current: None,
            state: IteratorState::Open,
            error: None,
            fetch_size: fetch_size.max(1),
            drained: false,
            released: false,
            rows: 0,
            kind,
        }
    }

    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// Rows handed out so far
    pub fn rows_read(&self) -> u64 {
        self.rows
    }

    /// Advances to the next row
    ///
    /// Returns `true` when a row is ready. Once it returns `false` it keeps
    /// returning `false`.
    pub async fn next(&mut self) -> bool {
        if !matches!(self.state, IteratorState::Open | IteratorState::RowReady) {
            return false;
        }
        self.current = None;

        if self.buffer.is_empty() && !self.drained {
            match self.source.fetch(self.fetch_size).await {
                Ok(batch) => {
                    self.drained = batch.len() < self.fetch_size as usize;
                    self.buffer.extend(batch);
                }
                Err(e) => {
                    self.fail(e).await;
                    return false;
                }
            }
        }

        match self.buffer.pop_front() {
            Some(Ok(entity)) => {
                self.current = Some(entity);
                self.state = IteratorState::RowReady;
                self.rows += 1;
                true
            }
            Some(Err(e)) => {
                self.fail(e).await;
                false
            }
            None => {
                self.state = IteratorState::Exhausted;
                debug!(entity = self.kind, rows = self.rows, "rows fetched");
                if let Err(e) = self.release().await {
                    self.error.get_or_insert(e);
                }
                false
            }
        }
    }

    /// The current row; only valid after `next()` returned `true`
    pub fn entity(&self) -> Result<&E, DatabaseError> {
        match (&self.current, self.state) {
            (Some(entity), IteratorState::RowReady) => Ok(entity),
            (_, state) => Err(DatabaseError::iteration(format!(
                "no current {} row: iterator is {}",
                self.kind, state
            ))),
        }
    }

    /// The first error hit while iterating, if any
    pub fn err(&self) -> Option<&DatabaseError> {
        self.error.as_ref()
    }

    /// Moves the recorded error out, leaving `err()` empty
    pub fn take_err(&mut self) -> Option<DatabaseError> {
        self.error.take()
    }

    /// Advances and hands out the row by value
    ///
    /// Returns `Ok(None)` at the end. An iteration error is moved out and
    /// returned once, after which `err()` no longer reports it.
    pub async fn try_next(&mut self) -> Result<Option<E>, DatabaseError>
    where
        E: Clone,
    {
        if self.next().await {
            return self.entity().map(|entity| Some(entity.clone()));
        }
        match self.take_err() {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Releases the cursor; calling it again is a no-op
    pub async fn close(&mut self) -> Result<(), DatabaseError> {
        if self.state == IteratorState::Closed {
            return Ok(());
        }
        self.state = IteratorState::Closed;
        self.current = None;
        self.buffer.clear();
        self.release().await
    }

    async fn fail(&mut self, error: DatabaseError) {
        debug!(entity = self.kind, rows = self.rows, error = %error, "iteration stopped");
        self.state = IteratorState::Failed;
        self.buffer.clear();
        self.error.get_or_insert(error);
        if let Err(e) = self.release().await {
            debug!(entity = self.kind, error = %e, "cursor release failed");
        }
    }

    async fn release(&mut self) -> Result<(), DatabaseError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.source.release().await
    }
}

impl<E: Send, S: RowSource<E>> Drop for ResultIterator<E, S> {
    fn drop(&mut self) {
        if !self.released {
            debug!(
                entity = self.kind,
                rows = self.rows,
                "result iterator dropped before release"
            );
        }
    }
}

impl<E: Send, S: RowSource<E>> fmt::Debug for ResultIterator<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultIterator")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("rows", &self.rows)
            .field("buffered", &self.buffer.len())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory source; `fail_at` injects a fetch error on that call
    struct VecSource {
        rows: VecDeque<Result<u32, DatabaseError>>,
        fetches: usize,
        fail_at: Option<usize>,
        releases: Arc<AtomicUsize>,
    }

    impl VecSource {
        fn new(rows: Vec<Result<u32, DatabaseError>>) -> (Self, Arc<AtomicUsize>) {
            let releases = Arc::new(AtomicUsize::new(0));
            let source = Self {
                rows: rows.into(),
                fetches: 0,
                fail_at: None,
                releases: releases.clone(),
            };
            (source, releases)
        }
    }

    #[async_trait]
    impl RowSource<u32> for VecSource {
        async fn fetch(&mut self, max: u32) -> Result<Vec<Result<u32, DatabaseError>>, DatabaseError> {
            self.fetches += 1;
            if self.fail_at == Some(self.fetches) {
                return Err(DatabaseError::ConnectionFailed("connection reset".into()));
            }
            let n = (max as usize).min(self.rows.len());
            Ok(self.rows.drain(..n).collect())
        }

        async fn release(&mut self) -> Result<(), DatabaseError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn ok_rows(n: u32) -> Vec<Result<u32, DatabaseError>> {
        (1..=n).map(Ok).collect()
    }

    #[tokio::test]
    async fn test_empty_source() {
        let (source, releases) = VecSource::new(vec![]);
        let mut iter = ResultIterator::new(source, 10, "test");

        assert!(!iter.next().await);
        assert!(iter.err().is_none());
        assert_eq!(iter.state(), IteratorState::Exhausted);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reads_across_batches() {
        let (source, releases) = VecSource::new(ok_rows(7));
        let mut iter = ResultIterator::new(source, 3, "test");

        let mut seen = Vec::new();
        while iter.next().await {
            seen.push(*iter.entity().unwrap());
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(iter.err().is_none());
        assert_eq!(iter.rows_read(), 7);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_is_idempotent() {
        let (source, releases) = VecSource::new(ok_rows(1));
        let mut iter = ResultIterator::new(source, 10, "test");

        assert!(iter.next().await);
        assert!(!iter.next().await);
        assert!(!iter.next().await);
        assert!(!iter.next().await);
        assert_eq!(iter.state(), IteratorState::Exhausted);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entity_outside_row_ready() {
        let (source, _) = VecSource::new(ok_rows(1));
        let mut iter = ResultIterator::new(source, 10, "test");

        let before = iter.entity().unwrap_err();
        assert!(matches!(before, DatabaseError::Iteration(_)));
        assert!(before.to_string().contains("open"));

        assert!(iter.next().await);
        assert_eq!(*iter.entity().unwrap(), 1);

        assert!(!iter.next().await);
        assert!(matches!(iter.entity(), Err(DatabaseError::Iteration(_))));
    }

    #[tokio::test]
    async fn test_decode_failure_stops_iteration() {
        let rows = vec![
            Ok(1),
            Err(DatabaseError::iteration("failed to decode row: bad column")),
            Ok(3),
        ];
        let (source, releases) = VecSource::new(rows);
        let mut iter = ResultIterator::new(source, 10, "test");

        assert!(iter.next().await);
        assert!(!iter.next().await);
        assert!(!iter.next().await);

        assert_eq!(iter.state(), IteratorState::Failed);
        assert!(matches!(iter.err(), Some(DatabaseError::Iteration(_))));
        assert!(matches!(iter.entity(), Err(DatabaseError::Iteration(_))));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let (mut source, releases) = VecSource::new(ok_rows(5));
        source.fail_at = Some(2);
        let mut iter = ResultIterator::new(source, 2, "test");

        assert!(iter.next().await);
        assert!(iter.next().await);
        assert!(!iter.next().await);

        assert!(iter.err().unwrap().is_connection_error());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_releases_once() {
        let (source, releases) = VecSource::new(ok_rows(50));
        let mut iter = ResultIterator::new(source, 10, "test");

        assert!(iter.next().await);
        iter.close().await.unwrap();
        iter.close().await.unwrap();

        assert_eq!(iter.state(), IteratorState::Closed);
        assert!(!iter.next().await);
        assert!(iter.entity().is_err());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_after_exhaustion_does_not_release_again() {
        let (source, releases) = VecSource::new(ok_rows(2));
        let mut iter = ResultIterator::new(source, 10, "test");

        while iter.next().await {}
        iter.close().await.unwrap();

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_try_next_moves_error_out() {
        let (mut source, _) = VecSource::new(ok_rows(3));
        source.fail_at = Some(1);
        let mut iter = ResultIterator::new(source, 10, "test");

        assert!(iter.try_next().await.is_err());
        assert!(iter.err().is_none());
        assert_eq!(iter.try_next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_try_next_collects_rows() {
        let (source, _) = VecSource::new(ok_rows(4));
        let mut iter = ResultIterator::new(source, 3, "test");

        let mut seen = Vec::new();
        while let Some(row) = iter.try_next().await.unwrap() {
            seen.push(row);
        }
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_exact_batch_boundary_needs_one_more_fetch() {
        let (source, releases) = VecSource::new(ok_rows(4));
        let mut iter = ResultIterator::new(source, 2, "test");

        let mut count = 0;
        while iter.next().await {
            count += 1;
        }
        assert_eq!(count, 4);
        assert!(iter.err().is_none());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
