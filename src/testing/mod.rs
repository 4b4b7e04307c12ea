//! Testing utilities
//!
//! Fault-injecting wrappers around pair sources and output sinks, for
//! exercising the error paths of a task run.

use crate::error::{ErrorCode, TaskError};
use crate::io::{OutputSink, PairSource};
use async_trait::async_trait;

/// Pair source that reports a read fault after a fixed number of pairs
pub struct FailingSource<S> {
    inner: S,
    fail_after: usize,
    read: usize,
}

impl<S> FailingSource<S> {
    /// Yield `fail_after` pairs from `inner`, then fail every read
    pub fn new(inner: S, fail_after: usize) -> Self {
        Self {
            inner,
            fail_after,
            read: 0,
        }
    }

    /// Pairs successfully read so far
    pub fn read(&self) -> usize {
        self.read
    }
}

#[async_trait]
impl<S, K, V> PairSource<K, V> for FailingSource<S>
where
    S: PairSource<K, V>,
    K: Send + 'static,
    V: Send + 'static,
{
    async fn next_pair(&mut self) -> Result<Option<(K, V)>, TaskError> {
        if self.read >= self.fail_after {
            return Err(TaskError::read_with_code(
                ErrorCode::READ_DECODE_ERROR,
                format!("injected fault after {} pairs", self.read),
            ));
        }
        let pair = self.inner.next_pair().await?;
        if pair.is_some() {
            self.read += 1;
        }
        Ok(pair)
    }
}

/// Output sink wrapper whose emit or close can be made to fail
pub struct FailingSink<O> {
    inner: O,
    fail_emit_after: Option<usize>,
    fail_close: bool,
    emitted: usize,
    close_calls: usize,
}

impl<O> FailingSink<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            fail_emit_after: None,
            fail_close: false,
            emitted: 0,
            close_calls: 0,
        }
    }

    /// Fail every emit once `count` pairs were accepted
    pub fn fail_emit_after(mut self, count: usize) -> Self {
        self.fail_emit_after = Some(count);
        self
    }

    /// Make `close` fail
    pub fn fail_on_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

#[async_trait]
impl<O, K, V> OutputSink<K, V> for FailingSink<O>
where
    O: OutputSink<K, V>,
    K: Send + 'static,
    V: Send + 'static,
{
    async fn emit(&mut self, key: K, value: V) -> Result<(), TaskError> {
        if self.fail_emit_after.is_some_and(|limit| self.emitted >= limit) {
            return Err(TaskError::write_with_code(
                ErrorCode::WRITE_EMIT_FAILED,
                "injected emit failure",
            ));
        }
        self.inner.emit(key, value).await?;
        self.emitted += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TaskError> {
        self.close_calls += 1;
        self.inner.close().await?;
        if self.fail_close {
            return Err(TaskError::write_with_code(
                ErrorCode::WRITE_CLOSE_FAILED,
                "injected close failure",
            ));
        }
        Ok(())
    }
}
