//! In-memory pair sources and sinks

use super::{OutputSink, PairSource};
use crate::error::TaskError;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Pair source backed by an in-memory list
#[derive(Debug, Clone, Default)]
pub struct VecSource<K, V> {
    pairs: VecDeque<(K, V)>,
}

impl<K, V> VecSource<K, V> {
    /// Create a source yielding `pairs` in order
    pub fn new(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Number of pairs not yet read
    pub fn remaining(&self) -> usize {
        self.pairs.len()
    }
}

impl<K, V> FromIterator<(K, V)> for VecSource<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[async_trait]
impl<K, V> PairSource<K, V> for VecSource<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn next_pair(&mut self) -> Result<Option<(K, V)>, TaskError> {
        Ok(self.pairs.pop_front())
    }
}

/// Output sink that records everything it receives
#[derive(Debug, Clone)]
pub struct MemorySink<K, V> {
    emitted: Vec<(K, V)>,
    close_calls: usize,
}

impl<K, V> Default for MemorySink<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemorySink<K, V> {
    pub fn new() -> Self {
        Self {
            emitted: Vec::new(),
            close_calls: 0,
        }
    }

    /// Pairs emitted so far, in emission order
    pub fn emitted(&self) -> &[(K, V)] {
        &self.emitted
    }

    /// Consume the sink and return the emitted pairs
    pub fn into_emitted(self) -> Vec<(K, V)> {
        self.emitted
    }

    /// How many times `close` was called
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls > 0
    }
}

#[async_trait]
impl<K, V> OutputSink<K, V> for MemorySink<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn emit(&mut self, key: K, value: V) -> Result<(), TaskError> {
        self.emitted.push((key, value));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TaskError> {
        self.close_calls += 1;
        Ok(())
    }
}
