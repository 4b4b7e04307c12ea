//! Pair input and output seams
//!
//! The task core never deals with bytes. A [`PairSource`] yields decoded
//! `(key, value)` pairs and an [`OutputSink`] accepts emitted pairs. Concrete
//! implementations live in [`memory`] and [`lines`].

pub mod lines;
pub mod memory;

use crate::error::TaskError;
use async_trait::async_trait;

pub use lines::{LineSink, LineSource};
pub use memory::{MemorySink, VecSource};

/// A linear sequence of key/value pairs
#[async_trait]
pub trait PairSource<K, V>: Send {
    /// Read the next pair.
    ///
    /// `Ok(None)` is end of input and is not an error. `Err` is a real fault,
    /// normally a [`TaskError::Read`].
    async fn next_pair(&mut self) -> Result<Option<(K, V)>, TaskError>;
}

/// Destination for pairs emitted by handler capabilities
#[async_trait]
pub trait OutputSink<K, V>: Send {
    /// Forward one emitted pair
    async fn emit(&mut self, key: K, value: V) -> Result<(), TaskError>;

    /// Release the output. Called exactly once per run.
    async fn close(&mut self) -> Result<(), TaskError>;
}

#[async_trait]
impl<K, V, S> PairSource<K, V> for Box<S>
where
    K: Send + 'static,
    V: Send + 'static,
    S: PairSource<K, V> + ?Sized,
{
    async fn next_pair(&mut self) -> Result<Option<(K, V)>, TaskError> {
        (**self).next_pair().await
    }
}
