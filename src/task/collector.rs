//! Emission interface handed to capabilities

use crate::error::TaskError;
use crate::io::OutputSink;

/// Forwards pairs emitted by a capability to the run's output sink
///
/// Emissions are written through immediately; nothing is buffered between a
/// capability and the sink.
pub struct Collector<'a, K, V> {
    sink: &'a mut (dyn OutputSink<K, V> + 'a),
    emitted: u64,
}

impl<'a, K, V> Collector<'a, K, V> {
    pub fn new(sink: &'a mut (dyn OutputSink<K, V> + 'a)) -> Self {
        Self { sink, emitted: 0 }
    }

    /// Emit one output pair
    pub async fn emit(&mut self, key: K, value: V) -> Result<(), TaskError> {
        self.sink.emit(key, value).await?;
        self.emitted += 1;
        Ok(())
    }

    /// Pairs emitted through this collector
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
