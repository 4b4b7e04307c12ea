//! Task execution
//!
//! A task runs one [`Phase`](crate::phase::Phase) of a [`Handler`]:
//!
//! ```text
//! PairSource ─┬──────────────────────────┬─> capability ─> Collector ─> OutputSink
//!             └─> GroupedStream (combine, reduce)
//! ```
//!
//! Map receives every raw pair. Combine and reduce receive one
//! `(key, ValueSequence)` per run of adjacent equal keys.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use spindle::grouped::ValueSequence;
//! use spindle::io::{MemorySink, VecSource};
//! use spindle::task::{Capability, Collector, Handler, TaskRunner};
//!
//! struct Sum;
//!
//! #[async_trait]
//! impl Capability<String, ValueSequence<u64>, String, u64> for Sum {
//!     async fn invoke(
//!         &mut self,
//!         key: String,
//!         mut values: ValueSequence<u64>,
//!         out: &mut Collector<'_, String, u64>,
//!     ) -> anyhow::Result<()> {
//!         let mut total = 0;
//!         while let Some(v) = values.next_value().await {
//!             total += v;
//!         }
//!         out.emit(key, total).await?;
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let source = VecSource::new(vec![("a".to_string(), 1), ("a".to_string(), 2)]);
//! let mut sink = MemorySink::new();
//! let mut runner = TaskRunner::new(Handler::new("sum").with_reduce(Sum));
//! runner.run_named("reduce", source, &mut sink).await.unwrap();
//! assert_eq!(sink.emitted(), &[("a".to_string(), 3)]);
//! # });
//! ```

pub mod collector;
pub mod handler;
pub mod runner;

pub use collector::Collector;
pub use handler::{Capability, GroupCapability, Handler, MapCapability};
pub use runner::{RunSummary, TaskRunner};
