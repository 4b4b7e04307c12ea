//! # Spindle
//!
//! Execution core for a MapReduce task: runs one phase (map, combine or
//! reduce) of a caller-supplied handler over a stream of key/value pairs and
//! forwards emitted pairs to an output sink.
//!
//! ## Usage
//!
//! ```bash
//! SPINDLE_PHASE=reduce my-task < sorted-pairs.tsv > output.tsv
//! ```
//!
//! ## Modules
//!
//! - `app` - Task configuration and logging setup
//! - `error` - Unified error type with numeric error codes
//! - `grouped` - Concurrent grouping of adjacent pairs into value sequences
//! - `io` - Pair source and output sink seams, in-memory and line-based codecs
//! - `phase` - The three task phases and phase name resolution
//! - `task` - Handler capabilities and the phase dispatcher
//! - `testing` - Fault-injecting sources and sinks for tests
pub mod app;
pub mod error;
pub mod grouped;
pub mod io;
pub mod phase;
pub mod task;

pub mod testing;

pub use error::{ErrorCode, TaskError};
pub use grouped::{GroupedStream, ValueSequence};
pub use io::{OutputSink, PairSource};
pub use phase::{resolve_phase, Phase};
pub use task::{Capability, Collector, Handler, RunSummary, TaskRunner};
