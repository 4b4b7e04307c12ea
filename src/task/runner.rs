//! Phase dispatch and the read/invoke/write loop

use super::collector::Collector;
use super::handler::{Capability, Handler};
use crate::app::TaskConfig;
use crate::error::TaskError;
use crate::grouped::GroupedStream;
use crate::io::{OutputSink, PairSource};
use crate::phase::{resolve_phase, Phase};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};

/// Outcome of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub phase: Phase,
    /// Pairs read in the map phase, groups read otherwise
    pub inputs: u64,
    /// Pairs written to the output sink
    pub emitted: u64,
}

/// Runs one phase of a handler over a pair source
///
/// The loop is strictly sequential: each pair or group is fully handled,
/// emissions included, before the next one is read.
pub struct TaskRunner<K, V, OK = K, OV = V> {
    handler: Handler<K, V, OK, OV>,
}

impl<K, V, OK, OV> TaskRunner<K, V, OK, OV>
where
    K: PartialEq + Clone + Send + 'static,
    V: Send + 'static,
    OK: Send + 'static,
    OV: Send + 'static,
{
    pub fn new(handler: Handler<K, V, OK, OV>) -> Self {
        Self { handler }
    }

    /// Resolve `phase` by name, then [`run`](Self::run).
    ///
    /// An invalid name fails before the source or the sink is touched.
    pub async fn run_named<S, O>(
        &mut self,
        phase: &str,
        source: S,
        sink: &mut O,
    ) -> Result<RunSummary, TaskError>
    where
        S: PairSource<K, V> + 'static,
        O: OutputSink<OK, OV>,
    {
        let phase = resolve_phase(phase)?;
        self.run(phase, source, sink).await
    }

    /// Run the phase named by `config`
    pub async fn run_configured<S, O>(
        &mut self,
        config: &TaskConfig,
        source: S,
        sink: &mut O,
    ) -> Result<RunSummary, TaskError>
    where
        S: PairSource<K, V> + 'static,
        O: OutputSink<OK, OV>,
    {
        let phase = config.phase()?;
        self.run(phase, source, sink).await
    }

    /// Run `phase` over `source`, writing emissions to `sink`.
    ///
    /// A missing capability fails before any input is read, and the sink is
    /// left untouched. Once the loop starts, `sink.close()` is called exactly
    /// once on every exit path. A close failure is the run's error only if
    /// the loop itself succeeded.
    pub async fn run<S, O>(
        &mut self,
        phase: Phase,
        source: S,
        sink: &mut O,
    ) -> Result<RunSummary, TaskError>
    where
        S: PairSource<K, V> + 'static,
        O: OutputSink<OK, OV>,
    {
        let name = self.handler.name().to_string();
        let span = info_span!("task", %phase, handler = %name);
        let summary = self
            .run_phase(phase, &name, source, sink)
            .instrument(span)
            .await?;
        info!(
            "Finished {} for '{}': {} inputs, {} pairs emitted",
            phase, name, summary.inputs, summary.emitted
        );
        Ok(summary)
    }

    async fn run_phase<S, O>(
        &mut self,
        phase: Phase,
        name: &str,
        source: S,
        sink: &mut O,
    ) -> Result<RunSummary, TaskError>
    where
        S: PairSource<K, V> + 'static,
        O: OutputSink<OK, OV>,
    {
        let outcome = if phase.is_grouped() {
            let capability = self
                .handler
                .group_capability(phase)
                .ok_or_else(|| TaskError::missing_capability(phase, name))?;
            debug!("Running {} over grouped pairs", phase);
            let mut groups = GroupedStream::new(source);
            drive(phase, name, &mut groups, &mut **capability, &mut *sink).await
        } else {
            let capability = self
                .handler
                .map_capability()
                .ok_or_else(|| TaskError::missing_capability(phase, name))?;
            debug!("Running map over raw pairs");
            let mut pairs = source;
            drive(phase, name, &mut pairs, &mut **capability, &mut *sink).await
        };

        finish::<_, OK, OV>(sink, outcome).await
    }
}

/// Read inputs and invoke `capability` on each until the input ends or fails
async fn drive<K, I, OK, OV, P, C>(
    phase: Phase,
    handler: &str,
    input: &mut P,
    capability: &mut C,
    sink: &mut dyn OutputSink<OK, OV>,
) -> Result<RunSummary, TaskError>
where
    P: PairSource<K, I> + ?Sized,
    C: Capability<K, I, OK, OV> + ?Sized,
{
    let mut collector = Collector::new(sink);
    let mut inputs = 0u64;

    loop {
        let (key, item) = match input.next_pair().await {
            Ok(Some(pair)) => pair,
            Ok(None) => break,
            Err(err) => {
                warn!("Read error: {}", err);
                return Err(err);
            }
        };
        inputs += 1;

        capability
            .invoke(key, item, &mut collector)
            .await
            .map_err(|err| capability_error(phase, handler, err))?;
    }

    Ok(RunSummary {
        phase,
        inputs,
        emitted: collector.emitted(),
    })
}

/// Close the sink and settle which error, if any, the run reports
async fn finish<O, OK, OV>(
    sink: &mut O,
    outcome: Result<RunSummary, TaskError>,
) -> Result<RunSummary, TaskError>
where
    O: OutputSink<OK, OV> + ?Sized,
{
    let closed = sink.close().await;
    match (outcome, closed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!("Ignoring output close failure after earlier error: {}", close_err);
            Err(err)
        }
    }
}

/// Errors raised by the crate inside a capability keep their identity
fn capability_error(phase: Phase, handler: &str, err: anyhow::Error) -> TaskError {
    match err.downcast::<TaskError>() {
        Ok(task_err) => task_err,
        Err(err) => TaskError::handler(phase, handler, err),
    }
}
