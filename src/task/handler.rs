//! Handler capabilities
//!
//! A [`Handler`] is a closed record of three optional capability slots, one
//! per phase. A handler only needs the capability for the phase it runs in;
//! the runner rejects a run whose slot is empty before reading any input.

use super::collector::Collector;
use crate::grouped::ValueSequence;
use crate::phase::Phase;
use async_trait::async_trait;
use std::fmt;

/// One phase operation of a handler
///
/// `I` is the input shape: a raw value for map, a [`ValueSequence`] for
/// combine and reduce. Group capabilities must drain or drop the sequence
/// before returning.
#[async_trait]
pub trait Capability<K, I, OK, OV>: Send {
    async fn invoke(
        &mut self,
        key: K,
        input: I,
        out: &mut Collector<'_, OK, OV>,
    ) -> anyhow::Result<()>;
}

/// Map capability: one raw pair per call
pub type MapCapability<K, V, OK, OV> = Box<dyn Capability<K, V, OK, OV>>;

/// Combine or reduce capability: one group per call
pub type GroupCapability<K, V, OK, OV> = Box<dyn Capability<K, ValueSequence<V>, OK, OV>>;

/// Capabilities supplied by the caller, by phase
pub struct Handler<K, V, OK = K, OV = V> {
    name: String,
    on_map: Option<MapCapability<K, V, OK, OV>>,
    on_combine: Option<GroupCapability<K, V, OK, OV>>,
    on_reduce: Option<GroupCapability<K, V, OK, OV>>,
}

impl<K, V, OK, OV> Handler<K, V, OK, OV> {
    /// Create a handler with no capabilities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_map: None,
            on_combine: None,
            on_reduce: None,
        }
    }

    pub fn with_map(mut self, capability: impl Capability<K, V, OK, OV> + 'static) -> Self {
        self.on_map = Some(Box::new(capability));
        self
    }

    pub fn with_combine(
        mut self,
        capability: impl Capability<K, ValueSequence<V>, OK, OV> + 'static,
    ) -> Self {
        self.on_combine = Some(Box::new(capability));
        self
    }

    pub fn with_reduce(
        mut self,
        capability: impl Capability<K, ValueSequence<V>, OK, OV> + 'static,
    ) -> Self {
        self.on_reduce = Some(Box::new(capability));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the slot for `phase` is filled
    pub fn supports(&self, phase: Phase) -> bool {
        match phase {
            Phase::Map => self.on_map.is_some(),
            Phase::Combine => self.on_combine.is_some(),
            Phase::Reduce => self.on_reduce.is_some(),
        }
    }

    /// Phases this handler can run
    pub fn phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|phase| self.supports(*phase))
            .collect()
    }

    pub(crate) fn map_capability(&mut self) -> Option<&mut MapCapability<K, V, OK, OV>> {
        self.on_map.as_mut()
    }

    /// Slot for a grouped phase. `None` for map.
    pub(crate) fn group_capability(
        &mut self,
        phase: Phase,
    ) -> Option<&mut GroupCapability<K, V, OK, OV>> {
        match phase {
            Phase::Map => None,
            Phase::Combine => self.on_combine.as_mut(),
            Phase::Reduce => self.on_reduce.as_mut(),
        }
    }
}

impl<K, V, OK, OV> fmt::Debug for Handler<K, V, OK, OV> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("phases", &self.phases())
            .finish()
    }
}

impl<K, V, OK, OV> fmt::Display for Handler<K, V, OK, OV> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
