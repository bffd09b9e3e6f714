//! Observation providers and the sink they write into.

use ac_context::AgentContext;

use crate::{Provider, ProviderResult};

/// Contributes a fixed-size slice of the agent's observation vector.
///
/// The collector concatenates providers in dispatch order.  Each provider's
/// slice always occupies exactly [`observation_size`](Self::observation_size)
/// slots: writing fewer values zero-pads, writing more truncates, so one
/// misbehaving provider never shifts the offsets of the ones after it.
pub trait ObservationProvider: Provider {
    fn observation_size(&self) -> usize;

    fn collect_observations(
        &mut self,
        ctx:  &AgentContext,
        sink: &mut ObservationSink,
    ) -> ProviderResult<()>;
}

/// Append-only buffer handed to one observation provider per collection.
#[derive(Debug, Default, Clone)]
pub struct ObservationSink {
    values: Vec<f32>,
}

impl ObservationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { values: Vec::with_capacity(n) }
    }

    #[inline]
    pub fn add(&mut self, value: f32) {
        self.values.push(value);
    }

    pub fn add_slice(&mut self, values: &[f32]) {
        self.values.extend_from_slice(values);
    }

    /// `1.0` for `true`, `0.0` for `false`.
    pub fn add_bool(&mut self, value: bool) {
        self.values.push(if value { 1.0 } else { 0.0 });
    }

    /// Append a one-hot encoding of `index` over `n` slots.  An out-of-range
    /// index yields all zeros.
    pub fn add_one_hot(&mut self, index: usize, n: usize) {
        self.values.extend((0..n).map(|i| if i == index { 1.0 } else { 0.0 }));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}
