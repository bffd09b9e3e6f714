//! Statistics providers.

use std::collections::BTreeMap;

use ac_context::AgentContext;

use crate::{Provider, ProviderResult};

/// Reports numeric telemetry as metric-name → value.
pub trait StatisticsProvider: Provider {
    fn collect_statistics(&mut self, ctx: &AgentContext) -> ProviderResult<BTreeMap<String, f32>>;
}
