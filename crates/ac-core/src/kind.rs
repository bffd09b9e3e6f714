//! The seven capability kinds a provider can implement.

use std::fmt;

/// Which registry a provider belongs to.
///
/// Used to address providers in deferred requests and side-channel commands,
/// and as a structured logging field.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProviderKind {
    Observation,
    Action,
    Reward,
    Episode,
    Sensor,
    Decision,
    Statistics,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 7] = [
        ProviderKind::Observation,
        ProviderKind::Action,
        ProviderKind::Reward,
        ProviderKind::Episode,
        ProviderKind::Sensor,
        ProviderKind::Decision,
        ProviderKind::Statistics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Observation => "observation",
            ProviderKind::Action      => "action",
            ProviderKind::Reward      => "reward",
            ProviderKind::Episode     => "episode",
            ProviderKind::Sensor      => "sensor",
            ProviderKind::Decision    => "decision",
            ProviderKind::Statistics  => "statistics",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
