//! Sensor providers.

use std::fmt;

use ac_context::AgentContext;

use crate::{Provider, ProviderResult, SensorCache};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum SensorKind {
    Vector,
    Raycast,
    Camera,
    #[default]
    Custom,
}

/// Detail level a sensor should render at, from the sensor manager's LOD
/// policy.  Ordered from most to least detailed.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum LodLevel {
    #[default]
    High,
    Medium,
    Low,
    /// Too far away to be worth updating at all.
    Culled,
}

impl LodLevel {
    /// LOD for the `index`-th distance band; anything past the last band is
    /// culled.
    pub fn from_band(index: usize) -> LodLevel {
        match index {
            0 => LodLevel::High,
            1 => LodLevel::Medium,
            2 => LodLevel::Low,
            _ => LodLevel::Culled,
        }
    }
}

impl fmt::Display for LodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LodLevel::High   => "high",
            LodLevel::Medium => "medium",
            LodLevel::Low    => "low",
            LodLevel::Culled => "culled",
        };
        f.write_str(s)
    }
}

/// Per-update inputs the sensor manager hands to one sensor.
pub struct SensorFrame<'a> {
    /// Simulated seconds since this sensor last updated (not the frame delta).
    pub elapsed_secs: f32,
    pub lod:          LodLevel,
    /// Shared short-TTL cache for derived data.
    pub cache:        &'a mut SensorCache,
}

/// A specialised, potentially expensive sensor (camera, raycast fan).
///
/// Sensors publish their readings into the context's shared data, where
/// observation providers pick them up.  The sensor manager throttles how
/// often [`update_sensor`](Self::update_sensor) runs.
pub trait SensorProvider: Provider {
    fn sensor_kind(&self) -> SensorKind {
        SensorKind::Custom
    }

    /// Refresh readings.
    fn update_sensor(
        &mut self,
        ctx:   &mut AgentContext,
        frame: SensorFrame<'_>,
    ) -> ProviderResult<()>;
}
