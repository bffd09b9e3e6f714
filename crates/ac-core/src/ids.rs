//! Strongly typed, zero-cost identifier wrappers.
//!
//! Agent and provider identities are strings (they come from scene/asset
//! names); the integer handles here cover the opaque host-side references.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Opaque reference to the host-engine object that owns an agent.
    ///
    /// The framework never dereferences it; it is carried on the context so
    /// providers can hand it back to engine APIs.
    pub struct EntityHandle(u64);
}

typed_id! {
    /// Monotonic registration sequence number.
    ///
    /// Registries stamp every provider on insertion; it is the last tie-breaker
    /// after `(priority desc, name asc)` so ordering is total.
    pub struct ProviderSeq(u64);
}

impl ProviderSeq {
    /// The sequence number following `self`.
    #[inline]
    pub fn next(self) -> ProviderSeq {
        ProviderSeq(self.0 + 1)
    }
}
