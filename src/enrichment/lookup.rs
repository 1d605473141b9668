use std::time::Duration;

use async_trait::async_trait;

use crate::error::LookupError;

/// Routing mode requested from the directions service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TravelMode {
    /// Public transit only.
    #[default]
    Transit,
    Driving,
    Walking,
    Bicycling,
}

impl TravelMode {
    /// Wire name used by the directions API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transit => "transit",
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Bicycling => "bicycling",
        }
    }
}

/// One-way travel-duration lookup between two free-text addresses.
///
/// Implementations are treated as unreliable: every error is recovered by the caller.
#[async_trait]
pub trait TransitLookup: Send + Sync {
    async fn duration(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<Duration, LookupError>;
}
