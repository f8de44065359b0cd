//! The configurable catalog of reload intervals

use thiserror::Error;
use tracing::warn;

/// Built-in interval list used until the user configures their own, and
/// whenever a persisted list fails validation.
pub const DEFAULT_DURATIONS: [u32; 10] = [3, 10, 30, 60, 180, 300, 600, 900, 1200, 3600];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duration list is empty")]
    Empty,
    #[error("duration {0} is not a positive number of seconds")]
    NonPositive(i64),
    #[error("duration {0} is out of range")]
    OutOfRange(i64),
}

/// Ordered set of reload intervals, in seconds. Always non-empty, entries
/// always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationCatalog {
    durations: Vec<u32>,
}

impl Default for DurationCatalog {
    fn default() -> Self {
        Self {
            durations: DEFAULT_DURATIONS.to_vec(),
        }
    }
}

impl DurationCatalog {
    /// Validate a user-provided list: non-empty, all entries strictly
    /// positive seconds.
    pub fn try_new(durations: &[i64]) -> Result<Self, CatalogError> {
        if durations.is_empty() {
            return Err(CatalogError::Empty);
        }
        for &duration in durations {
            if duration <= 0 {
                return Err(CatalogError::NonPositive(duration));
            }
            if duration > i64::from(u32::MAX) {
                return Err(CatalogError::OutOfRange(duration));
            }
        }
        Ok(Self {
            durations: durations.iter().map(|&d| d as u32).collect(),
        })
    }

    /// Validate, falling back to the built-in defaults on any failure.
    pub fn validated(durations: &[i64]) -> Self {
        match Self::try_new(durations) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Invalid duration list ({}), falling back to defaults", e);
                Self::default()
            }
        }
    }

    pub fn durations(&self) -> &[u32] {
        &self.durations
    }
}
