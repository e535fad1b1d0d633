//! Zone allow-list and row filter thresholds.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::trip::model::{RawTripRow, ZoneId};

/// Bronx taxi zones.
pub const BRONX_ZONES: &[ZoneId] = &[
    3, 18, 20, 31, 32, 46, 47, 51, 58, 59, 60, 69, 78, 81, 94, 119, 126, 136, 147, 159, 167, 168,
    169, 174, 182, 183, 184, 185, 199, 200, 208, 212, 213, 220, 235, 240, 241, 242, 247, 248, 250,
    254, 259,
];

/// Which rows are kept during normalization.
///
/// A row is kept only when both zones are in `allowed_zones` and distance and
/// fare are strictly above their minimums.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterPolicy {
    pub allowed_zones: BTreeSet<ZoneId>,
    pub min_distance: f64,
    pub min_fare: f64,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            allowed_zones: BRONX_ZONES.iter().copied().collect(),
            min_distance: 0.1,
            min_fare: 2.5,
        }
    }
}

impl FilterPolicy {
    /// Policy with a custom allow-list and the default thresholds.
    pub fn with_zones(zones: impl IntoIterator<Item = ZoneId>) -> Self {
        Self {
            allowed_zones: zones.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn allows_zone(&self, zone: ZoneId) -> bool {
        self.allowed_zones.contains(&zone)
    }

    /// Whether a raw row passes the zone and threshold checks.
    ///
    /// NaN distances or fares never pass.
    pub fn accepts(&self, row: &RawTripRow) -> bool {
        self.allows_zone(row.pickup_zone)
            && self.allows_zone(row.dropoff_zone)
            && row.distance > self.min_distance
            && row.fare > self.min_fare
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pickup: ZoneId, dropoff: ZoneId, distance: f64, fare: f64) -> RawTripRow {
        RawTripRow {
            pickup_datetime: "2022-03-01 00:13:08".to_string(),
            dropoff_datetime: "2022-03-01 00:24:35".to_string(),
            pickup_zone: pickup,
            dropoff_zone: dropoff,
            distance,
            fare,
        }
    }

    #[test]
    fn test_default_policy_is_bronx() {
        let policy = FilterPolicy::default();
        assert_eq!(policy.allowed_zones.len(), 43);
        assert!(policy.allows_zone(3));
        assert!(policy.allows_zone(259));
        assert!(!policy.allows_zone(132));
    }

    #[test]
    fn test_zone_outside_allow_list_rejected() {
        let policy = FilterPolicy::default();
        assert!(policy.accepts(&row(3, 18, 1.0, 5.0)));
        assert!(!policy.accepts(&row(132, 18, 1.0, 5.0)));
        assert!(!policy.accepts(&row(3, 132, 1.0, 5.0)));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let policy = FilterPolicy::default();
        assert!(!policy.accepts(&row(3, 18, 0.1, 5.0)));
        assert!(!policy.accepts(&row(3, 18, 1.0, 2.5)));
        assert!(policy.accepts(&row(3, 18, 0.11, 2.51)));
    }

    #[test]
    fn test_nan_never_passes() {
        let policy = FilterPolicy::default();
        assert!(!policy.accepts(&row(3, 18, f64::NAN, 5.0)));
        assert!(!policy.accepts(&row(3, 18, 1.0, f64::NAN)));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let policy: FilterPolicy = toml::from_str("allowed_zones = [1, 2]\nmin_fare = 10.0").unwrap();
        assert_eq!(policy.allowed_zones.len(), 2);
        assert_eq!(policy.min_fare, 10.0);
        assert_eq!(policy.min_distance, 0.1);
    }
}
