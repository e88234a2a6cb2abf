// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Activity-type codes, labels, and distance-metric selection
//!
//! The bridge works in a single exercise-type code space (the native agent
//! normalizes platform identifiers into it before they reach us). Labels and
//! the per-activity distance-metric choice are static tables, with an
//! explicit `unknown` fallback for codes outside the table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform exercise-type code for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityType(pub u32);

/// Code -> label pairs, kept sorted by code for binary-search lookup.
const ACTIVITY_LABELS: &[(u32, &str)] = &[
    (0, "unknown"),
    (2, "badminton"),
    (4, "baseball"),
    (5, "basketball"),
    (8, "biking"),
    (9, "biking_stationary"),
    (10, "boot_camp"),
    (11, "boxing"),
    (13, "calisthenics"),
    (14, "cricket"),
    (16, "dancing"),
    (25, "elliptical"),
    (26, "exercise_class"),
    (27, "fencing"),
    (28, "football_american"),
    (29, "football_australian"),
    (31, "frisbee_disc"),
    (32, "golf"),
    (33, "guided_breathing"),
    (34, "gymnastics"),
    (35, "handball"),
    (36, "high_intensity_interval_training"),
    (37, "hiking"),
    (38, "ice_hockey"),
    (39, "ice_skating"),
    (44, "martial_arts"),
    (46, "paddling"),
    (47, "para_gliding"),
    (48, "pilates"),
    (50, "racquetball"),
    (51, "rock_climbing"),
    (52, "roller_hockey"),
    (53, "rowing"),
    (54, "rowing_machine"),
    (55, "rugby"),
    (56, "running"),
    (57, "running_treadmill"),
    (58, "sailing"),
    (59, "scuba_diving"),
    (60, "skating"),
    (61, "skiing"),
    (62, "snowboarding"),
    (63, "snowshoeing"),
    (64, "soccer"),
    (65, "softball"),
    (66, "squash"),
    (68, "stair_climbing"),
    (69, "stair_climbing_machine"),
    (70, "strength_training"),
    (71, "stretching"),
    (72, "surfing"),
    (73, "swimming_open_water"),
    (74, "swimming_pool"),
    (75, "table_tennis"),
    (76, "tennis"),
    (78, "volleyball"),
    (79, "walking"),
    (80, "water_polo"),
    (81, "weightlifting"),
    (82, "wheelchair"),
    (83, "yoga"),
];

impl ActivityType {
    /// Human-readable label for this code, `"unknown"` when unmapped.
    pub fn label(self) -> &'static str {
        ACTIVITY_LABELS
            .binary_search_by_key(&self.0, |&(code, _)| code)
            .map(|idx| ACTIVITY_LABELS[idx].1)
            .unwrap_or("unknown")
    }

    /// Distance metric appropriate for this activity, if one exists.
    ///
    /// Activities without a dedicated distance metric (yoga, rowing,
    /// paddling, ...) return `None` and the aggregator skips the distance
    /// sub-query entirely.
    pub fn distance_kind(self) -> Option<DistanceKind> {
        match self.0 {
            37 | 56 | 57 | 79 => Some(DistanceKind::WalkingRunning),
            8 | 9 => Some(DistanceKind::Cycling),
            73 | 74 => Some(DistanceKind::Swimming),
            82 => Some(DistanceKind::Wheelchair),
            61 | 62 => Some(DistanceKind::DownhillSnowSports),
            63 => Some(DistanceKind::CrossCountrySkiing),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Distance metric families the platform health stores distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    WalkingRunning,
    Cycling,
    Swimming,
    Wheelchair,
    DownhillSnowSports,
    CrossCountrySkiing,
}

impl DistanceKind {
    /// Stable identifier used on the agent wire and in scope names.
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceKind::WalkingRunning => "walking_running",
            DistanceKind::Cycling => "cycling",
            DistanceKind::Swimming => "swimming",
            DistanceKind::Wheelchair => "wheelchair",
            DistanceKind::DownhillSnowSports => "downhill_snow_sports",
            DistanceKind::CrossCountrySkiing => "cross_country_skiing",
        }
    }
}

/// Distance kinds available on this device, resolved once at startup from the
/// configured platform version and never re-evaluated per query.
#[derive(Debug, Clone)]
pub struct StoreCapabilities {
    distance_kinds: Vec<DistanceKind>,
}

/// Snow-sport distance metrics only exist on platform versions >= 11.2.
const SNOW_DISTANCE_MIN_VERSION: (u32, u32) = (11, 2);

impl StoreCapabilities {
    /// Build the capability set for a `major.minor` platform version string.
    /// Unparseable versions get the baseline set.
    pub fn for_platform_version(version: &str) -> Self {
        let mut distance_kinds = vec![
            DistanceKind::WalkingRunning,
            DistanceKind::Cycling,
            DistanceKind::Swimming,
            DistanceKind::Wheelchair,
        ];
        if parse_version(version).is_some_and(|v| v >= SNOW_DISTANCE_MIN_VERSION) {
            distance_kinds.push(DistanceKind::DownhillSnowSports);
            distance_kinds.push(DistanceKind::CrossCountrySkiing);
        }
        Self { distance_kinds }
    }

    pub fn supports_distance(&self, kind: DistanceKind) -> bool {
        self.distance_kinds.contains(&kind)
    }

    pub fn distance_kinds(&self) -> &[DistanceKind] {
        &self.distance_kinds
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_table_is_sorted() {
        for pair in ACTIVITY_LABELS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "table out of order at code {}", pair[1].0);
        }
    }

    #[test]
    fn test_known_labels() {
        assert_eq!(ActivityType(56).label(), "running");
        assert_eq!(ActivityType(74).label(), "swimming_pool");
        assert_eq!(ActivityType(8).label(), "biking");
        assert_eq!(ActivityType(83).label(), "yoga");
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(ActivityType(0).label(), "unknown");
        assert_eq!(ActivityType(1).label(), "unknown");
        assert_eq!(ActivityType(999).label(), "unknown");
    }

    #[test]
    fn test_distance_kind_selection() {
        assert_eq!(
            ActivityType(56).distance_kind(),
            Some(DistanceKind::WalkingRunning)
        );
        assert_eq!(ActivityType(9).distance_kind(), Some(DistanceKind::Cycling));
        assert_eq!(
            ActivityType(73).distance_kind(),
            Some(DistanceKind::Swimming)
        );
        assert_eq!(
            ActivityType(61).distance_kind(),
            Some(DistanceKind::DownhillSnowSports)
        );
        // Yoga has no distance metric at all.
        assert_eq!(ActivityType(83).distance_kind(), None);
    }

    #[test]
    fn test_capabilities_version_gate() {
        let old = StoreCapabilities::for_platform_version("10.3");
        assert!(old.supports_distance(DistanceKind::WalkingRunning));
        assert!(!old.supports_distance(DistanceKind::DownhillSnowSports));
        assert!(!old.supports_distance(DistanceKind::CrossCountrySkiing));

        let exact = StoreCapabilities::for_platform_version("11.2");
        assert!(exact.supports_distance(DistanceKind::DownhillSnowSports));

        let newer = StoreCapabilities::for_platform_version("17.4");
        assert!(newer.supports_distance(DistanceKind::CrossCountrySkiing));
    }

    #[test]
    fn test_capabilities_unparseable_version_gets_baseline() {
        let caps = StoreCapabilities::for_platform_version("garbage");
        assert_eq!(caps.distance_kinds().len(), 4);
        assert!(!caps.supports_distance(DistanceKind::DownhillSnowSports));
    }

    #[test]
    fn test_version_without_minor() {
        let caps = StoreCapabilities::for_platform_version("12");
        assert!(caps.supports_distance(DistanceKind::DownhillSnowSports));
    }
}
