pub mod column_scan;
pub mod components;
pub mod extraction;
pub mod moore;
pub mod preprocessing;
pub mod raycast;
pub mod simplification;

pub use column_scan::*;
pub use components::*;
pub use extraction::*;
pub use moore::*;
pub use preprocessing::*;
pub use raycast::*;
pub use simplification::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{config::DetectionConfig, traits::BoundaryDetector};

/// The interchangeable boundary strategies.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    VariantNames,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectorKind {
    /// Longest vertical run per sampled column; fast, convex-ish outlines.
    #[default]
    ColumnScan,
    /// Rays from the wall centroid; star-shaped outlines.
    CentroidRaycast,
    /// Moore-neighbour contour tracing; follows concave boundaries.
    MooreTrace,
    /// imageproc border following, largest outer border.
    BorderFollowing,
}

impl DetectorKind {
    pub fn build(self, config: &DetectionConfig) -> Box<dyn BoundaryDetector> {
        match self {
            Self::ColumnScan => Box::new(ColumnScanDetector {
                columns: config.columns,
                min_run_fraction: config.min_run_fraction,
            }),
            Self::CentroidRaycast => Box::new(CentroidRaycastDetector {
                rays: config.ray_count,
            }),
            Self::MooreTrace => Box::new(MooreTraceDetector {
                tolerance: config.trace_tolerance,
                max_steps: config.max_trace_steps,
            }),
            Self::BorderFollowing => Box::new(BorderFollowingDetector {
                tolerance: config.trace_tolerance,
            }),
        }
    }

    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip_through_strum() {
        for kind in DetectorKind::iter() {
            let name: &'static str = kind.into();
            assert_eq!(DetectorKind::from_str(name).unwrap(), kind);
            assert_eq!(kind.build(&DetectionConfig::default()).name(), name);
        }
        assert_eq!(DetectorKind::names().len(), 4);
    }
}
