use std::fmt;

use crate::detection::domain::detection::Detection;

use super::crowd_level::{occupancy_percentage, CrowdLevel};
use super::zone_registry::ZoneRegistry;

/// Count for one zone in one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneCount {
    pub name: String,
    pub count: usize,
    /// Copied from the zone; `None` when it has no configured capacity.
    pub capacity: Option<u32>,
}

impl ZoneCount {
    /// `None` for zones without a capacity.
    pub fn crowd_level(&self) -> Option<CrowdLevel> {
        self.capacity.map(|c| CrowdLevel::classify(self.count, c))
    }

    /// Share of capacity in use, rounded to a whole percent.
    pub fn percent_of_capacity(&self) -> Option<u32> {
        self.capacity
            .map(|c| occupancy_percentage(self.count, c).round() as u32)
    }
}

/// `"Frozen: 4"`, or `"Frozen: 4 (20% of 20, LOW)"` when the zone has a capacity.
impl fmt::Display for ZoneCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.count)?;
        if let Some(capacity) = self.capacity {
            let pct = occupancy_percentage(self.count, capacity).round();
            let level = CrowdLevel::classify(self.count, capacity);
            write!(f, " ({pct}% of {capacity}, {level})")?;
        }
        Ok(())
    }
}

/// Per-zone face counts for a single frame, in zone registration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancyReport {
    counts: Vec<ZoneCount>,
}

impl OccupancyReport {
    pub fn get(&self, zone: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|c| c.name == zone)
            .map(|c| c.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneCount> {
        self.counts.iter()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Faces counted across all zones; a face in overlapping zones counts once per zone.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }
}

/// Counts detection centers per zone.
///
/// Every zone evaluates every detection independently, so overlapping zones
/// may each count the same face. Stateless: identical inputs always yield
/// identical reports.
pub struct OccupancyCalculator;

impl OccupancyCalculator {
    pub fn compute(registry: &ZoneRegistry, detections: &[Detection]) -> OccupancyReport {
        let centers: Vec<(i32, i32)> = detections.iter().map(Detection::center).collect();
        let counts = registry
            .list()
            .iter()
            .map(|zone| {
                let bounds = zone.bounds();
                ZoneCount {
                    name: zone.name().to_string(),
                    count: centers
                        .iter()
                        .filter(|&&(cx, cy)| bounds.contains(cx, cy))
                        .count(),
                    capacity: zone.capacity(),
                }
            })
            .collect();
        OccupancyReport { counts }
    }
}
