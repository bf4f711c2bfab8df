use crate::shared::config_error::ConfigError;

use super::zone::{Zone, ZoneBounds};

/// Ordered set of uniquely named zones.
///
/// Populated once at startup and read-only while the pipeline runs.
/// Iteration order is registration order, which fixes annotation order.
#[derive(Clone, Debug, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, bounds: ZoneBounds) -> Result<(), ConfigError> {
        self.register_with_capacity(name, bounds, None)
    }

    /// Registers a zone that also reports a crowd level against `capacity`.
    pub fn register_with_capacity(
        &mut self,
        name: &str,
        bounds: ZoneBounds,
        capacity: Option<u32>,
    ) -> Result<(), ConfigError> {
        if self.get(name).is_some() {
            return Err(ConfigError::DuplicateZone(name.to_string()));
        }
        if bounds.is_degenerate() {
            return Err(ConfigError::DegenerateZone {
                name: name.to_string(),
                x1: bounds.x1,
                y1: bounds.y1,
                x2: bounds.x2,
                y2: bounds.y2,
            });
        }
        if capacity == Some(0) {
            return Err(ConfigError::ZeroCapacity(name.to_string()));
        }
        self.zones.push(Zone::new(name.to_string(), bounds, capacity));
        Ok(())
    }

    pub fn list(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name() == name)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
