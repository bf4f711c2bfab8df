pub mod crowd_level;
pub mod occupancy;
pub mod zone;
pub mod zone_registry;
