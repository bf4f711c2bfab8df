pub mod annotation;
pub mod config;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod video;
pub mod zones;
