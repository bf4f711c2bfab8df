pub mod clock;
pub mod config_error;
pub mod constants;
pub mod frame;
pub mod video_metadata;
