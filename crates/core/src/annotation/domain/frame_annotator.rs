use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;
use crate::zones::domain::occupancy::OccupancyReport;
use crate::zones::domain::zone_registry::ZoneRegistry;

/// Annotation or emission failure. Fatal: the pipeline stops and propagates it.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render {channels}-channel {width}x{height} frame: expected an RGB buffer matching its dimensions")]
    InvalidFrame { width: u32, height: u32, channels: u8 },
    #[error("display surface failed: {0}")]
    Sink(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Everything drawn onto one frame.
pub struct Overlay<'a> {
    pub zones: &'a ZoneRegistry,
    pub report: &'a OccupancyReport,
    pub detections: &'a [Detection],
    pub timestamp: &'a str,
}

/// Draws zone outlines with their counts, detection boxes and the wall-clock
/// time onto a color frame, in that order.
pub trait FrameAnnotator: Send {
    fn annotate(&self, frame: &mut Frame, overlay: &Overlay<'_>) -> Result<(), RenderError>;
}
