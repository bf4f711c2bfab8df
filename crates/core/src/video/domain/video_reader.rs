use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    /// Local capture device by index (`/dev/video{index}` on Linux).
    Camera(u32),
    /// Video file, image sequence pattern or stream URL.
    Path(PathBuf),
}

impl VideoSource {
    /// A bare non-negative integer selects a camera; anything else is a path.
    pub fn parse(input: &str) -> Self {
        match input.parse::<u32>() {
            Ok(index) => VideoSource::Camera(index),
            Err(_) => VideoSource::Path(PathBuf::from(input)),
        }
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Camera(index) => write!(f, "camera {index}"),
            VideoSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to open {source_name}: {message}")]
    Open { source_name: String, message: String },
    #[error("reader used before open")]
    NotOpened,
    #[error("failed to decode frame: {0}")]
    Decode(String),
}

/// Sequential frame source.
///
/// No seeking: the pipeline pulls frames one at a time until the source
/// reports exhaustion with `Ok(None)`.
pub trait VideoReader: Send {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, AcquisitionError>;

    /// Next frame in decode order, or `None` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Frame>, AcquisitionError>;

    /// Releases any resources held by the reader. Idempotent.
    fn close(&mut self);
}
