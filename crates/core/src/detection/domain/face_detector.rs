use thiserror::Error;

use crate::shared::frame::Frame;

use super::detection::Detection;

/// Failure of a detector on one frame. The pipeline skips that frame and
/// carries on with the next.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detector expects a single-channel frame, got {channels} channels")]
    UnsupportedFormat { channels: u8 },
    #[error("failed to load detection model {path}: {message}")]
    ModelLoad { path: String, message: String },
    #[error("detector backend failed: {0}")]
    Backend(String),
}

/// Domain interface for face detection.
///
/// Receives the grayscale working-resolution frame and returns face boxes in
/// that frame's coordinates. `&mut self` lets backends reuse buffers or
/// sessions between calls; results must not depend on earlier frames.
pub trait FaceDetector: Send {
    fn detect(&mut self, gray: &Frame) -> Result<Vec<Detection>, DetectionError>;
}

/// Rejects anything other than single-channel input.
pub fn ensure_grayscale(frame: &Frame) -> Result<(), DetectionError> {
    if frame.is_grayscale() {
        Ok(())
    } else {
        Err(DetectionError::UnsupportedFormat {
            channels: frame.channels(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_grayscale_accepts_single_channel() {
        let frame = Frame::new(vec![0u8; 4], 2, 2, 1, 0);
        assert!(ensure_grayscale(&frame).is_ok());
    }

    #[test]
    fn test_ensure_grayscale_rejects_rgb() {
        let frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        let err = ensure_grayscale(&frame).unwrap_err();
        assert!(matches!(err, DetectionError::UnsupportedFormat { channels: 3 }));
        assert!(err.to_string().contains("3 channels"));
    }
}
