use std::path::{Path, PathBuf};

use crate::annotation::domain::frame_annotator::RenderError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_sink::FrameSink;
use crate::zones::domain::occupancy::OccupancyReport;

/// Keeps a single image file updated with the latest annotated frame.
///
/// Each frame is written beside the target and renamed over it, so an image
/// viewer or dashboard polling the file never reads a half-written image.
/// The encoding follows the target's extension.
pub struct SnapshotSink {
    path: PathBuf,
    staging_path: PathBuf,
}

impl SnapshotSink {
    pub fn new(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.jpg".to_string());
        let staging_path = path.with_file_name(format!(".{file_name}.partial"));
        Self {
            path: path.to_path_buf(),
            staging_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for SnapshotSink {
    fn emit(&mut self, frame: &Frame, _report: &OccupancyReport) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let img = frame.to_rgb_image().ok_or(RenderError::InvalidFrame {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
        })?;

        let format = image::ImageFormat::from_path(&self.path)?;
        img.save_with_format(&self.staging_path, format)?;
        std::fs::rename(&self.staging_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: u8, index: usize) -> Frame {
        Frame::new(vec![value; 40 * 30 * 3], 40, 30, 3, index)
    }

    #[test]
    fn test_emit_writes_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.png");
        let mut sink = SnapshotSink::new(&path);

        sink.emit(&frame(200, 0), &OccupancyReport::default()).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (40, 30));
        assert_eq!(img.get_pixel(0, 0).0, [200, 200, 200]);
    }

    #[test]
    fn test_emit_overwrites_previous_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.png");
        let mut sink = SnapshotSink::new(&path);

        sink.emit(&frame(10, 0), &OccupancyReport::default()).unwrap();
        sink.emit(&frame(90, 1), &OccupancyReport::default()).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(5, 5).0, [90, 90, 90]);
        assert!(!sink.staging_path.exists());
    }

    #[test]
    fn test_emit_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("live.png");
        let mut sink = SnapshotSink::new(&path);
        sink.emit(&frame(1, 0), &OccupancyReport::default()).unwrap();
        assert!(sink.path().exists());
    }

    #[test]
    fn test_gray_frame_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SnapshotSink::new(&dir.path().join("live.png"));
        let gray = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        let err = sink.emit(&gray, &OccupancyReport::default()).unwrap_err();
        assert!(matches!(err, RenderError::InvalidFrame { channels: 1, .. }));
    }

    #[test]
    fn test_unknown_extension_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SnapshotSink::new(&dir.path().join("live.unknown"));
        assert!(sink
            .emit(&frame(1, 0), &OccupancyReport::default())
            .is_err());
    }
}
