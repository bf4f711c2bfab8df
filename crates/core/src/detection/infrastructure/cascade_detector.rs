use std::path::Path;

use opencv::core::{Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::{ensure_grayscale, DetectionError, FaceDetector};
use crate::shared::frame::Frame;

/// Tuning for OpenCV's multi-scale sliding-window search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeParameters {
    /// Image pyramid step; must be > 1.0.
    pub scale_factor: f64,
    /// Overlapping candidates required before a face is reported.
    pub min_neighbors: u32,
    /// Smallest face side in pixels; 0 means no lower bound.
    pub min_size: u32,
}

/// Haar/LBP cascade face detector (`haarcascade_frontalface_default.xml` and friends).
pub struct CascadeDetector {
    classifier: CascadeClassifier,
    params: CascadeParameters,
}

impl CascadeDetector {
    pub fn new(cascade_path: &Path, params: CascadeParameters) -> Result<Self, DetectionError> {
        let load_error = |message: String| DetectionError::ModelLoad {
            path: cascade_path.display().to_string(),
            message,
        };
        let path = cascade_path
            .to_str()
            .ok_or_else(|| load_error("path is not valid UTF-8".into()))?;
        let classifier = CascadeClassifier::new(path).map_err(|e| load_error(e.to_string()))?;
        if classifier.empty().map_err(|e| load_error(e.to_string()))? {
            return Err(load_error("cascade file contains no classifier".into()));
        }
        log::info!(
            "Loaded cascade {} (scale_factor={}, min_neighbors={}, min_size={})",
            cascade_path.display(),
            params.scale_factor,
            params.min_neighbors,
            params.min_size
        );
        Ok(Self { classifier, params })
    }
}

impl FaceDetector for CascadeDetector {
    fn detect(&mut self, gray: &Frame) -> Result<Vec<Detection>, DetectionError> {
        ensure_grayscale(gray)?;
        let backend = |e: opencv::Error| DetectionError::Backend(e.to_string());

        let mat = Mat::new_rows_cols_with_data(gray.height() as i32, gray.width() as i32, gray.data())
            .map_err(backend)?;
        let mut rects = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &*mat,
                &mut rects,
                self.params.scale_factor,
                self.params.min_neighbors as i32,
                0,
                min_window(self.params.min_size),
                Size::default(),
            )
            .map_err(backend)?;

        Ok(rects
            .iter()
            .map(|r| Detection::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

/// OpenCV treats an empty size as "no minimum".
fn min_window(side: u32) -> Size {
    if side == 0 {
        return Size::default();
    }
    let side = i32::try_from(side).unwrap_or(i32::MAX);
    Size::new(side, side)
}
