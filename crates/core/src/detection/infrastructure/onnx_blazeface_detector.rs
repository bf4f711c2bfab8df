/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// Fed the grayscale working frame: intensity is replicated into the three
/// model input channels, so color never influences detection.
use std::path::Path;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::{ensure_grayscale, DetectionError, FaceDetector};
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// BlazeFace detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Loads a BlazeFace ONNX model. `confidence` is the minimum score kept.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, DetectionError> {
        let session = ort::session::Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_execution_providers(preferred_execution_providers())
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;
        log::info!(
            "Loaded BlazeFace model {} (confidence >= {confidence})",
            model_path.display()
        );
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, gray: &Frame) -> Result<Vec<Detection>, DetectionError> {
        ensure_grayscale(gray)?;
        let fw = gray.width();
        let fh = gray.height();

        let input_tensor = preprocess(gray, INPUT_SIZE);

        let input_value = ort::value::Tensor::from_array(input_tensor).map_err(backend)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(backend)?;

        // regressors: [1, 896, 16] (box deltas + keypoints)
        // classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(DetectionError::Backend(format!(
                "BlazeFace model expected 2 outputs, got {}",
                outputs.len()
            )));
        }

        let regressors = outputs[0].try_extract_array::<f32>().map_err(backend)?;
        let scores = outputs[1].try_extract_array::<f32>().map_err(backend)?;
        let reg_data = regressors
            .as_slice()
            .ok_or_else(|| DetectionError::Backend("non-contiguous regressor output".into()))?;
        let score_data = scores
            .as_slice()
            .ok_or_else(|| DetectionError::Backend("non-contiguous score output".into()))?;

        let mut raw_dets = decode(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence as f32,
            fw,
            fh,
        );
        let kept = nms(&mut raw_dets, NMS_IOU_THRESH);

        Ok(kept.iter().map(|d| to_detection(d, fw, fh)).collect())
    }
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> DetectionError {
    DetectionError::ModelLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn backend(e: impl std::fmt::Display) -> DetectionError {
    DetectionError::Backend(e.to_string())
}

/// CoreML on macOS, DirectML on Windows, plain CPU elsewhere.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Nearest-neighbor resize of a single-channel frame to `size × size`,
/// normalized to [0,1] and broadcast to a 3-channel NCHW tensor.
fn preprocess(gray: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = gray.as_ndarray();
    let src_h = gray.height() as usize;
    let src_w = gray.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    if src_h == 0 || src_w == 0 {
        return tensor;
    }

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            let v = src[[src_y, src_x, 0]] as f32 / 255.0;
            for c in 0..3 {
                tensor[[0, c, y, x]] = v;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchors and decoding (BlazeFace short-range)
// ---------------------------------------------------------------------------

/// Two feature maps, 16×16 and 8×8, with 2 and 6 anchors per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

#[derive(Clone, Debug)]
struct RawDet {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    score: f64,
}

/// Decodes anchor-relative boxes above `threshold` into frame pixel corners.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    threshold: f32,
    fw: u32,
    fh: u32,
) -> Vec<RawDet> {
    let mut raw_dets = Vec::new();
    let num_anchors = anchors.len().min(NUM_ANCHORS);

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if score < threshold {
            continue;
        }

        let anchor = &anchors[i];
        let reg_offset = i * 16;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

        raw_dets.push(RawDet {
            x1: ((cx - w / 2.0) * fw as f32).max(0.0) as f64,
            y1: ((cy - h / 2.0) * fh as f32).max(0.0) as f64,
            x2: ((cx + w / 2.0) * fw as f32).min(fw as f32) as f64,
            y2: ((cy + h / 2.0) * fh as f32).min(fh as f32) as f64,
            score: score as f64,
        });
    }
    raw_dets
}

fn to_detection(d: &RawDet, fw: u32, fh: u32) -> Detection {
    // x1/y1 are already clamped to >= 0 during decoding
    let x = d.x1 as i32;
    let y = d.y1 as i32;
    let w = ((d.x2 - d.x1) as i32).min(fw as i32 - x).max(0);
    let h = ((d.y2 - d.y1) as i32).min(fh as i32 - y).max(0);
    Detection::new(x, y, w, h)
}

fn nms(dets: &mut [RawDet], iou_thresh: f64) -> Vec<RawDet> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && bbox_iou(&dets[i], &dets[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn bbox_iou(a: &RawDet, b: &RawDet) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> RawDet {
        RawDet {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    #[test]
    fn test_preprocess_shape() {
        let frame = Frame::new(vec![128u8; 200 * 100], 200, 100, 1, 0);
        let tensor = preprocess(&frame, 128);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
    }

    #[test]
    fn test_preprocess_replicates_intensity() {
        let frame = Frame::new(vec![255u8; 50 * 50], 50, 50, 1, 0);
        let tensor = preprocess(&frame, 128);
        for c in 0..3 {
            assert_relative_eq!(tensor[[0, c, 10, 10]], 1.0);
        }
    }

    #[test]
    fn test_anchor_count_and_range() {
        let anchors = generate_anchors();
        // 16×16 grid × 2 anchors + 8×8 grid × 6 anchors = 512 + 384 = 896
        assert_eq!(anchors.len(), NUM_ANCHORS);
        assert!(anchors
            .iter()
            .all(|a| a[0] > 0.0 && a[0] < 1.0 && a[1] > 0.0 && a[1] < 1.0));
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_decode_filters_low_scores() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let mut reg = vec![0.0f32; 32];
        // Anchor 0: 64x64 model pixels wide box centered on the anchor.
        reg[2] = 64.0;
        reg[3] = 64.0;
        let scores = vec![5.0, -5.0];
        let dets = decode(&reg, &scores, &anchors, 0.5, 640, 480);
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].x1, 160.0);
        assert_relative_eq!(dets[0].x2, 480.0);
        assert_relative_eq!(dets[0].y1, 120.0);
        assert_relative_eq!(dets[0].y2, 360.0);
    }

    #[test]
    fn test_nms_suppresses_overlap() {
        let mut dets = vec![
            raw(0.0, 0.0, 100.0, 100.0, 0.9),
            raw(5.0, 5.0, 105.0, 105.0, 0.7),
        ];
        let kept = nms(&mut dets, NMS_IOU_THRESH);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_nms_keeps_separate() {
        let mut dets = vec![
            raw(0.0, 0.0, 50.0, 50.0, 0.8),
            raw(200.0, 200.0, 250.0, 250.0, 0.9),
        ];
        let kept = nms(&mut dets, NMS_IOU_THRESH);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_to_detection_clamps_to_frame() {
        let d = to_detection(&raw(600.0, 400.0, 700.0, 520.0, 0.9), 640, 480);
        assert_eq!(d, Detection::new(600, 400, 40, 80));
    }
}
