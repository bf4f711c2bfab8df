#[cfg(feature = "opencv-cascade")]
pub mod cascade_detector;
pub mod onnx_blazeface_detector;
