use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::shared::frame::Frame;
use crate::video::domain::video_reader::AcquisitionError;

/// A frame at working resolution: color for annotation, gray for detection.
pub struct PreparedFrame {
    pub color: Frame,
    pub gray: Frame,
}

/// Resizes acquired frames to the working resolution and derives the
/// single-channel detector input.
pub struct Preprocessor {
    width: u32,
    height: u32,
}

impl Preprocessor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn prepare(&self, frame: Frame) -> Result<PreparedFrame, AcquisitionError> {
        let index = frame.index();
        let rgb = to_rgb(frame)?;
        let rgb = if rgb.dimensions() == (self.width, self.height) {
            rgb
        } else {
            imageops::resize(&rgb, self.width, self.height, FilterType::Triangle)
        };
        let gray: GrayImage = imageops::grayscale(&rgb);

        Ok(PreparedFrame {
            color: Frame::from_rgb_image(rgb, index),
            gray: Frame::from_gray_image(gray, index),
        })
    }
}

fn to_rgb(frame: Frame) -> Result<RgbImage, AcquisitionError> {
    let (w, h, channels) = (frame.width(), frame.height(), frame.channels());
    let malformed = || {
        AcquisitionError::Decode(format!(
            "unusable {channels}-channel {w}x{h} frame {}",
            frame.index()
        ))
    };
    let image = match channels {
        3 => RgbImage::from_raw(w, h, frame.data().to_vec()).map(DynamicImage::ImageRgb8),
        1 => GrayImage::from_raw(w, h, frame.data().to_vec()).map(DynamicImage::ImageLuma8),
        _ => None,
    };
    image.map(DynamicImage::into_rgb8).ok_or_else(malformed)
}
