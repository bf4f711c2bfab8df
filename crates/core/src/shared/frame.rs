use image::{GrayImage, RgbImage};
use ndarray::ArrayView3;

/// A single video frame: contiguous pixel bytes in row-major order.
///
/// Color frames carry 3 interleaved RGB channels; preprocessed detector input
/// carries a single intensity channel. Format conversion happens at I/O
/// boundaries only.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn from_gray_image(image: GrayImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 1, index)
    }

    /// Copies the pixels into an `RgbImage`. `None` unless the frame is
    /// 3-channel with a buffer matching its dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.channels != 3 {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_grayscale());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_from_rgb_image_keeps_pixels_and_index() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(img, 7);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.as_ndarray()[[1, 2, 1]], 20);
    }

    #[test]
    fn test_from_gray_image_is_single_channel() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([90]));
        let frame = Frame::from_gray_image(img, 0);
        assert!(frame.is_grayscale());
        assert_eq!(frame.data().len(), 16);
    }

    #[test]
    fn test_to_rgb_image_rejects_gray_frame() {
        let frame = Frame::new(vec![0u8; 4], 2, 2, 1, 0);
        assert!(frame.to_rgb_image().is_none());
    }

    #[test]
    fn test_to_rgb_image_roundtrip_dimensions() {
        let frame = Frame::new(vec![1u8; 24], 4, 2, 3, 0);
        let img = frame.to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (4, 2));
    }

    #[test]
    fn test_data_mut_allows_modification() {
        let mut frame = Frame::new(vec![0u8; 6], 2, 1, 3, 0);
        frame.data_mut()[0] = 255;
        assert_eq!(frame.as_ndarray()[[0, 0, 0]], 255);
    }
}
