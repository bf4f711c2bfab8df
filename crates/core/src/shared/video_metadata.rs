/// Stream properties reported by a [`VideoReader`](crate::video::domain::video_reader::VideoReader)
/// when it is opened.
///
/// `total_frames` is 0 for live sources whose length is unknown.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source: String,
}

impl VideoMetadata {
    pub fn is_live(&self) -> bool {
        self.total_frames == 0
    }
}
