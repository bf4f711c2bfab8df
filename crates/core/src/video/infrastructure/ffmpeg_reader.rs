use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::{AcquisitionError, VideoReader, VideoSource};

#[cfg(target_os = "linux")]
const CAMERA_INPUT_FORMAT: &str = "video4linux2";
#[cfg(target_os = "macos")]
const CAMERA_INPUT_FORMAT: &str = "avfoundation";

/// Decodes frames from files, streams or capture devices via ffmpeg-next.
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`] with
/// a sequential index starting at 0.
pub struct FfmpegReader {
    state: Option<DecodeState>,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, AcquisitionError> {
        let open_err = |message: String| AcquisitionError::Open {
            source_name: source.to_string(),
            message,
        };

        ffmpeg_next::init().map_err(|e| open_err(e.to_string()))?;
        let ictx = open_input(source).map_err(open_err)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| open_err("no video stream found".into()))?;

        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_err(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| open_err(e.to_string()))?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| open_err(e.to_string()))?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: source.to_string(),
        };

        log::info!(
            "Opened {source}: {width}x{height} @ {fps:.1} fps ({})",
            metadata.codec
        );

        self.state = Some(DecodeState {
            ictx,
            decoder,
            scaler,
            width,
            height,
            stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        });
        Ok(metadata)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, AcquisitionError> {
        match self.state.as_mut() {
            Some(state) => state.next_frame(),
            None => Err(AcquisitionError::NotOpened),
        }
    }

    fn close(&mut self) {
        self.state = None;
    }
}

fn open_input(source: &VideoSource) -> Result<ffmpeg_next::format::context::Input, String> {
    match source {
        VideoSource::Path(path) => ffmpeg_next::format::input(path).map_err(|e| e.to_string()),
        VideoSource::Camera(index) => open_camera(*index),
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn open_camera(index: u32) -> Result<ffmpeg_next::format::context::Input, String> {
    ffmpeg_next::device::register_all();
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == CAMERA_INPUT_FORMAT)
        .ok_or_else(|| format!("ffmpeg was built without the {CAMERA_INPUT_FORMAT} device"))?;

    #[cfg(target_os = "linux")]
    let device = format!("/dev/video{index}");
    #[cfg(target_os = "macos")]
    let device = index.to_string();

    let ctx = ffmpeg_next::format::open(&device, &ffmpeg_next::format::Format::Input(format))
        .map_err(|e| e.to_string())?;
    Ok(ctx.input())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn open_camera(index: u32) -> Result<ffmpeg_next::format::context::Input, String> {
    Err(format!(
        "camera {index}: capture devices are not supported on this platform; pass a file or stream URL"
    ))
}

/// Decoder state for one opened source.
struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl DecodeState {
    fn next_frame(&mut self) -> Result<Option<Frame>, AcquisitionError> {
        if self.done {
            return Ok(None);
        }

        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }

            if self.flushing {
                self.done = true;
                return Ok(None);
            }

            match self.ictx.packets().next() {
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Dropping undecodable packet: {e}");
                    }
                }
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, AcquisitionError> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| AcquisitionError::Decode(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is dropped.
fn extract_rgb_pixels(rgb_frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
