pub mod ffmpeg_reader;
pub mod log_sink;
pub mod snapshot_sink;
