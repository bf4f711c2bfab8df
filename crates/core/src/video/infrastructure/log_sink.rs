use crate::annotation::domain::frame_annotator::RenderError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_sink::FrameSink;
use crate::zones::domain::occupancy::OccupancyReport;

/// Headless sink: discards pixels and logs each frame's counts at debug level.
#[derive(Default)]
pub struct LogSink {
    emitted: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

/// `"Zone A: 2, Zone B: 0"`, in report order. Zones with a capacity also
/// show their share of it and crowd level.
pub fn format_counts(report: &OccupancyReport) -> String {
    report
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FrameSink for LogSink {
    fn emit(&mut self, frame: &Frame, report: &OccupancyReport) -> Result<(), RenderError> {
        self.emitted += 1;
        log::debug!("frame {}: {}", frame.index(), format_counts(report));
        Ok(())
    }
}
