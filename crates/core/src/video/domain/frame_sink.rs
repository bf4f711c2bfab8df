use crate::annotation::domain::frame_annotator::RenderError;
use crate::shared::frame::Frame;
use crate::zones::domain::occupancy::OccupancyReport;

/// Output surface for annotated frames.
///
/// Emission failures are fatal to the pipeline: there is no point in
/// continuing when results cannot be shown.
pub trait FrameSink: Send {
    fn emit(&mut self, frame: &Frame, report: &OccupancyReport) -> Result<(), RenderError>;
}
