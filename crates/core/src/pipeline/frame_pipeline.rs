use std::time::Instant;

use crate::annotation::domain::frame_annotator::{FrameAnnotator, Overlay, RenderError};
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::clock::Clock;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_sink::FrameSink;
use crate::video::domain::video_reader::VideoReader;
use crate::zones::domain::crowd_level::occupancy_percentage;
use crate::zones::domain::occupancy::{OccupancyCalculator, OccupancyReport};
use crate::zones::domain::zone_registry::ZoneRegistry;

use super::pipeline_logger::{capacity_metric, occupancy_metric, PipelineLogger};
use super::preprocessor::Preprocessor;
use super::stop_signal::StopSignal;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The source has no more frames.
    Exhausted,
    /// The stop signal fired after a frame was emitted.
    StopRequested,
    /// Reading or decoding a frame failed.
    AcquisitionFailed(String),
    /// Annotation or emission failed; the error was returned to the caller.
    RenderFailed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Stopped(StopReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_read: usize,
    pub frames_emitted: usize,
    pub frames_skipped: usize,
    pub stop_reason: StopReason,
}

/// Acquire, preprocess, detect, count, annotate and emit, one frame at a time.
///
/// Starts `Running` and moves to `Stopped` exactly once; a stopped pipeline
/// never reads again. A frame whose detection fails is skipped and the loop
/// continues. Render failures stop the pipeline and propagate.
pub struct FramePipeline {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    annotator: Box<dyn FrameAnnotator>,
    sink: Box<dyn FrameSink>,
    zones: ZoneRegistry,
    preprocessor: Preprocessor,
    clock: Box<dyn Clock>,
    stop: Box<dyn StopSignal>,
    logger: Box<dyn PipelineLogger>,
    state: PipelineState,
    total_frames: usize,
    frames_read: usize,
    frames_emitted: usize,
    frames_skipped: usize,
}

impl FramePipeline {
    /// `reader` must already be open on the source described by `metadata`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        metadata: &VideoMetadata,
        detector: Box<dyn FaceDetector>,
        annotator: Box<dyn FrameAnnotator>,
        sink: Box<dyn FrameSink>,
        zones: ZoneRegistry,
        preprocessor: Preprocessor,
        clock: Box<dyn Clock>,
        stop: Box<dyn StopSignal>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            detector,
            annotator,
            sink,
            zones,
            preprocessor,
            clock,
            stop,
            logger,
            state: PipelineState::Running,
            total_frames: metadata.total_frames,
            frames_read: 0,
            frames_emitted: 0,
            frames_skipped: 0,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Runs one loop iteration. No-op once stopped.
    ///
    /// Only annotation and emission failures are returned. Acquisition
    /// failures stop the pipeline and detection failures skip the frame.
    pub fn step(&mut self) -> Result<(), RenderError> {
        if self.is_stopped() {
            return Ok(());
        }

        let frame = match self.reader.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.transition(StopReason::Exhausted);
                return Ok(());
            }
            Err(e) => {
                log::warn!("Frame acquisition failed: {e}");
                self.transition(StopReason::AcquisitionFailed(e.to_string()));
                return Ok(());
            }
        };
        self.frames_read += 1;
        let index = frame.index();

        let t = Instant::now();
        let prepared = match self.preprocessor.prepare(frame) {
            Ok(prepared) => prepared,
            Err(e) => {
                log::warn!("Frame acquisition failed: {e}");
                self.transition(StopReason::AcquisitionFailed(e.to_string()));
                return Ok(());
            }
        };
        self.logger.timing("preprocess", elapsed_ms(t));

        let t = Instant::now();
        let detections = match self.detector.detect(&prepared.gray) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("Skipping frame {index}: {e}");
                self.frames_skipped += 1;
                self.finish_iteration();
                return Ok(());
            }
        };
        self.logger.timing("detect", elapsed_ms(t));
        self.logger.metric("detections", detections.len() as f64);

        let t = Instant::now();
        let report = OccupancyCalculator::compute(&self.zones, &detections);
        self.logger.timing("occupancy", elapsed_ms(t));
        self.record_occupancy(&report);

        let mut color = prepared.color;
        let timestamp = self.clock.timestamp();
        let overlay = Overlay {
            zones: &self.zones,
            report: &report,
            detections: &detections,
            timestamp: &timestamp,
        };

        let t = Instant::now();
        if let Err(e) = self.annotator.annotate(&mut color, &overlay) {
            return self.render_failed(e);
        }
        self.logger.timing("annotate", elapsed_ms(t));

        let t = Instant::now();
        if let Err(e) = self.sink.emit(&color, &report) {
            return self.render_failed(e);
        }
        self.logger.timing("emit", elapsed_ms(t));
        self.frames_emitted += 1;

        self.finish_iteration();
        Ok(())
    }

    /// Steps until stopped. Render failures are returned as errors; every
    /// other way of stopping yields a summary.
    pub fn run(&mut self) -> Result<RunSummary, RenderError> {
        while !self.is_stopped() {
            self.step()?;
        }
        self.logger.summary();

        let stop_reason = match &self.state {
            PipelineState::Stopped(reason) => reason.clone(),
            PipelineState::Running => StopReason::Exhausted,
        };
        Ok(RunSummary {
            frames_read: self.frames_read,
            frames_emitted: self.frames_emitted,
            frames_skipped: self.frames_skipped,
            stop_reason,
        })
    }

    fn is_stopped(&self) -> bool {
        matches!(self.state, PipelineState::Stopped(_))
    }

    fn record_occupancy(&mut self, report: &OccupancyReport) {
        for zone in report.iter() {
            self.logger
                .metric(&occupancy_metric(&zone.name), zone.count as f64);
            if let Some(capacity) = zone.capacity {
                self.logger.metric(
                    &capacity_metric(&zone.name),
                    occupancy_percentage(zone.count, capacity),
                );
            }
        }
    }

    /// Progress report and stop check that close every acquired frame.
    fn finish_iteration(&mut self) {
        self.logger.progress(self.frames_read, self.total_frames);
        if self.stop.should_stop() {
            self.logger.info("Stop requested");
            self.transition(StopReason::StopRequested);
        }
    }

    fn render_failed(&mut self, e: RenderError) -> Result<(), RenderError> {
        self.transition(StopReason::RenderFailed(e.to_string()));
        Err(e)
    }

    fn transition(&mut self, reason: StopReason) {
        log::debug!("Pipeline stopped: {reason:?}");
        self.reader.close();
        self.state = PipelineState::Stopped(reason);
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
