use std::collections::HashMap;
use std::time::Instant;

use crate::zones::domain::crowd_level::CrowdLevel;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Keeps the frame loop free of output concerns so callers decide how
/// progress, stage timings and per-zone counts are surfaced.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 for live sources.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named pipeline stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. detection count, zone occupancy).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Metric name under which a zone's per-frame count is recorded.
pub fn occupancy_metric(zone: &str) -> String {
    format!("{OCCUPANCY_PREFIX}{zone}")
}

/// Metric name under which a zone's count as a percentage of its capacity is
/// recorded. Only zones with a capacity report it.
pub fn capacity_metric(zone: &str) -> String {
    format!("{CAPACITY_PREFIX}{zone}")
}

const OCCUPANCY_PREFIX: &str = "occupancy:";
const CAPACITY_PREFIX: &str = "capacity:";

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Terminal logger: tracks per-stage timing and metrics, reports the latest
/// zone counts every `throttle_frames` frames and prints a summary at the end.
pub struct CliPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    /// Zone names in first-seen order, for stable progress lines.
    zones: Vec<String>,
    start_time: Instant,
    frames: usize,
    messages: Vec<String>,
}

impl CliPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            zones: Vec::new(),
            start_time: Instant::now(),
            frames: 0,
            messages: Vec::new(),
        }
    }

    /// Most recent count of every zone seen so far, e.g. `"A=2 B=0"`.
    /// Zones with a capacity add their share and crowd level:
    /// `"A=2 (40% MEDIUM) B=0"`.
    pub fn latest_counts(&self) -> String {
        self.zones
            .iter()
            .filter_map(|zone| {
                let count = self.latest(&occupancy_metric(zone))?;
                Some(match self.latest(&capacity_metric(zone)) {
                    Some(pct) => format!(
                        "{zone}={count:.0} ({:.0}% {})",
                        pct.round(),
                        CrowdLevel::from_percentage(pct)
                    ),
                    None => format!("{zone}={count:.0}"),
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn latest(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric)?.last().copied()
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Run summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let peak = values.iter().copied().fold(0.0, f64::max);
            lines.push(format!("  {name}: avg {:.1}  peak {peak:.0}", mean(values)));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for CliPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for CliPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = current;
        let due = current % self.throttle_frames == 0 || (total > 0 && current == total);
        if !due {
            return;
        }
        let counts = self.latest_counts();
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processed {current}/{total} frames ({pct:.1}%) {counts}");
        } else {
            log::info!("Processed {current} frames {counts}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        if let Some(zone) = name.strip_prefix(OCCUPANCY_PREFIX) {
            if !self.zones.iter().any(|z| z == zone) {
                self.zones.push(zone.to_string());
            }
        }
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("detections", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = CliPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("annotate", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect.len(), 2);
        assert_relative_eq!(detect[0], 20.0);
        assert_relative_eq!(detect[1], 30.0);
        assert_eq!(logger.timings_for("annotate").unwrap().len(), 1);
    }

    #[test]
    fn test_occupancy_metric_name() {
        assert_eq!(occupancy_metric("Zone A - Snacks"), "occupancy:Zone A - Snacks");
    }

    #[test]
    fn test_latest_counts_in_first_seen_order() {
        let mut logger = CliPipelineLogger::new(10);
        logger.metric(&occupancy_metric("Snacks"), 1.0);
        logger.metric(&occupancy_metric("Checkout"), 0.0);
        logger.metric("detections", 1.0);
        logger.metric(&occupancy_metric("Snacks"), 3.0);
        logger.metric(&occupancy_metric("Checkout"), 2.0);

        assert_eq!(logger.latest_counts(), "Snacks=3 Checkout=2");
    }

    #[test]
    fn test_latest_counts_with_crowd_level() {
        let mut logger = CliPipelineLogger::new(10);
        logger.metric(&occupancy_metric("Frozen"), 3.0);
        logger.metric(&capacity_metric("Frozen"), 15.0);
        logger.metric(&occupancy_metric("Aisle"), 1.0);
        logger.metric(&occupancy_metric("Frozen"), 18.0);
        logger.metric(&capacity_metric("Frozen"), 90.0);

        assert_eq!(logger.latest_counts(), "Frozen=18 (90% CRITICAL) Aisle=1");
    }

    #[test]
    fn test_capacity_metric_name() {
        assert_eq!(capacity_metric("Frozen"), "capacity:Frozen");
    }

    #[test]
    fn test_summary_includes_timing_and_metrics() {
        let mut logger = CliPipelineLogger::new(10);
        logger.progress(2, 0);
        logger.timing("detect", 20.0);
        logger.timing("emit", 1.0);
        logger.metric("detections", 3.0);
        logger.metric("detections", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Run summary (2 frames"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("emit"));
        assert!(summary.contains("detections: avg 3.5  peak 4"));
    }

    #[test]
    fn test_summary_includes_fps() {
        let mut logger = CliPipelineLogger::new(10);
        logger.progress(100, 100);
        logger.timing("detect", 10.0);
        std::thread::sleep(std::time::Duration::from_millis(2));

        assert!(logger.summary_string().unwrap().contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(CliPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_frames_for_live_source() {
        let mut logger = CliPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i, 0);
        }
        assert_eq!(logger.frames, 25);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = CliPipelineLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let logger = CliPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }
}
