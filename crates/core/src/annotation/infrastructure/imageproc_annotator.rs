use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::frame_annotator::{FrameAnnotator, Overlay, RenderError};
use crate::shared::frame::Frame;
use crate::zones::domain::crowd_level::{occupancy_percentage, CrowdLevel};

pub const ZONE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const LABEL_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const DETECTION_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const TIMESTAMP_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const LINE_THICKNESS: i32 = 2;
const TEXT_SCALE: f32 = 18.0;
/// Gap between a zone's top edge and its label baseline.
const LABEL_OFFSET: i32 = 10;
/// Baseline origin of the timestamp.
const TIMESTAMP_ORIGIN: (i32, i32) = (10, 20);

/// Draws the occupancy overlay with `imageproc`.
///
/// Text needs a TrueType font. Without one, outlines are still drawn and
/// labels are skipped.
pub struct ImageprocAnnotator {
    font: Option<FontArc>,
    scale: PxScale,
}

impl ImageprocAnnotator {
    pub fn new(font: Option<FontArc>) -> Self {
        if font.is_none() {
            log::warn!("No overlay font available; zone labels and timestamps will not be drawn");
        }
        Self {
            font,
            scale: PxScale::from(TEXT_SCALE),
        }
    }

    /// Draws `text` with its baseline at `baseline_y`.
    fn draw_text(&self, img: &mut RgbImage, color: Rgb<u8>, x: i32, baseline_y: i32, text: &str) {
        let Some(font) = &self.font else {
            return;
        };
        let ascent = font.as_scaled(self.scale).ascent();
        let top = baseline_y - ascent.ceil() as i32;
        draw_text_mut(img, color, x, top, self.scale, font, text);
    }

    fn ascent(&self) -> f32 {
        self.font
            .as_ref()
            .map(|f| f.as_scaled(self.scale).ascent())
            .unwrap_or(0.0)
    }
}

impl FrameAnnotator for ImageprocAnnotator {
    fn annotate(&self, frame: &mut Frame, overlay: &Overlay<'_>) -> Result<(), RenderError> {
        let mut img = frame.to_rgb_image().ok_or(RenderError::InvalidFrame {
            width: frame.width(),
            height: frame.height(),
            channels: frame.channels(),
        })?;
        let max_x = img.width().saturating_sub(1) as i32;

        for zone in overlay.zones.list() {
            let b = zone.bounds();
            let (left, top) = (i64::from(b.x1), i64::from(b.y1));
            draw_box(&mut img, left, top, left + b.width(), top + b.height(), ZONE_COLOR);

            let count = overlay.report.get(zone.name()).unwrap_or(0);
            let label = zone_label(zone.name(), count, zone.capacity());
            let baseline = label_baseline(b.y1, self.ascent());
            self.draw_text(&mut img, LABEL_COLOR, b.x1.clamp(0, max_x), baseline, &label);
        }

        for d in overlay.detections {
            let (left, top) = (i64::from(d.x), i64::from(d.y));
            let (right, bottom) = (left + i64::from(d.width), top + i64::from(d.height));
            draw_box(&mut img, left, top, right, bottom, DETECTION_COLOR);
        }

        let (tx, ty) = TIMESTAMP_ORIGIN;
        let text = format!("Time: {}", overlay.timestamp);
        self.draw_text(&mut img, TIMESTAMP_COLOR, tx, ty, &text);

        frame.data_mut().copy_from_slice(img.as_raw());
        Ok(())
    }
}

/// Text drawn above a zone: `"Snacks: 3"`, plus share of capacity and crowd
/// level when the zone has a capacity, e.g. `"Snacks: 3 (15% LOW)"`.
pub fn zone_label(name: &str, count: usize, capacity: Option<u32>) -> String {
    match capacity {
        Some(capacity) => {
            let pct = occupancy_percentage(count, capacity).round();
            let level = CrowdLevel::classify(count, capacity);
            format!("{name}: {count} ({pct}% {level})")
        }
        None => format!("{name}: {count}"),
    }
}

/// Label baseline for a zone whose top edge is at `zone_top`, kept low enough
/// that the glyphs stay inside the frame.
fn label_baseline(zone_top: i32, ascent: f32) -> i32 {
    zone_top
        .saturating_sub(LABEL_OFFSET)
        .max(ascent.ceil() as i32)
}

/// Outline of `LINE_THICKNESS` pixels growing inward from the inclusive
/// corners `(left, top)` and `(right, bottom)`. Anything outside the image is
/// clipped.
fn draw_box(img: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64, color: Rgb<u8>) {
    let (max_x, max_y) = (i64::from(img.width()), i64::from(img.height()));
    for inset in 0..i64::from(LINE_THICKNESS) {
        let (l, t) = (left + inset, top + inset);
        let (r, b) = (right - inset, bottom - inset);
        if r < l || b < t {
            break;
        }
        // Pull far edges in to one pixel past the image; they stay invisible.
        let (l, t) = (l.max(-1), t.max(-1));
        let (r, b) = (r.min(max_x), b.min(max_y));
        if r < l || b < t {
            break;
        }
        let rect = Rect::at(l as i32, t as i32).of_size((r - l + 1) as u32, (b - t + 1) as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}
