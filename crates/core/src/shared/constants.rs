/// Frames are resized to this resolution before detection and annotation.
pub const DEFAULT_WORKING_WIDTH: u32 = 640;
pub const DEFAULT_WORKING_HEIGHT: u32 = 480;

/// Haar cascade pyramid step and neighbor threshold.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_NEIGHBORS: u32 = 5;
/// Smallest face side (pixels) the cascade will report. 0 leaves the search
/// unbounded, so the cascade's own training window sets the floor.
pub const DEFAULT_MIN_FACE_SIZE: u32 = 0;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Store layout used when no configuration file is supplied: `(name, x1, y1, x2, y2)`.
pub const DEFAULT_ZONES: &[(&str, i32, i32, i32, i32)] = &[
    ("Zone A - Snacks", 50, 50, 300, 300),
    ("Zone B - Checkout", 320, 50, 600, 300),
    ("Zone C - Frozen", 50, 320, 600, 480),
];

pub const CONFIG_DIR_NAME: &str = "crowd-zones";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Operator key that ends a live session.
pub const QUIT_KEY: char = 'q';

/// TrueType fonts tried in order when no font path is configured.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
