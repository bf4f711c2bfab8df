use std::path::{Path, PathBuf};

use ab_glyph::FontArc;

use crate::shared::constants::SYSTEM_FONT_PATHS;

/// Loads the overlay font: the configured file if given, then the well-known
/// system locations. `None` when nothing usable is found.
pub fn load_font(configured: Option<&Path>) -> Option<FontArc> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = configured {
        candidates.push(path.to_path_buf());
    }
    candidates.extend(SYSTEM_FONT_PATHS.iter().map(PathBuf::from));
    load_first(&candidates, configured)
}

fn load_first(candidates: &[PathBuf], configured: Option<&Path>) -> Option<FontArc> {
    for path in candidates {
        let is_configured = configured == Some(path.as_path());
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                if is_configured {
                    log::warn!("Cannot read font {}: {e}", path.display());
                }
                continue;
            }
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                log::info!("Using overlay font {}", path.display());
                return Some(font);
            }
            Err(e) => log::warn!("Ignoring font {}: {e}", path.display()),
        }
    }
    None
}
