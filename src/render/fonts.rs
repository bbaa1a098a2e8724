//! Font registration for the `ab_glyph` text path, which does not discover
//! system fonts on its own.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};

/// Environment variable naming a TTF/OTF file to draw text with.
pub const FONT_ENV: &str = "QPLOT_FONT";

const CANDIDATES: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<bool> = OnceLock::new();

fn candidates() -> Vec<PathBuf> {
    std::env::var_os(FONT_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain(CANDIDATES.iter().map(PathBuf::from))
        .collect()
}

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    // plotters keeps the font for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match plotters::style::register_font("sans-serif", plotters::style::FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!("registered font {}", path.display());
            true
        }
        Err(_) => false,
    }
}

/// Register a sans-serif font once per process. Returns whether text can be
/// drawn; without a font, images are rendered without text.
pub fn ensure_fonts_registered() -> bool {
    *REGISTERED.get_or_init(|| {
        let found = candidates().iter().any(|p| try_register(p));
        if !found {
            warn!("no usable font found; set {FONT_ENV} to a .ttf file to render text");
        }
        found
    })
}
