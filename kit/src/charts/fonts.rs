use plotters::style::{register_font, FontStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Environment variable naming a TrueType font to use for figure text.
pub const FONT_ENV: &str = "SCRIPT_KIT_FONT";

pub(crate) const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static TEXT_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Register a font for figure text. Only the first call has an effect.
///
/// `preferred` is tried first, then `$SCRIPT_KIT_FONT`, then common system
/// locations. Returns whether text can be drawn; without a font figures are
/// rendered without captions and labels.
pub fn init_fonts(preferred: Option<&Path>) -> bool {
    *TEXT_AVAILABLE.get_or_init(|| {
        let mut candidates: Vec<PathBuf> = Vec::new();
        candidates.extend(preferred.map(Path::to_path_buf));
        candidates.extend(std::env::var_os(FONT_ENV).map(PathBuf::from));
        candidates.extend(SYSTEM_FONTS.iter().map(PathBuf::from));

        for candidate in candidates {
            let Ok(bytes) = fs::read(&candidate) else {
                continue;
            };
            // plotters keeps registered fonts for the whole process
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
                Ok(()) => {
                    debug!("Using font {} for figures", candidate.display());
                    return true;
                }
                Err(_) => warn!("Unusable font file {}", candidate.display()),
            }
        }

        warn!("No font found, figures are rendered without text (set {})", FONT_ENV);
        false
    })
}

pub fn text_available() -> bool {
    init_fonts(None)
}
