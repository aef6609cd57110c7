//! Runtime Configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::capture::{Camera, NoCamera, StillImageCamera};
use crate::render::{CardRenderer, FontPainter, NoText};
use crate::storage::CardStore;

/// Fonts tried when none is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the per-kind card roots.
    pub root: PathBuf,
    /// Camera device index.
    pub camera_index: u32,
    /// Image file served as the camera feed, when no driver is available.
    pub camera_still: Option<PathBuf>,
    pub font: Option<PathBuf>,
    /// Stop previewing after this long without a capture.
    pub capture_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            camera_index: 0,
            camera_still: None,
            font: None,
            capture_timeout: None,
        }
    }
}

impl Config {
    pub fn store(&self) -> CardStore {
        CardStore::new(&self.root)
    }

    pub fn camera(&self) -> Box<dyn Camera> {
        match &self.camera_still {
            Some(path) => Box::new(StillImageCamera::new(path)),
            None => Box::new(NoCamera),
        }
    }

    /// The configured font, or the first installed candidate.
    pub fn font_path(&self) -> Option<PathBuf> {
        if let Some(font) = &self.font {
            return Some(font.clone());
        }
        FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.is_file())
            .map(Path::to_path_buf)
    }

    /// Renderer with text when a usable font is found, without otherwise.
    pub fn renderer(&self) -> CardRenderer {
        let Some(path) = self.font_path() else {
            warn!("no font found, cards will be rendered without text");
            return CardRenderer::new(Box::new(NoText));
        };
        match FontPainter::load(&path) {
            Ok(painter) => CardRenderer::new(Box::new(painter)),
            Err(e) => {
                warn!(font = %path.display(), error = %e, "font unusable, cards will be rendered without text");
                CardRenderer::new(Box::new(NoText))
            }
        }
    }
}
