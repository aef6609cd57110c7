//! ID Card Lifecycle - Single Entry Point per Person
//!
//! An `IdCard` ties one validated record to its folder and optional photo.
//! Every generate writes the image and its manifest together.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::capture::{Camera, CaptureError, CaptureSession, CaptureState, PreviewSink};
use crate::hashing::{compute_record_hash, sha256_hex};
use crate::render::{encode_jpeg, CardRenderer, RenderError};
use crate::schema::{CardKind, PersonRecord};
use crate::storage::{CardStore, StoreError};
use crate::ENGINE_VERSION;

pub const PHOTO_FILE: &str = "photo.jpg";
pub const CARD_FILE: &str = "IDcard.jpg";
pub const MANIFEST_FILE: &str = "card.json";

#[derive(Debug, Error)]
pub enum CardError {
    #[error("ID Card not found: {}", .0.display())]
    CardNotFound(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Displays a rendered card until the operator acknowledges it.
pub trait CardViewer {
    fn view(&mut self, title: &str, path: &Path, card: &RgbImage) -> std::io::Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardManifest {
    pub id: String,
    pub kind: CardKind,
    pub fields: BTreeMap<String, String>,
    pub photo: Option<String>,
    pub image: String,
    pub image_sha256: String,
    pub record_hash: String,
    pub engine_version: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IdCard {
    record: PersonRecord,
    folder: PathBuf,
    photo: Option<PathBuf>,
}

impl IdCard {
    /// Create (or reuse) the person folder for `record`.
    pub fn create_folder(store: &CardStore, record: PersonRecord) -> Result<Self, CardError> {
        let folder = store.create_person_folder(record.kind(), record.name())?;
        Ok(Self {
            record,
            folder,
            photo: None,
        })
    }

    pub fn record(&self) -> &PersonRecord {
        &self.record
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn photo(&self) -> Option<&Path> {
        self.photo.as_deref()
    }

    pub fn card_path(&self) -> PathBuf {
        self.folder.join(CARD_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.folder.join(MANIFEST_FILE)
    }

    /// Run the capture protocol and keep the confirmed frame as the photo.
    ///
    /// Returns `Ok(false)` when the operator cancelled or the session timed out.
    pub fn capture_photo(
        &mut self,
        camera: &dyn Camera,
        preview: &mut dyn PreviewSink,
        device: u32,
        timeout: Option<Duration>,
    ) -> Result<bool, CardError> {
        let mut source = camera.open(device)?;
        match CaptureSession::new(timeout).run(source.as_mut(), preview)? {
            CaptureState::Captured(frame) => {
                let path = self.folder.join(PHOTO_FILE);
                frame.save_with_format(&path, ImageFormat::Jpeg)?;
                info!(photo = %path.display(), "photo saved");
                self.photo = Some(path);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Use an existing image file as the photo, re-encoded as JPEG.
    pub fn import_photo(&mut self, source: &Path) -> Result<(), CardError> {
        let image = image::open(source)?.to_rgb8();
        let path = self.folder.join(PHOTO_FILE);
        image.save_with_format(&path, ImageFormat::Jpeg)?;
        info!(source = %source.display(), photo = %path.display(), "photo imported");
        self.photo = Some(path);
        Ok(())
    }

    /// Render the card, overwrite `IDcard.jpg`, and write the manifest.
    pub fn generate(&self, renderer: &CardRenderer) -> Result<CardManifest, CardError> {
        let canvas = renderer.render(&self.record, self.photo.as_deref());
        let bytes = encode_jpeg(&canvas)?;
        let card_path = self.card_path();
        fs::write(&card_path, &bytes)?;

        let manifest = CardManifest {
            id: Uuid::new_v4().to_string(),
            kind: self.record.kind(),
            fields: self.record.to_map(),
            photo: self
                .photo
                .as_deref()
                .filter(|p| p.is_file())
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            image: CARD_FILE.to_string(),
            image_sha256: sha256_hex(&bytes),
            record_hash: compute_record_hash(&self.record)?,
            engine_version: ENGINE_VERSION.to_string(),
            generated_at: Utc::now(),
        };
        fs::write(self.manifest_path(), serde_json::to_string_pretty(&manifest)?)?;

        info!(card = %card_path.display(), "ID Card generated");
        Ok(manifest)
    }

    /// Load the rendered card and hand it to `viewer`.
    pub fn show(&self, viewer: &mut dyn CardViewer) -> Result<(), CardError> {
        let path = self.card_path();
        let card = match image::open(&path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                warn!(card = %path.display(), error = %e, "card unreadable");
                return Err(CardError::CardNotFound(path));
            }
        };
        viewer.view(self.record.kind().caption(), &path, &card)?;
        Ok(())
    }
}
