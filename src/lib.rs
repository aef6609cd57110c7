//! ID Card Forge - Core Engine
//!
//! # Guarantees
//! 1. Records Are Validated Before They Exist
//! 2. Card Kinds Are Contracts (fields, geometry, captions)
//! 3. Rendering Is Deterministic
//! 4. Capabilities Are Injected (camera, preview, viewer, glyphs, console)
//! 5. No Operation Error Ends the Session

pub mod validation;
pub mod schema;
pub mod storage;
pub mod capture;
pub mod render;
pub mod card;
pub mod hashing;
pub mod config;
pub mod session;

pub use validation::{
    is_valid_date, is_valid_email, is_valid_name, is_valid_phone, is_valid_text, FieldRule,
    FieldViolation,
};
pub use schema::{collect_details, CardKind, FieldSpec, PersonRecord, RecordError};
pub use storage::{CardStore, StoreError};
pub use capture::{Camera, CaptureError, CaptureSession, CaptureState, FrameSource, PreviewSignal, PreviewSink};
pub use render::{CardLayout, CardRenderer, RenderError, TextPainter};
pub use card::{CardError, CardManifest, CardViewer, IdCard};
pub use config::Config;
pub use session::{Operator, ScriptedOperator, Session};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
