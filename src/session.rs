//! Interactive Session
//!
//! Outer menu picks a card kind, inner menu drives one person's card.
//! All console traffic goes through `Operator` so the loop can be scripted.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use tracing::{debug, info};

use crate::capture::{Camera, PreviewSink};
use crate::card::{CardError, CardViewer, IdCard};
use crate::config::Config;
use crate::render::CardRenderer;
use crate::schema::{collect_details, CardKind, RecordError};
use crate::storage::{CardStore, StoreError};

const KIND_MENU: &str = "\nSelect Card Type:\n1. Student ID Card\n2. Business ID Card\n3. Library ID Card\n4. Exit";
const PERSON_MENU: &str = "\n1. Capture Photo\n2. Generate ID Card\n3. Show ID Card\n4. Delete Person Folder\n5. Back to Card Type Menu";

/// Console capability: questions, plain output and warnings.
pub trait Operator {
    /// Read one answer. End of input is reported as `UnexpectedEof`.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;
    fn say(&mut self, message: &str);
    fn warn(&mut self, message: &str);
}

/// Replays fixed answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    messages: Vec<String>,
    warnings: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn say(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

enum Flow {
    Back,
    Quit,
}

pub struct Session<'a> {
    store: CardStore,
    renderer: CardRenderer,
    camera: Box<dyn Camera>,
    camera_index: u32,
    capture_timeout: Option<Duration>,
    operator: &'a mut dyn Operator,
    preview: &'a mut dyn PreviewSink,
    viewer: &'a mut dyn CardViewer,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &Config,
        operator: &'a mut dyn Operator,
        preview: &'a mut dyn PreviewSink,
        viewer: &'a mut dyn CardViewer,
    ) -> Self {
        Self {
            store: config.store(),
            renderer: config.renderer(),
            camera: config.camera(),
            camera_index: config.camera_index,
            capture_timeout: config.capture_timeout,
            operator,
            preview,
            viewer,
        }
    }

    pub fn with_camera(mut self, camera: Box<dyn Camera>) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_renderer(mut self, renderer: CardRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Run until Exit is chosen or input ends.
    pub fn run(&mut self) {
        info!(root = %self.store.root().display(), "session started");
        loop {
            self.operator.say(KIND_MENU);
            let Ok(choice) = self.operator.ask("Choice") else {
                break;
            };
            let kind = match choice.trim() {
                "1" => CardKind::Student,
                "2" => CardKind::Business,
                "3" => CardKind::Library,
                "4" => break,
                _ => {
                    self.operator.warn("Invalid choice!");
                    continue;
                }
            };

            let record = match collect_details(kind, &mut *self.operator) {
                Ok(record) => record,
                Err(RecordError::Input(_)) => break,
                Err(e) => {
                    self.operator.warn(&e.to_string());
                    continue;
                }
            };

            let mut card = match IdCard::create_folder(&self.store, record) {
                Ok(card) => card,
                Err(e) => {
                    self.operator.warn(&e.to_string());
                    continue;
                }
            };

            if let Flow::Quit = self.person_menu(&mut card) {
                break;
            }
        }
        info!("session ended");
    }

    fn person_menu(&mut self, card: &mut IdCard) -> Flow {
        loop {
            self.operator.say(PERSON_MENU);
            let Ok(choice) = self.operator.ask("Choice") else {
                return Flow::Quit;
            };
            debug!(choice = choice.trim(), "person menu");
            match choice.trim() {
                "1" => self.capture(card),
                "2" => match card.generate(&self.renderer) {
                    Ok(_) => self
                        .operator
                        .say(&format!("ID Card generated at: {}", card.card_path().display())),
                    Err(e) => self.operator.warn(&e.to_string()),
                },
                "3" => match card.show(&mut *self.viewer) {
                    Ok(()) => {}
                    Err(CardError::CardNotFound(_)) => self.operator.warn("ID Card not found!"),
                    Err(e) => self.operator.warn(&e.to_string()),
                },
                "4" => self.delete_person(card.record().kind()),
                "5" => return Flow::Back,
                _ => self.operator.warn("Invalid choice!"),
            }
        }
    }

    fn capture(&mut self, card: &mut IdCard) {
        self.operator.say("Press 's' to capture photo, 'q' to cancel...");
        match card.capture_photo(
            self.camera.as_ref(),
            &mut *self.preview,
            self.camera_index,
            self.capture_timeout,
        ) {
            Ok(true) => self.operator.say("Photo saved!"),
            Ok(false) => self.operator.say("Capture cancelled."),
            Err(e) => self.operator.warn(&e.to_string()),
        }
    }

    fn delete_person(&mut self, kind: CardKind) {
        let operator = &mut *self.operator;
        let result = self.store.delete_person_folder(kind, |names| {
            for (i, name) in names.iter().enumerate() {
                operator.say(&format!("{}. {}", i + 1, name));
            }
            operator.ask("Select folder to delete")
        });

        match result {
            Ok(path) => self
                .operator
                .say(&format!("Deleted folder: {}", path.display())),
            Err(StoreError::NoFolders(root)) => self
                .operator
                .say(&format!("No folders found in {}", root.display())),
            Err(StoreError::InvalidSelection(_)) => self.operator.warn("Invalid choice!"),
            Err(e) => self.operator.warn(&e.to_string()),
        }
    }
}
