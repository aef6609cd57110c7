//! ID Card Forge CLI
//!
//! Without a subcommand: interactive card session.
//! `generate` and `list` are scripted commands that print JSON to stdout.
//! Returns 2 when a record fails validation.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::{style, Term};
use dialoguer::Input;
use image::RgbImage;
use tracing::warn;

use idcard_core::{
    CardKind, CardViewer, CaptureError, Config, IdCard, Operator, PersonRecord, PreviewSignal,
    PreviewSink, RecordError, Session,
};

#[derive(Parser)]
#[command(name = "idcard-cli")]
#[command(version, about = "ID Card Forge - student, business and library ID cards")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the card folders
    #[arg(short, long, global = true, env = "IDCARD_ROOT", default_value = ".")]
    root: PathBuf,

    /// Camera device index
    #[arg(long, global = true, default_value_t = 0)]
    camera: u32,

    /// Image file served as the camera feed
    #[arg(long, global = true)]
    camera_still: Option<PathBuf>,

    /// TrueType font used for card text
    #[arg(long, global = true, env = "IDCARD_FONT")]
    font: Option<PathBuf>,

    /// Give up previewing after this many seconds
    #[arg(long, global = true)]
    capture_timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive card session (default)
    Session,

    /// Validate a record and render its card
    Generate {
        /// Card kind (student, business, library)
        #[arg(short, long)]
        kind: CardKind,

        /// JSON object of field values
        #[arg(short, long)]
        payload: String,

        /// Photo to place on the card
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// List person folders of a card kind
    List {
        #[arg(short, long)]
        kind: CardKind,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            root: self.root.clone(),
            camera_index: self.camera,
            camera_still: self.camera_still.clone(),
            font: self.font.clone(),
            capture_timeout: self.capture_timeout.map(Duration::from_secs),
        }
    }
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        None | Some(Commands::Session) => {
            let mut operator = ConsoleOperator;
            let mut preview = ConsolePreview;
            let mut viewer = SystemViewer;
            Session::new(&config, &mut operator, &mut preview, &mut viewer).run();
            ExitCode::SUCCESS
        }

        Some(Commands::Generate { kind, payload, photo }) => {
            generate(&config, kind, &payload, photo.as_deref())
        }

        Some(Commands::List { kind }) => match config.store().list_people(kind) {
            Ok(people) => {
                println!("{}", serde_json::json!({ "kind": kind, "people": people }));
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
                ExitCode::FAILURE
            }
        },
    }
}

fn generate(config: &Config, kind: CardKind, payload: &str, photo: Option<&Path>) -> ExitCode {
    let values: HashMap<String, String> = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            println!("{}", serde_json::json!({ "success": false, "error": format!("Invalid payload: {}", e) }));
            return ExitCode::FAILURE;
        }
    };

    let record = match PersonRecord::from_values(kind, &values) {
        Ok(r) => r,
        Err(RecordError::Invalid(violations)) => {
            println!("{}", serde_json::json!({ "success": false, "violations": violations }));
            return ExitCode::from(2);
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "success": false, "error": e.to_string() }));
            return ExitCode::from(2);
        }
    };

    let result = IdCard::create_folder(&config.store(), record).and_then(|mut card| {
        if let Some(photo) = photo {
            card.import_photo(photo)?;
        }
        card.generate(&config.renderer())
    });

    match result {
        Ok(manifest) => {
            let output = serde_json::json!({ "success": true, "card": manifest });
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", output),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "success": false, "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

/// Reads answers with dialoguer on a terminal, line by line otherwise.
struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        if Term::stdout().is_term() {
            return Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map_err(io::Error::other);
        }

        print!("{}: ", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn say(&mut self, message: &str) {
        println!("{}", message);
    }

    fn warn(&mut self, message: &str) {
        println!("{}", style(message).yellow());
    }
}

/// Reports each frame and asks whether to keep it.
struct ConsolePreview;

impl PreviewSink for ConsolePreview {
    fn present(&mut self, frame: &RgbImage) -> Result<PreviewSignal, CaptureError> {
        let (w, h) = frame.dimensions();
        let answer = ConsoleOperator.ask(&format!("Frame {}x{} [s = capture, q = cancel]", w, h))?;
        Ok(match answer.trim() {
            "s" | "S" => PreviewSignal::Confirm,
            "q" | "Q" => PreviewSignal::Cancel,
            _ => PreviewSignal::Continue,
        })
    }
}

/// Opens the card in the system image viewer and waits for Enter.
struct SystemViewer;

impl CardViewer for SystemViewer {
    fn view(&mut self, title: &str, path: &Path, card: &RgbImage) -> io::Result<()> {
        let (w, h) = card.dimensions();
        println!("{} ({}x{}): {}", style(title).bold(), w, h, path.display());
        if let Err(e) = open::that(path) {
            warn!(card = %path.display(), error = %e, "could not open viewer");
        }
        ConsoleOperator.ask("Press Enter to close")?;
        Ok(())
    }
}
