//! # Fanfare - Trumpet Practice GUI
//!
//! The desktop front end for the note-practice engine. It renders the
//! current note, the required and held valve combinations, and feedback,
//! and feeds the engine raw keyboard events plus navigation commands.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme; every engine
//!   transition happens here, in event arrival order
//! - **Loader Thread**: short-lived worker per load running the file
//!   dialog and score parsing off the GUI thread
//! - **Communication**: Crossbeam channel drained on the tick
//! - **Updates**: continuous 60 FPS ticks drive the debounce deadline

mod ui;

use crossbeam_channel::{Receiver, Sender};
use iced::keyboard;
use iced::{self, Element, Subscription, Theme};
use std::thread;
use std::time::Instant;

use practice_core::SessionSnapshot;
use practice_core::keymap::KeyMapping;
use practice_core::score::{self, NoteDescriptor, ScoreError};
use practice_core::session::{PracticeSession, SessionEvent};
use practice_core::valves::VALVE_IDS;
use ui::main_display::create_main_view;

/// Main entry point for the Fanfare application.
pub fn main() -> iced::Result {
    eprintln!("[MAIN] Starting Fanfare application...");
    let result = iced::application("Fanfare", PracticeApp::update, PracticeApp::view)
        .subscription(PracticeApp::subscription)
        .theme(PracticeApp::theme)
        .run();
    eprintln!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    // Raw keyboard events, classified by the engine
    KeyPressed(char),
    KeyReleased(char),

    // Navigation commands
    PrevPressed,
    NextPressed,

    // Score loading
    OpenScore,

    // Rebinding: arm capture for a valve; the next key press lands there
    BeginRemap(u8),

    // Continuous update message
    Tick,
}

/// What the loader thread reports back for one load attempt.
#[derive(Debug)]
enum LoaderReply {
    Loaded {
        file_name: String,
        notes: Vec<NoteDescriptor>,
    },
    Failed {
        file_name: String,
        error: ScoreError,
    },
    Cancelled,
}

/// A scheduled debounced advance: deliver `DebounceElapsed(generation)`
/// to the engine once `due` passes. Superseded schedules are harmless,
/// the engine discards stale generations.
#[derive(Debug, Clone, Copy)]
struct PendingAdvance {
    generation: u64,
    due: Instant,
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct PracticeDisplayData {
    /// Engine projection after the latest transition.
    pub snapshot: SessionSnapshot,
    /// All note names of the loaded score, for the score strip.
    pub note_names: Vec<String>,
    /// Current key bound to each valve, in valve order.
    pub bindings: Vec<(u8, Option<char>)>,
    /// Valve armed for rebinding, if any.
    pub remap_capture: Option<u8>,
    /// Status line: load results and errors.
    pub status: String,
}

/// Main application state for the Fanfare practice tool.
#[derive(Debug)]
struct PracticeApp {
    // The engine; all transitions go through apply_session
    session: PracticeSession,

    // Loader channel endpoints; the sender is cloned into worker threads
    loader_tx: Sender<LoaderReply>,
    loader_rx: Receiver<LoaderReply>,

    // The one outstanding debounce deadline, if any
    pending_advance: Option<PendingAdvance>,

    // Valve waiting for its new key, if rebinding is armed
    remap_capture: Option<u8>,

    // Status line shown under the title
    status: String,
}

impl Default for PracticeApp {
    /// Creates the application with the persisted key mapping and, when a
    /// score path is given on the command line, that score preloaded.
    fn default() -> Self {
        eprintln!("[MAIN] Creating PracticeApp...");
        let mapping = match KeyMapping::load() {
            Ok(mapping) => mapping,
            Err(e) => {
                eprintln!("[MAIN] Could not load key mapping, using defaults: {}", e);
                KeyMapping::default()
            }
        };

        let (loader_tx, loader_rx) = crossbeam_channel::unbounded();
        let mut app = Self {
            session: PracticeSession::new(mapping),
            loader_tx,
            loader_rx,
            pending_advance: None,
            remap_capture: None,
            status: "Open a score to start practicing.".to_string(),
        };

        if let Some(path) = std::env::args().nth(1) {
            eprintln!("[MAIN] Preloading score from argument: {}", path);
            match score::load_score(&path) {
                Ok(notes) => {
                    let count = notes.len();
                    app.apply_session(SessionEvent::ScoreLoaded(notes));
                    app.status = format!("{}: {} notes", path, count);
                }
                Err(e) => {
                    eprintln!("[MAIN] Preload failed: {}", e);
                    app.status = e.to_string();
                }
            }
        }

        app
    }
}

impl PracticeApp {
    /// Routes an event into the engine and schedules the debounce deadline
    /// when the engine asks for one.
    fn apply_session(&mut self, event: SessionEvent) {
        if let Some(timer) = self.session.apply(event) {
            self.pending_advance = Some(PendingAdvance {
                generation: timer.generation,
                due: Instant::now() + timer.delay,
            });
        }
    }

    /// Spawns a worker thread that runs the file dialog and score parsing,
    /// reporting back over the loader channel.
    fn start_score_load(&self) {
        let reply_tx = self.loader_tx.clone();
        thread::spawn(move || {
            eprintln!("[LOADER] Opening file dialog...");
            let picked = rfd::FileDialog::new()
                .add_filter("MusicXML score", &["musicxml", "xml", "mxl"])
                .pick_file();

            let Some(path) = picked else {
                eprintln!("[LOADER] Dialog cancelled");
                let _ = reply_tx.send(LoaderReply::Cancelled);
                return;
            };
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            eprintln!("[LOADER] Parsing {}...", file_name);
            let reply = match score::load_score(&path) {
                Ok(notes) => LoaderReply::Loaded { file_name, notes },
                Err(error) => LoaderReply::Failed { file_name, error },
            };
            if reply_tx.send(reply).is_err() {
                eprintln!("[LOADER] GUI is gone, dropping load result");
            }
        });
    }

    /// Applies one loader reply on the GUI thread. A failed load leaves
    /// the running session untouched; only the status line changes.
    fn handle_loader_reply(&mut self, reply: LoaderReply) {
        match reply {
            LoaderReply::Loaded { file_name, notes } => {
                let count = notes.len();
                self.apply_session(SessionEvent::ScoreLoaded(notes));
                self.status = format!("{}: {} notes", file_name, count);
            }
            LoaderReply::Failed { file_name, error } => {
                eprintln!("[MAIN] Load of {} failed: {}", file_name, error);
                self.status = error.to_string();
            }
            LoaderReply::Cancelled => {
                self.status = "Load cancelled.".to_string();
            }
        }
    }

    /// Handles application state updates based on incoming messages.
    fn update(&mut self, message: Message) {
        match message {
            Message::KeyPressed(key) => {
                if let Some(valve) = self.remap_capture.take() {
                    eprintln!("[MAIN] Rebinding valve {} to '{}'", valve, key);
                    self.apply_session(SessionEvent::Remap { valve, key });
                    if let Err(e) = self.session.mapping().save() {
                        eprintln!("[MAIN] Could not save key mapping: {}", e);
                    }
                } else {
                    self.apply_session(SessionEvent::KeyDown(key));
                }
            }
            Message::KeyReleased(key) => {
                self.apply_session(SessionEvent::KeyUp(key));
            }
            Message::PrevPressed => {
                self.apply_session(SessionEvent::PrevNote);
            }
            Message::NextPressed => {
                self.apply_session(SessionEvent::NextNote);
            }
            Message::OpenScore => {
                self.status = "Choose a score file...".to_string();
                self.start_score_load();
            }
            Message::BeginRemap(valve) => {
                // Clicking the armed valve again disarms it.
                if self.remap_capture == Some(valve) {
                    self.remap_capture = None;
                } else {
                    self.remap_capture = Some(valve);
                }
            }
            Message::Tick => {
                // Collect all replies first to avoid borrowing conflicts
                let mut replies = Vec::new();
                while let Ok(reply) = self.loader_rx.try_recv() {
                    replies.push(reply);
                }
                for reply in replies {
                    self.handle_loader_reply(reply);
                }

                if let Some(pending) = self.pending_advance {
                    if Instant::now() >= pending.due {
                        self.pending_advance = None;
                        self.apply_session(SessionEvent::DebounceElapsed(pending.generation));
                    }
                }
            }
        }
    }

    /// Renders the main application interface.
    fn view(&self) -> Element<'_, Message> {
        let snapshot = self.session.snapshot();
        let data = PracticeDisplayData {
            note_names: self
                .session
                .notes()
                .iter()
                .map(|n| n.name.clone())
                .collect(),
            bindings: VALVE_IDS
                .iter()
                .map(|&v| (v, self.session.mapping().key_for(v)))
                .collect(),
            remap_capture: self.remap_capture,
            status: self.status.clone(),
            snapshot,
        };
        create_main_view(&data)
    }

    /// Ticks at 60 FPS for the debounce deadline and loader replies, and
    /// listens for raw keyboard input.
    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick),
            keyboard::on_key_press(handle_key_press),
            keyboard::on_key_release(handle_key_release),
        ])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Maps a raw pressed key to an application message. Character keys feed
/// the engine; the arrow keys double as navigation.
fn handle_key_press(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key {
        keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => Some(Message::PrevPressed),
        keyboard::Key::Named(keyboard::key::Named::ArrowRight) => Some(Message::NextPressed),
        keyboard::Key::Character(text) => single_char(text.as_str()).map(Message::KeyPressed),
        _ => None,
    }
}

fn handle_key_release(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    match key {
        keyboard::Key::Character(text) => single_char(text.as_str()).map(Message::KeyReleased),
        _ => None,
    }
}

/// The engine's key domain is single characters; multi-char sequences
/// (dead keys, IME output) are ignored.
fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if chars.next().is_none() {
        Some(first.to_ascii_lowercase())
    } else {
        None
    }
}
