//! # Practice Session Module
//!
//! The note-practice state machine. The session owns the annotated note
//! sequence, the position in it, the set of valves currently held, and the
//! derived feedback state; everything is mutated through a single
//! transition function fed one event at a time, in arrival order.
//!
//! A correct combination does not advance immediately: key-down events for
//! a chord arrive spread over a few milliseconds, so the match is
//! confirmed again after a short debounce window. The pending advance is a
//! cancellable scheduled action tied to a transition counter: if any
//! transition intervenes, the stale schedule is discarded instead of
//! firing against state it no longer describes.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::keymap::KeyMapping;
use crate::score::{self, AnnotatedNote, NoteDescriptor};
use crate::valves::{self, ValveSet};
use crate::{Correctness, SessionSnapshot};

/// Delay between detecting a matching combination and advancing.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

const READY_FEEDBACK: &str = "Press the valves for the note shown.";
const CORRECT_FEEDBACK: &str = "Correct!";
const TRY_AGAIN_FEEDBACK: &str = "Not quite. Release the valves and try again.";
const COMPLETE_FEEDBACK: &str = "End of the piece. Well played!";

/// External events driving the session, applied strictly in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A score finished loading; replaces the note sequence.
    ScoreLoaded(Vec<NoteDescriptor>),
    /// A raw key went down.
    KeyDown(char),
    /// A raw key came up.
    KeyUp(char),
    /// Manual navigation forwards.
    NextNote,
    /// Manual navigation backwards.
    PrevNote,
    /// Rebind one valve to a new key.
    Remap { valve: u8, key: char },
    /// The debounce window scheduled at `generation` elapsed.
    DebounceElapsed(u64),
}

/// A request to deliver `DebounceElapsed(generation)` after `delay`.
/// Returned by [`PracticeSession::apply`] when a match is detected; the
/// driver owns the clock, the session owns the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTimer {
    pub generation: u64,
    pub delay: Duration,
}

/// The practice engine. All state is private; the presentation layer sees
/// only [`SessionSnapshot`] projections.
#[derive(Debug)]
pub struct PracticeSession {
    notes: Vec<AnnotatedNote>,
    current_index: Option<usize>,
    /// Held valves, keyed by valve id, each recording the physical key
    /// that activated it so a later remap cannot strand it.
    held: BTreeMap<u8, char>,
    feedback: String,
    correctness: Correctness,
    mapping: KeyMapping,
    /// Bumped on every transition that changes notes, position, or the
    /// held set. A scheduled advance is valid only for the generation at
    /// which it was scheduled.
    generation: u64,
}

impl PracticeSession {
    pub fn new(mapping: KeyMapping) -> Self {
        Self {
            notes: Vec::new(),
            current_index: None,
            held: BTreeMap::new(),
            feedback: String::new(),
            correctness: Correctness::Unknown,
            mapping,
            generation: 0,
        }
    }

    /// The loaded, annotated note sequence.
    pub fn notes(&self) -> &[AnnotatedNote] {
        &self.notes
    }

    /// The current key mapping.
    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    /// Applies one event. The returned timer, if any, asks the driver to
    /// deliver [`SessionEvent::DebounceElapsed`] after the debounce window.
    pub fn apply(&mut self, event: SessionEvent) -> Option<AdvanceTimer> {
        match event {
            SessionEvent::ScoreLoaded(descriptors) => self.load(descriptors),
            SessionEvent::KeyDown(key) => self.key_down(key),
            SessionEvent::KeyUp(key) => self.key_up(key),
            SessionEvent::NextNote => self.navigate(1),
            SessionEvent::PrevNote => self.navigate(-1),
            SessionEvent::Remap { valve, key } => {
                // Only future key events see the new binding; valves
                // already held release by their recorded physical key.
                self.mapping.remap(valve, key);
                None
            }
            SessionEvent::DebounceElapsed(generation) => self.debounce_elapsed(generation),
        }
    }

    /// Builds the read-only projection for the presentation layer.
    pub fn snapshot(&self) -> SessionSnapshot {
        let current = self.current_index.map(|i| &self.notes[i]);
        SessionSnapshot {
            current_note_name: current.map(|n| n.name.clone()),
            required_combination: current
                .map(|n| n.required_combination.clone())
                .unwrap_or_default(),
            pressed_set: self.pressed(),
            feedback_message: self.feedback.clone(),
            correctness: self.correctness,
            can_go_prev: self.current_index.is_some_and(|i| i > 0),
            can_go_next: self.current_index.is_some_and(|i| i + 1 < self.notes.len()),
            position: self.current_index,
            note_count: self.notes.len(),
        }
    }

    fn pressed(&self) -> ValveSet {
        self.held.keys().copied().collect()
    }

    fn load(&mut self, descriptors: Vec<NoteDescriptor>) -> Option<AdvanceTimer> {
        self.notes = score::annotate(descriptors);
        self.current_index = if self.notes.is_empty() { None } else { Some(0) };
        self.held.clear();
        self.feedback = READY_FEEDBACK.to_string();
        self.correctness = Correctness::Unknown;
        self.generation += 1;
        eprintln!("[SESSION] Loaded score with {} notes", self.notes.len());
        // An open first note is answered by the empty set already in hand.
        self.evaluate()
    }

    fn key_down(&mut self, key: char) -> Option<AdvanceTimer> {
        let valve = self.mapping.classify(key)?;
        if self.held.contains_key(&valve) {
            // Pressing an already-held key (or its OS auto-repeat) is a
            // no-op on the set.
            return None;
        }
        self.held.insert(valve, key.to_ascii_lowercase());
        self.generation += 1;
        self.evaluate()
    }

    fn key_up(&mut self, key: char) -> Option<AdvanceTimer> {
        let key = key.to_ascii_lowercase();
        let released: Vec<u8> = self
            .held
            .iter()
            .filter(|(_, recorded)| **recorded == key)
            .map(|(valve, _)| *valve)
            .collect();
        if released.is_empty() {
            return None;
        }
        for valve in released {
            self.held.remove(&valve);
        }
        self.generation += 1;
        self.evaluate()
    }

    fn navigate(&mut self, delta: isize) -> Option<AdvanceTimer> {
        let index = self.current_index?;
        let target = index as isize + delta;
        if target < 0 || target as usize >= self.notes.len() {
            // Already at the boundary; a defined no-op.
            return None;
        }
        self.current_index = Some(target as usize);
        self.arrive()
    }

    /// Shared tail of every transition that lands on a (new) current note.
    fn arrive(&mut self) -> Option<AdvanceTimer> {
        self.held.clear();
        self.feedback.clear();
        self.correctness = Correctness::Unknown;
        self.generation += 1;
        self.evaluate()
    }

    /// Re-derives correctness from the held set and the current note.
    /// Called after every change to either.
    fn evaluate(&mut self) -> Option<AdvanceTimer> {
        let index = self.current_index?;
        let required = &self.notes[index].required_combination;
        let pressed = self.pressed();

        if valves::is_match(required, &pressed) {
            self.correctness = Correctness::Correct;
            self.feedback = CORRECT_FEEDBACK.to_string();
            Some(AdvanceTimer {
                generation: self.generation,
                delay: DEBOUNCE_WINDOW,
            })
        } else if pressed.len() >= required.len() {
            // Enough valves down to have committed to a guess.
            self.correctness = Correctness::Incorrect;
            self.feedback = TRY_AGAIN_FEEDBACK.to_string();
            None
        } else {
            // Still composing a partial combination.
            self.correctness = Correctness::Unknown;
            None
        }
    }

    fn debounce_elapsed(&mut self, generation: u64) -> Option<AdvanceTimer> {
        if generation != self.generation {
            // A transition superseded the scheduled advance; discard it.
            return None;
        }
        let index = self.current_index?;
        let pressed = self.pressed();
        if !valves::is_match(&self.notes[index].required_combination, &pressed) {
            return None;
        }
        self.advance()
    }

    fn advance(&mut self) -> Option<AdvanceTimer> {
        let index = self.current_index?;
        if index + 1 == self.notes.len() {
            // Terminal: hold the position and report completion.
            self.correctness = Correctness::Correct;
            self.feedback = COMPLETE_FEEDBACK.to_string();
            eprintln!("[SESSION] Sequence complete");
            return None;
        }
        self.current_index = Some(index + 1);
        self.arrive()
    }
}
