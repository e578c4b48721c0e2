//! End-to-end test: parse a score document, load it into a practice
//! session, and play it through with raw key events.

use practice_core::keymap::KeyMapping;
use practice_core::score::{self, ScoreEncoding};
use practice_core::session::{PracticeSession, SessionEvent};
use practice_core::{Correctness, musicxml};

/// Four-note exercise: D4 {1,3}, Eb4 {2,3}, F4 {1}, G4 open.
const EXERCISE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="4.0">
  <part-list>
    <score-part id="P1"><part-name>Trumpet</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <note><pitch><step>D</step><octave>4</octave></pitch><duration>4</duration></note>
      <note><pitch><step>E</step><alter>-1</alter><octave>4</octave></pitch><duration>4</duration></note>
    </measure>
    <measure number="2">
      <note><pitch><step>F</step><octave>4</octave></pitch><duration>4</duration></note>
      <note><pitch><step>G</step><octave>4</octave></pitch><duration>8</duration></note>
    </measure>
  </part>
</score-partwise>"#;

/// Presses the given keys, confirms the match, and fires the debounce.
fn play_combination(session: &mut PracticeSession, keys: &[char]) {
    let mut timer = None;
    for key in keys {
        timer = session.apply(SessionEvent::KeyDown(*key));
    }
    let timer = timer.expect("combination should match and schedule an advance");
    assert_eq!(session.snapshot().correctness, Correctness::Correct);
    session.apply(SessionEvent::DebounceElapsed(timer.generation));
}

#[test]
fn plays_a_parsed_score_to_completion() {
    let notes = musicxml::extract_notes(EXERCISE).expect("exercise parses");
    assert_eq!(notes.len(), 4);

    let mut session = PracticeSession::new(KeyMapping::default());
    session.apply(SessionEvent::ScoreLoaded(notes));
    assert_eq!(session.snapshot().current_note_name.as_deref(), Some("D4"));

    play_combination(&mut session, &['a', 'd']); // D4 = 1+3
    assert_eq!(session.snapshot().current_note_name.as_deref(), Some("Eb4"));

    play_combination(&mut session, &['s', 'd']); // Eb4 = 2+3
    assert_eq!(session.snapshot().current_note_name.as_deref(), Some("F4"));

    // A wrong committed guess first: F4 needs valve 1, not 2.
    session.apply(SessionEvent::KeyDown('s'));
    assert_eq!(session.snapshot().correctness, Correctness::Incorrect);
    session.apply(SessionEvent::KeyUp('s'));

    let timer = session.apply(SessionEvent::KeyDown('a')).expect("F4 matches");
    session.apply(SessionEvent::KeyUp('a'));
    // Released before the window elapsed; the advance must not fire.
    session.apply(SessionEvent::DebounceElapsed(timer.generation));
    assert_eq!(session.snapshot().current_note_name.as_deref(), Some("F4"));

    // Hold it through the window this time.
    let timer = session.apply(SessionEvent::KeyDown('a')).expect("F4 matches again");
    session.apply(SessionEvent::DebounceElapsed(timer.generation));

    // G4 is open; arrival already cleared the held set, so the note is
    // matched immediately and chains through its own debounce window.
    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_note_name.as_deref(), Some("G4"));
    assert_eq!(snapshot.correctness, Correctness::Correct);
}

#[test]
fn completing_the_final_note_reports_completion() {
    let notes = musicxml::extract_notes(EXERCISE).unwrap();
    let mut session = PracticeSession::new(KeyMapping::default());
    session.apply(SessionEvent::ScoreLoaded(notes));

    play_combination(&mut session, &['a', 'd']);
    play_combination(&mut session, &['s', 'd']);
    let timer = session.apply(SessionEvent::KeyDown('a')).unwrap();
    let open_timer = session
        .apply(SessionEvent::DebounceElapsed(timer.generation))
        .expect("open G4 schedules on arrival");
    session.apply(SessionEvent::DebounceElapsed(open_timer.generation));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.position, Some(3));
    assert!(!snapshot.can_go_next);
    assert_eq!(snapshot.correctness, Correctness::Correct);
    assert!(snapshot.feedback_message.contains("End of the piece"));
}

/// Wraps a payload in a single stored archive entry, the layout the
/// compressed container encoding uses.
fn container_around(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x50, 0x4b, 0x03, 0x04];
    bytes.extend_from_slice(&[20, 0]); // version needed
    bytes.extend_from_slice(&[0, 0]); // flags
    bytes.extend_from_slice(&[0, 0]); // method: stored
    bytes.extend_from_slice(&[0; 8]); // mod time/date, crc
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&[0, 0]); // extra length
    bytes.extend_from_slice(name.as_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn container_and_markup_encodings_agree() {
    let from_markup =
        score::load_score_bytes(EXERCISE.as_bytes(), ScoreEncoding::PlainMarkup).unwrap();

    let container = container_around("exercise.xml", EXERCISE.as_bytes());
    let from_container =
        score::load_score_bytes(&container, ScoreEncoding::CompressedContainer).unwrap();
    assert_eq!(from_markup, from_container);

    let annotated = score::annotate(from_markup);
    assert_eq!(annotated[0].required_combination.len(), 2);
    assert!(annotated[3].required_combination.is_empty());
}
