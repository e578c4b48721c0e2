//! # MusicXML Extraction Module
//!
//! Pulls the ordered pitch sequence out of a MusicXML document. Only the
//! `<pitch>` elements matter to the practice engine; durations, ties,
//! dynamics and layout are the renderer's business and are skipped here.
//! Rests carry no pitch and fall out naturally. Document order matches the
//! score's left-to-right, top-to-bottom reading order.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::score::{NoteDescriptor, ScoreError};

/// The element currently being collected inside a `<pitch>`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PitchField {
    Step,
    Alter,
    Octave,
}

/// Extracts every pitch in document order from MusicXML markup.
///
/// The root element must be `score-partwise` or `score-timewise`;
/// anything else is rejected as malformed. A score with no notes yields
/// an empty sequence, which is a valid (if silent) practice piece.
pub fn extract_notes(markup: &str) -> Result<Vec<NoteDescriptor>, ScoreError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut notes = Vec::new();
    let mut saw_root = false;
    let mut in_pitch = false;
    let mut field: Option<PitchField> = None;
    let mut step = String::new();
    let mut alter = String::new();
    let mut octave = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = element.name();
                if !saw_root {
                    saw_root = true;
                    if !matches!(name.as_ref(), b"score-partwise" | b"score-timewise") {
                        return Err(ScoreError::MalformedDocument {
                            message: "root element is not a MusicXML score".to_string(),
                        });
                    }
                    continue;
                }
                match name.as_ref() {
                    b"pitch" => {
                        in_pitch = true;
                        step.clear();
                        alter.clear();
                        octave.clear();
                    }
                    b"step" if in_pitch => field = Some(PitchField::Step),
                    b"alter" if in_pitch => field = Some(PitchField::Alter),
                    b"octave" if in_pitch => field = Some(PitchField::Octave),
                    _ => {}
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = field {
                    let value = text.unescape().map_err(|e| ScoreError::MalformedDocument {
                        message: format!("bad text content: {e}"),
                    })?;
                    match current {
                        PitchField::Step => step.push_str(&value),
                        PitchField::Alter => alter.push_str(&value),
                        PitchField::Octave => octave.push_str(&value),
                    }
                }
            }
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"step" | b"alter" | b"octave" => field = None,
                b"pitch" => {
                    in_pitch = false;
                    field = None;
                    if !step.is_empty() && !octave.is_empty() {
                        let name = format!(
                            "{}{}{}",
                            step.trim(),
                            accidental_suffix(&alter),
                            octave.trim()
                        );
                        notes.push(NoteDescriptor {
                            name,
                            sequence_index: notes.len(),
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ScoreError::MalformedDocument {
                    message: e.to_string(),
                });
            }
        }
    }

    if !saw_root {
        return Err(ScoreError::MalformedDocument {
            message: "document contains no elements".to_string(),
        });
    }

    Ok(notes)
}

/// Renders a MusicXML `<alter>` value as an accidental suffix.
/// Positive alters become sharps, negative ones flats; microtonal values
/// round to the nearest semitone.
fn accidental_suffix(alter: &str) -> String {
    let semitones = alter.trim().parse::<f32>().unwrap_or(0.0).round() as i32;
    if semitones > 0 {
        "#".repeat(semitones as usize)
    } else {
        "b".repeat(semitones.unsigned_abs() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SCORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score-partwise version="4.0">
  <part-list>
    <score-part id="P1"><part-name>Trumpet</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
      <note><pitch><step>F</step><alter>1</alter><octave>4</octave></pitch><duration>4</duration></note>
      <note><rest/><duration>4</duration></note>
      <note><pitch><step>B</step><alter>-1</alter><octave>3</octave></pitch><duration>4</duration></note>
    </measure>
  </part>
</score-partwise>"#;

    #[test]
    fn test_pitches_extracted_in_document_order() {
        let notes = extract_notes(SIMPLE_SCORE).unwrap();
        let names: Vec<&str> = notes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["C4", "F#4", "Bb3"]);
    }

    #[test]
    fn test_sequence_indices_are_consecutive() {
        let notes = extract_notes(SIMPLE_SCORE).unwrap();
        for (i, note) in notes.iter().enumerate() {
            assert_eq!(note.sequence_index, i);
        }
    }

    #[test]
    fn test_rests_are_skipped() {
        let notes = extract_notes(SIMPLE_SCORE).unwrap();
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn test_timewise_root_is_accepted() {
        let markup = r#"<score-timewise>
  <measure number="1"><part id="P1">
    <note><pitch><step>G</step><octave>4</octave></pitch></note>
  </part></measure>
</score-timewise>"#;
        let notes = extract_notes(markup).unwrap();
        assert_eq!(notes[0].name, "G4");
    }

    #[test]
    fn test_non_score_root_is_rejected() {
        let result = extract_notes("<html><body>not a score</body></html>");
        assert!(matches!(result, Err(ScoreError::MalformedDocument { .. })));
    }

    #[test]
    fn test_mismatched_end_tag_is_rejected() {
        let result = extract_notes("<score-partwise><part></note></score-partwise>");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_score_yields_empty_sequence() {
        let notes = extract_notes("<score-partwise><part id=\"P1\"/></score-partwise>").unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn test_double_flat_is_rendered() {
        let markup = r#"<score-partwise><part id="P1"><measure number="1">
  <note><pitch><step>E</step><alter>-2</alter><octave>4</octave></pitch></note>
</measure></part></score-partwise>"#;
        let notes = extract_notes(markup).unwrap();
        assert_eq!(notes[0].name, "Ebb4");
    }
}
