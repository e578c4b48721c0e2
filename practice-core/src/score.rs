//! # Score Adapter Module
//!
//! Ingests a score document and yields the ordered note sequence the
//! practice session consumes. Two encodings are recognized, distinguished
//! by file extension: a plain MusicXML markup document and the compressed
//! container variant. Parsing failures are surfaced as a typed error and
//! deliver no partial sequence; the caller's session state stays untouched.

use flate2::read::DeflateDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::fingering;
use crate::musicxml;
use crate::valves::ValveSet;

/// A single note as extracted from the score, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDescriptor {
    /// Written pitch name, e.g. "F#4".
    pub name: String,
    /// Position among all notes extracted from the score.
    pub sequence_index: usize,
}

/// A note descriptor augmented with its precomputed valve combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedNote {
    pub name: String,
    pub sequence_index: usize,
    /// Subset of {1,2,3}; empty for open notes and unrecognized pitches.
    pub required_combination: ValveSet,
}

/// Errors produced while loading a score document.
#[derive(Error, Debug)]
pub enum ScoreError {
    /// The document is not a well-formed score.
    #[error("Malformed score document: {message}")]
    MalformedDocument { message: String },

    /// The file extension matches neither recognized encoding.
    #[error("Unsupported score encoding: .{extension}")]
    UnsupportedEncoding { extension: String },

    /// The file could not be read at all.
    #[error("Could not read score file: {0}")]
    Io(#[from] std::io::Error),
}

/// The two recognized score encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreEncoding {
    /// Plain MusicXML markup (`.musicxml`, `.xml`).
    PlainMarkup,
    /// Compressed MusicXML container (`.mxl`).
    CompressedContainer,
}

impl ScoreEncoding {
    /// Detects the encoding from a file path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ScoreError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "musicxml" | "xml" => Ok(Self::PlainMarkup),
            "mxl" => Ok(Self::CompressedContainer),
            _ => Err(ScoreError::UnsupportedEncoding { extension }),
        }
    }
}

/// Annotates each note with its required combination via the fingering
/// table. Computed once per load; the session never re-derives it.
pub fn annotate(notes: Vec<NoteDescriptor>) -> Vec<AnnotatedNote> {
    notes
        .into_iter()
        .map(|note| {
            let required_combination = fingering::required_combination(&note.name);
            AnnotatedNote {
                name: note.name,
                sequence_index: note.sequence_index,
                required_combination,
            }
        })
        .collect()
}

/// Loads a score file and extracts its ordered note sequence.
pub fn load_score<P: AsRef<Path>>(path: P) -> Result<Vec<NoteDescriptor>, ScoreError> {
    let path = path.as_ref();
    let encoding = ScoreEncoding::from_path(path)?;
    let bytes = fs::read(path)?;
    load_score_bytes(&bytes, encoding)
}

/// Loads a score from raw bytes with a known encoding.
pub fn load_score_bytes(
    bytes: &[u8],
    encoding: ScoreEncoding,
) -> Result<Vec<NoteDescriptor>, ScoreError> {
    let markup = match encoding {
        ScoreEncoding::PlainMarkup => String::from_utf8(bytes.to_vec()).map_err(|e| {
            ScoreError::MalformedDocument {
                message: format!("document is not valid UTF-8: {e}"),
            }
        })?,
        ScoreEncoding::CompressedContainer => unpack_container(bytes)?,
    };
    musicxml::extract_notes(&markup)
}

/// Extracts the score document from a compressed container.
///
/// The container is an archive of deflated entries. The score is taken to
/// be the first markup entry outside `META-INF/`; entries written with
/// streamed sizes are rejected rather than guessed at.
fn unpack_container(bytes: &[u8]) -> Result<String, ScoreError> {
    const ENTRY_SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
    let malformed = |message: &str| ScoreError::MalformedDocument {
        message: message.to_string(),
    };

    let mut offset = 0usize;
    while offset + 30 <= bytes.len() && bytes[offset..offset + 4] == ENTRY_SIGNATURE {
        let header = &bytes[offset..offset + 30];
        let flags = u16::from_le_bytes([header[6], header[7]]);
        let method = u16::from_le_bytes([header[8], header[9]]);
        let compressed_size =
            u32::from_le_bytes([header[18], header[19], header[20], header[21]]) as usize;
        let name_len = u16::from_le_bytes([header[26], header[27]]) as usize;
        let extra_len = u16::from_le_bytes([header[28], header[29]]) as usize;

        let data_start = offset + 30 + name_len + extra_len;
        if offset + 30 + name_len > bytes.len() || data_start + compressed_size > bytes.len() {
            return Err(malformed("container entry is truncated"));
        }
        if flags & 0x0008 != 0 {
            return Err(malformed("container uses streamed entry sizes"));
        }

        let name = String::from_utf8_lossy(&bytes[offset + 30..offset + 30 + name_len]);
        let data = &bytes[data_start..data_start + compressed_size];

        let is_score_entry = !name.starts_with("META-INF/")
            && (name.ends_with(".xml") || name.ends_with(".musicxml"));
        if is_score_entry {
            let markup = match method {
                0 => String::from_utf8(data.to_vec())
                    .map_err(|_| malformed("container entry is not valid UTF-8"))?,
                8 => {
                    let mut decoder = DeflateDecoder::new(data);
                    let mut markup = String::new();
                    decoder
                        .read_to_string(&mut markup)
                        .map_err(|e| malformed(&format!("could not inflate score entry: {e}")))?;
                    markup
                }
                other => {
                    return Err(malformed(&format!(
                        "container entry uses unsupported compression method {other}"
                    )));
                }
            };
            return Ok(markup);
        }

        offset = data_start + compressed_size;
    }

    Err(malformed("no score document found in container"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valves::valve_set;
    use std::path::PathBuf;

    #[test]
    fn test_encoding_detection() {
        let plain = PathBuf::from("piece.musicxml");
        let xml = PathBuf::from("piece.XML");
        let container = PathBuf::from("piece.mxl");
        assert_eq!(ScoreEncoding::from_path(&plain).unwrap(), ScoreEncoding::PlainMarkup);
        assert_eq!(ScoreEncoding::from_path(&xml).unwrap(), ScoreEncoding::PlainMarkup);
        assert_eq!(
            ScoreEncoding::from_path(&container).unwrap(),
            ScoreEncoding::CompressedContainer
        );
        assert!(matches!(
            ScoreEncoding::from_path(&PathBuf::from("piece.pdf")),
            Err(ScoreError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_annotate_applies_fingering_table() {
        let notes = vec![
            NoteDescriptor { name: "D4".to_string(), sequence_index: 0 },
            NoteDescriptor { name: "C4".to_string(), sequence_index: 1 },
            NoteDescriptor { name: "mystery".to_string(), sequence_index: 2 },
        ];
        let annotated = annotate(notes);
        assert_eq!(annotated[0].required_combination, valve_set(&[1, 3]));
        assert!(annotated[1].required_combination.is_empty());
        assert!(annotated[2].required_combination.is_empty());
        assert_eq!(annotated[2].sequence_index, 2);
    }

    /// Builds a minimal single-entry container around a stored payload.
    fn stored_container(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x50, 0x4b, 0x03, 0x04];
        bytes.extend_from_slice(&[20, 0]); // version needed
        bytes.extend_from_slice(&[0, 0]); // flags
        bytes.extend_from_slice(&[0, 0]); // method: stored
        bytes.extend_from_slice(&[0, 0, 0, 0]); // mod time/date
        bytes.extend_from_slice(&[0, 0, 0, 0]); // crc (unchecked)
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&[0, 0]); // extra length
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_container_with_stored_score_entry() {
        let xml = r#"<?xml version="1.0"?>
<score-partwise version="4.0">
  <part id="P1"><measure number="1">
    <note><pitch><step>D</step><octave>4</octave></pitch></note>
  </measure></part>
</score-partwise>"#;
        let container = stored_container("piece.xml", xml.as_bytes());
        let notes =
            load_score_bytes(&container, ScoreEncoding::CompressedContainer).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].name, "D4");
    }

    #[test]
    fn test_container_without_score_entry_is_malformed() {
        let container = stored_container("META-INF/container.xml", b"<container/>");
        let result = load_score_bytes(&container, ScoreEncoding::CompressedContainer);
        assert!(matches!(result, Err(ScoreError::MalformedDocument { .. })));
    }

    #[test]
    fn test_plain_markup_must_be_utf8() {
        let result = load_score_bytes(&[0xff, 0xfe, 0x00], ScoreEncoding::PlainMarkup);
        assert!(matches!(result, Err(ScoreError::MalformedDocument { .. })));
    }
}
