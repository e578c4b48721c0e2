//! # Fingering Table Module
//!
//! This module maps written pitch names to the valve combination that
//! produces them on a B-flat trumpet. The table is a fixed static lookup
//! computed once at startup: for each chromatic pitch in the practiced
//! range, the nearest open partial at or above it determines how many
//! semitones of tubing the valves must add, and that offset selects one of
//! the seven standard combinations.
//!
//! ## Features
//! - Written F#3 to C6 coverage, sharp and flat spellings both present
//! - Deterministic, total lookup: unknown names yield the empty set
//! - No learning or adaptation; the table never changes at runtime

use crate::valves::ValveSet;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Written pitches of the open (no-valve) partials, as MIDI numbers.
/// C4, G4, C5, E5, G5 and C6; the out-of-tune seventh partial is skipped.
const OPEN_PARTIALS: [i32; 6] = [60, 67, 72, 76, 79, 84];

/// Valve combination that lowers an open partial by 0..=6 semitones.
const OFFSET_COMBINATIONS: [&[u8]; 7] = [
    &[],        // in tune with the partial
    &[2],       // -1 semitone
    &[1],       // -2
    &[1, 2],    // -3
    &[2, 3],    // -4
    &[1, 3],    // -5
    &[1, 2, 3], // -6
];

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Lowest and highest written pitches in the table (F#3 and C6).
const RANGE_LOW: i32 = 54;
const RANGE_HIGH: i32 = 84;

/// Statically computed fingering table for the practiced range.
///
/// Both enharmonic spellings of each pitch map to the same combination,
/// so the table accepts whichever spelling the score document used.
static FINGERINGS: Lazy<BTreeMap<String, ValveSet>> = Lazy::new(|| {
    let mut table = BTreeMap::new();

    for midi in RANGE_LOW..=RANGE_HIGH {
        // The nearest partial at or above the pitch; the valves can only
        // lower a partial, and only by six semitones at most.
        let offset = match OPEN_PARTIALS
            .iter()
            .find(|&&p| p >= midi && p - midi <= 6)
        {
            Some(p) => (p - midi) as usize,
            None => continue,
        };
        let combination: ValveSet = OFFSET_COMBINATIONS[offset].iter().copied().collect();

        let pitch_class = (midi % 12) as usize;
        // MIDI 60 is C4; the octave number changes at C.
        let octave = midi / 12 - 1;

        table.insert(
            format!("{}{}", SHARP_NAMES[pitch_class], octave),
            combination.clone(),
        );
        if FLAT_NAMES[pitch_class] != SHARP_NAMES[pitch_class] {
            table.insert(format!("{}{}", FLAT_NAMES[pitch_class], octave), combination);
        }
    }

    table
});

/// Looks up the valve combination for a written pitch name.
///
/// Deterministic and total: pitch names not present in the table yield the
/// empty set. That fallback is a defined result, not a failure; an
/// unrecognized note is practiced as an open note.
///
/// # Arguments
/// * `pitch_name` - Written pitch, e.g. "F#4", "Bb3", "c5"
pub fn required_combination(pitch_name: &str) -> ValveSet {
    FINGERINGS
        .get(&canonical_name(pitch_name))
        .cloned()
        .unwrap_or_default()
}

/// Normalizes a pitch name to the table's spelling: uppercase note letter,
/// accidental and octave left as written.
fn canonical_name(pitch_name: &str) -> String {
    let trimmed = pitch_name.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valves::valve_set;

    #[test]
    fn test_open_partials_use_no_valves() {
        for name in ["C4", "G4", "C5", "E5", "G5", "C6"] {
            assert!(required_combination(name).is_empty(), "{name} should be open");
        }
    }

    #[test]
    fn test_standard_fingerings() {
        assert_eq!(required_combination("F#4"), valve_set(&[2]));
        assert_eq!(required_combination("F4"), valve_set(&[1]));
        assert_eq!(required_combination("E4"), valve_set(&[1, 2]));
        assert_eq!(required_combination("Eb4"), valve_set(&[2, 3]));
        assert_eq!(required_combination("D4"), valve_set(&[1, 3]));
        assert_eq!(required_combination("C#4"), valve_set(&[1, 2, 3]));
        assert_eq!(required_combination("A4"), valve_set(&[1, 2]));
        assert_eq!(required_combination("Bb4"), valve_set(&[1]));
    }

    #[test]
    fn test_enharmonic_spellings_agree() {
        assert_eq!(required_combination("F#4"), required_combination("Gb4"));
        assert_eq!(required_combination("D#4"), required_combination("Eb4"));
    }

    #[test]
    fn test_lowercase_letter_is_accepted() {
        assert_eq!(required_combination("f#4"), required_combination("F#4"));
    }

    #[test]
    fn test_unknown_names_fall_back_to_empty() {
        for name in ["H2", "C99", "rest", "", "F#9", "C0"] {
            assert!(required_combination(name).is_empty(), "{name:?} should fall back");
        }
    }

    #[test]
    fn test_range_extremes() {
        assert_eq!(required_combination("F#3"), valve_set(&[1, 2, 3]));
        assert!(required_combination("C6").is_empty());
    }
}
