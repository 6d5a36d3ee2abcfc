// ============================================================
// Layer 3: Score Domain Types
// ============================================================
// What a parsed music file looks like once the file format is
// gone. A parser produces a ScoreView, which is EITHER a list of
// per-instrument parts (when the file could be partitioned by
// instrument) OR one flat stream holding every event in the file.
//
// The extractor never has to guess which one it got: the variant
// says so.

use crate::domain::pitch::{normal_order, Pitch};
use crate::domain::token::Token;

/// One musical event in time order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicEvent {
    /// A single sounding pitch
    Note(Pitch),
    /// Several pitches sounding together
    Chord(Vec<Pitch>),
    /// Percussion hits and anything else without a usable pitch
    Unpitched,
}

impl MusicEvent {
    /// The token for this event, or None for event kinds that carry no token.
    pub fn token(&self) -> Option<Token> {
        match self {
            MusicEvent::Note(p) => Some(Token::new(p.to_string())),
            MusicEvent::Chord(pitches) => {
                let classes: Vec<String> = normal_order(pitches)
                    .iter()
                    .map(|pc| pc.to_string())
                    .collect();
                Some(Token::new(classes.join(".")))
            }
            MusicEvent::Unpitched => None,
        }
    }
}

/// Who plays a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    /// General MIDI program number
    Program(u8),
    /// The MIDI percussion channel
    Percussion,
}

/// All events played by one instrument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub instrument: Instrument,
    pub events:     Vec<MusicEvent>,
}

/// The result of the instrument-partitioning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreView {
    /// One part per instrument, in order of first appearance
    Partitioned(Vec<Part>),
    /// Every event in the file, merged into time order
    Flat(Vec<MusicEvent>),
}

impl ScoreView {
    /// The events the extractor reads tokens from:
    /// the first instrument part, or the whole flat stream.
    pub fn primary_events(&self) -> &[MusicEvent] {
        match self {
            ScoreView::Partitioned(parts) => {
                parts.first().map(|p| p.events.as_slice()).unwrap_or(&[])
            }
            ScoreView::Flat(events) => events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_token_is_pitch_name() {
        let e = MusicEvent::Note(Pitch::from_midi(66));
        assert_eq!(e.token(), Some(Token::from("F#4")));
    }

    #[test]
    fn test_chord_token_is_dot_joined_normal_order() {
        let e = MusicEvent::Chord(vec![
            Pitch::from_midi(59),
            Pitch::from_midi(62),
            Pitch::from_midi(66),
        ]);
        assert_eq!(e.token(), Some(Token::from("11.2.6")));
    }

    #[test]
    fn test_unpitched_has_no_token() {
        assert_eq!(MusicEvent::Unpitched.token(), None);
    }

    #[test]
    fn test_primary_events_uses_first_part_only() {
        let view = ScoreView::Partitioned(vec![
            Part {
                instrument: Instrument::Program(0),
                events:     vec![MusicEvent::Note(Pitch::from_midi(60))],
            },
            Part {
                instrument: Instrument::Program(40),
                events:     vec![MusicEvent::Note(Pitch::from_midi(72))],
            },
        ]);
        assert_eq!(view.primary_events(), &[MusicEvent::Note(Pitch::from_midi(60))]);
    }
}
