// ============================================================
// Layer 3: Pitch and Pitch-Class Sets
// ============================================================
// A Pitch is a MIDI key number (0..=127, middle C = 60 = "C4").
//
// Spelling: black keys use a fixed spelling with '#' for sharps
// and '-' for flats:
//   C  C#  D  E-  E  F  F#  G  G#  A  B-  B
//
// Chords are reduced to their pitch-class set in NORMAL ORDER:
//   1. take the distinct pitch classes (key mod 12), ascending
//   2. among all rotations pick the one with the smallest span
//      from first to last element
//   3. ties: smallest interval from the first element to the
//      second-to-last, then third-to-last, and so on
//   4. remaining ties (symmetric sets): lowest starting class
//
// Example: B minor triad {2, 6, 11} → [11, 2, 6] → "11.2.6"

use std::cmp::Ordering;
use std::fmt;

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "E-", "E", "F", "F#", "G", "G#", "A", "B-", "B",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pitch(u8);

impl Pitch {
    pub fn from_midi(key: u8) -> Self {
        Self(key)
    }

    /// Pitch class in 0..12, C = 0
    pub fn pitch_class(&self) -> u8 {
        self.0 % 12
    }

    /// Octave number; MIDI keys 0..=11 sit in octave -1
    pub fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PITCH_NAMES[self.pitch_class() as usize], self.octave())
    }
}

/// Normal order of the pitch-class set of `pitches`.
pub fn normal_order(pitches: &[Pitch]) -> Vec<u8> {
    let mut classes: Vec<u8> = pitches.iter().map(Pitch::pitch_class).collect();
    classes.sort_unstable();
    classes.dedup();

    let n = classes.len();
    if n <= 1 {
        return classes;
    }

    // Interval from the first element of a rotation to its k-th element
    let span = |rot: &[u8], k: usize| (rot[k] + 12 - rot[0]) % 12;

    (0..n)
        .map(|start| (0..n).map(|i| classes[(start + i) % n]).collect::<Vec<u8>>())
        .min_by(|a, b| {
            for k in (1..n).rev() {
                match span(a, k).cmp(&span(b, k)) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            a[0].cmp(&b[0])
        })
        .unwrap_or_default()
}
