// ============================================================
// Layer 4: MIDI Loader
// ============================================================
// Reads Standard MIDI Files with the midly crate and turns them
// into a ScoreView.
//
// How a MIDI file becomes events:
//   - every track is walked, delta times summed into absolute ticks
//   - each NoteOn with velocity > 0 is an onset
//   - onsets in the same track at the same tick form one event:
//       one distinct key  → Note
//       several keys      → Chord
//       only drum keys    → Unpitched   (channel 10, index 9)
//
// Instrument partitioning:
//   A file that carries ProgramChange messages is split into one
//   part per instrument (program, or percussion), ordered by the
//   first onset of each instrument. A file with no ProgramChange
//   at all has no instrument information and is returned as a
//   single flat stream of every track's events in tick order.
//
// Reference: midly crate documentation

use anyhow::{Context, Result};
use midly::{MidiMessage, Smf, TrackEventKind};
use std::{collections::HashMap, fs, path::Path};

use crate::domain::pitch::Pitch;
use crate::domain::score::{Instrument, MusicEvent, Part, ScoreView};
use crate::domain::traits::ScoreParser;

/// MIDI channel 10, counted from zero
const PERCUSSION_CHANNEL: u8 = 9;

/// Parses .mid files; stateless, so one instance serves a whole corpus.
#[derive(Debug, Default, Clone, Copy)]
pub struct MidiLoader;

impl MidiLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ScoreParser for MidiLoader {
    fn parse(&self, path: &Path) -> Result<ScoreView> {
        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;

        let smf = Smf::parse(&bytes)
            .map_err(|e| anyhow::anyhow!("midly parse error in '{}': {e}", path.display()))?;

        Ok(score_view(&smf))
    }
}

/// One sounding key with everything needed to place it
#[derive(Debug, Clone, Copy)]
struct Onset {
    tick:       u64,
    track:      usize,
    key:        u8,
    instrument: Instrument,
}

/// Build the partitioned or flat view of a parsed file.
fn score_view(smf: &Smf) -> ScoreView {
    let (mut onsets, has_programs) = collect_onsets(smf);

    // Stable sort keeps file order for onsets that share a tick and track
    onsets.sort_by_key(|o| (o.tick, o.track));

    if !has_programs {
        return ScoreView::Flat(group_events(&onsets));
    }

    // Group by instrument, parts in order of first appearance
    let mut order: Vec<Instrument> = Vec::new();
    let mut by_instrument: HashMap<Instrument, Vec<Onset>> = HashMap::new();
    for onset in onsets {
        by_instrument
            .entry(onset.instrument)
            .or_insert_with(|| {
                order.push(onset.instrument);
                Vec::new()
            })
            .push(onset);
    }

    let parts = order
        .into_iter()
        .map(|instrument| Part {
            instrument,
            events: group_events(by_instrument.get(&instrument).map_or(&[][..], Vec::as_slice)),
        })
        .collect();

    ScoreView::Partitioned(parts)
}

/// Walk every track and collect note onsets.
/// Also reports whether any ProgramChange was seen.
fn collect_onsets(smf: &Smf) -> (Vec<Onset>, bool) {
    let mut onsets       = Vec::new();
    let mut has_programs = false;

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        // Program currently selected on each channel of this track
        let mut programs = [0u8; 16];

        for event in track {
            tick += u64::from(event.delta.as_int());

            if let TrackEventKind::Midi { channel, message } = event.kind {
                let channel = channel.as_int();
                match message {
                    MidiMessage::ProgramChange { program } => {
                        has_programs = true;
                        programs[channel as usize] = program.as_int();
                    }
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        let instrument = if channel == PERCUSSION_CHANNEL {
                            Instrument::Percussion
                        } else {
                            Instrument::Program(programs[channel as usize])
                        };
                        onsets.push(Onset {
                            tick,
                            track: track_idx,
                            key: key.as_int(),
                            instrument,
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    (onsets, has_programs)
}

/// Merge time-sorted onsets sharing (tick, track) into events.
fn group_events(onsets: &[Onset]) -> Vec<MusicEvent> {
    let mut events = Vec::new();
    let mut start  = 0usize;

    while start < onsets.len() {
        let head = onsets[start];
        let end  = onsets[start..]
            .iter()
            .position(|o| o.tick != head.tick || o.track != head.track)
            .map_or(onsets.len(), |offset| start + offset);

        let mut keys: Vec<u8> = onsets[start..end]
            .iter()
            .filter(|o| o.instrument != Instrument::Percussion)
            .map(|o| o.key)
            .collect();
        keys.sort_unstable();
        keys.dedup();

        events.push(match keys.as_slice() {
            []    => MusicEvent::Unpitched,
            [key] => MusicEvent::Note(Pitch::from_midi(*key)),
            _     => MusicEvent::Chord(keys.iter().copied().map(Pitch::from_midi).collect()),
        });

        start = end;
    }

    events
}
