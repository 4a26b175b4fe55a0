//! Column widths for pulse counts.

use std::cmp::max;

use midly::{num::u28, TrackEvent};

fn digits(value: u64) -> usize {
    (max(value, 1).ilog10() + 1) as usize
}

#[derive(Clone, Copy)]
pub struct UnitWidths {
    pub delta: usize,
    pub pulse: usize,
}

impl UnitWidths {
    pub fn of(track: &[TrackEvent]) -> Self {
        let delta_max = track.iter().fold(u28::new(0), |acc, ev| max(acc, ev.delta));
        let pulse_total = track
            .iter()
            .fold(0u64, |acc, ev| acc + u64::from(ev.delta.as_int()));
        UnitWidths {
            // Deltas are shown with a sign.
            delta: digits(delta_max.as_int().into()) + 1,
            pulse: digits(pulse_total),
        }
    }
}
