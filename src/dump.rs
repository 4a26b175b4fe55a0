//! MIDI event dumping.

use std::{cmp::max, error::Error, fmt::Debug};

use midly::{MetaMessage, Smf, Timing, TrackEventKind};

use crate::time::UnitWidths;

struct Hex<'a>(&'a [u8]);

impl<'a> std::fmt::Display for Hex<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            write!(f, "{}{:02X}", if i != 0 { " " } else { "" }, byte)?;
        }
        Ok(())
    }
}

/// Name and body of meta events that carry text.
fn text_meta<'a>(kind: &TrackEventKind<'a>) -> Option<(&'static str, &'a [u8])> {
    let TrackEventKind::Meta(meta) = kind else {
        return None;
    };
    Some(match *meta {
        MetaMessage::Text(b) => ("Text", b),
        MetaMessage::Copyright(b) => ("Copyright", b),
        MetaMessage::TrackName(b) => ("TrackName", b),
        MetaMessage::InstrumentName(b) => ("InstrumentName", b),
        MetaMessage::Lyric(b) => ("Lyric", b),
        MetaMessage::Marker(b) => ("Marker", b),
        MetaMessage::CuePoint(b) => ("CuePoint", b),
        MetaMessage::ProgramName(b) => ("ProgramName", b),
        MetaMessage::DeviceName(b) => ("DeviceName", b),
        _ => return None,
    })
}

#[derive(Debug)]
struct KindDisplay<'a>(&'a TrackEventKind<'a>);

impl<'a> std::fmt::Display for KindDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((name, text)) = text_meta(self.0) {
            return write!(f, "Meta({name}({:?}))", String::from_utf8_lossy(text));
        }
        match self.0 {
            TrackEventKind::SysEx(b) => write!(f, "SysEx({})", Hex(b)),
            TrackEventKind::Escape(b) => write!(f, "Escape({})", Hex(b)),
            TrackEventKind::Meta(meta) => match meta {
                MetaMessage::SequencerSpecific(b) => {
                    write!(f, "Meta(SequencerSpecific({}))", Hex(b))
                }
                MetaMessage::Unknown(kind, b) => {
                    write!(f, "Meta(Unknown({kind:#04X}, {}))", Hex(b))
                }
                _ => self.0.fmt(f),
            },
            _ => self.0.fmt(f),
        }
    }
}

const TAB_WIDTH: usize = 8;

/// Narrowest event column we wrap text to, however small the terminal.
const MIN_EVENT_WIDTH: usize = 24;

fn next_tab_stop(column: usize) -> usize {
    (column / TAB_WIDTH + 1) * TAB_WIDTH
}

/// Breaks `event` into lines of at most `width` columns, continuing each one after `indent`.
fn wrap_event(event: &str, width: usize, indent: &str) -> String {
    textwrap::wrap(event, width).join(&format!("\n{indent}"))
}

fn timing_display(timing: &Timing) -> String {
    match timing {
        Timing::Metrical(ppqn) => format!("{} pulses per quarter note", ppqn.as_int()),
        Timing::Timecode(fps, subframe) => {
            format!("{} fps, {subframe} ticks per frame", fps.as_f32())
        }
    }
}

/// Prints the events of every converted sequence, one event per line.
pub fn dump(sequences: &[Vec<u8>]) -> Result<(), Box<dyn Error>> {
    let delta_header = "Delta";
    let pulse_header = "Pulse";

    for (seq_i, bytes) in sequences.iter().enumerate() {
        let smf = Smf::parse(bytes)?;
        if seq_i != 0 {
            println!();
        }
        println!("## Sequence {seq_i}\n");
        println!("{}\n", timing_display(&smf.header.timing));

        for track in &smf.tracks {
            let widths = UnitWidths::of(track);
            let delta_width = max(delta_header.chars().count(), widths.delta);
            let pulse_width = max(pulse_header.chars().count(), widths.pulse);
            println!("{delta_header:>delta_width$}\t{pulse_header:>pulse_width$}\tEvent");

            let indent = format!("{:delta_width$}\t{:pulse_width$}\t", "", "");
            let event_column = next_tab_stop(next_tab_stop(delta_width) + pulse_width);
            let event_width = textwrap::termwidth()
                .saturating_sub(event_column)
                .max(MIN_EVENT_WIDTH);

            let mut pulse: u64 = 0;
            for ev in track {
                pulse += u64::from(ev.delta.as_int());
                let mut event = KindDisplay(&ev.kind).to_string();
                if text_meta(&ev.kind).is_some() {
                    event = wrap_event(&event, event_width, &indent);
                }
                println!(
                    "{:>+delta_width$}\t{pulse:>pulse_width$}\t{event}",
                    ev.delta.as_int(),
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_shown_as_text() {
        let kind = TrackEventKind::Meta(MetaMessage::Marker(b"verse\x01"));
        assert_eq!(KindDisplay(&kind).to_string(), r#"Meta(Marker("verse\u{1}"))"#);

        let kind = TrackEventKind::Meta(MetaMessage::SequencerSpecific(&[0x41, 0x10]));
        assert_eq!(
            KindDisplay(&kind).to_string(),
            "Meta(SequencerSpecific(41 10))"
        );
    }

    #[test]
    fn long_text_continues_under_the_event_column() {
        let kind = TrackEventKind::Meta(MetaMessage::Lyric(
            b"the band keeps playing until the long awaited finale",
        ));
        let event = KindDisplay(&kind).to_string();
        let wrapped = wrap_event(&event, MIN_EVENT_WIDTH, "\t\t");
        let lines: Vec<_> = wrapped.split("\n\t\t").collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.len() <= MIN_EVENT_WIDTH));
        assert_eq!(lines.join(" "), event);

        assert_eq!(wrap_event("Meta(Marker(\"A\"))", 80, "\t\t"), "Meta(Marker(\"A\"))");
    }

    #[test]
    fn tab_stops() {
        assert_eq!(next_tab_stop(0), 8);
        assert_eq!(next_tab_stop(5), 8);
        assert_eq!(next_tab_stop(8), 16);
        assert_eq!(next_tab_stop(13), 16);
    }
}
