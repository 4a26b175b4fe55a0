//! XMI event stream decoding.
//!
//! XMI differs from a Standard MIDI track in two ways that matter here:
//!
//! * Delays are written as a run of bytes below 0x80 in front of an event, each one adding its
//!   value to the current time.
//! * Notes have no release event. Instead, every note-on carries a variable-length duration
//!   after its velocity, and the matching note-off has to be synthesized.
//!
//! All times are multiplied by [`TIME_SCALE`] to keep the resolution of XMI's 120 Hz clock once
//! it is expressed in MIDI pulses.

use tracing::{debug, warn};

use crate::{
    cursor::Reader,
    error::Result,
    token::{Payload, Token},
};

pub const TIME_SCALE: u32 = 3;

/// Microseconds per quarter note if the chunk never sets a tempo.
pub const DEFAULT_TEMPO: u32 = 500_000;

const META: u8 = 0xFF;
const META_END_OF_TRACK: u8 = 0x2F;
const META_TEMPO: u8 = 0x51;

/// Decoder state for a single chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserState {
    pub time: u32,
    pub tempo: u32,
    pub tempo_captured: bool,
    pub ended: bool,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            time: 0,
            tempo: DEFAULT_TEMPO,
            tempo_captured: false,
            ended: false,
        }
    }
}

/// Unsorted events of one `EVNT` chunk.
#[derive(Debug)]
pub struct ParsedChunk<'a> {
    /// Input offset of the first event byte.
    pub offset: usize,
    pub tokens: Vec<Token<'a>>,
    pub tempo: u32,
}

/// Decodes events until the end-of-track event or the end of the input.
///
/// A truncated event ends the chunk early. Everything decoded up to that point is kept.
pub fn parse_chunk<'a>(reader: &mut Reader<'a>) -> ParsedChunk<'a> {
    let offset = reader.tell();
    let mut state = ParserState::default();
    let mut tokens = Vec::new();

    while !state.ended && !reader.is_eof() {
        if let Err(e) = parse_event(reader, &mut state, &mut tokens) {
            if e.is_out_of_bounds() {
                debug!(
                    "EVNT chunk at {offset:#x} is cut short at {:#x}, keeping {} events",
                    reader.tell(),
                    tokens.len()
                );
            } else {
                warn!("EVNT chunk at {offset:#x}: {e}, keeping {} events", tokens.len());
            }
            break;
        }
    }
    if state.ended {
        hold_end_of_track(&mut tokens);
    }
    ParsedChunk {
        offset,
        tokens,
        tempo: state.tempo,
    }
}

/// Accumulates the delay in front of an event and returns its status byte, or `None` if the
/// input ends first.
fn read_status(reader: &mut Reader, state: &mut ParserState) -> Result<Option<u8>> {
    while !reader.is_eof() {
        let byte = reader.read_u8()?;
        if byte & 0x80 != 0 {
            return Ok(Some(byte));
        }
        state.time = state.time.saturating_add(u32::from(byte) * TIME_SCALE);
    }
    Ok(None)
}

pub fn parse_event<'a>(
    reader: &mut Reader<'a>,
    state: &mut ParserState,
    tokens: &mut Vec<Token<'a>>,
) -> Result<()> {
    let Some(status) = read_status(reader, state)? else {
        return Ok(());
    };
    let time = state.time;

    match status & 0xF0 {
        0xC0 | 0xD0 => {
            let data = reader.read_u8()?;
            tokens.push(Token {
                time,
                status,
                data,
                payload: Payload::Absent,
            });
        }
        0x80 | 0xA0 | 0xB0 | 0xE0 => {
            let data = reader.read_u8()?;
            let value = reader.read_u8()?;
            tokens.push(Token {
                time,
                status,
                data,
                payload: Payload::TrailingByte(value),
            });
        }
        0x90 => {
            let key = reader.read_u8()?;
            let vel = reader.read_u8()?;
            let duration = reader.read_varlen()?;
            let on = Token {
                time,
                status,
                data: key,
                payload: Payload::TrailingByte(vel),
            };
            tokens.push(on);
            tokens.push(Token {
                time: time.saturating_add(duration.saturating_mul(TIME_SCALE)),
                payload: Payload::NoteOffMarker,
                ..on
            });
        }
        _ => parse_system(reader, state, tokens, status, time)?,
    }
    Ok(())
}

fn parse_system<'a>(
    reader: &mut Reader<'a>,
    state: &mut ParserState,
    tokens: &mut Vec<Token<'a>>,
    status: u8,
    time: u32,
) -> Result<()> {
    let mut data = 0;
    if status == META {
        data = reader.read_u8()?;
        match data {
            META_END_OF_TRACK => state.ended = true,
            META_TEMPO if state.tempo_captured => {
                let len = reader.read_varlen()?;
                return reader.skip(len as isize);
            }
            META_TEMPO => {
                reader.skip(1)?;
                state.tempo = reader.read_u24_be()? * TIME_SCALE;
                state.tempo_captured = true;
                // Back to the length byte, so that the event is kept as-is.
                reader.skip(-4)?;
            }
            _ => {}
        }
    }

    let len = reader.read_varlen()?;
    let body = reader.read_bytes(len as usize)?;
    tokens.push(Token {
        time,
        status,
        data,
        payload: Payload::Borrowed(body),
    });
    Ok(())
}

/// Moves the end-of-track event behind any note that is still held when it occurs.
fn hold_end_of_track(tokens: &mut [Token]) {
    let Some(latest) = tokens.iter().map(|t| t.time).max() else {
        return;
    };
    if let Some(end) = tokens.last_mut().filter(|t| t.is_end_of_track()) {
        end.time = end.time.max(latest);
    }
}
