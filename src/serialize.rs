//! Standard MIDI File output.

use crate::{
    cursor::{Writer, VARLEN_MAX},
    error::Result,
    parse::TIME_SCALE,
    token::{Payload, Token},
};

/// `MThd` chunk plus the `MTrk` tag and length.
pub const HEADER_LEN: usize = 22;
const TRACK_LEN_OFFSET: usize = 18;

/// Pulses per quarter note for a tempo that has already been scaled by [`TIME_SCALE`].
///
/// At most 6039 for any 24-bit tempo, so the result never reaches the SMPTE bit.
pub fn division(tempo: u32) -> u16 {
    let ppqn = (u64::from(tempo) * u64::from(TIME_SCALE)) / 25_000;
    ppqn.min(0x7FFF) as u16
}

/// Writes a single-track Standard MIDI File from tokens sorted by time.
///
/// Output stops after the first end-of-track event. A gap too long for a single delta is cut to
/// the longest one; the events after it then catch up with their real time.
pub fn write_smf(tokens: &[Token], tempo: u32) -> Result<Vec<u8>> {
    let mut out = Writer::new();
    out.write_bytes(b"MThd")?;
    out.write_u32_be(6)?;
    out.write_u16_be(0)?; // format
    out.write_u16_be(1)?; // tracks
    out.write_u16_be(division(tempo))?;
    out.write_bytes(b"MTrk")?;
    out.write_u32_be(0)?;

    let mut time = 0;
    let mut running_status = 0;
    for token in tokens {
        let delta = token.time.saturating_sub(time).min(VARLEN_MAX);
        out.write_varlen(delta)?;
        time += delta;

        if token.status >= 0xF0 {
            running_status = token.status;
            out.write_u8(token.status)?;
            if token.status == 0xFF {
                out.write_u8(token.data)?;
            }
            let body: &[u8] = match token.payload {
                Payload::Borrowed(body) => body,
                _ => &[],
            };
            out.write_varlen(body.len() as u32)?;
            out.write_bytes(body)?;
            if token.is_end_of_track() {
                break;
            }
        } else {
            if token.status != running_status {
                running_status = token.status;
                out.write_u8(token.status)?;
            }
            out.write_u8(token.data)?;
            match token.payload {
                Payload::TrailingByte(value) => out.write_u8(value)?,
                Payload::NoteOffMarker => out.write_u8(0)?,
                Payload::Absent | Payload::Borrowed(_) => {}
            }
        }
    }

    let track_len = (out.tell() - HEADER_LEN) as u32;
    out.seek(TRACK_LEN_OFFSET)?;
    out.write_u32_be(track_len)?;
    Ok(out.into_inner())
}
