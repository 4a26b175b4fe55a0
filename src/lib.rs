//! Conversion of XMI (Extended MIDI) event tracks into Standard MIDI Files.
//!
//! An XMI file can hold several sequences, each stored in its own `EVNT` chunk. [`transcode`]
//! turns every one of them into an independent single-track (format 0) SMF.

pub mod cursor;
pub mod error;
pub mod parse;
pub mod scan;
pub mod serialize;
pub mod token;

use rayon::prelude::*;
use tracing::warn;

pub use error::{Error, Result};

use crate::{parse::ParsedChunk, scan::Chunks, serialize::write_smf, token::sort_tokens};

/// Sorts and writes the events of a single chunk.
pub fn convert_chunk(mut chunk: ParsedChunk) -> Result<Vec<u8>> {
    sort_tokens(&mut chunk.tokens);
    write_smf(&chunk.tokens, chunk.tempo)
}

/// Converts every `EVNT` chunk in `xmi` into a Standard MIDI File.
///
/// Chunks without events, and chunks whose output can't be allocated, are left out. An empty
/// result means that nothing in `xmi` could be converted.
pub fn transcode(xmi: &[u8]) -> Vec<Vec<u8>> {
    let chunks: Vec<_> = Chunks::new(xmi).collect();
    chunks
        .into_par_iter()
        .filter_map(|chunk| {
            let offset = chunk.offset;
            convert_chunk(chunk)
                .inspect_err(|e| warn!("EVNT chunk at {offset:#x}: dropped ({e})"))
                .ok()
        })
        .collect()
}
