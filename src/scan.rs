//! Locating `EVNT` chunks inside an XMI file.

use tracing::debug;

use crate::{
    cursor::Reader,
    parse::{parse_chunk, ParsedChunk},
};

pub const EVENT_CHUNK_TAG: &[u8; 4] = b"EVNT";

/// Tag plus the big-endian chunk length, which is not needed to find the end of the stream.
const EVENT_CHUNK_HEADER_LEN: isize = 8;

/// Yields the decoded events of every `EVNT` chunk with at least one event, in file order.
///
/// Each search starts where the previous chunk's event stream stopped.
pub struct Chunks<'a> {
    reader: Reader<'a>,
}

impl<'a> Chunks<'a> {
    pub fn new(xmi: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(xmi),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = ParsedChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.reader.scan_to(EVENT_CHUNK_TAG).ok()?;
            let tag_offset = self.reader.tell();
            if let Err(e) = self.reader.skip(EVENT_CHUNK_HEADER_LEN) {
                debug!("EVNT chunk at {tag_offset:#x}: header cut short ({e})");
                return None;
            }
            let chunk = parse_chunk(&mut self.reader);
            if chunk.tokens.is_empty() {
                debug!("EVNT chunk at {tag_offset:#x}: no events, skipping");
                continue;
            }
            debug!(
                "EVNT chunk at {tag_offset:#x}: {} events, ends at {:#x}",
                chunk.tokens.len(),
                self.reader.tell()
            );
            return Some(chunk);
        }
    }
}
