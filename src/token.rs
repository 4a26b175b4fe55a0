//! Decoded events, timed in absolute ticks.

/// Whatever follows a token's data byte in the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Program change and channel pressure only carry one data byte.
    Absent,
    /// Second data byte, copied from the input.
    TrailingByte(u8),
    /// Release derived from a note's duration; written as a zero velocity.
    NoteOffMarker,
    /// Meta or system event body, pointing into the input.
    Borrowed(&'a [u8]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub time: u32,
    pub status: u8,
    pub data: u8,
    pub payload: Payload<'a>,
}

impl<'a> Token<'a> {
    pub fn is_note_on(&self) -> bool {
        self.status & 0xF0 == 0x90 && !matches!(self.payload, Payload::NoteOffMarker)
    }

    pub fn is_end_of_track(&self) -> bool {
        self.status == 0xFF && self.data == 0x2F
    }
}

/// Sorts by absolute time. Tokens with the same time keep the order they were decoded in.
pub fn sort_tokens(tokens: &mut [Token]) {
    tokens.sort_by_key(|token| token.time);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(time: u32, status: u8, data: u8) -> Token<'static> {
        Token {
            time,
            status,
            data,
            payload: Payload::Absent,
        }
    }

    #[test]
    fn sort_is_stable() {
        let mut tokens = vec![
            token(30, 0xC0, 1),
            token(0, 0xC0, 2),
            token(30, 0xC1, 3),
            token(0, 0xC1, 4),
            token(15, 0xC0, 5),
            token(30, 0xC2, 6),
        ];
        sort_tokens(&mut tokens);
        let order: Vec<u8> = tokens.iter().map(|t| t.data).collect();
        assert_eq!(order, [2, 4, 5, 1, 3, 6]);
    }

    #[test]
    fn synthesized_release_is_not_a_note_on() {
        let on = Token {
            payload: Payload::TrailingByte(100),
            ..token(0, 0x93, 60)
        };
        let off = Token {
            payload: Payload::NoteOffMarker,
            ..on
        };
        assert!(on.is_note_on());
        assert!(!off.is_note_on());
    }
}
