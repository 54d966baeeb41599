//! Rune-level cursor over the query source.

use crate::error::ReadError;

/// Decodes UTF-8 one rune at a time and tracks the byte offset.
///
/// Only the most recent read can be reverted: a second
/// [`unread_rune`](RuneReader::unread_rune) without an intervening read does
/// nothing. A peek is a read followed by an unread, so unreading right after a
/// peek does nothing either.
#[derive(Debug, Clone)]
pub struct RuneReader {
    src: Vec<u8>,
    offset: usize,
    last_width: usize,
}

impl RuneReader {
    pub fn new(src: impl Into<Vec<u8>>) -> Self {
        RuneReader {
            src: src.into(),
            offset: 0,
            last_width: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Consumes the next rune, returning it with its width in bytes.
    ///
    /// A failed read leaves nothing to unread.
    pub fn read_rune(&mut self) -> Result<(char, usize), ReadError> {
        match self.decode_at(self.offset) {
            Ok((c, width)) => {
                self.offset += width;
                self.last_width = width;
                Ok((c, width))
            }
            Err(e) => {
                self.last_width = 0;
                Err(e)
            }
        }
    }

    /// Reverts the last successful read.
    pub fn unread_rune(&mut self) {
        self.offset -= self.last_width;
        self.last_width = 0;
    }

    /// Reads the next rune without moving the cursor.
    pub fn peek_rune(&mut self) -> Result<(char, usize), ReadError> {
        let res = self.read_rune();
        self.unread_rune();
        res
    }

    /// Consumes whitespace up to the next non-space rune or end of input.
    ///
    /// Never fails: a decode error is left in place for the next read to report.
    pub fn skip_spaces(&mut self) {
        while let Ok((c, _)) = self.peek_rune() {
            if !c.is_whitespace() {
                break;
            }
            let _ = self.read_rune();
        }
    }

    /// Source text in `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<&str, ReadError> {
        let bytes = self
            .src
            .get(start..end)
            .ok_or(ReadError::OutOfBounds { start, end })?;
        std::str::from_utf8(bytes).map_err(|e| ReadError::InvalidUtf8 {
            offset: start + e.valid_up_to(),
        })
    }

    fn decode_at(&self, offset: usize) -> Result<(char, usize), ReadError> {
        let lead = *self.src.get(offset).ok_or(ReadError::Eof)?;
        let width = utf8_width(lead);
        let invalid = ReadError::InvalidUtf8 { offset };
        if width == 0 {
            return Err(invalid);
        }
        let bytes = self.src.get(offset..offset + width).ok_or(invalid)?;
        let c = std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or(invalid)?;
        Ok((c, width))
    }
}

// Length of the sequence introduced by a leading byte, 0 if it cannot lead one.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tracks_offset_and_width() {
        let mut rdr = RuneReader::new("aé€😀");
        assert_eq!(rdr.read_rune(), Ok(('a', 1)));
        assert_eq!(rdr.read_rune(), Ok(('é', 2)));
        assert_eq!(rdr.read_rune(), Ok(('€', 3)));
        assert_eq!(rdr.read_rune(), Ok(('😀', 4)));
        assert_eq!(rdr.offset(), 10);
        assert_eq!(rdr.read_rune(), Err(ReadError::Eof));
        assert_eq!(rdr.offset(), 10);
    }

    #[test]
    fn test_peek_leaves_cursor() {
        let mut rdr = RuneReader::new("xy");
        assert_eq!(rdr.peek_rune(), Ok(('x', 1)));
        assert_eq!(rdr.peek_rune(), Ok(('x', 1)));
        assert_eq!(rdr.offset(), 0);
        assert_eq!(rdr.read_rune(), Ok(('x', 1)));
        assert_eq!(rdr.peek_rune(), Ok(('y', 1)));
        assert_eq!(rdr.offset(), 1);
    }

    #[test]
    fn test_unread_is_single_level() {
        let mut rdr = RuneReader::new("abc");
        rdr.read_rune().unwrap();
        rdr.read_rune().unwrap();
        rdr.unread_rune();
        assert_eq!(rdr.offset(), 1);
        rdr.unread_rune();
        assert_eq!(rdr.offset(), 1);
    }

    #[test]
    fn test_unread_after_peek_is_noop() {
        let mut rdr = RuneReader::new("ab");
        rdr.read_rune().unwrap();
        rdr.peek_rune().unwrap();
        rdr.unread_rune();
        assert_eq!(rdr.offset(), 1);
    }

    #[test]
    fn test_skip_spaces() {
        let mut rdr = RuneReader::new(" \t\n\u{3000}x ");
        rdr.skip_spaces();
        assert_eq!(rdr.peek_rune(), Ok(('x', 1)));
        rdr.read_rune().unwrap();
        rdr.skip_spaces();
        assert_eq!(rdr.peek_rune(), Err(ReadError::Eof));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut rdr = RuneReader::new(b"a\xffb".to_vec());
        assert_eq!(rdr.read_rune(), Ok(('a', 1)));
        assert_eq!(rdr.peek_rune(), Err(ReadError::InvalidUtf8 { offset: 1 }));
        assert_eq!(rdr.read_rune(), Err(ReadError::InvalidUtf8 { offset: 1 }));
        assert_eq!(rdr.offset(), 1);
    }

    #[test]
    fn test_len_counts_bytes() {
        let rdr = RuneReader::new("héllo");
        assert_eq!(rdr.len(), 6);
        assert!(!rdr.is_empty());
        assert!(RuneReader::new("").is_empty());
    }

    #[test]
    fn test_truncated_sequence() {
        // First two bytes of a three byte sequence
        let mut rdr = RuneReader::new(b"\xe2\x82".to_vec());
        assert_eq!(rdr.read_rune(), Err(ReadError::InvalidUtf8 { offset: 0 }));
    }

    #[test]
    fn test_slice() {
        let rdr = RuneReader::new("héllo");
        assert_eq!(rdr.slice(0, 3), Ok("hé"));
        assert_eq!(rdr.slice(3, 6), Ok("llo"));
        assert_eq!(rdr.slice(4, 9), Err(ReadError::OutOfBounds { start: 4, end: 9 }));
        assert!(matches!(rdr.slice(2, 3), Err(ReadError::InvalidUtf8 { .. })));
    }
}
