//! Byte cursor over an in-memory flight file.

use crate::error::DecodeError;

/// Positioned reader over the file bytes.
///
/// Cloning is cheap and yields an independent position, which is how the
/// pull-based views re-scan a flight without disturbing each other.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Borrow `len` bytes starting at an arbitrary offset, without moving.
    pub fn slice_at(&self, start: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = start.checked_add(len).ok_or(DecodeError::UnexpectedEof {
            offset: self.data.len(),
        })?;
        self.data
            .get(start..end)
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.data.len(),
            })
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + len)
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read one CRLF-terminated header line, returning it without the
    /// terminator. A bare LF terminator is tolerated.
    pub fn read_header_line(&mut self) -> Result<&'a str, DecodeError> {
        let start = self.pos;
        let rest = &self.data[start.min(self.data.len())..];
        if rest.is_empty() {
            return Err(DecodeError::UnexpectedEof { offset: start });
        }

        let lf = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.data.len(),
            })?;
        self.pos = start + lf + 1;

        let mut line = &rest[..lf];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        std::str::from_utf8(line).map_err(|_| DecodeError::UnexpectedEof { offset: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_position() {
        let mut cur = Cursor::new(&[0x12, 0x34, 0x56]);
        assert_eq!(cur.read_u16_be().unwrap(), 0x1234);
        assert_eq!(cur.position(), 2);
        assert_eq!(cur.read_u8().unwrap(), 0x56);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn read_past_end_reports_offset() {
        let mut cur = Cursor::new(&[0x01]);
        cur.read_u8().unwrap();
        assert!(matches!(
            cur.read_u8().unwrap_err(),
            DecodeError::UnexpectedEof { offset: 1 }
        ));
    }

    #[test]
    fn header_line_strips_crlf() {
        let mut cur = Cursor::new(b"$P,2*4E\r\n$L,1*00\r\nbinary");
        assert_eq!(cur.read_header_line().unwrap(), "$P,2*4E");
        assert_eq!(cur.read_header_line().unwrap(), "$L,1*00");
        assert_eq!(cur.position(), 18);
    }

    #[test]
    fn header_line_tolerates_bare_lf() {
        let mut cur = Cursor::new(b"$P,2*4E\n");
        assert_eq!(cur.read_header_line().unwrap(), "$P,2*4E");
    }

    #[test]
    fn unterminated_line_is_truncation() {
        let mut cur = Cursor::new(b"$P,2*4E");
        assert!(matches!(
            cur.read_header_line().unwrap_err(),
            DecodeError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn clones_are_independent() {
        let mut a = Cursor::new(&[1, 2, 3, 4]);
        a.read_u8().unwrap();
        let mut b = a.clone();
        b.read_u8().unwrap();
        assert_eq!(a.position(), 1);
        assert_eq!(b.position(), 2);
    }
}
