//! Big-endian cursors over caller-owned byte buffers

use crate::{DecodeError, GenError};

/// Which output a writer fills, and so which overflow error it raises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Bytecode,
    Metadata,
}

/// Bounds-checked writer; a write that does not fit fails whole and leaves
/// the position unchanged.
pub struct ByteWriter<'b> {
    buf: &'b mut [u8],
    pos: usize,
    section: Section,
}

impl<'b> ByteWriter<'b> {
    pub fn new(buf: &'b mut [u8], section: Section) -> Self {
        Self {
            buf,
            pos: 0,
            section,
        }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> Result<(), GenError> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            let capacity = self.buf.len();
            return Err(match self.section {
                Section::Bytecode => GenError::BytecodeOverflow { capacity },
                Section::Metadata => GenError::MetadataOverflow { capacity },
            });
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn u8(&mut self, value: u8) -> Result<(), GenError> {
        self.bytes(&[value])
    }

    pub fn u16(&mut self, value: u16) -> Result<(), GenError> {
        self.bytes(&value.to_be_bytes())
    }

    pub fn i32(&mut self, value: i32) -> Result<(), GenError> {
        self.bytes(&value.to_be_bytes())
    }

    pub fn f32(&mut self, value: f32) -> Result<(), GenError> {
        self.bytes(&value.to_bits().to_be_bytes())
    }
}

pub struct ByteReader<'b> {
    bytes: &'b [u8],
    pos: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn take(&mut self, len: usize) -> Result<&'b [u8], DecodeError> {
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::UnexpectedEnd { offset: self.pos })?;
        self.pos = end;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(u32::from_be_bytes(self.array()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_big_endian() {
        let mut buf = [0u8; 8];
        let mut w = ByteWriter::new(&mut buf, Section::Bytecode);
        w.u16(0x0102).unwrap();
        w.i32(-2).unwrap();
        assert_eq!(w.position(), 6);
        assert_eq!(&buf[..6], &[0x01, 0x02, 0xff, 0xff, 0xff, 0xfe]);
    }

    #[test]
    fn overflow_leaves_position() {
        let mut buf = [0u8; 3];
        let mut w = ByteWriter::new(&mut buf, Section::Metadata);
        w.u16(7).unwrap();
        assert_eq!(w.u16(8), Err(GenError::MetadataOverflow { capacity: 3 }));
        assert_eq!(w.position(), 2);
        w.u8(9).unwrap();
    }

    #[test]
    fn reader_reports_offset() {
        let mut r = ByteReader::new(&[0x00, 0x2a, 0x01]);
        assert_eq!(r.u16().unwrap(), 42);
        assert_eq!(r.u16(), Err(DecodeError::UnexpectedEnd { offset: 2 }));
        assert_eq!(r.u8().unwrap(), 1);
        assert!(r.is_at_end());
    }
}
