//! Bounds-checked cursor over one encoded message.

use buildscope_core::error::DecodeError;

/// Longest legal varint: ten groups of seven bits cover 64 bits.
pub const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
    /// Group markers (3, 4) and the unassigned values 6 and 7.
    Unsupported(u8),
}

impl WireType {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            0 => WireType::Varint,
            1 => WireType::Fixed64,
            2 => WireType::LengthDelimited,
            5 => WireType::Fixed32,
            other => WireType::Unsupported(other),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
            WireType::Unsupported(b) => b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field: u32,
    pub wire_type: WireType,
}

pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof { offset: self.pos, needed: n, remaining: self.remaining() });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut result: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = *self.buf.get(self.pos).ok_or(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: 1,
                remaining: 0,
            })?;
            self.pos += 1;
            let payload = u64::from(byte & 0x7F);
            // The tenth group only has room for the single remaining bit.
            if i == MAX_VARINT_LEN - 1 && payload > 1 {
                return Err(DecodeError::VarintOverflow { offset: start });
            }
            result |= payload << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(DecodeError::VarintOverflow { offset: start })
    }

    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let offset = self.pos;
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::UnexpectedEof {
            offset,
            needed: usize::MAX,
            remaining: self.remaining(),
        })?;
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof { offset: self.pos, needed: len, remaining: self.remaining() });
        }
        Ok(len)
    }

    /// Length-prefixed payload, borrowed from the underlying buffer.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_len()?;
        self.take(len)
    }

    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let offset = self.pos;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes).map(str::to_string).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.read_fixed32().map(f32::from_bits)
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.read_fixed64().map(f64::from_bits)
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        self.read_varint().map(|v| v != 0)
    }

    pub fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let offset = self.pos;
        let raw = self.read_varint()?;
        let field = u32::try_from(raw >> 3).map_err(|_| DecodeError::InvalidTag { tag: raw, offset })?;
        if field == 0 {
            return Err(DecodeError::InvalidTag { tag: raw, offset });
        }
        #[allow(clippy::cast_possible_truncation)]
        let wire_type = WireType::from_bits((raw & 0x7) as u8);
        Ok(Tag { field, wire_type })
    }

    /// Advance past a field body of the given wire type.
    pub fn skip(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.take(8).map(|_| ()),
            WireType::LengthDelimited => self.read_bytes().map(|_| ()),
            WireType::Fixed32 => self.take(4).map(|_| ()),
            WireType::Unsupported(bits) => Err(DecodeError::UnsupportedWireType { wire_type: bits, offset: self.pos }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_multi_byte() {
        let mut r = WireReader::new(&[0xAC, 0x02]);
        assert_eq!(r.read_varint().expect("varint"), 300);
        assert!(r.is_empty());
    }

    #[test]
    fn varint_above_32_bits() {
        // 2^35 needs six groups; a 32-bit accumulator would wrap this to zero.
        let mut r = WireReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(r.read_varint().expect("varint"), 1u64 << 35);
    }

    #[test]
    fn varint_max_u64() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(WireReader::new(&bytes).read_varint().expect("varint"), u64::MAX);
    }

    #[test]
    fn varint_overflow_rejected() {
        let eleven = [0xFF; 11];
        assert_eq!(WireReader::new(&eleven).read_varint(), Err(DecodeError::VarintOverflow { offset: 0 }));
        let too_wide = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
        assert_eq!(WireReader::new(&too_wide).read_varint(), Err(DecodeError::VarintOverflow { offset: 0 }));
    }

    #[test]
    fn truncated_varint() {
        let mut r = WireReader::new(&[0x80, 0x80]);
        assert!(matches!(r.read_varint(), Err(DecodeError::UnexpectedEof { .. })));
    }

    #[test]
    fn length_beyond_buffer_fails_fast() {
        let mut r = WireReader::new(&[0x05, b'a', b'b']);
        assert_eq!(r.read_bytes(), Err(DecodeError::UnexpectedEof { offset: 1, needed: 5, remaining: 2 }));
    }

    #[test]
    fn fixed_width_little_endian() {
        let mut r = WireReader::new(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(r.read_fixed32().expect("fixed32"), 1);
        assert!((r.read_f32().expect("f32") - 1.0).abs() < f32::EPSILON);
        let wide = 1.5f64.to_le_bytes();
        let mut r = WireReader::new(&wide);
        assert!((r.read_f64().expect("f64") - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn tag_split() {
        let mut r = WireReader::new(&[0x1A]);
        assert_eq!(r.read_tag().expect("tag"), Tag { field: 3, wire_type: WireType::LengthDelimited });
        assert!(matches!(WireReader::new(&[0x02]).read_tag(), Err(DecodeError::InvalidTag { .. })));
    }

    #[test]
    fn skip_policy() {
        let mut r = WireReader::new(&[0x96, 0x01, 1, 2, 3, 4, 5, 6, 7, 8, 0x02, 9, 9, 1, 2, 3, 4]);
        r.skip(WireType::Varint).expect("varint");
        r.skip(WireType::Fixed64).expect("fixed64");
        r.skip(WireType::LengthDelimited).expect("len");
        r.skip(WireType::Fixed32).expect("fixed32");
        assert!(r.is_empty());
        assert!(matches!(
            WireReader::new(&[0x00]).skip(WireType::Unsupported(3)),
            Err(DecodeError::UnsupportedWireType { wire_type: 3, .. })
        ));
    }
}
