//! Minimal DER reader/writer covering what certificate names need.
//!
//! Only single-byte tags and definite lengths are accepted; that is all
//! RFC 5280 `Name` values ever use.

pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_SET: u8 = 0x31;
pub const TAG_OID: u8 = 0x06;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerError {
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),
    #[error("expected tag 0x{expected:02x}, found 0x{found:02x} at offset {offset}")]
    UnexpectedTag { expected: u8, found: u8, offset: usize },
    #[error("indefinite length at offset {0}")]
    IndefiniteLength(usize),
    #[error("length at offset {0} overflows")]
    LengthOverflow(usize),
    #[error("multi-byte tag at offset {0} is not supported")]
    HighTagNumber(usize),
    #[error("{0} trailing byte(s) after value")]
    TrailingBytes(usize),
    #[error("malformed object identifier")]
    InvalidOid,
}

/// A decoded tag-length-value triple borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// Content octets.
    pub value: &'a [u8],
    /// Full encoding including tag and length.
    pub raw: &'a [u8],
}

pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn byte(&mut self) -> Result<u8, DerError> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or(DerError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_any(&mut self) -> Result<Tlv<'a>, DerError> {
        let start = self.pos;
        let tag = self.byte()?;
        if tag & 0x1f == 0x1f {
            return Err(DerError::HighTagNumber(start));
        }
        let first = self.byte()?;
        let len = match first {
            0x80 => return Err(DerError::IndefiniteLength(start)),
            n if n < 0x80 => n as usize,
            n => {
                let count = (n & 0x7f) as usize;
                if count > std::mem::size_of::<usize>() {
                    return Err(DerError::LengthOverflow(start));
                }
                let mut len = 0usize;
                for _ in 0..count {
                    len = (len << 8) | self.byte()? as usize;
                }
                len
            }
        };
        let end = self
            .pos
            .checked_add(len)
            .ok_or(DerError::LengthOverflow(start))?;
        if end > self.input.len() {
            return Err(DerError::Truncated(self.input.len()));
        }
        let value = &self.input[self.pos..end];
        self.pos = end;
        Ok(Tlv {
            tag,
            value,
            raw: &self.input[start..end],
        })
    }

    pub fn read(&mut self, expected: u8) -> Result<Tlv<'a>, DerError> {
        let offset = self.pos;
        let tlv = self.read_any()?;
        if tlv.tag != expected {
            return Err(DerError::UnexpectedTag {
                expected,
                found: tlv.tag,
                offset,
            });
        }
        Ok(tlv)
    }

    pub fn finish(&self) -> Result<(), DerError> {
        let remaining = self.input.len().saturating_sub(self.pos);
        if remaining > 0 {
            return Err(DerError::TrailingBytes(remaining));
        }
        Ok(())
    }
}

pub fn decode_oid(bytes: &[u8]) -> Result<Vec<u64>, DerError> {
    if bytes.is_empty() {
        return Err(DerError::InvalidOid);
    }
    let mut arcs = Vec::new();
    let mut acc: u64 = 0;
    let mut pending = false;
    for &b in bytes {
        // 0x80 as the first octet of a subidentifier is a non-minimal encoding.
        if !pending && b == 0x80 {
            return Err(DerError::InvalidOid);
        }
        if acc > (u64::MAX >> 7) {
            return Err(DerError::InvalidOid);
        }
        acc = (acc << 7) | u64::from(b & 0x7f);
        pending = true;
        if b & 0x80 == 0 {
            if arcs.is_empty() {
                let first = match acc {
                    0..=39 => 0,
                    40..=79 => 1,
                    _ => 2,
                };
                arcs.push(first);
                arcs.push(acc - first * 40);
            } else {
                arcs.push(acc);
            }
            acc = 0;
            pending = false;
        }
    }
    if pending {
        return Err(DerError::InvalidOid);
    }
    Ok(arcs)
}

/// The first two arcs share one subidentifier. The first arc is 0, 1 or 2,
/// and only under 2 may the second reach 40.
pub fn oid_head(first: u64, second: u64) -> Result<u64, DerError> {
    if first > 2 || (first < 2 && second >= 40) {
        return Err(DerError::InvalidOid);
    }
    first
        .checked_mul(40)
        .and_then(|base| base.checked_add(second))
        .ok_or(DerError::InvalidOid)
}

pub fn encode_oid(arcs: &[u64], out: &mut Vec<u8>) -> Result<(), DerError> {
    let [first, second, rest @ ..] = arcs else {
        return Err(DerError::InvalidOid);
    };
    let mut content = Vec::new();
    encode_base128(oid_head(*first, *second)?, &mut content);
    for arc in rest {
        encode_base128(*arc, &mut content);
    }
    encode_tlv(TAG_OID, &content, out);
    Ok(())
}

fn encode_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut stack = [0u8; 10];
    let mut n = 0;
    loop {
        stack[n] = (value & 0x7f) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(stack[i] | continuation);
    }
}

pub fn encode_tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(content);
}
