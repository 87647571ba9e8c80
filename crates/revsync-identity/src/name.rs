//! X.509 distinguished names: parsing, normalization, and string rendering.

use std::fmt;
use std::str::FromStr;

use crate::der::{self, DerError, Reader, TAG_OID, TAG_SEQUENCE, TAG_SET};

const TAG_UTF8_STRING: u8 = 0x0c;
const TAG_NUMERIC_STRING: u8 = 0x12;
const TAG_PRINTABLE_STRING: u8 = 0x13;
const TAG_T61_STRING: u8 = 0x14;
const TAG_IA5_STRING: u8 = 0x16;
const TAG_VISIBLE_STRING: u8 = 0x1a;
const TAG_UNIVERSAL_STRING: u8 = 0x1c;
const TAG_BMP_STRING: u8 = 0x1e;

/// Object identifier. Ordering is lexicographic over the arcs, so a prefix
/// sorts before any longer identifier that extends it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(Vec<u64>);

impl Oid {
    /// At least two arcs whose leading pair fits a single subidentifier.
    pub fn new(arcs: impl Into<Vec<u64>>) -> Result<Self, DerError> {
        let arcs = arcs.into();
        match arcs.as_slice() {
            [first, second, ..] => der::oid_head(*first, *second)?,
            _ => return Err(DerError::InvalidOid),
        };
        Ok(Oid(arcs))
    }

    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    /// Conventional short name for well-known attribute types.
    pub fn short_name(&self) -> Option<&'static str> {
        let name = match self.0.as_slice() {
            [2, 5, 4, 3] => "CN",
            [2, 5, 4, 5] => "SERIALNUMBER",
            [2, 5, 4, 6] => "C",
            [2, 5, 4, 7] => "L",
            [2, 5, 4, 8] => "ST",
            [2, 5, 4, 9] => "STREET",
            [2, 5, 4, 10] => "O",
            [2, 5, 4, 11] => "OU",
            [2, 5, 4, 17] => "POSTALCODE",
            [0, 9, 2342, 19200300, 100, 1, 1] => "UID",
            [0, 9, 2342, 19200300, 100, 1, 25] => "DC",
            [1, 2, 840, 113549, 1, 9, 1] => "emailAddress",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = DerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(|arc| arc.parse::<u64>().map_err(|_| DerError::InvalidOid))
            .collect::<Result<Vec<_>, _>>()?;
        Oid::new(arcs)
    }
}

/// Raw attribute value: the universal tag plus content octets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeValue {
    pub tag: u8,
    pub bytes: Vec<u8>,
}

impl AttributeValue {
    pub fn utf8(value: &str) -> Self {
        Self {
            tag: TAG_UTF8_STRING,
            bytes: value.as_bytes().to_vec(),
        }
    }

    pub fn printable(value: &str) -> Self {
        Self {
            tag: TAG_PRINTABLE_STRING,
            bytes: value.as_bytes().to_vec(),
        }
    }

    /// Decode string-typed values. Returns `None` for non-string types or
    /// content that is not valid for its declared string type.
    pub fn as_text(&self) -> Option<String> {
        match self.tag {
            TAG_UTF8_STRING | TAG_PRINTABLE_STRING | TAG_IA5_STRING | TAG_NUMERIC_STRING
            | TAG_VISIBLE_STRING => String::from_utf8(self.bytes.clone()).ok(),
            // T.61 in practice carries Latin-1.
            TAG_T61_STRING => Some(self.bytes.iter().map(|&b| b as char).collect()),
            TAG_BMP_STRING => {
                if self.bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = self
                    .bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            }
            TAG_UNIVERSAL_STRING => {
                if self.bytes.len() % 4 != 0 {
                    return None;
                }
                self.bytes
                    .chunks_exact(4)
                    .map(|c| char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
                    .collect()
            }
            _ => None,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        der::encode_tlv(self.tag, &self.bytes, out);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub oid: Oid,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(oid: Oid, value: AttributeValue) -> Self {
        Self { oid, value }
    }

    fn render(&self, out: &mut String) {
        match (self.oid.short_name(), self.value.as_text()) {
            (Some(short), Some(text)) => {
                out.push_str(short);
                out.push('=');
                escape_value(&text, out);
            }
            (None, Some(text)) => {
                out.push_str(&self.oid.to_string());
                out.push('=');
                escape_value(&text, out);
            }
            (name, None) => {
                match name {
                    Some(short) => out.push_str(short),
                    None => out.push_str(&self.oid.to_string()),
                }
                let mut encoded = Vec::new();
                self.value.encode(&mut encoded);
                out.push_str("=#");
                out.push_str(&hex::encode(encoded));
            }
        }
    }
}

/// One (possibly multi-valued) relative distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RelativeName(Vec<Attribute>);

impl RelativeName {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }

    pub fn single(oid: Oid, value: AttributeValue) -> Self {
        Self(vec![Attribute::new(oid, value)])
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.0
    }

    fn normalize(&mut self) {
        self.0.sort_by(|a, b| a.oid.cmp(&b.oid).then_with(|| a.value.cmp(&b.value)));
    }
}

/// An RDN sequence as found in certificate issuer and subject fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DistinguishedName {
    rdns: Vec<RelativeName>,
}

impl DistinguishedName {
    pub fn new(rdns: Vec<RelativeName>) -> Self {
        Self { rdns }
    }

    pub fn rdns(&self) -> &[RelativeName] {
        &self.rdns
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self, DerError> {
        let mut outer = Reader::new(bytes);
        let sequence = outer.read(TAG_SEQUENCE)?;
        outer.finish()?;

        let mut rdns = Vec::new();
        let mut sets = Reader::new(sequence.value);
        while !sets.is_empty() {
            let set = sets.read(TAG_SET)?;
            let mut attributes = Vec::new();
            let mut entries = Reader::new(set.value);
            while !entries.is_empty() {
                let entry = entries.read(TAG_SEQUENCE)?;
                let mut fields = Reader::new(entry.value);
                let oid = fields.read(TAG_OID)?;
                let value = fields.read_any()?;
                fields.finish()?;
                attributes.push(Attribute {
                    oid: Oid(der::decode_oid(oid.value)?),
                    value: AttributeValue {
                        tag: value.tag,
                        bytes: value.value.to_vec(),
                    },
                });
            }
            rdns.push(RelativeName(attributes));
        }
        Ok(Self { rdns })
    }

    pub fn to_der(&self) -> Result<Vec<u8>, DerError> {
        let mut sets = Vec::new();
        for rdn in &self.rdns {
            let mut entries = Vec::new();
            for attribute in &rdn.0 {
                let mut fields = Vec::new();
                der::encode_oid(attribute.oid.arcs(), &mut fields)?;
                attribute.value.encode(&mut fields);
                der::encode_tlv(TAG_SEQUENCE, &fields, &mut entries);
            }
            der::encode_tlv(TAG_SET, &entries, &mut sets);
        }
        let mut out = Vec::new();
        der::encode_tlv(TAG_SEQUENCE, &sets, &mut out);
        Ok(out)
    }

    /// Order the attributes inside every RDN by attribute type. RDN order
    /// itself is significant and left untouched.
    pub fn normalize(&mut self) {
        for rdn in &mut self.rdns {
            rdn.normalize();
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }
}

/// Renders in RFC 4514 order: the last RDN first.
impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (i, rdn) in self.rdns.iter().rev().enumerate() {
            if i > 0 {
                out.push(',');
            }
            for (j, attribute) in rdn.0.iter().enumerate() {
                if j > 0 {
                    out.push('+');
                }
                attribute.render(&mut out);
            }
        }
        f.write_str(&out)
    }
}

fn escape_value(value: &str, out: &mut String) {
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if i == 0 || i == last => {
                out.push('\\');
                out.push(c);
            }
            '#' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\00"),
            _ => out.push(c),
        }
    }
}
