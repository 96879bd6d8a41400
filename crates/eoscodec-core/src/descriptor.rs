//! Record descriptors: the statically-declared binary layout of a record.
//!
//! A descriptor is an ordered list of fields. Each field has a value kind and
//! may name an earlier unsigned-integer sibling as its size source, in which
//! case the sibling carries the element count and the field itself is written
//! without a length prefix.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Bit width of a fixed-width integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(IntWidth::W8),
            16 => Some(IntWidth::W16),
            32 => Some(IntWidth::W32),
            64 => Some(IntWidth::W64),
            _ => None,
        }
    }

    pub fn max_unsigned(self) -> u64 {
        match self {
            IntWidth::W64 => u64::MAX,
            w => (1u64 << w.bits()) - 1,
        }
    }

    pub fn signed_range(self) -> (i64, i64) {
        match self {
            IntWidth::W64 => (i64::MIN, i64::MAX),
            w => {
                let half = 1i64 << (w.bits() - 1);
                (-half, half - 1)
            }
        }
    }
}

/// How a single field is laid out on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Little-endian unsigned integer
    Uint(IntWidth),
    /// Little-endian two's-complement integer
    Int(IntWidth),
    /// LEB128 unsigned integer, at most `u32::MAX`
    Varuint32,
    /// One byte, 0 or 1
    Bool,
    /// 8-byte name
    Name,
    /// 8-byte token symbol
    Symbol,
    /// Byte string, varint length prefix unless sized by a sibling
    Bytes,
    /// Byte string of exactly this many bytes, no prefix
    FixedBytes(usize),
    /// UTF-8 string, varint length prefix unless sized by a sibling
    Str,
    /// Nested record
    Record(Arc<RecordDescriptor>),
    /// Sequence, varint count prefix unless sized by a sibling
    Seq(Box<FieldKind>),
}

impl FieldKind {
    /// Whether a field of this kind can serve as a size source.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, FieldKind::Uint(_) | FieldKind::Varuint32)
    }

    /// Whether a field of this kind can be sized by a sibling.
    pub fn is_sizable(&self) -> bool {
        matches!(self, FieldKind::Bytes | FieldKind::Str | FieldKind::Seq(_))
    }

    /// Fewest bytes one value of this kind occupies on the wire.
    pub fn min_wire_len(&self) -> usize {
        match self {
            FieldKind::Uint(w) | FieldKind::Int(w) => (w.bits() / 8) as usize,
            FieldKind::Varuint32 | FieldKind::Bool => 1,
            FieldKind::Name | FieldKind::Symbol => 8,
            FieldKind::Bytes | FieldKind::Str | FieldKind::Seq(_) => 1,
            FieldKind::FixedBytes(n) => *n,
            FieldKind::Record(desc) => desc
                .fields()
                .iter()
                .filter(|f| f.size_from.is_none())
                .map(|f| f.kind.min_wire_len())
                .sum(),
        }
    }

    /// The first sequence element kind, at any depth, that occupies no bytes.
    fn zero_width_element(&self) -> Option<&FieldKind> {
        match self {
            FieldKind::Seq(elem) if elem.min_wire_len() == 0 => Some(elem),
            FieldKind::Seq(elem) => elem.zero_width_element(),
            _ => None,
        }
    }

    /// Parse a primitive type name (`uint32`, `name`, `bytes16`, `string[]`, ...).
    ///
    /// Struct references are not resolved here; callers that support them
    /// (the ABI-definition parser) look them up before falling back to this.
    pub fn parse_primitive(s: &str) -> Result<Self, CodecError> {
        let s = s.trim();
        let unknown = || CodecError::UnknownFieldKind { kind: s.to_string() };

        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(FieldKind::Seq(Box::new(Self::parse_primitive(inner)?)));
        }

        match s {
            "bool" => return Ok(FieldKind::Bool),
            "name" => return Ok(FieldKind::Name),
            "symbol" => return Ok(FieldKind::Symbol),
            "bytes" => return Ok(FieldKind::Bytes),
            "string" => return Ok(FieldKind::Str),
            "varuint32" => return Ok(FieldKind::Varuint32),
            _ => {}
        }

        if let Some(bits) = s.strip_prefix("uint") {
            let bits: u32 = bits.parse().map_err(|_| unknown())?;
            return IntWidth::from_bits(bits).map(FieldKind::Uint).ok_or_else(unknown);
        }
        if let Some(bits) = s.strip_prefix("int") {
            let bits: u32 = bits.parse().map_err(|_| unknown())?;
            return IntWidth::from_bits(bits).map(FieldKind::Int).ok_or_else(unknown);
        }
        if let Some(len) = s.strip_prefix("bytes") {
            let len: usize = len.parse().map_err(|_| unknown())?;
            if len == 0 {
                return Err(unknown());
            }
            return Ok(FieldKind::FixedBytes(len));
        }
        Err(unknown())
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Uint(w) => write!(f, "uint{}", w.bits()),
            FieldKind::Int(w) => write!(f, "int{}", w.bits()),
            FieldKind::Varuint32 => write!(f, "varuint32"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Name => write!(f, "name"),
            FieldKind::Symbol => write!(f, "symbol"),
            FieldKind::Bytes => write!(f, "bytes"),
            FieldKind::FixedBytes(n) => write!(f, "bytes{n}"),
            FieldKind::Str => write!(f, "string"),
            FieldKind::Record(desc) => write!(f, "{}", desc.name()),
            FieldKind::Seq(elem) => write!(f, "{elem}[]"),
        }
    }
}

impl FromStr for FieldKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_primitive(s)
    }
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Earlier sibling whose value is this field's element count
    pub size_from: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size_from: None,
        }
    }

    pub fn sized(name: impl Into<String>, kind: FieldKind, size_from: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            size_from: Some(size_from.into()),
        }
    }
}

/// A validated, ordered record layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescriptor {
    name: String,
    fields: Vec<FieldSpec>,
}

impl RecordDescriptor {
    /// Validate and build a descriptor.
    ///
    /// Rejects duplicate field names, size sources that are missing, not
    /// earlier in the record, not unsigned integers, or shared by two fields,
    /// sized fields whose kind has no length, and sequences of elements that
    /// occupy no bytes.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, CodecError> {
        let desc = Self {
            name: name.into(),
            fields,
        };
        desc.validate()?;
        Ok(desc)
    }

    pub fn builder(name: impl Into<String>) -> RecordDescriptorBuilder {
        RecordDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field sized by `source`, if `source` is a size source.
    pub fn sized_by(&self, source: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.size_from.as_deref() == Some(source))
    }

    fn validate(&self) -> Result<(), CodecError> {
        let invalid = |reason: String| CodecError::InvalidDescriptor {
            record: self.name.clone(),
            reason,
        };

        for (idx, field) in self.fields.iter().enumerate() {
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(invalid(format!("duplicate field '{}'", field.name)));
            }
            if let Some(elem) = field.kind.zero_width_element() {
                return Err(invalid(format!(
                    "field '{}' is a sequence of {elem}, which occupies no bytes",
                    field.name
                )));
            }

            let Some(source) = field.size_from.as_deref() else {
                continue;
            };
            if !field.kind.is_sizable() {
                return Err(invalid(format!(
                    "field '{}' of kind {} cannot be sized",
                    field.name, field.kind
                )));
            }
            let src = self.fields[..idx]
                .iter()
                .find(|f| f.name == source)
                .ok_or_else(|| {
                    invalid(format!(
                        "size source '{source}' of '{}' must be an earlier field",
                        field.name
                    ))
                })?;
            if !src.kind.is_unsigned() {
                return Err(invalid(format!(
                    "size source '{source}' must be an unsigned integer, found {}",
                    src.kind
                )));
            }
            if src.size_from.is_some() {
                return Err(invalid(format!("size source '{source}' is itself sized")));
            }
            if self.fields[..idx]
                .iter()
                .any(|f| f.size_from.as_deref() == Some(source))
            {
                return Err(invalid(format!("size source '{source}' sizes more than one field")));
            }
        }
        Ok(())
    }
}

/// Incremental builder for `RecordDescriptor`.
#[derive(Debug)]
pub struct RecordDescriptorBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl RecordDescriptorBuilder {
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec::new(name, kind));
        self
    }

    pub fn sized(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        size_from: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldSpec::sized(name, kind, size_from));
        self
    }

    pub fn build(self) -> Result<RecordDescriptor, CodecError> {
        RecordDescriptor::new(self.name, self.fields)
    }
}
