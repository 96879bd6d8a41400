//! Decoded record values.
//!
//! `Record` keeps fields in binary (descriptor) order; the interchange
//! serializer re-sorts keys on its own.

use crate::descriptor::{FieldKind, RecordDescriptor};
use crate::name::Name;
use crate::symbol::Symbol;
use indexmap::IndexMap;
use std::fmt;

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any unsigned width, including varuint32
    Uint(u64),
    /// Any signed width
    Int(i64),
    Bool(bool),
    Name(Name),
    Symbol(Symbol),
    Bytes(Vec<u8>),
    Str(String),
    Record(Record),
    Seq(Vec<Value>),
}

impl Value {
    /// The zero value for a kind: `0`, `false`, empty name, empty string,
    /// zero-filled fixed bytes, an all-zero nested record, an empty sequence.
    pub fn zero(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Uint(_) | FieldKind::Varuint32 => Value::Uint(0),
            FieldKind::Int(_) => Value::Int(0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Name => Value::Name(Name::default()),
            FieldKind::Symbol => Value::Symbol(Symbol::default()),
            FieldKind::Bytes => Value::Bytes(Vec::new()),
            FieldKind::FixedBytes(n) => Value::Bytes(vec![0; *n]),
            FieldKind::Str => Value::Str(String::new()),
            FieldKind::Record(desc) => Value::Record(Record::zeroed(desc)),
            FieldKind::Seq(_) => Value::Seq(Vec::new()),
        }
    }

    /// Short variant label used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Name(_) => "name",
            Value::Symbol(_) => "symbol",
            Value::Bytes(_) => "bytes",
            Value::Str(_) => "string",
            Value::Record(_) => "record",
            Value::Seq(_) => "sequence",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<Name> {
        match self {
            Value::Name(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Name(n) => write!(f, "{n}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "{}", hex::encode(b)),
            Value::Str(s) => write!(f, "{s}"),
            Value::Record(r) => write!(f, "{r}"),
            Value::Seq(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Name> for Value {
    fn from(v: Name) -> Self {
        Value::Name(v)
    }
}

impl From<Symbol> for Value {
    fn from(v: Symbol) -> Self {
        Value::Symbol(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

/// Ordered field name → value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record with every field of `desc` set to its zero value.
    ///
    /// Size-source fields are left out so that packing fills them from the
    /// live length of the fields they size.
    pub fn zeroed(desc: &RecordDescriptor) -> Self {
        let mut record = Self::new();
        for field in desc.fields() {
            if desc.sized_by(&field.name).is_some() {
                continue;
            }
            record.insert(field.name.clone(), Value::zero(&field.kind));
        }
        record
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
