//! Structural codec: packs and unpacks whole records by walking a
//! `RecordDescriptor` in declared order.
//!
//! ## Size sources
//! A size-source field physically precedes the field it sizes, but its value
//! must equal that field's live length. `pack` therefore runs a pre-pass that
//! measures every sized field, then writes the measured count in place of the
//! size source. A caller-supplied size value that disagrees is a
//! `SizeMismatch`; an omitted one is filled in. `unpack` remembers each decoded
//! size source and reads exactly that many elements for the sized field.

use crate::descriptor::{FieldKind, FieldSpec, IntWidth, RecordDescriptor};
use crate::error::CodecError;
use crate::name::Name;
use crate::primitive::{Reader, Writer};
use crate::symbol::Symbol;
use crate::value::{Record, Value};
use std::collections::HashMap;
use tracing::debug;

/// Pack one record into its wire bytes.
///
/// Fields missing from `record` are written as their kind's zero value.
/// An empty descriptor packs to zero bytes.
pub fn pack(desc: &RecordDescriptor, record: &Record) -> Result<Vec<u8>, CodecError> {
    let mut w = Writer::new();
    pack_into(&mut w, desc, record)?;
    Ok(w.into_vec())
}

/// Pack several records back to back with no count prefix.
///
/// An empty slice packs to zero bytes.
pub fn pack_all(desc: &RecordDescriptor, records: &[Record]) -> Result<Vec<u8>, CodecError> {
    let mut w = Writer::new();
    for record in records {
        pack_into(&mut w, desc, record)?;
    }
    Ok(w.into_vec())
}

/// Pack a record into an existing writer.
pub fn pack_into(w: &mut Writer, desc: &RecordDescriptor, record: &Record) -> Result<(), CodecError> {
    // Pre-pass: size-source name → live length of the field it sizes
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for field in desc.fields() {
        if let Some(source) = field.size_from.as_deref() {
            let actual = match record.get(&field.name) {
                Some(value) => live_len(field, value)?,
                None => 0,
            };
            counts.insert(source, actual);
        }
    }

    for field in desc.fields() {
        if let Some(&actual) = counts.get(field.name.as_str()) {
            if let Some(supplied) = record.get(&field.name) {
                let declared = supplied
                    .as_u64()
                    .ok_or_else(|| type_mismatch(&field.name, &field.kind, supplied))?;
                if declared != actual {
                    return Err(CodecError::SizeMismatch {
                        field: field.name.clone(),
                        declared,
                        actual,
                    });
                }
            }
            write_value(w, &field.name, &field.kind, &Value::Uint(actual), true)?;
            continue;
        }

        let prefixed = field.size_from.is_none();
        match record.get(&field.name) {
            Some(value) => write_value(w, &field.name, &field.kind, value, prefixed)?,
            None => write_value(w, &field.name, &field.kind, &Value::zero(&field.kind), prefixed)?,
        }
    }
    Ok(())
}

/// Unpack one record. Bytes left over after the last field are ignored.
pub fn unpack(desc: &RecordDescriptor, bytes: &[u8]) -> Result<Record, CodecError> {
    let mut r = Reader::new(bytes);
    let record = unpack_from(&mut r, desc)?;
    if !r.is_empty() {
        debug!(
            record = desc.name(),
            trailing = r.remaining(),
            "ignoring trailing bytes after record"
        );
    }
    Ok(record)
}

/// Unpack one record, rejecting trailing bytes.
pub fn unpack_exact(desc: &RecordDescriptor, bytes: &[u8]) -> Result<Record, CodecError> {
    let mut r = Reader::new(bytes);
    let record = unpack_from(&mut r, desc)?;
    if !r.is_empty() {
        return Err(CodecError::TrailingBytes {
            count: r.remaining(),
        });
    }
    Ok(record)
}

/// Unpack one record from a reader, leaving it positioned after the record.
pub fn unpack_from(r: &mut Reader<'_>, desc: &RecordDescriptor) -> Result<Record, CodecError> {
    let mut sizes: HashMap<&str, u64> = HashMap::new();
    let mut record = Record::new();

    for field in desc.fields() {
        let value = match field.size_from.as_deref() {
            Some(source) => {
                // descriptor validation guarantees the source was decoded already
                let count = sizes.get(source).copied().unwrap_or(0);
                read_sized(r, &field.kind, count)?
            }
            None => read_value(r, &field.kind)?,
        };

        if desc.sized_by(&field.name).is_some() {
            if let Some(count) = value.as_u64() {
                sizes.insert(field.name.as_str(), count);
            }
        }
        record.insert(field.name.clone(), value);
    }
    Ok(record)
}

// ─── Encoding ────────────────────────────────────────────────────────────────

fn type_mismatch(field: &str, kind: &FieldKind, got: &Value) -> CodecError {
    CodecError::TypeMismatch {
        field: field.to_string(),
        expected: kind.to_string(),
        got: got.type_name().to_string(),
    }
}

fn out_of_range(field: &str, kind: &FieldKind, value: impl ToString) -> CodecError {
    CodecError::ValueOutOfRange {
        field: field.to_string(),
        kind: kind.to_string(),
        value: value.to_string(),
    }
}

/// Element count of a sized field's value.
fn live_len(field: &FieldSpec, value: &Value) -> Result<u64, CodecError> {
    let len = match (&field.kind, value) {
        (FieldKind::Bytes, Value::Bytes(b)) => b.len(),
        (FieldKind::Str, Value::Str(s)) => s.len(),
        (FieldKind::Seq(_), Value::Seq(items)) => items.len(),
        _ => return Err(type_mismatch(&field.name, &field.kind, value)),
    };
    Ok(len as u64)
}

/// Write one value. `prefixed` is false for sized fields, whose count lives in
/// a sibling.
fn write_value(
    w: &mut Writer,
    field: &str,
    kind: &FieldKind,
    value: &Value,
    prefixed: bool,
) -> Result<(), CodecError> {
    match (kind, value) {
        (FieldKind::Uint(width), Value::Uint(v)) => {
            if *v > width.max_unsigned() {
                return Err(out_of_range(field, kind, v));
            }
            match width {
                IntWidth::W8 => w.write_u8(*v as u8),
                IntWidth::W16 => w.write_u16(*v as u16),
                IntWidth::W32 => w.write_u32(*v as u32),
                IntWidth::W64 => w.write_u64(*v),
            }
        }
        (FieldKind::Int(width), Value::Int(v)) => {
            let (min, max) = width.signed_range();
            if *v < min || *v > max {
                return Err(out_of_range(field, kind, v));
            }
            match width {
                IntWidth::W8 => w.write_i8(*v as i8),
                IntWidth::W16 => w.write_i16(*v as i16),
                IntWidth::W32 => w.write_i32(*v as i32),
                IntWidth::W64 => w.write_i64(*v),
            }
        }
        (FieldKind::Varuint32, Value::Uint(v)) => {
            if *v > u64::from(u32::MAX) {
                return Err(out_of_range(field, kind, v));
            }
            w.write_varint(*v);
        }
        (FieldKind::Bool, Value::Bool(b)) => w.write_u8(u8::from(*b)),
        (FieldKind::Name, Value::Name(n)) => w.write_u64(n.as_u64()),
        (FieldKind::Symbol, Value::Symbol(s)) => w.write_u64(s.as_u64()),
        (FieldKind::Bytes, Value::Bytes(b)) => {
            if prefixed {
                w.write_prefixed_bytes(b);
            } else {
                w.write_bytes(b);
            }
        }
        (FieldKind::FixedBytes(n), Value::Bytes(b)) => {
            if b.len() != *n {
                return Err(CodecError::SizeMismatch {
                    field: field.to_string(),
                    declared: *n as u64,
                    actual: b.len() as u64,
                });
            }
            w.write_bytes(b);
        }
        (FieldKind::Str, Value::Str(s)) => {
            if prefixed {
                w.write_prefixed_str(s);
            } else {
                w.write_bytes(s.as_bytes());
            }
        }
        (FieldKind::Record(desc), Value::Record(rec)) => pack_into(w, desc, rec)?,
        (FieldKind::Seq(elem), Value::Seq(items)) => {
            if prefixed {
                w.write_varint(items.len() as u64);
            }
            for item in items {
                write_value(w, field, elem, item, true)?;
            }
        }
        _ => return Err(type_mismatch(field, kind, value)),
    }
    Ok(())
}

// ─── Decoding ────────────────────────────────────────────────────────────────

fn read_value(r: &mut Reader<'_>, kind: &FieldKind) -> Result<Value, CodecError> {
    let value = match kind {
        FieldKind::Uint(IntWidth::W8) => Value::Uint(u64::from(r.read_u8()?)),
        FieldKind::Uint(IntWidth::W16) => Value::Uint(u64::from(r.read_u16()?)),
        FieldKind::Uint(IntWidth::W32) => Value::Uint(u64::from(r.read_u32()?)),
        FieldKind::Uint(IntWidth::W64) => Value::Uint(r.read_u64()?),
        FieldKind::Int(IntWidth::W8) => Value::Int(i64::from(r.read_i8()?)),
        FieldKind::Int(IntWidth::W16) => Value::Int(i64::from(r.read_i16()?)),
        FieldKind::Int(IntWidth::W32) => Value::Int(i64::from(r.read_i32()?)),
        FieldKind::Int(IntWidth::W64) => Value::Int(r.read_i64()?),
        FieldKind::Varuint32 => {
            let v = r.read_varint()?;
            if v > u64::from(u32::MAX) {
                return Err(CodecError::MalformedVarint);
            }
            Value::Uint(v)
        }
        FieldKind::Bool => Value::Bool(r.read_u8()? != 0),
        FieldKind::Name => Value::Name(Name::from_u64(r.read_u64()?)),
        FieldKind::Symbol => Value::Symbol(Symbol::try_from_u64(r.read_u64()?)?),
        FieldKind::Bytes => Value::Bytes(r.read_prefixed_bytes()?),
        FieldKind::FixedBytes(n) => Value::Bytes(r.read_bytes(*n)?),
        FieldKind::Str => Value::Str(r.read_prefixed_string()?),
        FieldKind::Record(desc) => Value::Record(unpack_from(r, desc)?),
        FieldKind::Seq(elem) => {
            let count = r.read_varint()?;
            read_elements(r, elem, count)?
        }
    };
    Ok(value)
}

/// Read a field whose element count came from a size source.
fn read_sized(r: &mut Reader<'_>, kind: &FieldKind, count: u64) -> Result<Value, CodecError> {
    match kind {
        FieldKind::Bytes => Ok(Value::Bytes(r.read_bytes(checked_len(r, count)?)?)),
        FieldKind::Str => Ok(Value::Str(r.read_string(checked_len(r, count)?)?)),
        FieldKind::Seq(elem) => read_elements(r, elem, count),
        // unreachable for validated descriptors
        other => Err(CodecError::UnknownFieldKind {
            kind: format!("sized {other}"),
        }),
    }
}

fn checked_len(r: &Reader<'_>, count: u64) -> Result<usize, CodecError> {
    match usize::try_from(count) {
        Ok(len) if len <= r.remaining() => Ok(len),
        _ => Err(CodecError::BufferTooShort {
            needed: usize::try_from(count).unwrap_or(usize::MAX),
            remaining: r.remaining(),
        }),
    }
}

fn read_elements(r: &mut Reader<'_>, elem: &FieldKind, count: u64) -> Result<Value, CodecError> {
    // Reject impossible counts before allocating. Every element takes at
    // least one byte (descriptors reject zero-width elements).
    let min = elem.min_wire_len().max(1) as u64;
    if count.saturating_mul(min) > r.remaining() as u64 {
        return Err(CodecError::BufferTooShort {
            needed: usize::try_from(count.saturating_mul(min)).unwrap_or(usize::MAX),
            remaining: r.remaining(),
        });
    }

    let capacity = usize::try_from(count).unwrap_or(usize::MAX).min(r.remaining());
    let mut items = Vec::with_capacity(capacity);
    for _ in 0..count {
        items.push(read_value(r, elem)?);
    }
    Ok(Value::Seq(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn transfer() -> RecordDescriptor {
        RecordDescriptor::builder("transfer")
            .field("from", FieldKind::Name)
            .field("to", FieldKind::Name)
            .field("quantity", FieldKind::Uint(IntWidth::W64))
            .field("memo", FieldKind::Str)
            .build()
            .unwrap()
    }

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn pack_transfer_layout() {
        let rec = Record::new()
            .with("from", name("tbcox2.3"))
            .with("to", name("tbcox2"))
            .with("quantity", 9u64)
            .with("memo", "");
        let bytes = pack(&transfer(), &rec).unwrap();
        assert_eq!(
            hex::encode(bytes),
            "00000003884ed1c900000000884ed1c9090000000000000000"
        );
    }

    #[test]
    fn unpack_transfer_tolerates_trailing_bytes() {
        let expected = Record::new()
            .with("from", name("tbcox2.3"))
            .with("to", name("tbcox2"))
            .with("quantity", 9u64)
            .with("memo", "");

        for input in [
            "00000003884ed1c900000000884ed1c9090000000000000000000000000000000000000000000000",
            "00000003884ed1c900000000884ed1c9090000000000000000",
        ] {
            let bytes = hex::decode(input).unwrap();
            assert_eq!(unpack(&transfer(), &bytes).unwrap(), expected);
        }
    }

    #[test]
    fn unpack_exact_rejects_trailing_bytes() {
        let bytes = hex::decode("00000003884ed1c900000000884ed1c909000000000000000000").unwrap();
        assert!(matches!(
            unpack_exact(&transfer(), &bytes),
            Err(CodecError::TrailingBytes { count: 1 })
        ));
    }

    #[test]
    fn missing_fields_pack_as_zero() {
        let rec = Record::new().with("from", name("abourget")).with("to", name("mama"));
        let bytes = pack(&transfer(), &rec).unwrap();
        assert_eq!(bytes.len(), 8 + 8 + 8 + 1);
        assert_eq!(*bytes.last().unwrap(), 0);
    }

    #[test]
    fn empty_record_and_empty_batch_pack_to_nothing() {
        let empty = RecordDescriptor::builder("empty").build().unwrap();
        assert!(pack(&empty, &Record::new()).unwrap().is_empty());
        assert!(pack_all(&transfer(), &[]).unwrap().is_empty());
    }

    fn memo_with_len() -> RecordDescriptor {
        RecordDescriptor::builder("memo")
            .field("memo_len", FieldKind::Uint(IntWidth::W8))
            .sized("memo", FieldKind::Str, "memo_len")
            .build()
            .unwrap()
    }

    #[test]
    fn size_source_filled_from_live_length() {
        let bytes = pack(&memo_with_len(), &Record::new().with("memo", "hi")).unwrap();
        assert_eq!(bytes, vec![0x02, b'h', b'i']);

        let back = unpack(&memo_with_len(), &bytes).unwrap();
        assert_eq!(back.get("memo_len"), Some(&Value::Uint(2)));
        assert_eq!(back.get("memo"), Some(&Value::Str("hi".into())));
    }

    #[test]
    fn zero_length_sized_field_packs_only_its_count() {
        let bytes = pack(&memo_with_len(), &Record::new().with("memo", "")).unwrap();
        assert_eq!(bytes, vec![0x00]);
    }

    #[test]
    fn zero_length_prefixed_field_packs_zero_prefix() {
        let desc = RecordDescriptor::builder("blob")
            .field("data", FieldKind::Bytes)
            .build()
            .unwrap();
        let bytes = pack(&desc, &Record::new().with("data", Vec::<u8>::new())).unwrap();
        assert_eq!(bytes, vec![0x00]);
    }

    #[test]
    fn conflicting_size_rejected() {
        let rec = Record::new().with("memo_len", 5u64).with("memo", "hi");
        match pack(&memo_with_len(), &rec) {
            Err(CodecError::SizeMismatch { field, declared: 5, actual: 2 }) => {
                assert_eq!(field, "memo_len")
            }
            other => panic!("expected SizeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn matching_supplied_size_accepted() {
        let rec = Record::new().with("memo_len", 2u64).with("memo", "hi");
        assert_eq!(pack(&memo_with_len(), &rec).unwrap(), vec![0x02, b'h', b'i']);
    }

    #[test]
    fn count_larger_than_size_width_rejected() {
        let rec = Record::new().with("memo", "x".repeat(256));
        assert!(matches!(
            pack(&memo_with_len(), &rec),
            Err(CodecError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn sized_sequence_of_records() {
        let auth = Arc::new(
            RecordDescriptor::builder("permission_level")
                .field("actor", FieldKind::Name)
                .field("permission", FieldKind::Name)
                .build()
                .unwrap(),
        );
        let desc = RecordDescriptor::builder("action")
            .field("account", FieldKind::Name)
            .field("auth_count", FieldKind::Varuint32)
            .sized(
                "authorization",
                FieldKind::Seq(Box::new(FieldKind::Record(auth))),
                "auth_count",
            )
            .build()
            .unwrap();

        let level = |actor: &str| {
            Value::Record(
                Record::new()
                    .with("actor", name(actor))
                    .with("permission", name("active")),
            )
        };
        let rec = Record::new()
            .with("account", name("eosio.token"))
            .with("authorization", Value::Seq(vec![level("alice"), level("bob")]));

        let bytes = pack(&desc, &rec).unwrap();
        assert_eq!(bytes.len(), 8 + 1 + 2 * 16);
        assert_eq!(bytes[8], 2);

        let back = unpack_exact(&desc, &bytes).unwrap();
        assert_eq!(back.get("auth_count"), Some(&Value::Uint(2)));
        assert_eq!(back.get("authorization"), rec.get("authorization"));
    }

    #[test]
    fn nested_and_prefixed_roundtrip() {
        let inner = Arc::new(
            RecordDescriptor::builder("inner")
                .field("flag", FieldKind::Bool)
                .field("delta", FieldKind::Int(IntWidth::W16))
                .build()
                .unwrap(),
        );
        let desc = RecordDescriptor::builder("outer")
            .field("tag", FieldKind::FixedBytes(4))
            .field("labels", FieldKind::Seq(Box::new(FieldKind::Str)))
            .field("inner", FieldKind::Record(inner))
            .field("blob", FieldKind::Bytes)
            .field("small", FieldKind::Int(IntWidth::W8))
            .build()
            .unwrap();

        let rec = Record::new()
            .with("tag", vec![1u8, 2, 3, 4])
            .with("labels", Value::Seq(vec!["a".into(), "bc".into()]))
            .with("inner", Record::new().with("flag", true).with("delta", -300i64))
            .with("blob", vec![0xffu8; 3])
            .with("small", -1i64);

        let bytes = pack(&desc, &rec).unwrap();
        assert_eq!(unpack_exact(&desc, &bytes).unwrap(), rec);
    }

    #[test]
    fn type_mismatch_reported() {
        let rec = Record::new().with("quantity", "nine");
        match pack(&transfer(), &rec) {
            Err(CodecError::TypeMismatch { field, expected, got }) => {
                assert_eq!(field, "quantity");
                assert_eq!(expected, "uint64");
                assert_eq!(got, "string");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_reported() {
        let desc = RecordDescriptor::builder("r")
            .field("v", FieldKind::Uint(IntWidth::W16))
            .build()
            .unwrap();
        assert!(matches!(
            pack(&desc, &Record::new().with("v", 70_000u64)),
            Err(CodecError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn fixed_bytes_length_enforced() {
        let desc = RecordDescriptor::builder("r")
            .field("h", FieldKind::FixedBytes(4))
            .build()
            .unwrap();
        assert!(matches!(
            pack(&desc, &Record::new().with("h", vec![1u8, 2])),
            Err(CodecError::SizeMismatch { declared: 4, actual: 2, .. })
        ));
    }

    #[test]
    fn truncated_input_is_buffer_too_short() {
        let bytes = hex::decode("00000003884ed1c900000000").unwrap();
        assert!(matches!(
            unpack(&transfer(), &bytes),
            Err(CodecError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn huge_sequence_count_rejected_before_allocation() {
        let desc = RecordDescriptor::builder("r")
            .field("names", FieldKind::Seq(Box::new(FieldKind::Name)))
            .build()
            .unwrap();
        // count = 2^35, no elements
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            unpack(&desc, &bytes),
            Err(CodecError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn sequence_count_bounded_for_zero_width_elements() {
        let empty = Arc::new(RecordDescriptor::builder("empty").build().unwrap());
        let elem = FieldKind::Record(empty);
        // count = 2^21 - 1 from three bytes of input
        let bytes = [0xff, 0xff, 0x7f];
        let mut r = Reader::new(&bytes);
        let count = r.read_varint().unwrap();
        assert!(matches!(
            read_elements(&mut r, &elem, count),
            Err(CodecError::BufferTooShort { remaining: 0, .. })
        ));
    }

    #[test]
    fn truncated_before_prefixed_field_is_buffer_too_short() {
        // transfer cut off right before `memo`
        let bytes = hex::decode("00000003884ed1c900000000884ed1c90900000000000000").unwrap();
        assert!(matches!(
            unpack(&transfer(), &bytes),
            Err(CodecError::BufferTooShort { needed: 1, remaining: 0 })
        ));
    }

    #[test]
    fn non_canonical_symbol_rejected_on_unpack() {
        let desc = RecordDescriptor::builder("r")
            .field("sym", FieldKind::Symbol)
            .build()
            .unwrap();
        assert!(unpack(&desc, &hex::decode("0443555200000000").unwrap()).is_ok());
        assert!(matches!(
            unpack(&desc, &hex::decode("0463757200000000").unwrap()),
            Err(CodecError::InvalidSymbol { .. })
        ));
    }

    #[test]
    fn sized_bytes_past_end() {
        let desc = RecordDescriptor::builder("r")
            .field("n", FieldKind::Uint(IntWidth::W32))
            .sized("data", FieldKind::Bytes, "n")
            .build()
            .unwrap();
        let bytes = [0x10, 0, 0, 0, 0xaa];
        assert!(matches!(
            unpack(&desc, &bytes),
            Err(CodecError::BufferTooShort { needed: 16, remaining: 1 })
        ));
    }
}
