//! ABI-definition parser.
//!
//! ABI definitions are YAML documents describing one contract each:
//!
//! ```yaml
//! contract: eosio.token
//! structs:
//!   permission_level:
//!     actor: name
//!     permission: name
//! actions:
//!   transfer:
//!     from: name
//!     to: name
//!     quantity: uint64
//!     memo: string
//! tables:
//!   accounts: account
//! ```
//!
//! An action or table is either an inline field map or the name of a struct.
//! A field is either a type string or `{ type, size_from }`. Struct
//! references must point at a struct declared earlier in the same document.
//! A single file may hold several documents separated by `---`.

use eoscodec_core::{
    error::{CodecError, RegistryError},
    FieldKind, FieldSpec, Name, RecordDescriptor,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::sync::Arc;

// ─── Raw serde types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AbiRaw {
    contract: String,
    #[serde(default)]
    description: Option<String>,
    // IndexMap preserves YAML order, which is the binary field order.
    #[serde(default)]
    structs: IndexMap<String, IndexMap<String, FieldRaw>>,
    #[serde(default)]
    actions: IndexMap<String, ShapeRaw>,
    #[serde(default)]
    tables: IndexMap<String, ShapeRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShapeRaw {
    Struct(String),
    Fields(IndexMap<String, FieldRaw>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldRaw {
    Type(String),
    Full {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        size_from: Option<String>,
    },
}

impl FieldRaw {
    fn ty(&self) -> &str {
        match self {
            FieldRaw::Type(ty) | FieldRaw::Full { ty, .. } => ty,
        }
    }

    fn size_from(&self) -> Option<&str> {
        match self {
            FieldRaw::Type(_) => None,
            FieldRaw::Full { size_from, .. } => size_from.as_deref(),
        }
    }
}

// ─── Parsed form ──────────────────────────────────────────────────────────────

/// One contract's payload and row layouts.
#[derive(Debug, Clone)]
pub struct ContractAbi {
    pub account: Name,
    pub description: Option<String>,
    pub structs: IndexMap<String, RecordDescriptor>,
    pub actions: IndexMap<Name, RecordDescriptor>,
    pub tables: IndexMap<Name, RecordDescriptor>,
}

impl ContractAbi {
    pub fn action(&self, action: Name) -> Option<&RecordDescriptor> {
        self.actions.get(&action)
    }

    pub fn table(&self, table: Name) -> Option<&RecordDescriptor> {
        self.tables.get(&table)
    }
}

// ─── Parser ───────────────────────────────────────────────────────────────────

pub struct AbiParser;

impl AbiParser {
    /// Parse the first contract document.
    /// For files with several documents, use `parse_all()`.
    pub fn parse(yaml: &str) -> Result<ContractAbi, RegistryError> {
        let mut contracts = Self::parse_all(yaml)?;
        if contracts.is_empty() {
            return Err(RegistryError::ParseError("empty ABI file".into()));
        }
        Ok(contracts.remove(0))
    }

    /// Parse every contract document, in file order.
    pub fn parse_all(yaml: &str) -> Result<Vec<ContractAbi>, RegistryError> {
        use serde::de::Deserialize as _;

        let mut contracts = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_yaml::Value::deserialize(doc)
                .map_err(|e| RegistryError::ParseError(e.to_string()))?;
            // Skip empty documents (e.g. trailing `---`)
            if value.is_null() {
                continue;
            }
            let raw: AbiRaw = serde_yaml::from_value(value)
                .map_err(|e| RegistryError::ParseError(e.to_string()))?;
            contracts.push(Self::build(raw)?);
        }
        Ok(contracts)
    }

    fn build(raw: AbiRaw) -> Result<ContractAbi, RegistryError> {
        let account = Name::new(&raw.contract)?;

        let mut structs: IndexMap<String, Arc<RecordDescriptor>> = IndexMap::new();
        for (name, fields) in &raw.structs {
            let desc = build_record(name, fields, &structs).map_err(|e| {
                RegistryError::ParseError(format!("{}: struct '{name}': {e}", raw.contract))
            })?;
            structs.insert(name.clone(), Arc::new(desc));
        }

        let actions = build_shapes(&raw.contract, "action", &raw.actions, &structs)?;
        let tables = build_shapes(&raw.contract, "table", &raw.tables, &structs)?;

        Ok(ContractAbi {
            account,
            description: raw.description,
            structs: structs
                .into_iter()
                .map(|(k, v)| (k, RecordDescriptor::clone(&v)))
                .collect(),
            actions,
            tables,
        })
    }
}

fn build_shapes(
    contract: &str,
    section: &str,
    shapes: &IndexMap<String, ShapeRaw>,
    structs: &IndexMap<String, Arc<RecordDescriptor>>,
) -> Result<IndexMap<Name, RecordDescriptor>, RegistryError> {
    let mut out = IndexMap::with_capacity(shapes.len());
    for (name, shape) in shapes {
        let key = Name::new(name)?;
        let desc = match shape {
            ShapeRaw::Struct(target) => structs
                .get(target.as_str())
                .map(|d| RecordDescriptor::clone(d))
                .ok_or_else(|| CodecError::UnknownFieldKind {
                    kind: target.clone(),
                })?,
            ShapeRaw::Fields(fields) => build_record(name, fields, structs).map_err(|e| {
                RegistryError::ParseError(format!("{contract}: {section} '{name}': {e}"))
            })?,
        };
        out.insert(key, desc);
    }
    Ok(out)
}

fn build_record(
    name: &str,
    fields: &IndexMap<String, FieldRaw>,
    structs: &IndexMap<String, Arc<RecordDescriptor>>,
) -> Result<RecordDescriptor, CodecError> {
    let specs = fields
        .iter()
        .map(|(field, raw)| {
            let kind = resolve_type(raw.ty(), structs)?;
            Ok(FieldSpec {
                name: field.clone(),
                kind,
                size_from: raw.size_from().map(str::to_string),
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;
    RecordDescriptor::new(name, specs)
}

/// Resolve a type string: `T[]`, a built-in kind, or an earlier struct.
fn resolve_type(
    ty: &str,
    structs: &IndexMap<String, Arc<RecordDescriptor>>,
) -> Result<FieldKind, CodecError> {
    let ty = ty.trim();
    if let Some(elem) = ty.strip_suffix("[]") {
        return Ok(FieldKind::Seq(Box::new(resolve_type(elem, structs)?)));
    }
    match FieldKind::parse_primitive(ty) {
        Err(CodecError::UnknownFieldKind { kind }) => structs
            .get(ty)
            .map(|d| FieldKind::Record(Arc::clone(d)))
            .ok_or(CodecError::UnknownFieldKind { kind }),
        other => other,
    }
}
