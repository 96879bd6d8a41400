//! Action envelopes: `account`, `name`, and a payload whose layout is looked
//! up in an [`ActionRegistry`].
//!
//! Binary layout: `account` (8 bytes LE) | `name` (8 bytes LE) | payload.
//! Interchange layout: a flat JSON object with `account`, `name` and the
//! payload's fields, keys in lexicographic order.

use crate::codec;
use crate::error::CodecError;
use crate::interchange::{record_from_json, sorted_object, value_to_json};
use crate::name::{AccountName, ActionName, Name};
use crate::primitive::{Reader, Writer};
use crate::registry::ActionRegistry;
use crate::value::Record;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use tracing::debug;

const ACCOUNT_KEY: &str = "account";
const NAME_KEY: &str = "name";

/// What to do when the registry has no layout for a payload being decoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Decode the envelope with the payload absent.
    #[default]
    Lenient,
    /// Fail with [`CodecError::UnresolvedPayloadType`].
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    pub account: AccountName,
    pub name: ActionName,
    pub payload: Option<Record>,
}

impl ActionEnvelope {
    pub fn new(account: AccountName, name: ActionName) -> Self {
        Self {
            account,
            name,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Record) -> Self {
        self.payload = Some(payload);
        self
    }

    // ─── Binary ──────────────────────────────────────────────────────────────

    /// Pack to the wire form.
    ///
    /// An absent payload packs as the 16-byte header alone. A present payload
    /// needs a layout from `registry`.
    pub fn pack(&self, registry: &dyn ActionRegistry) -> Result<Vec<u8>, CodecError> {
        let mut w = Writer::with_capacity(16);
        w.write_u64(self.account.as_u64());
        w.write_u64(self.name.as_u64());

        if let Some(payload) = &self.payload {
            let desc = registry
                .resolve(self.account, self.name)
                .ok_or_else(|| self.unresolved())?;
            codec::pack_into(&mut w, &desc, payload)?;
        }
        Ok(w.into_vec())
    }

    /// Unpack from the wire form.
    ///
    /// Bytes after the header are the payload. With no payload bytes the
    /// payload is absent and the registry is not consulted.
    pub fn unpack(
        bytes: &[u8],
        registry: &dyn ActionRegistry,
        resolution: Resolution,
    ) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let account = Name::from_u64(r.read_u64()?);
        let name = Name::from_u64(r.read_u64()?);
        let mut envelope = Self::new(account, name);

        if r.is_empty() {
            return Ok(envelope);
        }

        match registry.resolve(account, name) {
            Some(desc) => {
                envelope.payload = Some(codec::unpack_from(&mut r, &desc)?);
                if !r.is_empty() {
                    debug!(%account, %name, trailing = r.remaining(), "ignoring trailing payload bytes");
                }
            }
            None if resolution == Resolution::Strict => return Err(envelope.unresolved()),
            None => {
                debug!(%account, %name, bytes = r.remaining(), "no payload layout, leaving payload absent");
            }
        }
        Ok(envelope)
    }

    // ─── Interchange ─────────────────────────────────────────────────────────

    /// Flat JSON object with sorted keys.
    ///
    /// A payload field named `account` or `name` cannot be flattened and
    /// fails with [`CodecError::InterchangeConflict`].
    pub fn to_json(&self) -> Result<Json, CodecError> {
        let mut sorted = BTreeMap::new();
        if let Some(payload) = &self.payload {
            for (key, value) in payload.iter() {
                if key == ACCOUNT_KEY || key == NAME_KEY {
                    return Err(CodecError::InterchangeConflict {
                        key: key.to_string(),
                    });
                }
                sorted.insert(key.to_string(), value_to_json(value));
            }
        }
        sorted.insert(ACCOUNT_KEY.to_string(), Json::String(self.account.to_string()));
        sorted.insert(NAME_KEY.to_string(), Json::String(self.name.to_string()));
        Ok(sorted_object(sorted))
    }

    pub fn to_json_string(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    /// Parse the flat JSON form.
    ///
    /// Keys other than `account` and `name` are the payload. With none the
    /// payload is absent; otherwise it is shaped by the registry's layout.
    pub fn from_json(
        json: &Json,
        registry: &dyn ActionRegistry,
        resolution: Resolution,
    ) -> Result<Self, CodecError> {
        let obj = json.as_object().ok_or_else(|| CodecError::InvalidInterchange {
            reason: format!("expected an object, got {json}"),
        })?;
        let account = name_key(obj, ACCOUNT_KEY)?;
        let name = name_key(obj, NAME_KEY)?;
        let mut envelope = Self::new(account, name);

        let rest: Map<String, Json> = obj
            .iter()
            .filter(|(k, _)| *k != ACCOUNT_KEY && *k != NAME_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if rest.is_empty() {
            return Ok(envelope);
        }

        match registry.resolve(account, name) {
            Some(desc) => envelope.payload = Some(record_from_json(&desc, &rest)?),
            None if resolution == Resolution::Strict => return Err(envelope.unresolved()),
            None => {
                debug!(%account, %name, keys = rest.len(), "no payload layout, dropping payload keys");
            }
        }
        Ok(envelope)
    }

    pub fn from_json_str(
        s: &str,
        registry: &dyn ActionRegistry,
        resolution: Resolution,
    ) -> Result<Self, CodecError> {
        let json: Json = serde_json::from_str(s)?;
        Self::from_json(&json, registry, resolution)
    }

    fn unresolved(&self) -> CodecError {
        CodecError::UnresolvedPayloadType {
            contract: self.account.to_string(),
            action: self.name.to_string(),
        }
    }
}

fn name_key(obj: &Map<String, Json>, key: &str) -> Result<Name, CodecError> {
    let s = obj
        .get(key)
        .and_then(Json::as_str)
        .ok_or_else(|| CodecError::InvalidInterchange {
            reason: format!("missing string key '{key}'"),
        })?;
    Name::new(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldKind, IntWidth, RecordDescriptor};
    use crate::registry::NoPayloads;
    use crate::value::Value;

    fn transfer() -> RecordDescriptor {
        RecordDescriptor::builder("transfer")
            .field("from", FieldKind::Name)
            .field("to", FieldKind::Name)
            .field("quantity", FieldKind::Uint(IntWidth::W64))
            .field("memo", FieldKind::Str)
            .build()
            .unwrap()
    }

    fn token_registry(contract: Name, action: Name) -> Option<RecordDescriptor> {
        (contract == Name::new("eosio").unwrap() && action == Name::new("transfer").unwrap())
            .then(transfer)
    }

    fn n(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn sample() -> ActionEnvelope {
        ActionEnvelope::new(n("eosio"), n("transfer")).with_payload(
            Record::new()
                .with("from", n("abourget"))
                .with("to", n("mama"))
                .with("quantity", 0u64)
                .with("memo", ""),
        )
    }

    #[test]
    fn header_only_when_payload_absent() {
        let env = ActionEnvelope::new(n("eosio"), n("transfer"));
        let bytes = env.pack(&NoPayloads).unwrap();
        assert_eq!(hex::encode(&bytes), "0000000000ea3055000000572d3ccdcd");

        let back = ActionEnvelope::unpack(&bytes, &NoPayloads, Resolution::Strict).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn binary_roundtrip_with_payload() {
        let env = sample();
        let bytes = env.pack(&token_registry).unwrap();
        assert_eq!(bytes.len(), 16 + 8 + 8 + 8 + 1);
        assert_eq!(&bytes[16..24], &n("abourget").to_le_bytes());

        let back = ActionEnvelope::unpack(&bytes, &token_registry, Resolution::Lenient).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn pack_unresolved_payload_fails() {
        let err = sample().pack(&NoPayloads).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnresolvedPayloadType { ref contract, ref action }
                if contract == "eosio" && action == "transfer"
        ));
    }

    #[test]
    fn unpack_unresolved_lenient_vs_strict() {
        let bytes = sample().pack(&token_registry).unwrap();

        let lenient = ActionEnvelope::unpack(&bytes, &NoPayloads, Resolution::Lenient).unwrap();
        assert_eq!(lenient.account, n("eosio"));
        assert_eq!(lenient.name, n("transfer"));
        assert!(lenient.payload.is_none());

        assert!(matches!(
            ActionEnvelope::unpack(&bytes, &NoPayloads, Resolution::Strict),
            Err(CodecError::UnresolvedPayloadType { .. })
        ));
    }

    #[test]
    fn unpack_short_header() {
        assert!(matches!(
            ActionEnvelope::unpack(&[0u8; 12], &NoPayloads, Resolution::Lenient),
            Err(CodecError::BufferTooShort { needed: 8, remaining: 4 })
        ));
    }

    #[test]
    fn json_keys_are_sorted_and_flat() {
        assert_eq!(
            sample().to_json_string().unwrap(),
            r#"{"account":"eosio","from":"abourget","memo":"","name":"transfer","quantity":0,"to":"mama"}"#
        );
        let bare = ActionEnvelope::new(n("eosio"), n("transfer"));
        assert_eq!(bare.to_json_string().unwrap(), r#"{"account":"eosio","name":"transfer"}"#);
    }

    #[test]
    fn json_payload_key_conflict() {
        let env = ActionEnvelope::new(n("eosio"), n("newaccount"))
            .with_payload(Record::new().with("name", n("alice")));
        assert!(matches!(
            env.to_json(),
            Err(CodecError::InterchangeConflict { ref key }) if key == "name"
        ));
    }

    #[test]
    fn json_roundtrip() {
        let env = sample();
        let s = env.to_json_string().unwrap();
        let back = ActionEnvelope::from_json_str(&s, &token_registry, Resolution::Strict).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn json_without_payload_keys() {
        let back = ActionEnvelope::from_json_str(
            r#"{"account":"eosio","name":"transfer"}"#,
            &token_registry,
            Resolution::Strict,
        )
        .unwrap();
        assert!(back.payload.is_none());
    }

    #[test]
    fn json_partial_payload_zero_fills() {
        let back = ActionEnvelope::from_json_str(
            r#"{"account":"eosio","name":"transfer","quantity":"9"}"#,
            &token_registry,
            Resolution::Lenient,
        )
        .unwrap();
        let payload = back.payload.unwrap();
        assert_eq!(payload.get("quantity"), Some(&Value::Uint(9)));
        assert_eq!(payload.get("from"), Some(&Value::Name(Name::default())));
        assert_eq!(payload.get("memo"), Some(&Value::Str(String::new())));
    }

    #[test]
    fn json_unresolved_lenient_vs_strict() {
        let s = r#"{"account":"eosio","name":"transfer","memo":"hi"}"#;
        let lenient = ActionEnvelope::from_json_str(s, &NoPayloads, Resolution::Lenient).unwrap();
        assert!(lenient.payload.is_none());
        assert!(matches!(
            ActionEnvelope::from_json_str(s, &NoPayloads, Resolution::Strict),
            Err(CodecError::UnresolvedPayloadType { .. })
        ));
    }

    #[test]
    fn json_missing_header_key() {
        assert!(matches!(
            ActionEnvelope::from_json_str(r#"{"account":"eosio"}"#, &NoPayloads, Resolution::Lenient),
            Err(CodecError::InvalidInterchange { .. })
        ));
    }
}
