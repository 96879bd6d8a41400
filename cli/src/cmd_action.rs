//! `eoscodec pack-action`, `unpack-action` and `decode-rows`.

use anyhow::{anyhow, Context, Result};
use eoscodec_core::{
    interchange::{record_from_json, record_to_json},
    ActionEnvelope, HexBytes, Name, Resolution, TableRowDecoder,
};
use eoscodec_registry::MemoryRegistry;
use tracing::debug;

fn parse_name(kind: &str, s: &str) -> Result<Name> {
    Name::new(s).with_context(|| format!("invalid {kind} name '{s}'"))
}

/// Payload fields as JSON → envelope wire hex.
pub fn pack(registry: &MemoryRegistry, contract: &str, action: &str, json: &str) -> Result<String> {
    let account = parse_name("contract", contract)?;
    let name = parse_name("action", action)?;
    let value: serde_json::Value = serde_json::from_str(json).context("payload is not valid JSON")?;
    let fields = value
        .as_object()
        .ok_or_else(|| anyhow!("payload must be a JSON object"))?;

    let mut envelope = ActionEnvelope::new(account, name);
    if !fields.is_empty() {
        let desc = registry
            .action(account, name)
            .ok_or_else(|| anyhow!("no layout registered for {account}::{name}"))?;
        envelope = envelope.with_payload(record_from_json(&desc, fields)?);
    }

    let bytes = envelope.pack(registry)?;
    debug!(%account, %name, len = bytes.len(), "packed action");
    Ok(hex::encode(bytes))
}

/// Envelope wire hex → interchange JSON.
///
/// `nested` prints `{account, name, payload}` instead of the flat form, which
/// also works for payloads with `account` or `name` fields.
pub fn unpack(
    registry: &MemoryRegistry,
    hex_wire: &str,
    resolution: Resolution,
    nested: bool,
) -> Result<serde_json::Value> {
    let bytes = HexBytes::from_hex(hex_wire.trim()).context("wire data is not valid hex")?;
    let envelope = ActionEnvelope::unpack(&bytes, registry, resolution)?;

    if !nested {
        return Ok(envelope.to_json()?);
    }
    Ok(serde_json::json!({
        "account": envelope.account.to_string(),
        "name": envelope.name.to_string(),
        "payload": envelope.payload.as_ref().map(record_to_json),
    }))
}

/// JSON array of hex rows → JSON array of decoded rows.
pub fn decode_rows(
    registry: &MemoryRegistry,
    contract: &str,
    table: &str,
    rows: &str,
) -> Result<serde_json::Value> {
    let account = parse_name("contract", contract)?;
    let table_name = parse_name("table", table)?;
    let layout = registry
        .table(account, table_name)
        .ok_or_else(|| anyhow!("no layout registered for table {account}::{table_name}"))?;

    let decoded = TableRowDecoder::new(layout).decode_json(rows)?;
    Ok(serde_json::Value::Array(decoded.iter().map(record_to_json).collect()))
}
