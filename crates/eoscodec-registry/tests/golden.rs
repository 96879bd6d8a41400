//! Golden fixture integration tests.
//!
//! Each test loads the ABI definitions under `abi/`, then checks the wire and
//! interchange forms recorded in `fixtures/` against what the codec produces.

use eoscodec_core::{
    error::CodecError, interchange::record_to_json, ActionEnvelope, Name, Resolution,
    TableRowDecoder,
};
use eoscodec_registry::memory::MemoryRegistry;

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures");
    p.push(name);
    p
}

/// The ABI definitions live two levels above the crate root.
fn abi_dir() -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../abi");
    p
}

fn load_fixture(name: &str) -> serde_json::Value {
    let text = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    serde_json::from_str(&text).expect("invalid fixture JSON")
}

fn registry() -> MemoryRegistry {
    let reg = MemoryRegistry::new();
    let count = reg.load_directory(&abi_dir()).expect("load abi dir");
    assert_eq!(count, 3);
    reg
}

fn name(f: &serde_json::Value, key: &str) -> Name {
    Name::new(f[key].as_str().unwrap()).unwrap()
}

// ─── Actions ──────────────────────────────────────────────────────────────────

#[test]
fn abi_directory_loads() {
    let reg = registry();
    let names: Vec<String> = reg.contracts().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["eosio", "eosio.token", "exchange"]);
}

#[test]
fn action_wire_golden() {
    let reg = registry();
    for f in load_fixture("actions.json").as_array().unwrap() {
        let desc = f["description"].as_str().unwrap();
        let wire = hex::decode(f["wire"].as_str().unwrap()).unwrap();

        let env = ActionEnvelope::unpack(&wire, &reg, Resolution::Strict)
            .unwrap_or_else(|e| panic!("{desc}: unpack failed: {e}"));
        assert_eq!(env.account, name(f, "contract"), "{desc}");
        assert_eq!(env.name, name(f, "action"), "{desc}");

        let payload = env.payload.as_ref().expect("payload present");
        assert_eq!(record_to_json(payload), f["payload"], "{desc}");

        let repacked = env.pack(&reg).unwrap();
        assert_eq!(hex::encode(repacked), f["wire"].as_str().unwrap(), "{desc}");
    }
}

#[test]
fn action_interchange_golden() {
    let reg = registry();
    for f in load_fixture("actions.json").as_array().unwrap() {
        let desc = f["description"].as_str().unwrap();
        let wire = hex::decode(f["wire"].as_str().unwrap()).unwrap();
        let env = ActionEnvelope::unpack(&wire, &reg, Resolution::Strict).unwrap();

        if let Some(key) = f.get("conflict").and_then(|k| k.as_str()) {
            match env.to_json() {
                Err(CodecError::InterchangeConflict { key: got }) => assert_eq!(got, key, "{desc}"),
                other => panic!("{desc}: expected conflict, got {other:?}"),
            }
            continue;
        }

        let json = env.to_json().unwrap();
        assert_eq!(json, f["interchange"], "{desc}");

        let back = ActionEnvelope::from_json(&f["interchange"], &reg, Resolution::Strict).unwrap();
        assert_eq!(back, env, "{desc}");
    }
}

#[test]
fn sized_fields_fill_from_interchange() {
    let reg = registry();
    let json = serde_json::json!({
        "account": "exchange",
        "name": "postnote",
        "author": "tbcox",
        "note": "hello",
        "tags": ["eosio", "mama"]
    });
    let env = ActionEnvelope::from_json(&json, &reg, Resolution::Strict).unwrap();
    let wire = hex::encode(env.pack(&reg).unwrap());

    let fixtures = load_fixture("actions.json");
    let expected = fixtures
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["action"] == "postnote")
        .unwrap();
    assert_eq!(wire, expected["wire"].as_str().unwrap());
}

// ─── Tables ───────────────────────────────────────────────────────────────────

#[test]
fn market_rows_golden() {
    let reg = registry();
    let f = load_fixture("market_rows.json");
    let layout = reg
        .table(name(&f, "contract"), name(&f, "table"))
        .expect("markets table registered");

    let rows: Vec<&str> = f["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    let decoded = TableRowDecoder::new(layout).decode(&rows).unwrap();

    let got: Vec<serde_json::Value> = decoded.iter().map(record_to_json).collect();
    assert_eq!(serde_json::Value::Array(got), f["expected"]);
}
