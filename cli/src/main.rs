//! EOSCodec CLI, the command-line interface for EOSCodec.
//!
//! # Commands
//! ```
//! eoscodec name encode    <NAME>
//! eoscodec name decode    <VALUE>
//! eoscodec pack-action    --contract <name> --action <name> --json <payload>
//! eoscodec unpack-action  --hex <wire>
//! eoscodec decode-rows    --contract <name> --table <name> --rows <json>
//! eoscodec parse          --file <abi.yaml>
//! eoscodec validate       --dir <abi dir>
//! eoscodec info
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eoscodec_core::{name_to_string, Name, Resolution};
use eoscodec_observability::init_tracing;
use eoscodec_registry::MemoryRegistry;
use std::path::{Path, PathBuf};

mod cmd_action;
mod cmd_parse;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "eoscodec",
    about = "EOSIO name and ABI codec (EOSCodec CLI)",
    long_about = "
EOSCodec CLI: encode account/action names, pack and unpack actions, and
decode contract table rows against YAML ABI definitions.

ENVIRONMENT VARIABLES:
  RUST_LOG    Log filter directives (overrides the config file)
",
    version
)]
struct Cli {
    /// Config file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of ABI-definition files (overrides the config file)
    #[arg(long, global = true)]
    abi_dir: Option<PathBuf>,

    /// Fail when a payload has no registered layout
    #[arg(long, global = true)]
    strict: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert between name text and its 64-bit value
    Name {
        #[command(subcommand)]
        action: NameAction,
    },

    /// Pack an action from payload JSON to wire hex
    #[command(name = "pack-action")]
    PackAction {
        /// Contract account, e.g. eosio.token
        #[arg(long)]
        contract: String,
        /// Action name, e.g. transfer
        #[arg(long)]
        action: String,
        /// Payload fields as a JSON object
        #[arg(long, default_value = "{}")]
        json: String,
    },

    /// Unpack an action from wire hex to interchange JSON
    #[command(name = "unpack-action")]
    UnpackAction {
        /// Wire bytes (hex, optional 0x prefix)
        #[arg(long)]
        hex: String,
        /// Print {account, name, payload} instead of the flat form
        #[arg(long)]
        nested: bool,
    },

    /// Decode hex-encoded table rows
    #[command(name = "decode-rows")]
    DecodeRows {
        /// Contract account owning the table
        #[arg(long)]
        contract: String,
        /// Table name
        #[arg(long)]
        table: String,
        /// JSON array of hex rows, or {"rows": [...]}
        #[arg(long)]
        rows: String,
    },

    /// Parse and validate an ABI-definition file
    Parse {
        /// Path to the .yaml file
        #[arg(short, long)]
        file: String,
        /// Show field details
        #[arg(long)]
        fields: bool,
    },

    /// Validate every ABI-definition file in a directory
    Validate {
        #[arg(long, default_value = "./abi")]
        dir: String,
    },

    /// Show EOSCodec build and capability info
    Info,
}

#[derive(Subcommand)]
enum NameAction {
    /// Name text → u64 (decimal, hex, and little-endian wire hex)
    Encode { name: String },
    /// u64 (decimal or 0x-hex) → name text
    Decode { value: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.abi_dir {
        config.abi_dir = dir;
    }
    config.strict |= cli.strict;
    init_tracing(&config.log.clone().with_verbosity(cli.verbose));

    let resolution = if config.strict {
        Resolution::Strict
    } else {
        Resolution::Lenient
    };

    match cli.command {
        Commands::Name { action } => match action {
            NameAction::Encode { name } => cmd_name_encode(&name),
            NameAction::Decode { value } => cmd_name_decode(&value),
        },

        Commands::PackAction { contract, action, json } => {
            let registry = load_registry(&config.abi_dir)?;
            println!("{}", cmd_action::pack(&registry, &contract, &action, &json)?);
            Ok(())
        }

        Commands::UnpackAction { hex, nested } => {
            let registry = load_registry(&config.abi_dir)?;
            let json = cmd_action::unpack(&registry, &hex, resolution, nested)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }

        Commands::DecodeRows { contract, table, rows } => {
            let registry = load_registry(&config.abi_dir)?;
            let json = cmd_action::decode_rows(&registry, &contract, &table, &rows)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(())
        }

        Commands::Parse { file, fields } => cmd_parse::run(&file, fields),

        Commands::Validate { dir } => cmd_validate(&dir),

        Commands::Info => cmd_info(),
    }
}

fn load_registry(dir: &Path) -> Result<MemoryRegistry> {
    let registry = MemoryRegistry::new();
    registry
        .load_directory(dir)
        .with_context(|| format!("loading ABI definitions from {}", dir.display()))?;
    Ok(registry)
}

// ─── Command implementations ─────────────────────────────────────────────────

fn cmd_name_encode(name: &str) -> Result<()> {
    let n = Name::new(name).with_context(|| format!("invalid name '{name}'"))?;
    println!("{}", n.as_u64());
    println!("0x{:016x}", n.as_u64());
    println!("{}", hex::encode(n.to_le_bytes()));
    Ok(())
}

fn cmd_name_decode(value: &str) -> Result<()> {
    println!("{}", name_to_string(parse_u64(value)?));
    Ok(())
}

/// Decimal, or hex with a `0x` prefix.
fn parse_u64(value: &str) -> Result<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => value.parse(),
    }
    .with_context(|| format!("'{value}' is not a u64"))
}

fn cmd_validate(dir: &str) -> Result<()> {
    use eoscodec_registry::AbiParser;

    let mut ok = 0;
    let mut errors = 0;

    for entry in walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
    {
        let path = entry.path();
        let content = std::fs::read_to_string(path)?;
        match AbiParser::parse_all(&content) {
            Ok(contracts) => {
                ok += contracts.len();
                println!("  ✓ {} ({} contracts)", path.display(), contracts.len());
            }
            Err(e) => {
                errors += 1;
                eprintln!("  ✗ {}: {}", path.display(), e);
            }
        }
    }

    println!("\n{} contracts valid, {} files with errors", ok, errors);
    if errors > 0 {
        anyhow::bail!("{} ABI files failed validation", errors);
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("EOSCodec v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Capabilities:");
    println!("  ✓ Name codec              (13-char base-32 names ↔ u64)");
    println!("  ✓ Binary ABI codec        (LE integers, varint prefixes, sized fields)");
    println!("  ✓ Action envelopes        (registry-resolved payloads)");
    println!("  ✓ Interchange JSON        (flat, lexicographic keys)");
    println!("  ✓ Table-row decoding      (hex rows, all-or-nothing)");
    println!("  ✓ ABI definitions         (multi-doc YAML)");
    println!("  ✓ In-memory registry      (keyed by contract account)");
    println!();
    println!("Field kinds: uint8..uint64 int8..int64 varuint32 bool name symbol");
    println!("             bytes bytesN string T[] and declared structs");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_u64_forms() {
        assert_eq!(parse_u64("6138663577826885632").unwrap(), 0x5530ea0000000000);
        assert_eq!(parse_u64("0x5530ea0000000000").unwrap(), 6138663577826885632);
        assert!(parse_u64("eosio").is_err());
        assert!(parse_u64("0x1ffffffffffffffff").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "eoscodec", "unpack-action", "--hex", "00", "--strict", "-vv", "--abi-dir", "x",
        ])
        .unwrap();
        assert!(cli.strict);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.abi_dir, Some(PathBuf::from("x")));
    }
}
