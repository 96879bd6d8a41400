//! `eoscodec parse`: validate and pretty-print an ABI-definition file.

use anyhow::{Context, Result};
use eoscodec_core::RecordDescriptor;
use eoscodec_registry::AbiParser;

pub fn run(file: &str, verbose: bool) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    let contracts = AbiParser::parse_all(&content).with_context(|| format!("parsing {file}"))?;
    if contracts.is_empty() {
        anyhow::bail!("{file}: no contract documents");
    }

    for abi in &contracts {
        println!("✓ Contract '{}' parsed successfully", abi.account);
        if let Some(description) = &abi.description {
            println!("  Description: {description}");
        }
        println!("  Structs:     {}", abi.structs.len());
        println!("  Actions:     {}", abi.actions.len());
        for (name, desc) in &abi.actions {
            print_record(&name.to_string(), desc, verbose);
        }
        println!("  Tables:      {}", abi.tables.len());
        for (name, desc) in &abi.tables {
            print_record(&name.to_string(), desc, verbose);
        }
    }
    Ok(())
}

fn print_record(name: &str, desc: &RecordDescriptor, verbose: bool) {
    println!("    - {name} ({} fields)", desc.fields().len());
    if !verbose {
        return;
    }
    for field in desc.fields() {
        match &field.size_from {
            Some(source) => println!("        {}: {} [sized by {source}]", field.name, field.kind),
            None => println!("        {}: {}", field.name, field.kind),
        }
    }
}
