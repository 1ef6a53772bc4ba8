//! Helpers shared by the command line tools.
use abi_serializer::{AbiSerializer, SerializerConfig};
use anyhow::Context;
use std::{
    io::{self, Read, Write},
    path::Path,
};

/// Read the whole input, from the given file or from standard input if no
/// file is given.
pub fn read_input(input: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match input {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Cannot read input file {}.", path.display())),
        None => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data).context("Cannot read standard input.")?;
            Ok(data)
        }
    }
}

/// Decode hex text as typed on the command line. Surrounding whitespace and an
/// optional `0x` prefix are ignored.
pub fn decode_hex_input(text: &[u8]) -> anyhow::Result<Vec<u8>> {
    let text = std::str::from_utf8(text).context("Hex input is not valid UTF-8.")?.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(text).context("Input is not valid hex.")
}

/// Write the data to the given file, or to standard output followed by a
/// newline.
pub fn write_output(output: Option<&Path>, data: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            eprintln!("Writing output to {}", path.to_string_lossy());
            std::fs::write(path, data)
                .with_context(|| format!("Cannot write output file {}.", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            writeln!(stdout)?;
            Ok(())
        }
    }
}

/// Re-render compact JSON produced by the serializer with indentation. Field
/// order is kept.
pub fn to_pretty_json(compact: &[u8]) -> anyhow::Result<Vec<u8>> {
    let value: serde_json::Value =
        serde_json::from_slice(compact).context("Serializer produced invalid JSON.")?;
    Ok(serde_json::to_vec_pretty(&value)?)
}

/// Build a serializer from an optional configuration file, registering the
/// ABI in `abi` for `contract` if one is given.
pub fn build_serializer(
    config: Option<&Path>,
    contract: &str,
    abi: Option<&Path>,
) -> anyhow::Result<AbiSerializer> {
    let config = match config {
        Some(path) => SerializerConfig::from_json_file(path)?,
        None => SerializerConfig::default(),
    };
    let serializer = AbiSerializer::new(config).context("Cannot load the built-in ABIs.")?;
    if let Some(path) = abi {
        let abi_json = std::fs::read(path)
            .with_context(|| format!("Cannot read ABI file {}.", path.display()))?;
        serializer
            .register_contract_abi(contract, &abi_json)
            .with_context(|| format!("Cannot register the ABI of {}.", contract))?;
        log::info!("Registered ABI of {} from {}.", contract, path.display());
    }
    Ok(serializer)
}
