//! Command line access to the ABI serializer. Binary data is read and written
//! as hex, structured data as JSON.

use abi_serializer::{name::Name, AbiSerializer};
use abi_tools_helpers::*;
use anyhow::Context;
use clap::AppSettings;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
struct ContextOptions {
    #[structopt(long = "config", help = "Serializer configuration file in JSON.")]
    config: Option<PathBuf>,
    #[structopt(long = "abi", help = "ABI file to register for the contract before use.")]
    abi:    Option<PathBuf>,
}

#[derive(StructOpt)]
struct IoOptions {
    #[structopt(long = "in", help = "Input file. Defaults to standard input.")]
    input:  Option<PathBuf>,
    #[structopt(long = "out", help = "Output file. Defaults to standard output.")]
    output: Option<PathBuf>,
}

#[derive(StructOpt)]
struct ConfigAction {
    #[structopt(long = "contract", help = "Account the contract is deployed on.")]
    contract: String,
    #[structopt(long = "action", help = "Name of the action.")]
    action:   String,
    #[structopt(flatten)]
    context:  ContextOptions,
    #[structopt(flatten)]
    io:       IoOptions,
}

#[derive(StructOpt)]
struct ConfigType {
    #[structopt(long = "contract", help = "Contract whose ABI declares the type.")]
    contract:  String,
    #[structopt(long = "type", help = "Name of the struct.")]
    type_name: String,
    #[structopt(flatten)]
    context:   ContextOptions,
    #[structopt(flatten)]
    io:        IoOptions,
}

#[derive(StructOpt)]
struct ConfigAbi {
    #[structopt(long = "config", help = "Serializer configuration file in JSON.")]
    config: Option<PathBuf>,
    #[structopt(flatten)]
    io:     IoOptions,
}

#[derive(StructOpt)]
struct JsonOutput {
    #[structopt(long = "pretty", help = "Indent JSON output.")]
    pretty: bool,
}

#[derive(StructOpt)]
#[structopt(
    about = "Convert between JSON and the binary form of ABI described data",
    version = "0.1"
)]
enum AbiUtil {
    #[structopt(name = "pack-action", about = "Pack JSON action arguments into hex.")]
    PackAction(ConfigAction),
    #[structopt(name = "unpack-action", about = "Unpack hex action arguments into JSON.")]
    UnpackAction {
        #[structopt(flatten)]
        cfg:    ConfigAction,
        #[structopt(flatten)]
        output: JsonOutput,
    },
    #[structopt(name = "pack-type", about = "Pack a JSON value of a named struct into hex.")]
    PackType(ConfigType),
    #[structopt(name = "unpack-type", about = "Unpack hex into a JSON value of a named struct.")]
    UnpackType {
        #[structopt(flatten)]
        cfg:    ConfigType,
        #[structopt(flatten)]
        output: JsonOutput,
    },
    #[structopt(name = "pack-abi", about = "Pack an ABI document into hex.")]
    PackAbi(ConfigAbi),
    #[structopt(name = "unpack-abi", about = "Unpack a hex encoded ABI document into JSON.")]
    UnpackAbi {
        #[structopt(flatten)]
        cfg:    ConfigAbi,
        #[structopt(flatten)]
        output: JsonOutput,
    },
    #[structopt(name = "name-to-u64", about = "Print the numeric value of an account name.")]
    NameToU64 {
        #[structopt(help = "Account name.")]
        name: Name,
    },
    #[structopt(name = "u64-to-name", about = "Print the account name of a numeric value.")]
    U64ToName {
        #[structopt(help = "Numeric value of the name.")]
        value: u64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let app = AbiUtil::clap()
        .setting(AppSettings::ArgRequiredElseHelp)
        .global_setting(AppSettings::ColoredHelp);
    let matches = app.get_matches();
    let util = AbiUtil::from_clap(&matches);
    match util {
        AbiUtil::PackAction(cfg) => handle_pack_action(cfg),
        AbiUtil::UnpackAction { cfg, output } => handle_unpack_action(cfg, output.pretty),
        AbiUtil::PackType(cfg) => handle_pack_type(cfg),
        AbiUtil::UnpackType { cfg, output } => handle_unpack_type(cfg, output.pretty),
        AbiUtil::PackAbi(cfg) => handle_pack_abi(cfg),
        AbiUtil::UnpackAbi { cfg, output } => handle_unpack_abi(cfg, output.pretty),
        AbiUtil::NameToU64 { name } => {
            println!("{}", name.value());
            Ok(())
        }
        AbiUtil::U64ToName { value } => {
            println!("{}", Name(value));
            Ok(())
        }
    }
}

fn serializer_for(context: &ContextOptions, contract: &str) -> anyhow::Result<AbiSerializer> {
    build_serializer(context.config.as_deref(), contract, context.abi.as_deref())
}

fn write_json(io: &IoOptions, json: Vec<u8>, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty { to_pretty_json(&json)? } else { json };
    write_output(io.output.as_deref(), &json)
}

fn write_hex(io: &IoOptions, bytes: &[u8]) -> anyhow::Result<()> {
    write_output(io.output.as_deref(), hex::encode(bytes).as_bytes())
}

fn handle_pack_action(cfg: ConfigAction) -> anyhow::Result<()> {
    let serializer = serializer_for(&cfg.context, &cfg.contract)?;
    let json = read_input(cfg.io.input.as_deref())?;
    let packed = serializer
        .pack_action_args(&cfg.contract, &cfg.action, &json)
        .context("Could not pack the action arguments.")?;
    write_hex(&cfg.io, &packed)
}

fn handle_unpack_action(cfg: ConfigAction, pretty: bool) -> anyhow::Result<()> {
    let serializer = serializer_for(&cfg.context, &cfg.contract)?;
    let packed = decode_hex_input(&read_input(cfg.io.input.as_deref())?)?;
    let json = serializer
        .unpack_action_args(&cfg.contract, &cfg.action, &packed)
        .context("Could not unpack the action arguments.")?;
    write_json(&cfg.io, json, pretty)
}

fn handle_pack_type(cfg: ConfigType) -> anyhow::Result<()> {
    let serializer = serializer_for(&cfg.context, &cfg.contract)?;
    let json = read_input(cfg.io.input.as_deref())?;
    let packed = serializer
        .pack_abi_type(&cfg.contract, &cfg.type_name, &json)
        .with_context(|| format!("Could not pack a value of type {}.", cfg.type_name))?;
    write_hex(&cfg.io, &packed)
}

fn handle_unpack_type(cfg: ConfigType, pretty: bool) -> anyhow::Result<()> {
    let serializer = serializer_for(&cfg.context, &cfg.contract)?;
    let packed = decode_hex_input(&read_input(cfg.io.input.as_deref())?)?;
    let json = serializer
        .unpack_abi_type(&cfg.contract, &cfg.type_name, &packed)
        .with_context(|| format!("Could not unpack a value of type {}.", cfg.type_name))?;
    write_json(&cfg.io, json, pretty)
}

fn handle_pack_abi(cfg: ConfigAbi) -> anyhow::Result<()> {
    let serializer = build_serializer(cfg.config.as_deref(), "", None)?;
    let abi_json = read_input(cfg.io.input.as_deref())?;
    let packed = serializer.pack_abi(&abi_json).context("Could not pack the ABI.")?;
    write_hex(&cfg.io, &packed)
}

fn handle_unpack_abi(cfg: ConfigAbi, pretty: bool) -> anyhow::Result<()> {
    let serializer = build_serializer(cfg.config.as_deref(), "", None)?;
    let packed = decode_hex_input(&read_input(cfg.io.input.as_deref())?)?;
    let json = serializer.unpack_abi(&packed).context("Could not unpack the ABI.")?;
    write_json(&cfg.io, json, pretty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_only_for_json_output() {
        let pack = ["abi-util", "pack-action", "--contract", "c", "--action", "a", "--pretty"];
        assert!(AbiUtil::from_iter_safe(pack).is_err());
        let pack = ["abi-util", "pack-abi", "--pretty"];
        assert!(AbiUtil::from_iter_safe(pack).is_err());
        let unpack = ["abi-util", "unpack-action", "--contract", "c", "--action", "a", "--pretty"];
        match AbiUtil::from_iter_safe(unpack).unwrap() {
            AbiUtil::UnpackAction { cfg, output } => {
                assert_eq!(cfg.contract, "c");
                assert!(output.pretty);
            }
            _ => panic!("Expected unpack-action."),
        }
        match AbiUtil::from_iter_safe(["abi-util", "unpack-abi"]).unwrap() {
            AbiUtil::UnpackAbi { output, .. } => assert!(!output.pretty),
            _ => panic!("Expected unpack-abi."),
        }
    }
}
