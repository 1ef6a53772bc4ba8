//! The serializer context: a registry of contract ABIs together with codec
//! settings. One context is built at startup and shared by every caller.
use crate::{
    abi::AbiDefinition,
    common::*,
    config::SerializerConfig,
    constants::{ABI_DEF_STRUCT, SYSTEM_ABI, TOKEN_ABI, TOKEN_CONTRACT},
    error::*,
    registry::{AbiRegistry, ResolvedStruct},
    value::AbiValue,
    walker::StructWalker,
};
use log::{debug, trace};
use serde_json::Value;
use std::io::Cursor;

#[derive(Debug)]
pub struct AbiSerializer {
    registry: AbiRegistry,
    config:   SerializerConfig,
}

impl AbiSerializer {
    /// Build a context holding the built-in system ABI, and the token contract
    /// ABI unless the configuration disables it.
    pub fn new(config: SerializerConfig) -> ParseResult<Self> {
        let registry = AbiRegistry::new(AbiDefinition::from_json(SYSTEM_ABI.as_bytes())?);
        if config.preload_token_abi {
            registry.register(TOKEN_CONTRACT, TOKEN_ABI.as_bytes())?;
        }
        Ok(AbiSerializer { registry, config })
    }

    pub fn registry(&self) -> &AbiRegistry { &self.registry }

    /// Register the ABI of a contract, replacing any earlier registration.
    pub fn register_contract_abi(&self, contract: &str, abi_json: &[u8]) -> ParseResult<()> {
        self.registry.register(contract, abi_json)?;
        Ok(())
    }

    pub fn is_abi_cached(&self, contract: &str) -> bool { self.registry.is_registered(contract) }

    /// Name of the struct holding the arguments of an action.
    pub fn action_struct_name(&self, contract: &str, action: &str) -> Option<String> {
        let abi = self.registry.contract(contract)?;
        abi.action_type(action).map(str::to_string)
    }

    /// Declared type of a field. Unlike packing, this also searches the fields
    /// of base structs.
    pub fn field_type(&self, contract: &str, struct_name: &str, field: &str) -> Option<String> {
        let system = self.registry.system();
        let abi = self.registry.contract(contract).unwrap_or_else(|| system.clone());
        abi.field_type(system, struct_name, field).map(str::to_string)
    }

    fn walker<'a>(&'a self, resolved: &'a ResolvedStruct) -> StructWalker<'a> {
        StructWalker::new(&resolved.abi, self.registry.system(), &self.config)
    }

    fn pack_resolved(&self, resolved: &ResolvedStruct, args: &AbiValue) -> ParseResult<Vec<u8>> {
        let mut out = Vec::<u8>::start();
        self.walker(resolved).pack(resolved.target, args, &mut out)?;
        Ok(out.result())
    }

    fn unpack_resolved(&self, resolved: &ResolvedStruct, packed: &[u8]) -> ParseResult<Value> {
        let mut source = Cursor::new(packed);
        let value = self.walker(resolved).unpack(resolved.target, &mut source)?;
        let unread = packed.len() as u64 - source.position();
        if unread > 0 {
            debug!(
                "Ignoring {} trailing bytes after struct {}.",
                unread,
                resolved.abi.struct_def(resolved.target.index).name
            );
        }
        Ok(value)
    }

    /// Pack the JSON arguments of an action into its binary form.
    pub fn pack_action_args(
        &self,
        contract: &str,
        action: &str,
        json_args: &[u8],
    ) -> ParseResult<Vec<u8>> {
        self.pack_action_value(contract, action, &AbiValue::from_json_slice(json_args)?)
    }

    pub fn pack_action_value(
        &self,
        contract: &str,
        action: &str,
        args: &AbiValue,
    ) -> ParseResult<Vec<u8>> {
        trace!("Packing action {} of {}.", action, contract);
        let resolved = self.registry.resolve_action_struct(contract, action)?;
        self.pack_resolved(&resolved, args)
    }

    /// Unpack the binary arguments of an action into compact JSON.
    pub fn unpack_action_args(
        &self,
        contract: &str,
        action: &str,
        packed: &[u8],
    ) -> ParseResult<Vec<u8>> {
        let value = self.unpack_action_args_value(contract, action, packed)?;
        Ok(value.to_string().into_bytes())
    }

    pub fn unpack_action_args_value(
        &self,
        contract: &str,
        action: &str,
        packed: &[u8],
    ) -> ParseResult<Value> {
        trace!("Unpacking action {} of {}.", action, contract);
        let resolved = self.registry.resolve_action_struct(contract, action)?;
        self.unpack_resolved(&resolved, packed)
    }

    /// Pack a JSON value of the named struct. The struct is looked up in the
    /// contract's ABI first and in the system ABI second.
    pub fn pack_abi_type(
        &self,
        contract: &str,
        type_name: &str,
        json_args: &[u8],
    ) -> ParseResult<Vec<u8>> {
        self.pack_abi_type_value(contract, type_name, &AbiValue::from_json_slice(json_args)?)
    }

    pub fn pack_abi_type_value(
        &self,
        contract: &str,
        type_name: &str,
        args: &AbiValue,
    ) -> ParseResult<Vec<u8>> {
        trace!("Packing type {} of {}.", type_name, contract);
        let resolved = self.registry.resolve_struct(contract, type_name)?;
        self.pack_resolved(&resolved, args)
    }

    pub fn unpack_abi_type(
        &self,
        contract: &str,
        type_name: &str,
        packed: &[u8],
    ) -> ParseResult<Vec<u8>> {
        let value = self.unpack_abi_type_value(contract, type_name, packed)?;
        Ok(value.to_string().into_bytes())
    }

    pub fn unpack_abi_type_value(
        &self,
        contract: &str,
        type_name: &str,
        packed: &[u8],
    ) -> ParseResult<Value> {
        trace!("Unpacking type {} of {}.", type_name, contract);
        let resolved = self.registry.resolve_struct(contract, type_name)?;
        self.unpack_resolved(&resolved, packed)
    }

    /// Pack an ABI document into its binary form, as stored on the ledger.
    pub fn pack_abi(&self, abi_json: &[u8]) -> ParseResult<Vec<u8>> {
        let definition = AbiDefinition::from_json(abi_json)?;
        let canonical = serde_json::to_value(&definition).map_err(AbiError::MalformedAbi)?;
        let resolved = self.registry.resolve_system_struct(ABI_DEF_STRUCT)?;
        self.pack_resolved(&resolved, &AbiValue::from(canonical))
    }

    /// Unpack the binary form of an ABI document into compact JSON.
    pub fn unpack_abi(&self, packed: &[u8]) -> ParseResult<Vec<u8>> {
        let resolved = self.registry.resolve_system_struct(ABI_DEF_STRUCT)?;
        let value = self.unpack_resolved(&resolved, packed)?;
        Ok(value.to_string().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;
    use std::{sync::Arc, thread};

    const TRANSFER_ABI: &str = r#"{
        "version": "eosio::abi/1.1",
        "structs": [{
            "name": "transfer",
            "base": "",
            "fields": [
                {"name": "from", "type": "name"},
                {"name": "to", "type": "name"},
                {"name": "quantity", "type": "asset"},
                {"name": "memo", "type": "string"}
            ]
        }, {
            "name": "batch",
            "fields": [{"name": "ids", "type": "uint64[]"}]
        }],
        "actions": [
            {"name": "transfer", "type": "transfer", "ricardian_contract": ""},
            {"name": "batch", "type": "batch"}
        ]
    }"#;

    const PINNED_TRANSFER: &str = "10428a97721aa36a0000000000000e3d102700000000000004454f53000000001a7472616e736665722066726f6d20616c69636520746f20626f62";

    fn serializer() -> AbiSerializer {
        let serializer = AbiSerializer::new(SerializerConfig::default()).unwrap();
        serializer.register_contract_abi("hello", TRANSFER_ABI.as_bytes()).unwrap();
        serializer
    }

    #[test]
    fn test_pinned_transfer_fixture() {
        let serializer = serializer();
        let args = r#"{"from":"helloworld11","to":"bob","quantity":"1.0000 EOS","memo":"transfer from alice to bob"}"#;
        let packed = serializer.pack_action_args("hello", "transfer", args.as_bytes()).unwrap();
        assert_eq!(hex::encode(&packed), PINNED_TRANSFER);
        let json = serializer.unpack_action_args("hello", "transfer", &packed).unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), args);
    }

    #[test]
    fn test_hello_alice_scenario() {
        let serializer = serializer();
        let args = r#"{"from":"hello","to":"alice","quantity":"1.0000 EOS","memo":"transfer from alice"}"#;
        let packed = serializer.pack_action_args("hello", "transfer", args.as_bytes()).unwrap();
        assert_eq!(
            hex::encode(&packed),
            "00000000001aa36a0000000000855c34102700000000000004454f5300000000137472616e736665722066726f6d20616c696365"
        );
        let value = serializer.unpack_action_args_value("hello", "transfer", &packed).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["from", "to", "quantity", "memo"]);
    }

    #[test]
    fn test_field_order_independence() {
        let serializer = serializer();
        let ordered = r#"{"from":"hello","to":"alice","quantity":"1.0000 EOS","memo":"m"}"#;
        let shuffled = r#"{"memo":"m","quantity":"1.0000 EOS","to":"alice","from":"hello"}"#;
        assert_eq!(
            serializer.pack_action_args("hello", "transfer", ordered.as_bytes()).unwrap(),
            serializer.pack_action_args("hello", "transfer", shuffled.as_bytes()).unwrap()
        );
    }

    #[test]
    fn test_uint64_array_scenario() {
        let serializer = serializer();
        let packed = serializer.pack_action_args("hello", "batch", br#"{"ids": [1, 2, 3]}"#).unwrap();
        assert_eq!(
            hex::encode(&packed),
            "03010000000000000002000000000000000300000000000000"
        );
        let value = serializer.unpack_action_args_value("hello", "batch", &packed).unwrap();
        assert_eq!(value, json!({"ids": [1, 2, 3]}));
    }

    #[test]
    fn test_resolution_failures_are_typed() {
        let serializer = serializer();
        let err = serializer.pack_action_args("nobody", "transfer", b"{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaError);
        let err = serializer.pack_action_args("hello", "unknown", b"{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        let err = serializer.unpack_abi_type("hello", "unknown", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        let err = serializer.register_contract_abi("bad", b"{").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaError);
        let err = serializer.pack_action_args("hello", "transfer", b"not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }

    #[test]
    fn test_token_abi_is_preloaded() {
        let serializer = serializer();
        assert!(serializer.is_abi_cached(TOKEN_CONTRACT));
        assert_eq!(serializer.action_struct_name(TOKEN_CONTRACT, "issue").as_deref(), Some("issue"));
        let args = r#"{"to":"alice","quantity":"5.0000 EOS","memo":""}"#;
        let packed = serializer.pack_action_args(TOKEN_CONTRACT, "issue", args.as_bytes()).unwrap();
        let json = serializer.unpack_action_args(TOKEN_CONTRACT, "issue", &packed).unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), args);

        let bare = AbiSerializer::new(SerializerConfig {
            preload_token_abi: false,
            ..SerializerConfig::default()
        })
        .unwrap();
        assert!(!bare.is_abi_cached(TOKEN_CONTRACT));
    }

    #[test]
    fn test_system_types_are_a_fallback() {
        let serializer = serializer();
        let level = r#"{"actor":"alice","permission":"active"}"#;
        let packed = serializer.pack_abi_type("hello", "permission_level", level.as_bytes()).unwrap();
        assert_eq!(packed.len(), 16);
        let json = serializer.unpack_abi_type("unregistered", "permission_level", &packed).unwrap();
        assert_eq!(String::from_utf8(json).unwrap(), level);
        assert_eq!(serializer.field_type("hello", "action", "data").as_deref(), Some("bytes"));
    }

    #[test]
    fn test_transaction_round_trip() {
        let serializer = serializer();
        let transfer = serializer
            .pack_action_args("hello", "transfer", br#"{"from":"hello","to":"alice","quantity":"1.0000 EOS","memo":""}"#)
            .unwrap();
        let trx = json!({
            "expiration": "2021-08-31T05:59:39",
            "ref_block_num": 1234,
            "ref_block_prefix": 3_000_000_000u32,
            "max_net_usage_words": 0,
            "max_cpu_usage_ms": 0,
            "delay_sec": 0,
            "context_free_actions": [],
            "actions": [{
                "account": "hello",
                "name": "transfer",
                "authorization": [{"actor": "hello", "permission": "active"}],
                "data": hex::encode(&transfer),
            }],
            "transaction_extensions": [],
        });
        let packed = serializer
            .pack_abi_type("eosio", "transaction", trx.to_string().as_bytes())
            .unwrap();
        let value = serializer.unpack_abi_type_value("eosio", "transaction", &packed).unwrap();
        assert_eq!(value, trx);
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let serializer = serializer();
        let mut packed = hex::decode(PINNED_TRANSFER).unwrap();
        packed.extend_from_slice(&[0xde, 0xad]);
        assert!(serializer.unpack_action_args("hello", "transfer", &packed).is_ok());
    }

    #[test]
    fn test_abi_round_trip() {
        let serializer = serializer();
        let packed = serializer.pack_abi(TRANSFER_ABI.as_bytes()).unwrap();
        let json = serializer.unpack_abi(&packed).unwrap();
        let back = AbiDefinition::from_json(&json).unwrap();
        assert_eq!(back, AbiDefinition::from_json(TRANSFER_ABI.as_bytes()).unwrap());
        let token = serializer.pack_abi(TOKEN_ABI.as_bytes()).unwrap();
        let back = AbiDefinition::from_json(&serializer.unpack_abi(&token).unwrap()).unwrap();
        assert_eq!(back, AbiDefinition::from_json(TOKEN_ABI.as_bytes()).unwrap());
    }

    #[test]
    fn test_shared_between_threads() {
        let serializer = Arc::new(serializer());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let serializer = serializer.clone();
                thread::spawn(move || {
                    let contract = format!("contract{}", i + 1);
                    serializer.register_contract_abi(&contract, TRANSFER_ABI.as_bytes()).unwrap();
                    let args = r#"{"from":"hello","to":"alice","quantity":"1.0000 EOS","memo":""}"#;
                    serializer.pack_action_args(&contract, "transfer", args.as_bytes()).unwrap()
                })
            })
            .collect();
        let results: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
