//! Recursive packing and unpacking of struct values.
//!
//! Only the fields a struct declares itself are walked. A `base` struct is
//! never visited, so inherited fields are not part of the binary layout.
use crate::{
    abi::StructDef,
    common::*,
    config::SerializerConfig,
    constants::ARRAY_SUFFIX,
    error::*,
    registry::{ContractAbi, Scope, StructRef, TypeKind},
    scalar::{decode_scalar, encode_scalar},
    value::AbiValue,
};
use serde_json::{Map, Value};
use std::convert::TryFrom;

/// Walks structs of one contract ABI, resolving system scoped structs in the
/// system ABI.
pub struct StructWalker<'a> {
    contract: &'a ContractAbi,
    system:   &'a ContractAbi,
    config:   &'a SerializerConfig,
}

impl<'a> StructWalker<'a> {
    pub fn new(
        contract: &'a ContractAbi,
        system: &'a ContractAbi,
        config: &'a SerializerConfig,
    ) -> Self {
        StructWalker {
            contract,
            system,
            config,
        }
    }

    fn lookup(&self, target: StructRef) -> (&'a StructDef, &'a [TypeKind]) {
        let abi = match target.scope {
            Scope::Contract => self.contract,
            Scope::System => self.system,
        };
        (abi.struct_def(target.index), abi.field_kinds(target.index))
    }

    fn enter(&self, depth: usize) -> ParseResult<usize> {
        if depth >= self.config.max_depth {
            return Err(AbiError::DepthExceeded(self.config.max_depth));
        }
        Ok(depth + 1)
    }

    /// Whether values of `kind` have an empty binary form, i.e., structs with
    /// no fields or only such fields. Arrays of these cannot be checked
    /// against the input length, so only empty ones are accepted.
    fn takes_no_bytes(&self, kind: &TypeKind, depth: usize) -> bool {
        match kind {
            TypeKind::Struct(target) if depth < self.config.max_depth => {
                let (_, kinds) = self.lookup(*target);
                kinds.iter().all(|field| self.takes_no_bytes(field, depth + 1))
            }
            _ => false,
        }
    }

    fn check_array_len(
        &self,
        element: &TypeKind,
        type_name: &str,
        count: u32,
    ) -> ParseResult<()> {
        if count > 0 && self.takes_no_bytes(element, 0) {
            return Err(AbiError::format(
                type_name,
                count.to_string(),
                "non-empty arrays of types without binary content are not supported",
            ));
        }
        Ok(())
    }

    /// Append the binary form of `record` to `out`. The fields are written in
    /// declaration order regardless of the order of keys in the record. On
    /// error `out` may hold a partial write.
    pub fn pack<B: Buffer>(
        &self,
        target: StructRef,
        record: &AbiValue,
        out: &mut B,
    ) -> ParseResult<()> {
        self.pack_struct(target, record, 0, out)
    }

    fn pack_struct<B: Buffer>(
        &self,
        target: StructRef,
        record: &AbiValue,
        depth: usize,
        out: &mut B,
    ) -> ParseResult<()> {
        let depth = self.enter(depth)?;
        let (def, kinds) = self.lookup(target);
        if !matches!(record, AbiValue::Object(_)) {
            return Err(AbiError::format(&def.name, record.describe(), "expected a JSON object"));
        }
        for (field, kind) in def.fields.iter().zip(kinds) {
            let value = record.get(&field.name).ok_or_else(|| AbiError::MissingField {
                structure: def.name.clone(),
                field:     field.name.clone(),
            })?;
            self.pack_value(kind, &field.ty, value, depth, out)
                .map_err(|e| e.in_field(&field.name))?;
        }
        Ok(())
    }

    fn pack_value<B: Buffer>(
        &self,
        kind: &TypeKind,
        type_name: &str,
        value: &AbiValue,
        depth: usize,
        out: &mut B,
    ) -> ParseResult<()> {
        match (kind, value) {
            (TypeKind::Unresolved(name), _) => Err(AbiError::UnknownType(name.clone())),
            (TypeKind::Primitive(ty), _) => encode_scalar(*ty, value, self.config, out),
            (TypeKind::Struct(target), _) => self.pack_struct(*target, value, depth, out),
            (TypeKind::Array(element), AbiValue::Array(items)) => {
                let count = u32::try_from(items.len())
                    .map_err(|_| AbiError::overflow("varuint32", items.len()))?;
                self.check_array_len(element, type_name, count)?;
                out.put(&VarUint32(count));
                let element_name = type_name.strip_suffix(ARRAY_SUFFIX).unwrap_or(type_name);
                for item in items {
                    self.pack_value(element, element_name, item, depth, out)?;
                }
                Ok(())
            }
            (TypeKind::Array(_), other) => {
                Err(AbiError::format(type_name, other.describe(), "expected a JSON array"))
            }
        }
    }

    /// Read one struct from `source`, returning its fields in declaration
    /// order. Bytes after the struct are left unread.
    pub fn unpack<R: ReadBytesExt>(&self, target: StructRef, source: &mut R) -> ParseResult<Value> {
        self.unpack_struct(target, source, 0)
    }

    fn unpack_struct<R: ReadBytesExt>(
        &self,
        target: StructRef,
        source: &mut R,
        depth: usize,
    ) -> ParseResult<Value> {
        let depth = self.enter(depth)?;
        let (def, kinds) = self.lookup(target);
        let mut record = Map::new();
        for (field, kind) in def.fields.iter().zip(kinds) {
            let value = self
                .unpack_value(kind, &field.ty, source, depth)
                .map_err(|e| e.in_field(&field.name))?;
            record.insert(field.name.clone(), value);
        }
        Ok(Value::Object(record))
    }

    fn unpack_value<R: ReadBytesExt>(
        &self,
        kind: &TypeKind,
        type_name: &str,
        source: &mut R,
        depth: usize,
    ) -> ParseResult<Value> {
        match kind {
            TypeKind::Primitive(ty) => decode_scalar(*ty, self.config, source),
            TypeKind::Struct(target) => self.unpack_struct(*target, source, depth),
            TypeKind::Array(element) => {
                let VarUint32(count) = source.get()?;
                self.check_array_len(element, type_name, count)?;
                let element_name = type_name.strip_suffix(ARRAY_SUFFIX).unwrap_or(type_name);
                let mut items = safe_with_capacity(count as usize);
                for _ in 0..count {
                    items.push(self.unpack_value(element, element_name, source, depth)?);
                }
                Ok(Value::Array(items))
            }
            TypeKind::Unresolved(name) => Err(AbiError::UnknownType(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{abi::AbiDefinition, registry::AbiRegistry, ErrorKind};
    use serde_json::json;
    use std::io::Cursor;

    const ABI: &str = r#"{
        "structs": [
            {"name": "point", "fields": [{"name": "x", "type": "int32"}, {"name": "y", "type": "int32"}]},
            {"name": "shape", "fields": [
                {"name": "label", "type": "string"},
                {"name": "points", "type": "point[]"},
                {"name": "ids", "type": "uint64[]"}]},
            {"name": "node", "fields": [{"name": "next", "type": "node"}]},
            {"name": "broken", "fields": [{"name": "x", "type": "nothing"}]},
            {"name": "derived", "base": "point", "fields": [{"name": "z", "type": "int32"}]},
            {"name": "empty", "fields": []},
            {"name": "hollow", "fields": [{"name": "inner", "type": "empty"}]},
            {"name": "holder", "fields": [
                {"name": "xs", "type": "empty[]"},
                {"name": "ys", "type": "hollow[]"}]}
        ]
    }"#;

    fn registry() -> AbiRegistry {
        let registry = AbiRegistry::new(AbiDefinition::default());
        registry.register("c", ABI.as_bytes()).unwrap();
        registry
    }

    fn pack(registry: &AbiRegistry, ty: &str, json: &str) -> ParseResult<Vec<u8>> {
        let config = SerializerConfig::default();
        let resolved = registry.resolve_struct("c", ty)?;
        let walker = StructWalker::new(&resolved.abi, registry.system(), &config);
        let mut out = Vec::new();
        walker.pack(resolved.target, &AbiValue::from_json_slice(json.as_bytes())?, &mut out)?;
        Ok(out)
    }

    fn unpack(registry: &AbiRegistry, ty: &str, bytes: &[u8]) -> ParseResult<Value> {
        let config = SerializerConfig::default();
        let resolved = registry.resolve_struct("c", ty)?;
        let walker = StructWalker::new(&resolved.abi, registry.system(), &config);
        walker.unpack(resolved.target, &mut Cursor::new(bytes))
    }

    #[test]
    fn test_nested_structs_and_arrays() {
        let registry = registry();
        let json = r#"{"ids": [1, "2"], "points": [{"y": 2, "x": 1}], "label": "l"}"#;
        let bytes = pack(&registry, "shape", json).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            "016c01010000000200000002\
             01000000000000000200000000000000"
        );
        let value = unpack(&registry, "shape", &bytes).unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"label":"l","points":[{"x":1,"y":2}],"ids":[1,2]}"#
        );
    }

    #[test]
    fn test_base_fields_are_not_walked() {
        let registry = registry();
        let bytes = pack(&registry, "derived", r#"{"x": 1, "y": 2, "z": 3}"#).unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0]);
        assert_eq!(unpack(&registry, "derived", &bytes).unwrap(), json!({"z": 3}));
    }

    #[test]
    fn test_missing_field_names_struct() {
        let registry = registry();
        let err = pack(&registry, "point", r#"{"x": 1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(err.to_string().contains("'y'"));
    }

    #[test]
    fn test_error_path_through_arrays() {
        let registry = registry();
        let err = pack(&registry, "shape", r#"{"label": "", "points": [{"x": 1, "y": "a"}], "ids": []}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert_eq!(err.field_path(), Some("points.y"));
    }

    #[test]
    fn test_shape_mismatches() {
        let registry = registry();
        let err = pack(&registry, "shape", r#"{"label": "", "points": {}, "ids": []}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        let err = pack(&registry, "shape", r#"{"label": "", "points": ["p"], "ids": []}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        let err = pack(&registry, "point", "[1, 2]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }

    #[test]
    fn test_unresolved_type_fails_on_use() {
        let registry = registry();
        let err = pack(&registry, "broken", r#"{"x": 1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        let err = unpack(&registry, "broken", &[0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
    }

    #[test]
    fn test_recursion_is_bounded() {
        let registry = registry();
        let mut json = String::from("{}");
        for _ in 0..40 {
            json = format!(r#"{{"next": {}}}"#, json);
        }
        let err = pack(&registry, "node", &json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
        let err = unpack(&registry, "node", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn test_truncated_array() {
        let registry = registry();
        // Claims three ids but holds one.
        let bytes = hex::decode("0000030100000000000000").unwrap();
        let err = unpack(&registry, "shape", &bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnderlyingCodecError);
        assert_eq!(err.field_path(), Some("ids"));
    }

    #[test]
    fn test_arrays_of_empty_structs() {
        let registry = registry();
        // A count of 2^24 in four bytes, with elements that take no bytes.
        let err = unpack(&registry, "holder", &[0x80, 0x80, 0x80, 0x08]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert_eq!(err.field_path(), Some("xs"));
        let err = unpack(&registry, "holder", &[0x00, 0xff, 0xff, 0xff, 0xff, 0x0f]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert_eq!(err.field_path(), Some("ys"));
        assert_eq!(unpack(&registry, "holder", &[0, 0]).unwrap(), json!({"xs": [], "ys": []}));
        let err = pack(&registry, "holder", r#"{"xs": [{}], "ys": []}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert_eq!(pack(&registry, "holder", r#"{"xs": [], "ys": []}"#).unwrap(), vec![0, 0]);
    }
}
