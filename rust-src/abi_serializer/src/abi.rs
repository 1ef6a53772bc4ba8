//! The ABI document: the JSON description of the structs, actions and tables
//! of a contract. Every section is optional in the JSON.
use crate::{common::*, error::*};

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct AbiDefinition {
    pub version:           String,
    pub types:             Vec<TypeDef>,
    pub structs:           Vec<StructDef>,
    pub actions:           Vec<ActionDef>,
    pub tables:            Vec<TableDef>,
    pub ricardian_clauses: Vec<ClausePair>,
    pub error_messages:    Vec<ErrorMessage>,
    pub abi_extensions:    Vec<AbiExtension>,
    pub variants:          Vec<VariantDef>,
}

impl AbiDefinition {
    pub fn from_json(bytes: &[u8]) -> ParseResult<Self> {
        serde_json::from_slice(bytes).map_err(AbiError::MalformedAbi)
    }
}

/// Type alias declared by the ABI. Aliases are kept in the document but are
/// not expanded during packing.
#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub ty:            String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct StructDef {
    pub name:   String,
    /// Empty if the struct has no base.
    pub base:   String,
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    pub fn base(&self) -> Option<&str> {
        if self.base.is_empty() {
            None
        } else {
            Some(&self.base)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct ActionDef {
    pub name:               String,
    /// Name of the struct holding the action's arguments.
    #[serde(rename = "type")]
    pub ty:                 String,
    pub ricardian_contract: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct TableDef {
    pub name:       String,
    pub index_type: String,
    pub key_names:  Vec<String>,
    pub key_types:  Vec<String>,
    #[serde(rename = "type")]
    pub ty:         String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct ClausePair {
    pub id:   String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct ErrorMessage {
    pub error_code: u64,
    pub error_msg:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct AbiExtension {
    pub tag:   u16,
    /// Hex encoded payload.
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct VariantDef {
    pub name:  String,
    pub types: Vec<String>,
}
