//! Registered contract ABIs, with every field type resolved once at
//! registration.
//!
//! A field type name resolves, in order, to a primitive, a struct of the same
//! ABI, a struct of the system ABI, or a list of one of those (a single `[]`
//! suffix). Names that resolve to none of these are kept as
//! [TypeKind::Unresolved] and only fail when a value of that type is packed or
//! unpacked.
use crate::{
    abi::{AbiDefinition, StructDef},
    constants::ARRAY_SUFFIX,
    error::*,
    scalar::ScalarType,
};
use log::{info, warn};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Which ABI a [StructRef] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Contract,
    System,
}

/// Index of a struct within the `structs` of the ABI given by `scope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructRef {
    pub scope: Scope,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(ScalarType),
    Struct(StructRef),
    /// List of the element kind, which is never itself a list.
    Array(Box<TypeKind>),
    Unresolved(String),
}

/// A registered ABI together with its resolved field types.
#[derive(Debug)]
pub struct ContractAbi {
    definition:   AbiDefinition,
    struct_index: HashMap<String, usize>,
    field_kinds:  Vec<Vec<TypeKind>>,
    actions:      HashMap<String, String>,
}

impl ContractAbi {
    /// Resolve all field types of `definition`. `system` is the ABI that
    /// struct lookups fall back to, and is `None` when building the system ABI
    /// itself.
    pub fn new(definition: AbiDefinition, system: Option<&ContractAbi>) -> Self {
        let scope = if system.is_some() {
            Scope::Contract
        } else {
            Scope::System
        };
        let mut struct_index = HashMap::new();
        for (index, def) in definition.structs.iter().enumerate() {
            // On duplicate names the first declaration wins.
            struct_index.entry(def.name.clone()).or_insert(index);
        }
        let mut actions = HashMap::new();
        for action in &definition.actions {
            actions.entry(action.name.clone()).or_insert_with(|| action.ty.clone());
        }
        let field_kinds = definition
            .structs
            .iter()
            .map(|def| {
                def.fields
                    .iter()
                    .map(|field| resolve_kind(&field.ty, &struct_index, scope, system))
                    .collect()
            })
            .collect();
        ContractAbi {
            definition,
            struct_index,
            field_kinds,
            actions,
        }
    }

    pub fn struct_by_name(&self, name: &str) -> Option<usize> {
        self.struct_index.get(name).copied()
    }

    /// Panics if `index` did not come from this ABI.
    pub fn struct_def(&self, index: usize) -> &StructDef { &self.definition.structs[index] }

    /// Resolved field types of a struct, in declaration order.
    pub fn field_kinds(&self, index: usize) -> &[TypeKind] { &self.field_kinds[index] }

    /// Name of the struct declared as the type of an action.
    pub fn action_type(&self, action: &str) -> Option<&str> {
        self.actions.get(action).map(String::as_str)
    }

    /// Field type names that could not be resolved, with the struct declaring
    /// them.
    pub fn unresolved_types(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for (def, kinds) in self.definition.structs.iter().zip(&self.field_kinds) {
            for kind in kinds {
                if let TypeKind::Unresolved(name) = kind {
                    out.push((def.name.as_str(), name.as_str()));
                }
            }
        }
        out
    }

    /// Look up the declared type of a field, searching the `base` chain of the
    /// struct when the struct itself does not declare the field.
    pub fn field_type<'a>(
        &'a self,
        system: &'a ContractAbi,
        struct_name: &str,
        field: &str,
    ) -> Option<&'a str> {
        let mut current = self.lookup_struct(system, struct_name)?;
        // Bounded so that a cyclic base chain terminates.
        for _ in 0..=self.definition.structs.len() + system.definition.structs.len() {
            if let Some(def) = current.fields.iter().find(|f| f.name == field) {
                return Some(&def.ty);
            }
            current = self.lookup_struct(system, current.base()?)?;
        }
        None
    }

    fn lookup_struct<'a>(&'a self, system: &'a ContractAbi, name: &str) -> Option<&'a StructDef> {
        self.struct_by_name(name)
            .map(|i| self.struct_def(i))
            .or_else(|| system.struct_by_name(name).map(|i| system.struct_def(i)))
    }
}

fn resolve_element(
    name: &str,
    own: &HashMap<String, usize>,
    scope: Scope,
    system: Option<&ContractAbi>,
) -> Option<TypeKind> {
    if let Some(ty) = ScalarType::from_type_name(name) {
        return Some(TypeKind::Primitive(ty));
    }
    if let Some(&index) = own.get(name) {
        return Some(TypeKind::Struct(StructRef { scope, index }));
    }
    let index = system?.struct_by_name(name)?;
    Some(TypeKind::Struct(StructRef {
        scope: Scope::System,
        index,
    }))
}

fn resolve_kind(
    name: &str,
    own: &HashMap<String, usize>,
    scope: Scope,
    system: Option<&ContractAbi>,
) -> TypeKind {
    if let Some(kind) = resolve_element(name, own, scope, system) {
        return kind;
    }
    match name
        .strip_suffix(ARRAY_SUFFIX)
        .and_then(|element| resolve_element(element, own, scope, system))
    {
        Some(element) => TypeKind::Array(Box::new(element)),
        None => TypeKind::Unresolved(name.to_string()),
    }
}

/// A struct found by the registry, together with the ABI to walk it in.
#[derive(Debug, Clone)]
pub struct ResolvedStruct {
    pub abi:    Arc<ContractAbi>,
    pub target: StructRef,
}

/// Map from contract account to its ABI. Registrations replace whole
/// snapshots, so a reader sees either the old or the new ABI of a contract.
#[derive(Debug)]
pub struct AbiRegistry {
    system:    Arc<ContractAbi>,
    contracts: RwLock<HashMap<String, Arc<ContractAbi>>>,
}

impl AbiRegistry {
    pub fn new(system: AbiDefinition) -> Self {
        let system = ContractAbi::new(system, None);
        for (structure, ty) in system.unresolved_types() {
            warn!("System struct {} uses unknown type {}.", structure, ty);
        }
        AbiRegistry {
            system:    Arc::new(system),
            contracts: RwLock::new(HashMap::new()),
        }
    }

    pub fn system(&self) -> &Arc<ContractAbi> { &self.system }

    /// Parse and register the ABI of a contract, replacing any earlier one.
    pub fn register(&self, contract: &str, abi_json: &[u8]) -> ParseResult<Arc<ContractAbi>> {
        let definition = AbiDefinition::from_json(abi_json)?;
        Ok(self.register_definition(contract, definition))
    }

    pub fn register_definition(
        &self,
        contract: &str,
        definition: AbiDefinition,
    ) -> Arc<ContractAbi> {
        let abi = Arc::new(ContractAbi::new(definition, Some(&self.system)));
        for (structure, ty) in abi.unresolved_types() {
            warn!("Struct {} of contract {} uses unknown type {}.", structure, contract, ty);
        }
        info!(
            "Registered ABI for {} with {} structs and {} actions.",
            contract,
            abi.definition.structs.len(),
            abi.definition.actions.len()
        );
        self.contracts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(contract.to_string(), abi.clone());
        abi
    }

    pub fn contract(&self, contract: &str) -> Option<Arc<ContractAbi>> {
        self.contracts.read().unwrap_or_else(PoisonError::into_inner).get(contract).cloned()
    }

    pub fn is_registered(&self, contract: &str) -> bool { self.contract(contract).is_some() }

    /// Find a struct by name in the contract's ABI, falling back to the system
    /// ABI when the contract is unregistered or lacks the struct.
    pub fn resolve_struct(&self, contract: &str, type_name: &str) -> ParseResult<ResolvedStruct> {
        if let Some(abi) = self.contract(contract) {
            if let Some(index) = abi.struct_by_name(type_name) {
                return Ok(ResolvedStruct {
                    abi,
                    target: StructRef {
                        scope: Scope::Contract,
                        index,
                    },
                });
            }
        }
        self.resolve_system_struct(type_name)
    }

    pub fn resolve_system_struct(&self, type_name: &str) -> ParseResult<ResolvedStruct> {
        let index = self
            .system
            .struct_by_name(type_name)
            .ok_or_else(|| AbiError::UnknownType(type_name.to_string()))?;
        Ok(ResolvedStruct {
            abi:    self.system.clone(),
            target: StructRef {
                scope: Scope::System,
                index,
            },
        })
    }

    /// Find the argument struct of an action. The contract must be registered
    /// and the struct must be declared by the contract itself.
    pub fn resolve_action_struct(
        &self,
        contract: &str,
        action: &str,
    ) -> ParseResult<ResolvedStruct> {
        let abi = self
            .contract(contract)
            .ok_or_else(|| AbiError::UnregisteredContract(contract.to_string()))?;
        let index = abi
            .action_type(action)
            .and_then(|ty| abi.struct_by_name(ty))
            .ok_or_else(|| AbiError::UnknownAction {
                contract: contract.to_string(),
                action:   action.to_string(),
            })?;
        Ok(ResolvedStruct {
            abi,
            target: StructRef {
                scope: Scope::Contract,
                index,
            },
        })
    }
}
