use std::collections::BTreeMap;

use crate::abi::{selector, ParamType, Selector};
use crate::error::PrecompileError;

/// Whether a method may change ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Transaction,
    Query,
}

impl MethodKind {
    pub fn is_transaction(self) -> bool {
        self == MethodKind::Transaction
    }
}

impl std::fmt::Display for MethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodKind::Transaction => write!(f, "tx"),
            MethodKind::Query => write!(f, "query"),
        }
    }
}

/// One exposed method: where it routes, what it accepts, what it costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor<Op> {
    pub op: Op,
    pub selector: Selector,
    pub name: &'static str,
    /// Canonical signature the selector is derived from.
    pub signature: &'static str,
    pub inputs: &'static [ParamType],
    pub kind: MethodKind,
    /// Static cost used for the early budget check. Part of the protocol;
    /// changing a value changes what callers pay.
    pub gas: u64,
}

impl<Op> OperationDescriptor<Op> {
    pub fn new(
        op: Op,
        signature: &'static str,
        inputs: &'static [ParamType],
        kind: MethodKind,
        gas: u64,
    ) -> Self {
        let name = signature.split('(').next().unwrap_or(signature);
        Self {
            op,
            selector: selector(signature),
            name,
            signature,
            inputs,
            kind,
            gas,
        }
    }
}

/// Selector-indexed method table, built once per precompile.
#[derive(Debug, Clone)]
pub struct DescriptorTable<Op> {
    by_selector: BTreeMap<Selector, OperationDescriptor<Op>>,
}

impl<Op> DescriptorTable<Op> {
    /// Build the table. Two methods hashing to the same selector is a
    /// construction error.
    pub fn new(descriptors: Vec<OperationDescriptor<Op>>) -> Result<Self, PrecompileError> {
        let mut by_selector = BTreeMap::new();
        for desc in descriptors {
            let sel = desc.selector;
            let signature = desc.signature;
            if by_selector.insert(sel, desc).is_some() {
                return Err(PrecompileError::InvalidInput {
                    reason: format!("duplicate selector {} for {signature}", hex::encode(sel)),
                });
            }
        }
        Ok(Self { by_selector })
    }

    pub fn lookup(&self, selector: &Selector) -> Option<&OperationDescriptor<Op>> {
        self.by_selector.get(selector)
    }

    /// Static gas for a raw call; zero when the input names no method.
    pub fn required_gas(&self, input: &[u8]) -> u64 {
        let Some(sel) = input.get(..4) else {
            return 0;
        };
        let mut key = [0u8; 4];
        key.copy_from_slice(sel);
        self.lookup(&key).map(|d| d.gas).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor<Op>> {
        self.by_selector.values()
    }

    pub fn len(&self) -> usize {
        self.by_selector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }
}
