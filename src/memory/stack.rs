//! Stack region of the synthetic memory image
//!
//! This module provides:
//! - [`VarType`]: The three declarable types (`int`, `int*`, `int[N]`)
//! - [`Variable`]: A named stack entity with its address and raw bytes
//! - [`Stack`]: The ordered set of variables plus the downward-growing offset
//!
//! # Layout
//!
//! Each declaration takes the address `base - offset` and then advances the
//! offset by its size. Array element `i` lives at `address - 4 × i`, so
//! addresses decrease as the index grows. Variables are never popped: there
//! are no scopes, and every variable lives until the trace ends.

use super::bytes::{decode_int, decode_ints, encode_address, encode_int, format_address, format_elements};
use super::{Address, INT_SIZE, POINTER_SIZE};
use crate::parser::recognizer::{SymbolKind, SymbolTable};
use rustc_hash::FxHashMap;
use std::fmt;

/// Declared type of a stack variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Int,
    IntPointer,
    IntArray(usize),
}

impl VarType {
    /// Size in bytes
    pub fn size(self) -> usize {
        match self {
            VarType::Int => INT_SIZE,
            VarType::IntPointer => POINTER_SIZE,
            VarType::IntArray(len) => INT_SIZE * len,
        }
    }

    pub fn symbol_kind(self) -> SymbolKind {
        match self {
            VarType::Int => SymbolKind::Scalar,
            VarType::IntPointer => SymbolKind::Pointer,
            VarType::IntArray(_) => SymbolKind::Array,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Int => write!(f, "int"),
            VarType::IntPointer => write!(f, "int*"),
            VarType::IntArray(len) => write!(f, "int[{}]", len),
        }
    }
}

/// A variable on the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub address: Address,
    pub var_type: VarType,
    /// Current contents, little-endian
    pub bytes: Vec<u8>,
    /// Target address for pointers (`None` for a pointer to nothing)
    pub points_to: Option<Address>,
    /// Set on a pointer once the heap block it owns has been freed
    pub freed: bool,
}

impl Variable {
    pub fn scalar(name: impl Into<String>, address: Address, value: i32) -> Self {
        Variable {
            name: name.into(),
            address,
            var_type: VarType::Int,
            bytes: encode_int(value).to_vec(),
            points_to: None,
            freed: false,
        }
    }

    /// Array of `len` ints; `values` beyond `len` are dropped and missing ones
    /// are zero.
    pub fn array(name: impl Into<String>, address: Address, len: usize, values: &[i32]) -> Self {
        let mut bytes = vec![0; INT_SIZE * len];
        for (slot, value) in bytes.chunks_exact_mut(INT_SIZE).zip(values) {
            slot.copy_from_slice(&encode_int(*value));
        }

        Variable {
            name: name.into(),
            address,
            var_type: VarType::IntArray(len),
            bytes,
            points_to: None,
            freed: false,
        }
    }

    pub fn pointer(name: impl Into<String>, address: Address, target: Option<Address>) -> Self {
        Variable {
            name: name.into(),
            address,
            var_type: VarType::IntPointer,
            bytes: encode_address(target.unwrap_or(0)).to_vec(),
            points_to: target,
            freed: false,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Value of a scalar
    pub fn int_value(&self) -> Option<i32> {
        match self.var_type {
            VarType::Int => decode_int(&self.bytes),
            _ => None,
        }
    }

    /// Overwrite a scalar in place
    pub fn set_int(&mut self, value: i32) {
        if self.var_type == VarType::Int {
            self.bytes = encode_int(value).to_vec();
        }
    }

    /// Number of elements for arrays
    pub fn len(&self) -> Option<usize> {
        match self.var_type {
            VarType::IntArray(len) => Some(len),
            _ => None,
        }
    }

    /// Value of array element `index`
    pub fn element(&self, index: usize) -> Option<i32> {
        let start = index.checked_mul(INT_SIZE)?;
        decode_int(self.bytes.get(start..start.checked_add(INT_SIZE)?)?)
    }

    /// Overwrite array element `index`; returns false when out of bounds
    pub fn set_element(&mut self, index: usize, value: i32) -> bool {
        let Some(len) = self.len() else {
            return false;
        };
        if index >= len {
            return false;
        }

        let start = index * INT_SIZE;
        self.bytes[start..start + INT_SIZE].copy_from_slice(&encode_int(value));
        true
    }

    /// Address of array element `index` (elements grow downward)
    pub fn element_address(&self, index: usize) -> Address {
        self.address
            .saturating_sub((index as Address).saturating_mul(INT_SIZE as Address))
    }

    /// Human-readable value
    pub fn display_value(&self) -> String {
        match self.var_type {
            VarType::Int => decode_int(&self.bytes).unwrap_or_default().to_string(),
            VarType::IntArray(_) => format_elements(&decode_ints(&self.bytes)),
            VarType::IntPointer if self.freed => "freed".to_string(),
            VarType::IntPointer => format_address(self.points_to.unwrap_or(0)),
        }
    }
}

/// The stack region
#[derive(Debug, Clone)]
pub struct Stack {
    base: Address,
    offset: u64,
    limit: u64,
    locals: FxHashMap<String, Variable>,
    insertion_order: Vec<String>, // Track order of variable declarations
}

impl Stack {
    /// Create an empty stack at `base` that may grow by at most `limit` bytes
    pub fn new(base: Address, limit: u64) -> Self {
        Stack {
            base,
            offset: 0,
            limit,
            locals: FxHashMap::default(),
            insertion_order: Vec::new(),
        }
    }

    /// The fixed base address (`rbp`)
    pub fn base(&self) -> Address {
        self.base
    }

    /// Cumulative bytes reserved so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Current stack pointer: base minus the cumulative offset
    pub fn rsp(&self) -> Address {
        self.base.saturating_sub(self.offset)
    }

    /// Reserve `size` bytes and return their address, or `None` if the stack
    /// budget or the address space would be exceeded.
    pub fn reserve(&mut self, size: usize) -> Option<Address> {
        let next = self.offset.checked_add(u64::try_from(size).ok()?)?;
        if next > self.limit {
            return None;
        }

        let address = self.base.checked_sub(self.offset)?;
        self.offset = next;
        Some(address)
    }

    /// Register a new variable (replacing any variable of the same name)
    pub fn declare(&mut self, variable: Variable) {
        if !self.locals.contains_key(&variable.name) {
            self.insertion_order.push(variable.name.clone());
        }
        self.locals.insert(variable.name.clone(), variable);
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.locals.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.locals.get_mut(name)
    }

    /// Variables in declaration order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.insertion_order
            .iter()
            .filter_map(|name| self.locals.get(name))
    }

    /// Name of the variable whose address is exactly `address` (linear scan)
    pub fn owner_of(&self, address: Address) -> Option<&str> {
        self.variables()
            .find(|var| var.address == address)
            .map(|var| var.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }
}

impl SymbolTable for Stack {
    fn symbol_kind(&self, name: &str) -> Option<SymbolKind> {
        self.get(name).map(|var| var.var_type.symbol_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Address = 0x7fff_ffff_de00;

    #[test]
    fn test_reserve_grows_downward() {
        let mut stack = Stack::new(BASE, 1024);

        assert_eq!(stack.reserve(4), Some(BASE));
        assert_eq!(stack.reserve(8), Some(BASE - 4));
        assert_eq!(stack.rsp(), BASE - 12);
        assert_eq!(stack.offset(), 12);
    }

    #[test]
    fn test_reserve_respects_limit() {
        let mut stack = Stack::new(BASE, 8);

        assert!(stack.reserve(8).is_some());
        assert_eq!(stack.reserve(1), None);
        assert_eq!(stack.offset(), 8);
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let mut stack = Stack::new(BASE, 1024);
        stack.declare(Variable::scalar("b", BASE, 1));
        stack.declare(Variable::scalar("a", BASE - 4, 2));
        stack.declare(Variable::pointer("p", BASE - 8, Some(BASE)));

        let names: Vec<&str> = stack.variables().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "p"]);
        assert_eq!(stack.owner_of(BASE - 4), Some("a"));
        assert_eq!(stack.owner_of(BASE - 2), None);
        assert_eq!(stack.symbol_kind("p"), Some(SymbolKind::Pointer));
    }

    #[test]
    fn test_array_elements() {
        let mut arr = Variable::array("arr", BASE, 4, &[1, 2]);

        assert_eq!(arr.size(), 16);
        assert_eq!(arr.display_value(), "{1, 2, 0, 0}");
        assert_eq!(arr.element_address(3), BASE - 12);

        assert!(arr.set_element(3, -7));
        assert!(!arr.set_element(4, 1));
        assert_eq!(arr.element(3), Some(-7));
        assert_eq!(arr.display_value(), "{1, 2, 0, -7}");
    }

    #[test]
    fn test_excess_array_values_are_dropped() {
        let arr = Variable::array("arr", BASE, 2, &[1, 2, 3]);
        assert_eq!(arr.display_value(), "{1, 2}");
    }

    #[test]
    fn test_pointer_display() {
        let mut p = Variable::pointer("p", BASE, Some(0x5555_5555_9000));
        assert_eq!(p.display_value(), "0x555555559000");
        assert_eq!(p.size(), 8);

        p.freed = true;
        assert_eq!(p.display_value(), "freed");

        let null = Variable::pointer("q", BASE, None);
        assert_eq!(null.display_value(), "0x0");
        assert_eq!(null.bytes, vec![0; 8]);
    }

    #[test]
    fn test_scalar_update() {
        let mut x = Variable::scalar("x", BASE, 5);
        x.set_int(-20);
        assert_eq!(x.int_value(), Some(-20));
        assert_eq!(x.display_value(), "-20");
    }
}
