//! Heap region of the synthetic memory image
//!
//! This module provides heap bookkeeping with:
//! - Blocks keyed by the name of the pointer that owns them
//! - Addresses growing upward from the heap base, with a fixed gap after each
//!   block so blocks are visually separate
//! - Tombstones: a freed block keeps its address and bytes and is only marked
//!   freed, so dangling pointers and double frees can be shown
//!
//! # Error Handling
//!
//! Misuse (double free, use after free, out-of-bounds writes) is reported as
//! small error enums. The tracer turns them into explanations; none of them
//! aborts a trace.

use super::bytes::{decode_ints, encode_int, format_elements};
use super::{Address, INT_SIZE};
use rustc_hash::FxHashMap;

/// State of a heap block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Allocated,
    Freed, // Kept for display after free()
}

/// Why a write into a heap block was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapWriteError {
    UseAfterFree,
    OutOfBounds { index: i64, capacity: usize },
}

/// Why `free` was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeError {
    NotAllocated,
    AlreadyFreed(Address),
}

/// A block of heap memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapBlock {
    /// Name of the pointer variable that received this block
    pub owner: String,
    pub address: Address,
    pub bytes: Vec<u8>, // Raw bytes, zeroed on allocation
    pub state: BlockState,
}

impl HeapBlock {
    pub fn new(owner: impl Into<String>, address: Address, size: usize) -> Self {
        HeapBlock {
            owner: owner.into(),
            address,
            bytes: vec![0; size],
            state: BlockState::Allocated,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Number of whole `int`s the block can hold
    pub fn capacity(&self) -> usize {
        self.size() / INT_SIZE
    }

    pub fn is_live(&self) -> bool {
        self.state == BlockState::Allocated
    }

    /// Type tag shown to the learner, e.g. `int[5]`
    pub fn type_name(&self) -> String {
        format!("int[{}]", self.capacity())
    }

    pub fn display_value(&self) -> String {
        format_elements(&decode_ints(&self.bytes))
    }

    /// Address of element `index` (elements grow upward)
    pub fn element_address(&self, index: i64) -> Address {
        let offset = index.saturating_mul(INT_SIZE as i64);
        self.address.saturating_add_signed(offset)
    }

    /// Write an `int` at element `index` if the block is live and the element
    /// fits entirely inside it. Returns the element address.
    pub fn write_int(&mut self, index: i64, value: i32) -> Result<Address, HeapWriteError> {
        if !self.is_live() {
            return Err(HeapWriteError::UseAfterFree);
        }

        let out_of_bounds = HeapWriteError::OutOfBounds {
            index,
            capacity: self.capacity(),
        };
        let start = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_mul(INT_SIZE))
            .ok_or(out_of_bounds)?;
        let end = start.checked_add(INT_SIZE).ok_or(out_of_bounds)?;
        let slot = self.bytes.get_mut(start..end).ok_or(out_of_bounds)?;

        slot.copy_from_slice(&encode_int(value));
        Ok(self.element_address(index))
    }
}

/// The heap
#[derive(Debug, Clone)]
pub struct Heap {
    base: Address,
    offset: u64,
    padding: u64,
    blocks: FxHashMap<String, HeapBlock>,
    insertion_order: Vec<String>,
}

impl Heap {
    /// Create an empty heap at `base`, leaving `padding` bytes after each block
    pub fn new(base: Address, padding: u64) -> Self {
        Heap {
            base,
            offset: 0,
            padding,
            blocks: FxHashMap::default(),
            insertion_order: Vec::new(),
        }
    }

    /// Cumulative bytes handed out so far, padding included
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Allocate `size` zeroed bytes for `owner`. Returns `None` if the address
    /// arithmetic would overflow.
    pub fn allocate(&mut self, owner: &str, size: usize) -> Option<Address> {
        let address = self.base.checked_add(self.offset)?;
        let advance = u64::try_from(size).ok()?.checked_add(self.padding)?;
        let next = self.offset.checked_add(advance)?;
        address.checked_add(advance)?;

        self.offset = next;
        if !self.blocks.contains_key(owner) {
            self.insertion_order.push(owner.to_string());
        }
        self.blocks
            .insert(owner.to_string(), HeapBlock::new(owner, address, size));

        Some(address)
    }

    /// Mark the block owned by `owner` as freed, returning its address
    pub fn free(&mut self, owner: &str) -> Result<Address, FreeError> {
        match self.blocks.get_mut(owner) {
            Some(block) if block.is_live() => {
                block.state = BlockState::Freed;
                Ok(block.address)
            }
            Some(block) => Err(FreeError::AlreadyFreed(block.address)),
            None => Err(FreeError::NotAllocated),
        }
    }

    pub fn block(&self, owner: &str) -> Option<&HeapBlock> {
        self.blocks.get(owner)
    }

    pub fn block_mut(&mut self, owner: &str) -> Option<&mut HeapBlock> {
        self.blocks.get_mut(owner)
    }

    /// Block starting exactly at `address`, freed or not
    pub fn block_at_mut(&mut self, address: Address) -> Option<&mut HeapBlock> {
        self.blocks
            .values_mut()
            .find(|block| block.address == address)
    }

    /// Blocks in allocation order, tombstones included
    pub fn blocks(&self) -> impl Iterator<Item = &HeapBlock> + '_ {
        self.insertion_order
            .iter()
            .filter_map(|owner| self.blocks.get(owner))
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Address = 0x5555_5555_9000;

    #[test]
    fn test_allocation_addresses_include_padding() {
        let mut heap = Heap::new(BASE, 16);

        assert_eq!(heap.allocate("p", 20), Some(BASE));
        assert_eq!(heap.allocate("q", 8), Some(BASE + 36));
        assert_eq!(heap.offset(), 36 + 24);

        let owners: Vec<&str> = heap.blocks().map(|b| b.owner.as_str()).collect();
        assert_eq!(owners, vec!["p", "q"]);
    }

    #[test]
    fn test_new_block_is_zeroed() {
        let mut heap = Heap::new(BASE, 16);
        heap.allocate("p", 16);

        let block = heap.block("p").unwrap();
        assert_eq!(block.bytes, vec![0; 16]);
        assert_eq!(block.type_name(), "int[4]");
        assert_eq!(block.display_value(), "{0, 0, 0, 0}");
        assert!(block.is_live());
    }

    #[test]
    fn test_free_keeps_tombstone() {
        let mut heap = Heap::new(BASE, 16);
        heap.allocate("p", 8);

        assert_eq!(heap.free("p"), Ok(BASE));
        assert_eq!(heap.free("p"), Err(FreeError::AlreadyFreed(BASE)));
        assert_eq!(heap.free("q"), Err(FreeError::NotAllocated));

        let block = heap.block("p").unwrap();
        assert_eq!(block.state, BlockState::Freed);
        assert_eq!(block.address, BASE);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_write_int_bounds() {
        let mut block = HeapBlock::new("p", BASE, 10);

        assert_eq!(block.write_int(1, 7), Ok(BASE + 4));
        assert_eq!(block.bytes[4..8], [7, 0, 0, 0]);
        // Element 2 would span bytes 8..12 of a 10-byte block
        assert_eq!(
            block.write_int(2, 1),
            Err(HeapWriteError::OutOfBounds {
                index: 2,
                capacity: 2
            })
        );
        assert!(matches!(
            block.write_int(-1, 1),
            Err(HeapWriteError::OutOfBounds { index: -1, .. })
        ));
    }

    #[test]
    fn test_write_after_free_is_refused() {
        let mut heap = Heap::new(BASE, 16);
        heap.allocate("p", 8);
        heap.free("p").unwrap();

        let before = heap.block("p").unwrap().bytes.clone();
        let block = heap.block_at_mut(BASE).unwrap();
        assert_eq!(block.write_int(0, 3), Err(HeapWriteError::UseAfterFree));
        assert_eq!(block.bytes, before);
    }
}
