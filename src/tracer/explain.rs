// Explanation text attached to each step
//
// Every function returns the full, multi-line text shown for one statement.
// The wording is aimed at students: it names the addresses involved and points
// out the hazard when a statement is unsafe.

use crate::memory::bytes::{format_address, format_bytes};
use crate::memory::Address;

pub fn scalar_declared(name: &str, address: Address, init: Option<i32>, bytes: &[u8]) -> String {
    match init {
        Some(value) => format!(
            "Integer '{name}' declared and initialized\n\n\
             - 4 bytes reserved on the stack at {addr}\n\
             - {value} stored in little-endian order: {bytes}\n\n\
             Little-endian puts the least significant byte first, \
             so 5 (0x00000005) is stored as 05 00 00 00.",
            addr = format_address(address),
            bytes = format_bytes(bytes),
        ),
        None => format!(
            "Integer '{name}' declared (uninitialized)\n\n\
             - 4 bytes reserved on the stack at {addr}\n\
             - No value was assigned, so the memory contains indeterminate content\n\n\
             Warning: reading an uninitialized variable is undefined behavior. \
             It is shown here as 0.",
            addr = format_address(address),
        ),
    }
}

pub fn array_declared(
    name: &str,
    len: usize,
    address: Address,
    init: Option<&[i32]>,
    dropped: usize,
) -> String {
    let total = len * 4;
    let layout = (0..len.min(3))
        .map(|i| {
            format!(
                "  {name}[{i}] -> {}",
                format_address(address.saturating_sub(4 * i as u64))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let more = if len > 3 { "\n  ..." } else { "" };

    let mut text = match init {
        Some(values) => {
            let shown = values
                .iter()
                .take(len)
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Array '{name}[{len}]' declared and initialized\n\n\
                 - {total} contiguous bytes reserved on the stack (4 bytes x {len})\n\
                 - Start address: {addr}\n\
                 - Initial values: {{{shown}}}{padding}\n\n\
                 Elements are laid out back to back:\n{layout}{more}\n\n\
                 The name '{name}' stands for the address of its first element.",
                addr = format_address(address),
                padding = if values.len() < len {
                    "; the remaining elements are zero"
                } else {
                    ""
                },
            )
        }
        None => format!(
            "Array '{name}[{len}]' declared (uninitialized)\n\n\
             - {total} contiguous bytes reserved on the stack\n\
             - Start address: {addr}\n\n\
             Elements:\n{layout}{more}\n\n\
             Warning: an uninitialized array holds indeterminate content. \
             It is shown here as zeros.",
            addr = format_address(address),
        ),
    };

    if dropped > 0 {
        text.push_str(&format!(
            "\n\nWarning: {dropped} extra initializer value(s) do not fit in {len} elements and were dropped."
        ));
    }
    text
}

pub fn redeclared(name: &str, existing: &str) -> String {
    format!(
        "'{name}' is already declared as {existing}\n\n\
         A name can only be declared once in the same scope. \
         No new memory was reserved."
    )
}

pub fn unknown_variable(name: &str) -> String {
    format!("'{name}' has not been declared, so nothing in memory changed.")
}

pub fn array_element_written(name: &str, index: i64, value: i32, base: Address, element: Address) -> String {
    format!(
        "Array element '{name}[{index}]' updated\n\n\
         - {name}[{index}] = {value}\n\
         - Element address: {elem} (start address - {index} x 4)\n\n\
         Index arithmetic: address = start - index x element size (stack arrays grow downward here)\n\
         {elem} is element {index} of the array starting at {start}.",
        elem = format_address(element),
        start = format_address(base),
    )
}

pub fn array_overflow(name: &str, index: i64, len: usize) -> String {
    format!(
        "Out-of-bounds write to '{name}[{index}]'!\n\n\
         - Array size: {len} (valid indices 0 to {last})\n\
         - Index {index} is outside the array\n\n\
         This is a buffer overflow, a classic source of security bugs. \
         Memory was left unchanged.",
        last = len.saturating_sub(1),
    )
}

pub fn region_too_large(name: &str, size: usize, limit: usize) -> String {
    format!(
        "'{name}' asks for {size} bytes, more than the {limit} bytes this tracer will lay out \
         for a single array or heap block.\n\n\
         Nothing was reserved and '{name}' was not declared. Memory was left unchanged."
    )
}

pub fn allocated(name: &str, size: usize, heap: Address, pointer: Address, defaulted: bool) -> String {
    let note = if defaulted {
        format!("\n- The size expression was not understood; {size} bytes were assumed")
    } else {
        String::new()
    };

    format!(
        "Dynamic allocation with malloc\n\n\
         - malloc({size}) reserves {size} bytes on the heap\n\
         - Block address: {heap_addr}{note}\n\n\
         Pointer '{name}':\n\
         - Lives on the stack at {ptr_addr}\n\
         - Holds {heap_addr}, the address of the heap block\n\n\
         Stack memory is released automatically; heap memory stays reserved until free() is called. \
         Every malloc needs a matching free to avoid a memory leak.",
        heap_addr = format_address(heap),
        ptr_addr = format_address(pointer),
    )
}

pub fn freed(name: &str, address: Address) -> String {
    format!(
        "Heap memory released with free\n\n\
         - free({name}) returns the block at {addr}\n\n\
         Careful after free:\n\
         - '{name}' still holds the old address: it is now a dangling pointer\n\
         - Set it to NULL after freeing\n\
         - Freeing the same block again is a double free",
        addr = format_address(address),
    )
}

pub fn double_free(name: &str, address: Address) -> String {
    format!(
        "'{name}' was already freed!\n\n\
         The block at {addr} has been released before. Calling free() on it again is a double free, \
         which corrupts the allocator. The heap was left unchanged.",
        addr = format_address(address),
    )
}

pub fn free_not_allocated(name: &str) -> String {
    format!(
        "'{name}' was not allocated with malloc\n\n\
         Only pointers returned by malloc can be passed to free(). Nothing was freed."
    )
}

pub fn pointer_declared(name: &str, pointer: Address, target: &str, target_address: Address, target_value: &str) -> String {
    format!(
        "Pointer '{name}' declared, holding the address of '{target}'\n\n\
         - A pointer is a variable too: 8 bytes reserved on the stack at {ptr_addr}\n\
         - Stored value: {addr} (the address of '{target}')\n\n\
         A pointer stores where another value lives:\n\
         {name} --> {target} ({target_value})\n\
         at {addr}",
        ptr_addr = format_address(pointer),
        addr = format_address(target_address),
    )
}

pub fn pointer_to_unknown(name: &str, target: &str) -> String {
    format!(
        "Pointer '{name}' points to '{target}', which does not exist\n\n\
         '{name}' was created holding 0x0."
    )
}

pub fn deref_written(pointer: &str, target: &str, address: Address, old: &str, new: i32) -> String {
    format!(
        "Indirect write through a pointer\n\n\
         - *{pointer} = {new}\n\
         - '{pointer}' holds {addr}, so the value at that address is changed\n\
         - '{target}' changes from {old} to {new}\n\n\
         Dereferencing (*) reaches the memory a pointer refers to: \
         *{pointer} is the value stored where {pointer} points.",
        addr = format_address(address),
    )
}

pub fn deref_use_after_free(pointer: &str, address: Address) -> String {
    format!(
        "Use after free through '{pointer}'!\n\n\
         '{pointer}' still holds {addr}, but that heap block has been freed. \
         Writing through a dangling pointer is undefined behavior. Memory was left unchanged.",
        addr = format_address(address),
    )
}

pub fn deref_null(pointer: &str) -> String {
    format!(
        "'{pointer}' does not point to any variable (it holds 0x0)\n\n\
         Dereferencing a null pointer crashes a real program. Memory was left unchanged."
    )
}

pub fn deref_unresolved(pointer: &str, address: Address) -> String {
    format!(
        "Pointer dereference of '{pointer}'\n\n\
         No variable lives at {addr}, so the write cannot be shown.",
        addr = format_address(address),
    )
}

pub fn deref_into_pointer(pointer: &str, target: &str) -> String {
    format!(
        "'{pointer}' refers to '{target}', which is itself a pointer\n\n\
         Storing an integer into a pointer is not modeled. Memory was left unchanged."
    )
}

pub fn not_a_pointer(name: &str, kind: &str) -> String {
    format!("'{name}' is {kind}, not a pointer, so it cannot be dereferenced or indexed.")
}

pub fn heap_written(pointer: &str, index: i64, value: i32, base: Address, element: Address) -> String {
    format!(
        "Heap write: {pointer}[{index}] = {value}\n\n\
         - '{pointer}' points to the heap block at {start}\n\
         - Element address: {start} + ({index} x 4) = {elem}\n\
         - {value} stored there\n\n\
         {pointer}[{index}] means *({pointer} + {index}): pointer arithmetic scales the index \
         by sizeof(int).",
        start = format_address(base),
        elem = format_address(element),
    )
}

pub fn heap_overflow(pointer: &str, index: i64, capacity: usize) -> String {
    let holds = if capacity == 0 {
        "The block holds no whole int, so every index is out of bounds.".to_string()
    } else {
        format!(
            "The block holds {capacity} int(s) (valid indices 0 to {}).",
            capacity - 1
        )
    };
    format!(
        "Heap buffer overflow through '{pointer}[{index}]'!\n\n\
         {holds} The write lands outside the allocation. Memory was left unchanged."
    )
}

pub fn heap_use_after_free(pointer: &str, index: i64) -> String {
    format!(
        "Use after free: '{pointer}[{index}]' writes into a freed block!\n\n\
         '{pointer}' is a dangling pointer. Memory was left unchanged."
    )
}

pub fn not_heap_pointer(pointer: &str) -> String {
    format!(
        "'{pointer}' does not point to a heap block\n\n\
         Indexing is only shown for pointers returned by malloc. Memory was left unchanged."
    )
}

pub fn assigned(name: &str, address: Address, old: &str, new: i32) -> String {
    format!(
        "Variable '{name}' updated\n\n\
         - {name} = {new}\n\
         - Old value {old}, new value {new}\n\
         - The 4 bytes at {addr} are overwritten",
        addr = format_address(address),
    )
}

pub fn assign_unresolved(name: &str, value: i32) -> String {
    format!(
        "Assignment of {value} to '{name}'\n\n\
         '{name}' has not been declared, so the assignment cannot be shown."
    )
}

pub fn assign_not_scalar(name: &str, type_name: &str) -> String {
    format!(
        "'{name}' is {type_name}; assigning a plain integer to it is not modeled. \
         Memory was left unchanged."
    )
}

pub fn output(callee: &str) -> String {
    format!("{callee}: writes values to the screen. Memory is not changed.")
}

pub fn program_ends() -> String {
    "return: the program ends here.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_text_distinguishes_initialization() {
        let init = scalar_declared("x", 0x7fff_ffff_de00, Some(5), &[5, 0, 0, 0]);
        assert!(init.contains("initialized"));
        assert!(init.contains("05 00 00 00"));
        assert!(init.contains("0x7fffffffde00"));

        let uninit = scalar_declared("x", 0x7fff_ffff_de00, None, &[0; 4]);
        assert!(uninit.contains("uninitialized"));
        assert!(uninit.contains("indeterminate"));
    }

    #[test]
    fn test_array_layout_lists_decreasing_addresses() {
        let text = array_declared("a", 5, 0x1000, Some(&[1, 2]), 0);
        assert!(text.contains("a[1] -> 0xffc"));
        assert!(text.contains("{1, 2}"));
        assert!(text.contains("remaining elements are zero"));
        assert!(text.ends_with("address of its first element."));

        let dropped = array_declared("a", 1, 0x1000, Some(&[1, 2]), 1);
        assert!(dropped.contains("dropped"));
        assert!(dropped.contains("{1}"));
    }

    #[test]
    fn test_heap_write_mentions_pointer_arithmetic() {
        let text = heap_written("p", 2, 7, 0x100, 0x108);
        assert!(text.contains("*(p + 2)"));
        assert!(text.contains("0x108"));
    }

    #[test]
    fn test_heap_overflow_bounds() {
        assert!(heap_overflow("p", 5, 3).contains("valid indices 0 to 2"));

        let empty = heap_overflow("p", 0, 0);
        assert!(empty.contains("no whole int"));
        assert!(!empty.contains("valid indices"));
    }
}
