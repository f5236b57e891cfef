//! Byte and address helpers shared by the stack, heap and snapshot code.

use super::{Address, INT_SIZE, POINTER_SIZE};

/// Little-endian two's-complement bytes of an `int`
pub fn encode_int(value: i32) -> [u8; INT_SIZE] {
    value.to_le_bytes()
}

/// Read an `int` from the first four bytes
pub fn decode_int(bytes: &[u8]) -> Option<i32> {
    let word: [u8; INT_SIZE] = bytes.get(..INT_SIZE)?.try_into().ok()?;
    Some(i32::from_le_bytes(word))
}

/// Every complete `int` in `bytes`; a trailing partial word is ignored
pub fn decode_ints(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(INT_SIZE)
        .filter_map(decode_int)
        .collect()
}

/// Little-endian bytes of a 64-bit address
pub fn encode_address(address: Address) -> [u8; POINTER_SIZE] {
    address.to_le_bytes()
}

/// `0x7fffffffde00` style, lowercase, no padding
pub fn format_address(address: Address) -> String {
    format!("{:#x}", address)
}

/// Inverse of [`format_address`]; accepts an optional `0x`/`0X` prefix
pub fn parse_address(text: &str) -> Option<Address> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    Address::from_str_radix(digits, 16).ok()
}

/// Space-separated uppercase hex, in memory order: `05 00 00 00`
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `{1, 2, 3}`
pub fn format_elements(values: &[i32]) -> String {
    let inner = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", inner)
}
