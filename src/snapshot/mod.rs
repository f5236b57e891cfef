// Step snapshots and the trace result handed to callers

use crate::memory::bytes::format_address;
use crate::memory::heap::HeapBlock;
use crate::memory::stack::Variable;
use crate::memory::Address;
use serde::{Deserialize, Serialize};

/// One rendered variable or heap block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    pub name: String,
    #[serde(with = "hex_address")]
    pub address: Address,
    #[serde(rename = "type")]
    pub type_name: String,
    pub size: usize,
    pub bytes: Vec<u8>,
    pub value: String,
    #[serde(default, with = "hex_address_opt")]
    pub points_to: Option<Address>,
    /// False for heap blocks that have been freed
    pub live: bool,
    pub explanation: String,
}

impl From<&Variable> for MemoryBlock {
    fn from(var: &Variable) -> Self {
        MemoryBlock {
            name: var.name.clone(),
            address: var.address,
            type_name: var.var_type.to_string(),
            size: var.size(),
            bytes: var.bytes.clone(),
            value: var.display_value(),
            points_to: var.points_to,
            live: true,
            explanation: String::new(),
        }
    }
}

impl From<&HeapBlock> for MemoryBlock {
    fn from(block: &HeapBlock) -> Self {
        MemoryBlock {
            name: format!("*{}", block.owner),
            address: block.address,
            type_name: block.type_name(),
            size: block.size(),
            bytes: block.bytes.clone(),
            value: block.display_value(),
            points_to: None,
            live: block.is_live(),
            explanation: String::new(),
        }
    }
}

/// Full memory state after one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based source line
    pub line: usize,
    pub code: String,
    pub stack: Vec<MemoryBlock>,
    pub heap: Vec<MemoryBlock>,
    pub explanation: String,
    #[serde(with = "hex_address")]
    pub rsp: Address,
    #[serde(with = "hex_address")]
    pub rbp: Address,
}

impl Step {
    pub fn variable(&self, name: &str) -> Option<&MemoryBlock> {
        self.stack.iter().find(|block| block.name == name)
    }

    /// Heap block owned by the pointer `owner`
    pub fn heap_block(&self, owner: &str) -> Option<&MemoryBlock> {
        self.heap
            .iter()
            .find(|block| block.name.strip_prefix('*') == Some(owner))
    }
}

/// Outcome of one trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    pub success: bool,
    pub steps: Vec<Step>,
    pub source_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceResult {
    pub fn completed(steps: Vec<Step>, source_lines: Vec<String>, message: Option<String>) -> Self {
        TraceResult {
            success: true,
            steps,
            source_lines,
            message,
            error: None,
        }
    }

    /// A trace aborted by an internal fault: no steps, a diagnostic message
    pub fn failed(source_lines: Vec<String>, error: &str, message: String) -> Self {
        TraceResult {
            success: false,
            steps: Vec::new(),
            source_lines,
            message: Some(message),
            error: Some(error.to_string()),
        }
    }
}

mod hex_address {
    use super::*;
    use crate::memory::bytes::parse_address;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_address(*address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_address(&text).ok_or_else(|| D::Error::custom(format!("invalid address: {text}")))
    }
}

mod hex_address_opt {
    use super::*;
    use crate::memory::bytes::parse_address;
    use serde::{de::Error, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Option<Address>, serializer: S) -> Result<S::Ok, S::Error> {
        match address {
            Some(address) => serializer.serialize_some(&format_address(*address)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Address>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| {
                parse_address(&text).ok_or_else(|| D::Error::custom(format!("invalid address: {text}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variable_block_json_shape() {
        let var = Variable::pointer("p", 0x7fff_ffff_ddfc, Some(0x7fff_ffff_de00));
        let block = MemoryBlock::from(&var);

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "name": "p",
                "address": "0x7fffffffddfc",
                "type": "int*",
                "size": 8,
                "bytes": [0x00, 0xde, 0xff, 0xff, 0xff, 0x7f, 0, 0],
                "value": "0x7fffffffde00",
                "points_to": "0x7fffffffde00",
                "live": true,
                "explanation": "",
            })
        );
    }

    #[test]
    fn test_heap_block_naming() {
        let mut block = HeapBlock::new("p", 0x5555_5555_9000, 8);
        block.state = crate::memory::heap::BlockState::Freed;

        let rendered = MemoryBlock::from(&block);
        assert_eq!(rendered.name, "*p");
        assert_eq!(rendered.type_name, "int[2]");
        assert!(!rendered.live);
        assert_eq!(rendered.points_to, None);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let result = TraceResult::completed(Vec::new(), vec!["int x;".to_string()], None);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value, json!({"success": true, "steps": [], "source_lines": ["int x;"]}));
    }

    #[test]
    fn test_step_deserializes_hex_registers() {
        let step: Step = serde_json::from_value(json!({
            "line": 2,
            "code": "int x",
            "stack": [],
            "heap": [],
            "explanation": "",
            "rsp": "0x7fffffffddfc",
            "rbp": "0x7fffffffde00",
        }))
        .unwrap();

        assert_eq!(step.rbp - step.rsp, 4);
        assert!(serde_json::from_value::<Step>(json!({
            "line": 1, "code": "", "stack": [], "heap": [], "explanation": "",
            "rsp": "nope", "rbp": "0x0",
        }))
        .is_err());
    }
}
