// Statement application and step building

use super::config::TracerConfig;
use super::errors::TraceError;
use super::explain;
use crate::memory::bytes::decode_int;
use crate::memory::heap::{FreeError, Heap, HeapWriteError};
use crate::memory::stack::{Stack, VarType, Variable};
use crate::memory::{Address, INT_SIZE, POINTER_SIZE};
use crate::parser::lexer::tokenize;
use crate::parser::recognizer::{is_return, recognize, AllocSize, Statement};
use crate::parser::statements::{main_body, RawStatement};
use crate::snapshot::{MemoryBlock, Step};
use tracing::{debug, trace};

/// Where the scan currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    /// Looking for the body of `main`
    ScanningPreamble,
    ScanningBody,
    /// After `return` or the end of `main`
    Terminated,
}

/// Memory model for a single trace
///
/// A tracer owns its stack and heap and is used for exactly one source text;
/// nothing is shared between traces.
pub struct Tracer<'c> {
    config: &'c TracerConfig,
    stack: Stack,
    heap: Heap,
    phase: Phase,
    steps: Vec<Step>,
    /// Statements of `main` looked at, recognized or not
    statements_seen: usize,
    main_found: bool,
}

impl<'c> Tracer<'c> {
    pub fn new(config: &'c TracerConfig) -> Self {
        Tracer {
            config,
            stack: Stack::new(config.stack_base, config.max_stack_bytes as u64),
            heap: Heap::new(config.heap_base, config.heap_padding),
            phase: Phase::Unstarted,
            steps: Vec::new(),
            statements_seen: 0,
            main_found: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    pub fn main_found(&self) -> bool {
        self.main_found
    }

    pub fn statements_seen(&self) -> usize {
        self.statements_seen
    }

    /// Scan `source` from the top, emitting one step per recognized statement
    /// of `main` until `return` or the end of its body.
    pub fn run(&mut self, source: &str) -> Result<(), TraceError> {
        if self.phase != Phase::Unstarted {
            return Ok(());
        }
        self.phase = Phase::ScanningPreamble;

        let tokens = tokenize(source);
        let Some(statements) = main_body(source, &tokens) else {
            debug!("no main() definition in source");
            self.phase = Phase::Terminated;
            return Ok(());
        };

        self.main_found = true;
        self.phase = Phase::ScanningBody;

        for statement in &statements {
            self.statements_seen += 1;
            self.process(statement)?;
            if self.phase == Phase::Terminated {
                break;
            }
        }

        self.phase = Phase::Terminated;
        Ok(())
    }

    fn process(&mut self, raw: &RawStatement) -> Result<(), TraceError> {
        if is_return(&raw.tokens) {
            debug!(line = raw.line, "return reached");
            self.push_step(raw, explain::program_ends());
            self.phase = Phase::Terminated;
            return Ok(());
        }

        let Some(statement) = recognize(&raw.tokens, &self.stack) else {
            trace!(line = raw.line, column = raw.column, code = %raw.text, "statement skipped");
            return Ok(());
        };

        debug!(line = raw.line, shape = statement.shape(), "applying statement");
        let explanation = self.apply(statement, raw.line)?;
        self.push_step(raw, explanation);
        Ok(())
    }

    fn apply(&mut self, statement: Statement, line: usize) -> Result<String, TraceError> {
        match statement {
            Statement::ArrayDecl { name, len, init } => self.declare_array(name, len, init, line),
            Statement::ArrayElementAssign { name, index, value } => {
                self.write_array_element(&name, index, value, line)
            }
            Statement::Malloc { name, size } => self.allocate(name, size, line),
            Statement::Free { name } => Ok(self.free(&name)),
            Statement::ScalarDecl { name, init } => self.declare_scalar(name, init, line),
            Statement::AddressOf { name, target } => self.declare_pointer(name, &target, line),
            Statement::DerefAssign { name, value } => self.write_through(&name, value, line),
            Statement::PointerIndexAssign { name, index, value } => {
                Ok(self.write_heap_element(&name, index, value))
            }
            Statement::Assign { name, value } => Ok(self.assign(&name, value)),
            Statement::Output { callee } => Ok(explain::output(&callee)),
        }
    }

    fn declare_scalar(&mut self, name: String, init: Option<i32>, line: usize) -> Result<String, TraceError> {
        if let Some(existing) = self.stack.get(&name) {
            return Ok(explain::redeclared(&name, &existing.var_type.to_string()));
        }

        let address = self.reserve(INT_SIZE, line)?;
        let variable = Variable::scalar(name, address, init.unwrap_or(0));
        let text = explain::scalar_declared(&variable.name, address, init, &variable.bytes);
        self.stack.declare(variable);
        Ok(text)
    }

    fn declare_array(
        &mut self,
        name: String,
        len: usize,
        init: Option<Vec<i32>>,
        line: usize,
    ) -> Result<String, TraceError> {
        if let Some(existing) = self.stack.get(&name) {
            return Ok(explain::redeclared(&name, &existing.var_type.to_string()));
        }

        let size = len.saturating_mul(INT_SIZE);
        if self.exceeds_region_limit(size) {
            return Ok(explain::region_too_large(&name, size, self.config.max_region_bytes));
        }
        let address = self.reserve(size, line)?;

        let values = init.as_deref().unwrap_or_default();
        let dropped = values.len().saturating_sub(len);
        let text = explain::array_declared(&name, len, address, init.as_deref(), dropped);
        self.stack.declare(Variable::array(name, address, len, values));
        Ok(text)
    }

    fn write_array_element(&mut self, name: &str, index: i64, value: i32, line: usize) -> Result<String, TraceError> {
        let array = self
            .stack
            .get_mut(name)
            .ok_or_else(|| TraceError::MissingDescriptor {
                name: name.to_string(),
                line,
            })?;
        let len = array.len().unwrap_or_default();

        match usize::try_from(index).ok().filter(|i| *i < len) {
            Some(i) => {
                array.set_element(i, value);
                Ok(explain::array_element_written(
                    name,
                    index,
                    value,
                    array.address,
                    array.element_address(i),
                ))
            }
            None => Ok(explain::array_overflow(name, index, len)),
        }
    }

    fn allocate(&mut self, name: String, size: AllocSize, line: usize) -> Result<String, TraceError> {
        if let Some(existing) = self.stack.get(&name) {
            return Ok(explain::redeclared(&name, &existing.var_type.to_string()));
        }

        let (bytes, defaulted) = match size {
            AllocSize::Bytes(bytes) => (bytes, false),
            AllocSize::Ints(count) => (count.saturating_mul(INT_SIZE), false),
            AllocSize::Unknown => (self.config.default_malloc_bytes, true),
        };
        if self.exceeds_region_limit(bytes) {
            return Ok(explain::region_too_large(&name, bytes, self.config.max_region_bytes));
        }

        let pointer_address = self.reserve(POINTER_SIZE, line)?;
        let heap_address = self
            .heap
            .allocate(&name, bytes)
            .ok_or(TraceError::HeapExhausted {
                requested: bytes,
                line,
            })?;

        let text = explain::allocated(&name, bytes, heap_address, pointer_address, defaulted);
        self.stack
            .declare(Variable::pointer(name, pointer_address, Some(heap_address)));
        Ok(text)
    }

    fn free(&mut self, name: &str) -> String {
        match self.heap.free(name) {
            Ok(address) => {
                if let Some(pointer) = self.stack.get_mut(name) {
                    pointer.freed = true;
                }
                explain::freed(name, address)
            }
            Err(FreeError::AlreadyFreed(address)) => explain::double_free(name, address),
            Err(FreeError::NotAllocated) => explain::free_not_allocated(name),
        }
    }

    fn declare_pointer(&mut self, name: String, target: &str, line: usize) -> Result<String, TraceError> {
        if let Some(existing) = self.stack.get(&name) {
            return Ok(explain::redeclared(&name, &existing.var_type.to_string()));
        }

        let address = self.reserve(POINTER_SIZE, line)?;
        let (pointer, text) = match self.stack.get(target) {
            Some(var) => (
                Variable::pointer(&name, address, Some(var.address)),
                explain::pointer_declared(&name, address, target, var.address, &var.display_value()),
            ),
            None => (
                Variable::pointer(&name, address, None),
                explain::pointer_to_unknown(&name, target),
            ),
        };

        self.stack.declare(pointer);
        Ok(text)
    }

    /// `*name = value`: stack targets are resolved first, then heap blocks
    fn write_through(&mut self, name: &str, value: i32, line: usize) -> Result<String, TraceError> {
        let Some(pointer) = self.stack.get(name) else {
            return Ok(explain::unknown_variable(name));
        };
        if pointer.var_type != VarType::IntPointer {
            return Ok(explain::not_a_pointer(name, &kind_phrase(pointer.var_type)));
        }
        let Some(target) = pointer.points_to else {
            return Ok(explain::deref_null(name));
        };

        if let Some(owner) = self.stack.owner_of(target).map(str::to_string) {
            return self.write_stack_target(name, &owner, target, value, line);
        }

        let Some(block) = self.heap.block_at_mut(target) else {
            return Ok(explain::deref_unresolved(name, target));
        };
        let old = decode_int(&block.bytes).unwrap_or_default();
        let label = format!("{}[0]", block.owner);

        Ok(match block.write_int(0, value) {
            Ok(_) => explain::deref_written(name, &label, target, &old.to_string(), value),
            Err(HeapWriteError::UseAfterFree) => explain::deref_use_after_free(name, target),
            Err(HeapWriteError::OutOfBounds { capacity, .. }) => explain::heap_overflow(name, 0, capacity),
        })
    }

    fn write_stack_target(
        &mut self,
        pointer: &str,
        owner: &str,
        target: Address,
        value: i32,
        line: usize,
    ) -> Result<String, TraceError> {
        let variable = self
            .stack
            .get_mut(owner)
            .ok_or_else(|| TraceError::MissingDescriptor {
                name: owner.to_string(),
                line,
            })?;

        match variable.var_type {
            VarType::Int => {
                let old = variable.display_value();
                variable.set_int(value);
                Ok(explain::deref_written(pointer, owner, target, &old, value))
            }
            VarType::IntArray(_) => {
                let old = variable.element(0).unwrap_or_default();
                variable.set_element(0, value);
                let label = format!("{}[0]", owner);
                Ok(explain::deref_written(pointer, &label, target, &old.to_string(), value))
            }
            VarType::IntPointer => Ok(explain::deref_into_pointer(pointer, owner)),
        }
    }

    /// `name[index] = value` through a pointer that owns a heap block
    fn write_heap_element(&mut self, name: &str, index: i64, value: i32) -> String {
        let Some(pointer) = self.stack.get(name) else {
            return explain::unknown_variable(name);
        };
        if pointer.var_type != VarType::IntPointer {
            return explain::not_a_pointer(name, &kind_phrase(pointer.var_type));
        }
        let Some(block) = self.heap.block_mut(name) else {
            return explain::not_heap_pointer(name);
        };

        let base = block.address;
        match block.write_int(index, value) {
            Ok(element) => explain::heap_written(name, index, value, base, element),
            Err(HeapWriteError::UseAfterFree) => explain::heap_use_after_free(name, index),
            Err(HeapWriteError::OutOfBounds { index, capacity }) => explain::heap_overflow(name, index, capacity),
        }
    }

    fn assign(&mut self, name: &str, value: i32) -> String {
        match self.stack.get_mut(name) {
            Some(variable) if variable.var_type == VarType::Int => {
                let old = variable.display_value();
                variable.set_int(value);
                explain::assigned(name, variable.address, &old, value)
            }
            Some(variable) => explain::assign_not_scalar(name, &variable.var_type.to_string()),
            None => explain::assign_unresolved(name, value),
        }
    }

    fn reserve(&mut self, size: usize, line: usize) -> Result<Address, TraceError> {
        self.stack.reserve(size).ok_or(TraceError::StackExhausted {
            requested: size,
            offset: self.stack.offset(),
            limit: self.config.max_stack_bytes,
            line,
        })
    }

    fn exceeds_region_limit(&self, size: usize) -> bool {
        if size > self.config.max_region_bytes {
            debug!(size, limit = self.config.max_region_bytes, "region over limit, not reserved");
            return true;
        }
        false
    }

    fn push_step(&mut self, raw: &RawStatement, explanation: String) {
        let step = Step {
            line: raw.line,
            code: raw.text.clone(),
            stack: self.stack.variables().map(MemoryBlock::from).collect(),
            heap: self.heap.blocks().map(MemoryBlock::from).collect(),
            explanation,
            rsp: self.stack.rsp(),
            rbp: self.stack.base(),
        };
        self.steps.push(step);
    }
}

fn kind_phrase(var_type: VarType) -> String {
    match var_type {
        VarType::Int => "an int".to_string(),
        VarType::IntPointer => "a pointer".to_string(),
        VarType::IntArray(len) => format!("an array (int[{}])", len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (Vec<Step>, Phase) {
        let config = TracerConfig::default();
        let mut tracer = Tracer::new(&config);
        tracer.run(source).unwrap();
        let phase = tracer.phase();
        (tracer.into_steps(), phase)
    }

    #[test]
    fn test_phases() {
        let config = TracerConfig::default();
        let mut tracer = Tracer::new(&config);
        assert_eq!(tracer.phase(), Phase::Unstarted);

        tracer.run("int main() { int x; }").unwrap();
        assert_eq!(tracer.phase(), Phase::Terminated);
        assert!(tracer.main_found());
        assert_eq!(tracer.statements_seen(), 1);

        // A tracer is single use
        tracer.run("int main() { int y; }").unwrap();
        assert_eq!(tracer.steps().len(), 1);
    }

    #[test]
    fn test_no_main() {
        let config = TracerConfig::default();
        let mut tracer = Tracer::new(&config);
        tracer.run("int helper() { int x = 1; }").unwrap();

        assert!(!tracer.main_found());
        assert!(tracer.steps().is_empty());
    }

    #[test]
    fn test_registers_follow_stack_offset() {
        let (steps, _) = run("int main() { int x = 1; int *p = &x; int a[3]; }");
        let base = TracerConfig::default().stack_base;

        assert!(steps.iter().all(|s| s.rbp == base));
        assert_eq!(steps[0].rsp, base - 4);
        assert_eq!(steps[1].rsp, base - 12);
        assert_eq!(steps[2].rsp, base - 24);
    }

    #[test]
    fn test_unrecognized_statements_are_silent() {
        let (steps, _) = run("int main() { int x = 1; x++; for (;;) {} x = x * 2; x = 3; }");
        let codes: Vec<&str> = steps.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["int x = 1", "x = 3"]);
    }

    #[test]
    fn test_redeclaration_does_not_allocate() {
        let (steps, _) = run("int main() { int x = 1; int x = 2; }");

        assert_eq!(steps.len(), 2);
        assert!(steps[1].explanation.contains("already declared"));
        assert_eq!(steps[1].rsp, steps[0].rsp);
        assert_eq!(steps[1].variable("x").unwrap().value, "1");
    }

    #[test]
    fn test_deref_into_array_and_heap() {
        let (steps, _) = run(
            "int main() {\n  int a[2] = {1, 2};\n  int *p = &a;\n  *p = 9;\n  int *h = malloc(8);\n  *h = 4;\n}",
        );

        assert_eq!(steps[2].variable("a").unwrap().value, "{9, 2}");
        assert!(steps[2].explanation.contains("a[0]"));
        assert_eq!(steps[4].heap_block("h").unwrap().value, "{4, 0}");
    }

    #[test]
    fn test_deref_of_pointer_to_pointer_is_refused() {
        let (steps, _) = run("int main() { int x = 1; int *p = &x; int *q = &p; *q = 5; }");

        let last = steps.last().unwrap();
        assert!(last.explanation.contains("itself a pointer"));
        assert_eq!(last.variable("x").unwrap().value, "1");
    }

    #[test]
    fn test_region_limit_is_explained_not_reserved() {
        let config = TracerConfig {
            max_region_bytes: 16,
            ..TracerConfig::default()
        };
        let mut tracer = Tracer::new(&config);
        tracer
            .run("int main() {\n  int x = 1;\n  int a[5];\n  int *p = malloc(32);\n  x = 2;\n}")
            .unwrap();

        let steps = tracer.steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[1].line, 3);
        assert!(steps[1].explanation.contains("20 bytes"));
        assert!(steps[1].variable("a").is_none());
        assert_eq!(steps[1].rsp, steps[0].rsp);
        assert!(steps[2].variable("p").is_none());
        assert!(steps[2].heap.is_empty());
        assert_eq!(steps[3].variable("x").unwrap().value, "2");
    }

    #[test]
    fn test_stack_budget_is_a_fault() {
        let config = TracerConfig {
            max_stack_bytes: 8,
            ..TracerConfig::default()
        };
        let mut tracer = Tracer::new(&config);
        let err = tracer.run("int main() { int a; int b; int c; }").unwrap_err();

        assert!(matches!(err, TraceError::StackExhausted { requested: 4, offset: 8, .. }));
        assert_eq!(tracer.steps().len(), 2);
    }
}
