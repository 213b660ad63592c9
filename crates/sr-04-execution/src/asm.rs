//! # Module Assembler
//!
//! A small builder for module bytecode, used by tooling and the test
//! suites. Labels resolve to byte offsets when a function is finished, so
//! forward jumps assemble naturally.
//!
//! Misusing the builder (jumping to a label that never gets bound) is a
//! programming error in the tool driving it and panics with a message;
//! the chain itself never assembles modules.

use crate::vm::instr::op;
use crate::vm::module::FORMAT_VERSION;

/// A forward-referenceable code position within the current function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(usize);

/// Builds module bytecode function by function. Function 0 (the entry
/// point) is open when the builder is created.
pub struct ModuleBuilder {
    footprint: u16,
    funcs: Vec<Vec<u8>>,
    current: Vec<u8>,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
}

impl ModuleBuilder {
    /// Starts a module with the given declared memory footprint.
    #[must_use]
    pub fn new(footprint: u16) -> Self {
        Self {
            footprint,
            funcs: Vec::new(),
            current: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
        }
    }

    /// Appends a bare opcode.
    pub fn op(&mut self, opcode: u8) -> &mut Self {
        self.current.push(opcode);
        self
    }

    /// Appends a push of an immediate word.
    pub fn push(&mut self, value: u64) -> &mut Self {
        self.current.push(op::PUSH);
        self.current.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Appends a call to the function at `index`.
    pub fn call(&mut self, index: u16) -> &mut Self {
        self.current.push(op::CALL);
        self.current.extend_from_slice(&index.to_le_bytes());
        self
    }

    /// Allocates a fresh, unbound label.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Binds `label` to the current position.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        self.labels[label.0] = Some(self.current.len() as u32);
        self
    }

    /// Appends an unconditional jump to `label`.
    pub fn jump(&mut self, label: Label) -> &mut Self {
        self.branch(op::JUMP, label)
    }

    /// Appends a conditional jump to `label`.
    pub fn jump_if(&mut self, label: Label) -> &mut Self {
        self.branch(op::JUMP_IF, label)
    }

    fn branch(&mut self, opcode: u8, label: Label) -> &mut Self {
        self.current.push(opcode);
        self.fixups.push((self.current.len(), label));
        self.current.extend_from_slice(&[0u8; 4]);
        self
    }

    /// Finishes the current function and opens the next one.
    pub fn next_func(&mut self) -> &mut Self {
        self.finish_current();
        self
    }

    fn finish_current(&mut self) {
        for (site, label) in self.fixups.drain(..) {
            let target = self.labels[label.0]
                .unwrap_or_else(|| panic!("label {label:?} was never bound"));
            self.current[site..site + 4].copy_from_slice(&target.to_le_bytes());
        }
        self.labels.clear();
        self.funcs.push(std::mem::take(&mut self.current));
    }

    /// Finishes the module and returns its wire-format bytes.
    pub fn build(&mut self) -> Vec<u8> {
        self.finish_current();
        let mut bytes = vec![FORMAT_VERSION];
        bytes.extend_from_slice(&self.footprint.to_le_bytes());
        bytes.extend_from_slice(&(self.funcs.len() as u16).to_le_bytes());
        for func in &self.funcs {
            bytes.extend_from_slice(&(func.len() as u32).to_le_bytes());
            bytes.extend_from_slice(func);
        }
        bytes
    }
}

// =============================================================================
// TESTS
// =============================================================================
