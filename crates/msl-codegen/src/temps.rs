//! Scoped temporary variable slots
//!
//! Mirrors the `OPSCOPE`/`CLSCOPE` brackets of the bytecode: every slot
//! allocated inside a scope is released when that scope is popped, so the
//! next expression reuses the same indices.

use crate::GenError;

#[derive(Debug, Clone)]
pub struct TempAllocator {
    next: u16,
    scopes: Vec<u16>,
    high_water: u16,
}

impl TempAllocator {
    /// Temporaries are numbered from `first`, the first index no global uses.
    pub fn new(first: u16) -> Self {
        Self {
            next: first,
            scopes: Vec::new(),
            high_water: first,
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(self.next);
    }

    pub fn pop_scope(&mut self) {
        if let Some(start) = self.scopes.pop() {
            self.next = start;
        }
    }

    pub fn alloc_temp(&mut self) -> Result<u16, GenError> {
        let slot = self.next;
        self.next = slot
            .checked_add(1)
            .ok_or(GenError::TooManyVariables {
                what: "temporary variables",
            })?;
        self.high_water = self.high_water.max(self.next);
        Ok(slot)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// One past the highest slot ever handed out
    pub fn high_water(&self) -> u16 {
        self.high_water
    }
}
