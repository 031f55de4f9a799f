use log::warn;

use crate::{Value, ValueKind, VmError, VmResult};

pub const STACK_SIZE: usize = 32;

/// One slot of the value stack. `float` is scratch space for unboxed
/// floats, which are pushed with kind `Float` and a nil `value`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stacklet {
    pub kind: ValueKind,
    pub value: Value,
    pub float: f32,
}

#[derive(Debug, Clone)]
pub struct Stack {
    slots: [Stacklet; STACK_SIZE],
    depth: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [Stacklet::default(); STACK_SIZE],
            depth: 0,
        }
    }

    /// Returns the active portion of the stack, bottom first
    #[must_use]
    pub fn slots(&self) -> &[Stacklet] {
        &self.slots[..self.depth]
    }

    /// Claims a new top slot, cleared to nil, for the caller to fill in.
    pub fn push(&mut self) -> VmResult<&mut Stacklet> {
        if self.depth == STACK_SIZE {
            warn!("stack overflow at depth {STACK_SIZE}");
            return Err(VmError::StackOverflow);
        }
        let slot = &mut self.slots[self.depth];
        *slot = Stacklet::default();
        self.depth += 1;
        Ok(slot)
    }

    /// Removes the top slot. An empty stack stays empty.
    pub fn pop(&mut self) -> VmResult<Stacklet> {
        if self.depth == 0 {
            warn!("stack underflow");
            return Err(VmError::StackUnderflow);
        }
        self.depth -= 1;
        Ok(self.slots[self.depth])
    }

    /// Pushes a tagged value; its kind is taken from the value.
    pub fn push_value(&mut self, value: Value) -> VmResult<()> {
        let slot = self.push()?;
        slot.kind = value.kind();
        slot.value = value;
        Ok(())
    }

    /// Pushes an unboxed float.
    pub fn push_float(&mut self, float: f32) -> VmResult<()> {
        let slot = self.push()?;
        slot.kind = ValueKind::Float;
        slot.float = float;
        Ok(())
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Stacklet> {
        self.get_nth(0)
    }

    /// Gets the nth slot from the top of the stack (0-indexed)
    #[must_use]
    pub fn get_nth(&self, n: usize) -> Option<&Stacklet> {
        if n >= self.depth {
            return None;
        }
        self.slots.get(self.depth - 1 - n)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    pub fn clear(&mut self) {
        self.depth = 0;
    }
}
