use log::debug;

use crate::{CellId, Vm, VmError, VmResult};

pub const MAX_COMPILE_DEPTH: usize = 8;

/// Words currently being extended, innermost last.
#[derive(Debug, Clone, Default)]
pub struct CompileState {
    words: [Option<CellId>; MAX_COMPILE_DEPTH],
    depth: usize,
}

impl CompileState {
    fn push(&mut self, head: CellId) -> VmResult<()> {
        if self.depth == MAX_COMPILE_DEPTH {
            return Err(VmError::CompileNestingExceeded);
        }
        self.words[self.depth] = Some(head);
        self.depth += 1;
        Ok(())
    }

    fn pop(&mut self) -> Option<CellId> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        self.words[self.depth].take()
    }

    fn open(&self) -> impl Iterator<Item = CellId> + '_ {
        self.words[..self.depth].iter().flatten().copied()
    }

    #[must_use]
    pub fn current(&self) -> Option<CellId> {
        self.depth.checked_sub(1).and_then(|top| self.words[top])
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Vm<'_> {
    /// Allocates a cell. While compiling, the new cell becomes part of every
    /// open word, so enclosing runs stay contiguous around nested ones.
    pub fn new_cell(&mut self) -> VmResult<CellId> {
        let id = self.cells.allocate()?;
        for head in self.compile.open() {
            self.cells.get_mut(head)?.extent += 1;
        }
        Ok(id)
    }

    /// Starts extending `head`. It has to be the last allocated cell so
    /// that everything allocated from here on follows it directly.
    pub fn begin_word(&mut self, head: CellId) -> VmResult<()> {
        self.cells.get(head)?;
        if self.cells.last() != Some(head) {
            return Err(VmError::DetachedWord(head));
        }
        if self.compile.open().any(|open| open == head) {
            return Err(VmError::AlreadyCompiling(head));
        }
        self.compile.push(head)?;
        debug!("begin word {head} (depth {})", self.compile.depth());
        Ok(())
    }

    /// Stops extending the innermost open word and returns its head.
    pub fn end_word(&mut self) -> VmResult<CellId> {
        let head = self.compile.pop().ok_or(VmError::NotCompiling)?;
        debug!(
            "end word {head} with extent {}",
            self.cells.get(head)?.extent
        );
        Ok(head)
    }

    #[must_use]
    pub fn is_compiling(&self) -> bool {
        self.compile.depth() > 0
    }

    #[must_use]
    pub fn current_word(&self) -> Option<CellId> {
        self.compile.current()
    }
}
