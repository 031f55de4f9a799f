use std::fmt;

use log::{debug, warn};

use crate::{CellId, Value, Vm, VmError, VmResult};

/// Native code bound to a cell. Receives the cell's payload.
pub type Procedure = fn(&mut Vm<'_>, Value) -> VmResult<()>;

/// The unit of execution.
///
/// A cell with an extent of 1 is a leaf. A larger extent makes it the head
/// of a compound word: the head plus the `extent - 1` cells allocated right
/// after it.
#[derive(Clone, Copy)]
pub struct Cell {
    pub(crate) procedure: Procedure,
    pub(crate) payload: Value,
    pub(crate) extent: u32,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        procedure: proc_zero,
        payload: Value::Nil,
        extent: 1,
    };

    #[must_use]
    pub fn procedure(&self) -> Procedure {
        self.procedure
    }

    #[must_use]
    pub fn payload(&self) -> Value {
        self.payload
    }

    #[must_use]
    pub fn extent(&self) -> u32 {
        self.extent
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.extent == 1
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("procedure", &(self.procedure as usize as *const ()))
            .field("payload", &self.payload)
            .field("extent", &self.extent)
            .finish()
    }
}

/// Does nothing. Every fresh cell is bound to this.
pub fn proc_zero(_vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
    Ok(())
}

/// Linear allocator over a caller supplied array of cells.
pub struct CellArena<'a> {
    cells: &'a mut [Cell],
    used: usize,
}

impl<'a> CellArena<'a> {
    pub fn new(cells: &'a mut [Cell]) -> Self {
        let mut arena = Self { cells, used: 0 };
        arena.initialize();
        arena
    }

    /// Rebinds every slot to the no-op procedure with an extent of 1 and
    /// forgets all allocations.
    pub fn initialize(&mut self) {
        self.cells.fill(Cell::EMPTY);
        self.used = 0;
        debug!("cell arena configured with {} cells", self.cells.len());
    }

    /// Hands out the next free slot. Compile-mode bookkeeping lives in
    /// [`Vm::new_cell`]; this only moves the watermark.
    pub fn allocate(&mut self) -> VmResult<CellId> {
        if self.used >= self.cells.len() {
            let err = VmError::CellArenaFull {
                capacity: self.cells.len(),
            };
            warn!("{err}");
            return Err(err);
        }

        let id = u32::try_from(self.used + 1)
            .ok()
            .and_then(CellId::new)
            .ok_or(VmError::CellArenaFull {
                capacity: self.cells.len(),
            })?;
        self.used += 1;
        Ok(id)
    }

    pub fn get(&self, id: CellId) -> VmResult<&Cell> {
        if id.index() >= self.used {
            return Err(VmError::InvalidCell(id));
        }
        Ok(&self.cells[id.index()])
    }

    pub fn get_mut(&mut self, id: CellId) -> VmResult<&mut Cell> {
        if id.index() >= self.used {
            return Err(VmError::InvalidCell(id));
        }
        Ok(&mut self.cells[id.index()])
    }

    /// The most recently allocated cell, if any.
    #[must_use]
    pub fn last(&self) -> Option<CellId> {
        u32::try_from(self.used).ok().and_then(CellId::new)
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }
}
