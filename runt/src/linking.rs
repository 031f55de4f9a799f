use std::fmt;

use log::debug;

use crate::{CellId, Value, Vm, VmError, VmResult, proc_zero};

/// Materializes a dictionary entry's cell (`source`) into a freshly
/// compiled cell (`dest`).
pub type CopyProc = fn(&mut Vm<'_>, CellId, CellId) -> VmResult<()>;

pub const COPY_TABLE_SIZE: usize = 16;

/// Index of a copy procedure in the VM's copy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyId(u32);

impl CopyId {
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

/// Wire `dest` to run `source` indirectly. The default for every entry.
pub const COPY_LINK: CopyId = CopyId(0);
/// Copy a leaf's procedure and payload straight into `dest`.
pub const COPY_INLINE: CopyId = CopyId(1);
/// Run `source` at compile time and leave `dest` as a no-op.
pub const COPY_IMMEDIATE: CopyId = CopyId(2);

pub struct CopyTable {
    procs: [Option<CopyProc>; COPY_TABLE_SIZE],
    len: usize,
}

impl CopyTable {
    pub(crate) fn new() -> Self {
        let mut procs: [Option<CopyProc>; COPY_TABLE_SIZE] = [None; COPY_TABLE_SIZE];
        procs[COPY_LINK.0 as usize] = Some(link_cell);
        procs[COPY_INLINE.0 as usize] = Some(inline_cell);
        procs[COPY_IMMEDIATE.0 as usize] = Some(immediate_cell);
        Self { procs, len: 3 }
    }

    fn register(&mut self, copy: CopyProc) -> VmResult<CopyId> {
        if self.len == COPY_TABLE_SIZE {
            return Err(VmError::CopyTableFull);
        }
        let id = CopyId(self.len as u32);
        self.procs[self.len] = Some(copy);
        self.len += 1;
        Ok(id)
    }

    pub(crate) fn get(&self, id: CopyId) -> VmResult<CopyProc> {
        self.procs
            .get(id.0 as usize)
            .copied()
            .flatten()
            .ok_or(VmError::UnknownCopyProc(id))
    }
}

impl fmt::Debug for CopyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyTable").field("len", &self.len).finish()
    }
}

/// Runs the cell referenced by the payload.
pub fn proc_link(vm: &mut Vm<'_>, payload: Value) -> VmResult<()> {
    let source = payload.as_cell()?;
    vm.exec(source)
}

/// `dest` becomes a leaf that executes `source`, however large it is.
pub fn link_cell(vm: &mut Vm<'_>, source: CellId, dest: CellId) -> VmResult<()> {
    vm.cells.get(source)?;
    let cell = vm.cells.get_mut(dest)?;
    cell.procedure = proc_link;
    cell.payload = Value::Cell(source);
    Ok(())
}

/// Copies a leaf source into `dest`. Compound sources cannot be inlined
/// into a single cell and are linked instead.
pub fn inline_cell(vm: &mut Vm<'_>, source: CellId, dest: CellId) -> VmResult<()> {
    let src = *vm.cells.get(source)?;
    if !src.is_leaf() {
        return link_cell(vm, source, dest);
    }
    let cell = vm.cells.get_mut(dest)?;
    cell.procedure = src.procedure;
    cell.payload = src.payload;
    Ok(())
}

pub fn immediate_cell(vm: &mut Vm<'_>, source: CellId, dest: CellId) -> VmResult<()> {
    vm.exec(source)?;
    vm.bind(dest, proc_zero)
}

impl Vm<'_> {
    pub fn link_cell(&mut self, source: CellId, dest: CellId) -> VmResult<()> {
        link_cell(self, source, dest)
    }

    /// Adds a resolution strategy that entries can be switched to.
    pub fn register_copy_proc(&mut self, copy: CopyProc) -> VmResult<CopyId> {
        let id = self.copy_procs.register(copy)?;
        debug!("registered copy procedure {}", id.0);
        Ok(id)
    }

    pub(crate) fn copy_proc(&self, id: CopyId) -> VmResult<CopyProc> {
        self.copy_procs.get(id)
    }
}
