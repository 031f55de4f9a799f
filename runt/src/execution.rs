use log::{trace, warn};

use crate::{CellId, Procedure, Value, Vm, VmError, VmResult};

impl Vm<'_> {
    /// Binds `procedure` to `cell` and resets its payload to nil.
    pub fn bind(&mut self, cell: CellId, procedure: Procedure) -> VmResult<()> {
        let nil = self.nil();
        let cell = self.cells.get_mut(cell)?;
        cell.procedure = procedure;
        cell.payload = nil;
        Ok(())
    }

    pub fn set_payload(&mut self, cell: CellId, payload: Value) -> VmResult<()> {
        self.cells.get_mut(cell)?.payload = payload;
        Ok(())
    }

    /// Invokes the procedure of `cell` once with its payload.
    pub fn call(&mut self, cell: CellId) -> VmResult<()> {
        let target = *self.cells.get(cell)?;
        trace!("call {cell}");
        (target.procedure)(self, target.payload)
    }

    /// Runs a cell. A leaf is called directly, a compound word runs the
    /// cells of its extent in order. Nested compound cells run as a unit and
    /// the walk resumes after them. Stops at the first error.
    pub fn exec(&mut self, cell: CellId) -> VmResult<()> {
        if self.call_depth >= self.settings.max_call_depth {
            warn!("call depth {} exceeded at {cell}", self.call_depth);
            return Err(VmError::CallDepthExceeded(self.call_depth));
        }

        self.call_depth += 1;
        let result = self.exec_cell(cell);
        self.call_depth -= 1;
        result
    }

    fn exec_cell(&mut self, head: CellId) -> VmResult<()> {
        let extent = self.cells.get(head)?.extent;
        if extent == 1 {
            return self.call(head);
        }

        trace!("exec {head} with extent {extent}");
        let mut i = 1;
        while i < extent {
            let id = head.offset(i).ok_or(VmError::InvalidCell(head))?;
            let sub = self.cells.get(id)?.extent;
            if sub == 1 {
                self.call(id)?;
                i += 1;
            } else {
                self.exec(id)?;
                i = i.saturating_add(sub);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Cell, CellId, Value, Vm, VmCreateInfo, VmError, VmResult, VmSettings};

    fn with_vm<R>(f: impl FnOnce(&mut Vm<'_>) -> R) -> R {
        let mut bytes = [0u8; 256];
        let mut cells = [Cell::EMPTY; 32];
        let mut vm = Vm::new(VmCreateInfo {
            bytes: &mut bytes,
            cells: &mut cells,
            settings: VmSettings {
                max_call_depth: 16,
                ..VmSettings::default()
            },
        });
        f(&mut vm)
    }

    // pushes the id of the calling cell, which tests store as the payload
    fn record(vm: &mut Vm<'_>, payload: Value) -> VmResult<()> {
        vm.stack.push_value(payload)
    }

    fn fail(_vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
        Err(VmError::NotFound)
    }

    fn recorded(vm: &Vm<'_>) -> Vec<u32> {
        vm.stack
            .slots()
            .iter()
            .map(|slot| slot.value.as_cell().unwrap().get())
            .collect()
    }

    fn recording_cell(vm: &mut Vm<'_>) -> CellId {
        let id = vm.new_cell().unwrap();
        vm.bind(id, record).unwrap();
        vm.set_payload(id, Value::Cell(id)).unwrap();
        id
    }

    #[test]
    fn exec_leaf_calls_once() {
        with_vm(|vm| {
            let leaf = recording_cell(vm);
            vm.exec(leaf).unwrap();
            assert_eq!(recorded(vm), vec![leaf.get()]);
        });
    }

    #[test]
    fn exec_compound_walks_extent_in_order() {
        with_vm(|vm| {
            let head = recording_cell(vm);
            vm.begin_word(head).unwrap();
            let body: Vec<u32> = (0..4).map(|_| recording_cell(vm).get()).collect();
            vm.end_word().unwrap();

            vm.exec(head).unwrap();
            // the head's own procedure is not part of the walk
            assert_eq!(recorded(vm), body);
        });
    }

    #[test]
    fn nested_compound_runs_once() {
        with_vm(|vm| {
            let outer = recording_cell(vm);
            vm.begin_word(outer).unwrap();
            let a = recording_cell(vm);
            let inner = recording_cell(vm);
            vm.begin_word(inner).unwrap();
            let b = recording_cell(vm);
            let c = recording_cell(vm);
            vm.end_word().unwrap();
            let d = recording_cell(vm);
            vm.end_word().unwrap();

            vm.exec(outer).unwrap();
            assert_eq!(
                recorded(vm),
                vec![a.get(), b.get(), c.get(), d.get()]
            );
        });
    }

    #[test]
    fn exec_stops_at_first_error() {
        with_vm(|vm| {
            let head = vm.new_cell().unwrap();
            vm.begin_word(head).unwrap();
            let first = recording_cell(vm);
            let broken = vm.new_cell().unwrap();
            vm.bind(broken, fail).unwrap();
            recording_cell(vm);
            vm.end_word().unwrap();

            assert_eq!(vm.exec(head), Err(VmError::NotFound));
            assert_eq!(recorded(vm), vec![first.get()]);
            assert_eq!(vm.call_depth, 0);
        });
    }

    #[test]
    fn corrupted_extent_is_reported() {
        with_vm(|vm| {
            let head = vm.new_cell().unwrap();
            vm.cells.get_mut(head).unwrap().extent = 5;
            let missing = CellId::new(2).unwrap();
            assert_eq!(vm.exec(head), Err(VmError::InvalidCell(missing)));
        });
    }

    #[test]
    fn bind_resets_payload() {
        with_vm(|vm| {
            let id = recording_cell(vm);
            vm.bind(id, crate::proc_zero).unwrap();
            assert!(vm.cell(id).unwrap().payload().is_nil());
            vm.call(id).unwrap();
            assert!(vm.stack.is_empty());
        });
    }
}
