use std::sync::Arc;

use parking_lot::Mutex;

use crate::Vm;

/// A VM that several host threads take turns on. Every access holds the
/// lock for its whole duration; the VM itself stays single threaded.
pub struct SharedVm<'a>(Arc<Mutex<Vm<'a>>>);

impl<'a> SharedVm<'a> {
    pub fn new(vm: Vm<'a>) -> Self {
        Self(Arc::new(Mutex::new(vm)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Vm<'a>) -> R) -> R {
        f(&mut *self.0.lock())
    }

    /// Gives the VM back once this is the last handle.
    pub fn try_into_inner(self) -> Result<Vm<'a>, Self> {
        Arc::try_unwrap(self.0)
            .map(Mutex::into_inner)
            .map_err(Self)
    }
}

impl Clone for SharedVm<'_> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Value, VmCreateInfo, VmResult, VmSettings};
    use std::thread;

    fn push_one(vm: &mut Vm<'_>, _payload: Value) -> VmResult<()> {
        vm.stack.push_float(1.0)
    }

    #[test]
    fn threads_take_turns() {
        let mut bytes = [0u8; 2048];
        let mut cells = [Cell::EMPTY; 32];
        let vm = Vm::new(VmCreateInfo {
            bytes: &mut bytes,
            cells: &mut cells,
            settings: VmSettings::default(),
        });
        let shared = SharedVm::new(vm);

        thread::scope(|scope| {
            for t in 0..4 {
                let shared = shared.clone();
                scope.spawn(move || {
                    for i in 0..4 {
                        shared.with(|vm| {
                            let name = format!("w{t}-{i}");
                            let entry = vm.word_define(&name, push_one).unwrap();
                            vm.entry_exec(entry).unwrap();
                        });
                    }
                });
            }
        });

        let vm = shared.try_into_inner().ok().unwrap();
        assert_eq!(vm.dictionary().len(), 16);
        assert_eq!(vm.cells_used(), 16);
        assert_eq!(vm.stack.depth(), 16);
        for t in 0..4 {
            for i in 0..4 {
                assert!(vm.search(&format!("w{t}-{i}")).is_ok());
            }
        }
    }
}
