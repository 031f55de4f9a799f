use log::debug;

use crate::{
    ByteArena, Cell, CellArena, CellId, CompileState, CopyTable, Dictionary, DictionaryMode,
    Stack, Value, VmResult,
};

/// Knobs that are not part of the storage contract.
#[derive(Debug, Clone, Copy)]
pub struct VmSettings {
    /// Upper bound on nested `exec` calls, including link indirections.
    pub max_call_depth: usize,
    pub dictionary: DictionaryMode,
}

impl Default for VmSettings {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
            dictionary: DictionaryMode::default(),
        }
    }
}

/// Storage handed to the VM by the embedder. Both buffers are borrowed for
/// the VM's whole life; nothing else is allocated afterwards.
pub struct VmCreateInfo<'a> {
    pub bytes: &'a mut [u8],
    pub cells: &'a mut [Cell],
    pub settings: VmSettings,
}

pub struct Vm<'a> {
    pub stack: Stack,
    pub(crate) cells: CellArena<'a>,
    pub(crate) bytes: ByteArena<'a>,
    pub(crate) dictionary: Dictionary,
    pub(crate) compile: CompileState,
    pub(crate) copy_procs: CopyTable,
    pub(crate) settings: VmSettings,
    pub(crate) call_depth: usize,
    nil: Value,
}

impl<'a> Vm<'a> {
    pub fn new(info: VmCreateInfo<'a>) -> Self {
        let vm = Self {
            stack: Stack::new(),
            cells: CellArena::new(info.cells),
            bytes: ByteArena::new(info.bytes),
            dictionary: Dictionary::new(info.settings.dictionary),
            compile: CompileState::default(),
            copy_procs: CopyTable::new(),
            settings: info.settings,
            call_depth: 0,
            nil: Value::Nil,
        };
        debug!(
            "vm ready: {} bytes, {} cells, {:?} dictionary",
            vm.bytes.capacity(),
            vm.cells.capacity(),
            vm.settings.dictionary
        );
        vm
    }

    /// Drops every word, cell and boxed value and starts over on the same
    /// buffers. Registered copy procedures survive.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.cells.initialize();
        self.bytes.reset();
        self.dictionary = Dictionary::new(self.settings.dictionary);
        self.compile = CompileState::default();
        self.call_depth = 0;
    }

    /// The shared nil value.
    #[must_use]
    pub fn nil(&self) -> Value {
        self.nil
    }

    /// A copy of the cell at `id`.
    pub fn cell(&self, id: CellId) -> VmResult<Cell> {
        self.cells.get(id).copied()
    }

    #[must_use]
    pub fn settings(&self) -> &VmSettings {
        &self.settings
    }

    #[must_use]
    pub fn bytes_used(&self) -> usize {
        self.bytes.used()
    }

    #[must_use]
    pub fn bytes_capacity(&self) -> usize {
        self.bytes.capacity()
    }

    #[must_use]
    pub fn cells_used(&self) -> usize {
        self.cells.used()
    }

    #[must_use]
    pub fn cells_capacity(&self) -> usize {
        self.cells.capacity()
    }
}
