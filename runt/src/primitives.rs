use log::debug;

use crate::{Procedure, Vm, VmResult};

/// A native word to be registered under `name`.
#[derive(Clone, Copy)]
pub struct PrimitiveDesc {
    pub name: &'static str,
    pub procedure: Procedure,
}

impl PrimitiveDesc {
    pub const fn new(name: &'static str, procedure: Procedure) -> Self {
        Self { name, procedure }
    }
}

impl Vm<'_> {
    /// Defines every primitive in `table`, in order. Stops at the first
    /// failure; primitives defined before it stay defined.
    pub fn register_primitives(&mut self, table: &[PrimitiveDesc]) -> VmResult<()> {
        for primitive in table {
            self.word_define(primitive.name, primitive.procedure)?;
        }
        debug!("registered {} primitives", table.len());
        Ok(())
    }
}
