mod boxed;
mod bytes;
mod cells;
mod compile;
mod dictionary;
mod error;
mod execution;
mod linking;
mod primitives;
mod shared;
mod stack;
mod value;
mod vm;

pub use boxed::proc_literal;
pub use bytes::ByteArena;
pub use cells::{Cell, CellArena, Procedure, proc_zero};
pub use compile::{CompileState, MAX_COMPILE_DEPTH};
pub use dictionary::{
    DICT_BUCKETS, Dictionary, DictionaryMode, ENTRY_SIZE, Entry, EntryId, HASH_PRIME, hash,
};
pub use error::{VmError, VmResult};
pub use linking::{
    COPY_IMMEDIATE, COPY_INLINE, COPY_LINK, COPY_TABLE_SIZE, CopyId, CopyProc, CopyTable,
    immediate_cell, inline_cell, link_cell, proc_link,
};
pub use primitives::PrimitiveDesc;
pub use shared::SharedVm;
pub use stack::{STACK_SIZE, Stack, Stacklet};
pub use value::*;
pub use vm::*;
