use std::fmt;

use crate::{CellId, CopyId, Value, ValueKind};

pub type VmResult<T> = Result<T, VmError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    ByteArenaFull {
        requested: usize,
        used: usize,
        capacity: usize,
    },
    CellArenaFull {
        capacity: usize,
    },
    InvalidCell(CellId),
    InvalidHandle,
    StackOverflow,
    StackUnderflow,
    TypeMismatch {
        expected: ValueKind,
        got: ValueKind,
    },
    NotFound,
    AlreadyDefined,
    CallDepthExceeded(usize),
    CompileNestingExceeded,
    NotCompiling,
    DetachedWord(CellId),
    AlreadyCompiling(CellId),
    CopyTableFull,
    UnknownCopyProc(CopyId),
    InvalidUtf8,
}

impl VmError {
    pub(crate) fn type_mismatch(expected: ValueKind, got: Value) -> Self {
        VmError::TypeMismatch {
            expected,
            got: got.kind(),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::ByteArenaFull {
                requested,
                used,
                capacity,
            } => write!(
                f,
                "byte arena exhausted: requested {requested} bytes with {used}/{capacity} in use"
            ),
            VmError::CellArenaFull { capacity } => {
                write!(f, "cell arena exhausted: all {capacity} cells in use")
            }
            VmError::InvalidCell(id) => write!(f, "{id} is not an allocated cell"),
            VmError::InvalidHandle => f.write_str("handle does not refer to live arena storage"),
            VmError::StackOverflow => f.write_str("stack overflow"),
            VmError::StackUnderflow => f.write_str("stack underflow"),
            VmError::TypeMismatch { expected, got } => {
                write!(f, "expected {expected}, got {got}")
            }
            VmError::NotFound => f.write_str("word not found"),
            VmError::AlreadyDefined => f.write_str("entry is already defined"),
            VmError::CallDepthExceeded(depth) => {
                write!(f, "call depth exceeded ({depth})")
            }
            VmError::CompileNestingExceeded => f.write_str("too many nested word definitions"),
            VmError::NotCompiling => f.write_str("no word is being compiled"),
            VmError::DetachedWord(id) => {
                write!(f, "{id} is not the most recently allocated cell")
            }
            VmError::AlreadyCompiling(id) => write!(f, "{id} is already being compiled"),
            VmError::CopyTableFull => f.write_str("copy procedure table is full"),
            VmError::UnknownCopyProc(id) => write!(f, "unknown copy procedure {}", id.get()),
            VmError::InvalidUtf8 => f.write_str("string is not valid utf-8"),
        }
    }
}

impl std::error::Error for VmError {}
