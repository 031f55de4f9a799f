use std::{fmt, num::NonZeroU32};

use crate::{VmError, VmResult};

/// 1-based index of a cell in the cell arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(NonZeroU32);

impl CellId {
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Zero-based slot index into the backing array.
    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// The cell `n` slots after this one.
    pub(crate) fn offset(self, n: u32) -> Option<Self> {
        self.0.checked_add(n).map(Self)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// 1-based offset of an allocation in the byte arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteId(NonZeroU32);

impl ByteId {
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub(crate) fn offset(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// A boxed `f32` living in the byte arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatRef(pub(crate) ByteId);

/// A string living in the byte arena. The stored bytes are followed by a
/// zero terminator that is not counted in `len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrRef {
    pub(crate) id: ByteId,
    pub(crate) len: u32,
}

impl StrRef {
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Nil,
    Float,
    String,
    Cell,
}

impl ValueKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Cell => "cell",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tagged reference into one of the arenas. Values never own what they
/// point at; the referenced storage lives as long as the arena does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Nil,
    Float(FloatRef),
    String(StrRef),
    Cell(CellId),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Cell(_) => ValueKind::Cell,
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_cell(&self) -> VmResult<CellId> {
        match *self {
            Value::Cell(id) => Ok(id),
            other => Err(VmError::type_mismatch(ValueKind::Cell, other)),
        }
    }

    pub fn as_float_ref(&self) -> VmResult<FloatRef> {
        match *self {
            Value::Float(float) => Ok(float),
            other => Err(VmError::type_mismatch(ValueKind::Float, other)),
        }
    }

    pub fn as_str_ref(&self) -> VmResult<StrRef> {
        match *self {
            Value::String(string) => Ok(string),
            other => Err(VmError::type_mismatch(ValueKind::String, other)),
        }
    }
}

impl From<CellId> for Value {
    fn from(id: CellId) -> Self {
        Value::Cell(id)
    }
}
