use crate::{CellId, FloatRef, StrRef, Value, ValueKind, Vm, VmError, VmResult};

const FLOAT_SIZE: usize = size_of::<f32>();

impl Vm<'_> {
    /// Boxes `float` in the byte arena.
    pub fn mk_float(&mut self, float: f32) -> VmResult<Value> {
        let id = self.bytes.allocate_copy(&float.to_le_bytes())?;
        Ok(Value::Float(FloatRef(id)))
    }

    pub fn to_float(&self, value: Value) -> VmResult<f32> {
        let FloatRef(id) = value.as_float_ref()?;
        let mut raw = [0u8; FLOAT_SIZE];
        raw.copy_from_slice(self.bytes.bytes(id, FLOAT_SIZE)?);
        Ok(f32::from_le_bytes(raw))
    }

    /// Overwrites a boxed float in place.
    pub fn store_float(&mut self, value: Value, float: f32) -> VmResult<()> {
        let FloatRef(id) = value.as_float_ref()?;
        self.bytes
            .bytes_mut(id, FLOAT_SIZE)?
            .copy_from_slice(&float.to_le_bytes());
        Ok(())
    }

    /// Copies `string` into the byte arena, followed by a zero byte.
    pub fn mk_string(&mut self, string: &str) -> VmResult<Value> {
        let len = u32::try_from(string.len()).map_err(|_| VmError::ByteArenaFull {
            requested: string.len(),
            used: self.bytes.used(),
            capacity: self.bytes.capacity(),
        })?;
        // the arena is zero filled, so the terminator is already there
        let id = self.bytes.allocate(string.len() + 1)?;
        self.bytes
            .bytes_mut(id, string.len())?
            .copy_from_slice(string.as_bytes());
        Ok(Value::String(StrRef { id, len }))
    }

    pub fn to_str(&self, value: Value) -> VmResult<&str> {
        let string = value.as_str_ref()?;
        let bytes = self.bytes.bytes(string.id, string.len())?;
        std::str::from_utf8(bytes).map_err(|_| VmError::InvalidUtf8)
    }

    /// Pops a float, either unboxed in the slot's scratch or boxed in the
    /// arena. The stack is left alone when the top is not a float.
    pub fn pop_float(&mut self) -> VmResult<f32> {
        let top = *self.stack.peek().ok_or(VmError::StackUnderflow)?;
        if top.kind != ValueKind::Float {
            return Err(VmError::TypeMismatch {
                expected: ValueKind::Float,
                got: top.kind,
            });
        }
        let float = match top.value {
            Value::Float(_) => self.to_float(top.value)?,
            _ => top.float,
        };
        self.stack.pop()?;
        Ok(float)
    }

    /// Binds `cell` so that calling it pushes `value`.
    pub fn bind_literal(&mut self, cell: CellId, value: Value) -> VmResult<()> {
        self.bind(cell, proc_literal)?;
        self.set_payload(cell, value)
    }
}

/// Pushes the payload. Boxed floats are also unboxed into the slot's scratch.
pub fn proc_literal(vm: &mut Vm<'_>, payload: Value) -> VmResult<()> {
    let float = match payload {
        Value::Float(_) => vm.to_float(payload)?,
        _ => 0.0,
    };
    let slot = vm.stack.push()?;
    slot.kind = payload.kind();
    slot.value = payload;
    slot.float = float;
    Ok(())
}
