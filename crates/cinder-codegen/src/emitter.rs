//! Instruction emission
//!
//! [`CodeEmitter`] is the per-compilation-unit session: it owns the string
//! table and the code buffer, and exposes one encoding method per opcode
//! family. Every method is a pure encode step over validated inputs; the
//! emitter never models the VM's selector registers, it only writes the
//! opcodes that drive them.

use crate::error::{EmitError, EmitResult};
use crate::scope::{ObjectScopes, ScopeId};
use cinder_bytecode::{CodeWriter, CompiledScript, Opcode, StringTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// The three value kinds a field or variable access can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// String-typed access
    Str,
    /// Unsigned-integer-typed access
    Uint,
    /// Float-typed access
    Flt,
}

/// Emission session for one compilation unit
///
/// Created once per unit, driven by the addressing-protocol helpers (or
/// directly), and consumed by [`CodeEmitter::finish`] into a
/// [`CompiledScript`]. All state is owned here; there are no process-wide
/// tables.
#[derive(Default)]
pub struct CodeEmitter {
    code: CodeWriter,
    strings: StringTable,
    scopes: ObjectScopes,
}

impl CodeEmitter {
    /// Create a fresh emission session
    pub fn new() -> Self {
        Self {
            code: CodeWriter::new(),
            strings: StringTable::new(),
            scopes: ObjectScopes::new(),
        }
    }

    /// Number of instructions emitted so far
    pub fn op_count(&self) -> u32 {
        self.code.op_count()
    }

    /// The code emitted so far
    pub fn code(&self) -> &[u8] {
        self.code.buffer()
    }

    /// The session's string table
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    fn intern(&mut self, value: &str) -> EmitResult<u16> {
        let offset = self.strings.intern(value)?;
        trace!(value, offset, "interned string");
        Ok(offset)
    }

    // ===== Selection =====

    /// Select the current object by name
    pub fn emit_set_cur_object(&mut self, name: &str) -> EmitResult<()> {
        let offset = self.intern(name)?;
        self.code.emit_opcode(Opcode::SetCurObject);
        self.code.emit_u16(offset);
        Ok(())
    }

    /// Select the most recently created object
    pub fn emit_set_cur_object_new(&mut self) {
        self.code.emit_opcode(Opcode::SetCurObjectNew);
    }

    /// Select the current field by name
    pub fn emit_set_cur_field(&mut self, name: &str) -> EmitResult<()> {
        let offset = self.intern(name)?;
        self.code.emit_opcode(Opcode::SetCurField);
        self.code.emit_u16(offset);
        Ok(())
    }

    /// Select an indexed field by name
    ///
    /// The index must already be on the VM's evaluation stack; the emitter
    /// does not validate that precondition.
    pub fn emit_set_cur_field_array(&mut self, name: &str) -> EmitResult<()> {
        let offset = self.intern(name)?;
        self.code.emit_opcode(Opcode::SetCurFieldArray);
        self.code.emit_u16(offset);
        Ok(())
    }

    // ===== Typed Field I/O =====

    /// Push the current field's value
    pub fn emit_load_field(&mut self, kind: FieldKind) {
        self.code.emit_opcode(match kind {
            FieldKind::Str => Opcode::LoadFieldStr,
            FieldKind::Uint => Opcode::LoadFieldUint,
            FieldKind::Flt => Opcode::LoadFieldFlt,
        });
    }

    /// Pop a value into the current field
    pub fn emit_save_field(&mut self, kind: FieldKind) {
        self.code.emit_opcode(match kind {
            FieldKind::Str => Opcode::SaveFieldStr,
            FieldKind::Uint => Opcode::SaveFieldUint,
            FieldKind::Flt => Opcode::SaveFieldFlt,
        });
    }

    // ===== Immediate Constants =====

    /// Push a string constant
    pub fn emit_load_imm_str(&mut self, value: &str) -> EmitResult<()> {
        let offset = self.intern(value)?;
        self.code.emit_opcode(Opcode::LoadImmStr);
        self.code.emit_u16(offset);
        Ok(())
    }

    /// Push an unsigned integer constant
    pub fn emit_load_imm_uint(&mut self, value: u32) {
        self.code.emit_opcode(Opcode::LoadImmUint);
        self.code.emit_u32(value);
    }

    /// Push a float constant
    pub fn emit_load_imm_flt(&mut self, value: f32) {
        self.code.emit_opcode(Opcode::LoadImmFlt);
        self.code.emit_f32(value);
    }

    // ===== Variables =====

    /// Select the current variable by name
    pub fn emit_set_cur_var(&mut self, name: &str) -> EmitResult<()> {
        let offset = self.intern(name)?;
        self.code.emit_opcode(Opcode::SetCurVar);
        self.code.emit_u16(offset);
        Ok(())
    }

    /// Push the current variable's value
    pub fn emit_load_var(&mut self, kind: FieldKind) {
        self.code.emit_opcode(match kind {
            FieldKind::Str => Opcode::LoadVarStr,
            FieldKind::Uint => Opcode::LoadVarUint,
            FieldKind::Flt => Opcode::LoadVarFlt,
        });
    }

    /// Pop a value into the current variable
    pub fn emit_save_var(&mut self, kind: FieldKind) {
        self.code.emit_opcode(match kind {
            FieldKind::Str => Opcode::SaveVarStr,
            FieldKind::Uint => Opcode::SaveVarUint,
            FieldKind::Flt => Opcode::SaveVarFlt,
        });
    }

    // ===== Construction =====

    /// Emit a bare CreateObject instruction
    ///
    /// An absent instance name encodes as offset 0, the VM's unnamed
    /// marker, without interning anything.
    pub fn emit_create_object(
        &mut self,
        class_name: &str,
        object_name: Option<&str>,
        datablock: bool,
    ) -> EmitResult<()> {
        let class_offset = self.intern(class_name)?;
        let name_offset = match object_name {
            Some(name) => self.intern(name)?,
            None => 0,
        };

        self.code.emit_opcode(Opcode::CreateObject);
        self.code.emit_u16(class_offset);
        self.code.emit_u16(name_offset);
        self.code.emit_u8(datablock as u8);
        Ok(())
    }

    /// Close the current statement's construction marker
    pub fn emit_end_object(&mut self, add_to_parent: bool) {
        self.code.emit_opcode(Opcode::EndObject);
        self.code.emit_u8(add_to_parent as u8);
    }

    /// Open a construction scope
    ///
    /// Emits CreateObject, then AddObject with a one-byte placeholder for
    /// the end instruction index. The placeholder is recorded as the
    /// scope's patch site and the scope stays open until
    /// [`CodeEmitter::end_object`] closes it.
    pub fn begin_object(
        &mut self,
        class_name: &str,
        object_name: Option<&str>,
        datablock: bool,
    ) -> EmitResult<ScopeId> {
        self.emit_create_object(class_name, object_name, datablock)?;

        self.code.emit_opcode(Opcode::AddObject);
        let position = self.code.reserve_u8();
        Ok(self.scopes.open(position))
    }

    /// Close the innermost open construction scope
    ///
    /// Emits EndObject, then resolves the scope's patch site with the
    /// instruction index immediately after the closing sequence. Fails if
    /// no scope is open, or if that index no longer fits the one-byte
    /// field; the value is never wrapped.
    pub fn end_object(&mut self, add_to_parent: bool) -> EmitResult<()> {
        let scope = self.scopes.pop_innermost()?;
        self.emit_end_object(add_to_parent);

        let op_count = self.code.op_count();
        let (position, value) = self.scopes.resolve(scope, op_count)?;
        self.code.patch_u8(position, value);
        debug!(position, end_index = value, "patched construction scope end");
        Ok(())
    }

    // ===== Control =====

    /// Terminate the compilation unit
    pub fn emit_return(&mut self) {
        self.code.emit_opcode(Opcode::Return);
    }

    /// Consume the session into a compiled script
    ///
    /// Fails if any construction scope is still open.
    pub fn finish(self) -> EmitResult<CompiledScript> {
        let open = self.scopes.open_count();
        if open > 0 {
            return Err(EmitError::UnclosedScope { count: open });
        }

        Ok(CompiledScript {
            flags: 0,
            strings: self.strings,
            code: self.code.into_bytes(),
        })
    }
}
