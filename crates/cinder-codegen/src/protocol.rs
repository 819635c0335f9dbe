//! Addressing-protocol composition
//!
//! The VM addresses fields through its selector registers, so a statement
//! like `obj.field = value` is a fixed opcode sequence, not a single
//! instruction with composite operands. This module provides the reusable
//! emission shapes: plain and indexed field assignment, indexed field
//! read, object construction with fields, and variable assignment. Each
//! shape emits in one deterministic order.

use crate::emitter::{CodeEmitter, FieldKind};
use crate::error::EmitResult;
use serde::{Deserialize, Serialize};

/// A typed value carried by an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// String value
    Str(String),
    /// Unsigned integer value
    Uint(u32),
    /// Float value
    Flt(f32),
}

impl FieldValue {
    /// The value kind, selecting the typed save/load opcode
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Str(_) => FieldKind::Str,
            Self::Uint(_) => FieldKind::Uint,
            Self::Flt(_) => FieldKind::Flt,
        }
    }
}

/// An array index expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexValue {
    /// Literal unsigned index
    Uint(u32),
    /// Literal string index
    Str(String),
    /// Variable reference, loaded as a string at runtime
    Var(String),
}

impl CodeEmitter {
    /// Push a typed constant
    pub fn emit_load_imm(&mut self, value: &FieldValue) -> EmitResult<()> {
        match value {
            FieldValue::Str(s) => self.emit_load_imm_str(s)?,
            FieldValue::Uint(v) => self.emit_load_imm_uint(*v),
            FieldValue::Flt(v) => self.emit_load_imm_flt(*v),
        }
        Ok(())
    }

    /// Push an array index onto the VM's evaluation stack
    fn emit_index(&mut self, index: &IndexValue) -> EmitResult<()> {
        match index {
            IndexValue::Uint(v) => self.emit_load_imm_uint(*v),
            IndexValue::Str(s) => self.emit_load_imm_str(s)?,
            IndexValue::Var(name) => {
                self.emit_set_cur_var(name)?;
                self.emit_load_var(FieldKind::Str);
            }
        }
        Ok(())
    }

    /// Emit `object.field = value`
    pub fn emit_field_assignment(
        &mut self,
        object: &str,
        field: &str,
        value: &FieldValue,
    ) -> EmitResult<()> {
        self.emit_set_cur_object(object)?;
        self.emit_set_cur_field(field)?;
        self.emit_load_imm(value)?;
        self.emit_save_field(value.kind());
        Ok(())
    }

    /// Emit `array[index, field] = value`
    pub fn emit_array_assignment(
        &mut self,
        array: &str,
        index: &IndexValue,
        field: &str,
        value: &FieldValue,
    ) -> EmitResult<()> {
        self.emit_set_cur_object(array)?;
        self.emit_index(index)?;
        self.emit_set_cur_field_array(field)?;
        self.emit_load_imm(value)?;
        self.emit_save_field(value.kind());
        Ok(())
    }

    /// Emit a read of `array[index, field]`
    ///
    /// The value is left on the VM's evaluation stack for the surrounding
    /// expression to consume.
    pub fn emit_array_read(
        &mut self,
        array: &str,
        index: &IndexValue,
        field: &str,
        kind: FieldKind,
    ) -> EmitResult<()> {
        self.emit_set_cur_object(array)?;
        self.emit_index(index)?;
        self.emit_set_cur_field_array(field)?;
        self.emit_load_field(kind);
        Ok(())
    }

    /// Emit `new Class(name) { field = value; ... }`
    ///
    /// Fields are assigned in the order supplied; each assignment
    /// reselects the newly created object so sibling assignments are
    /// independent of any outer selection.
    pub fn emit_object_with_fields(
        &mut self,
        class_name: &str,
        object_name: Option<&str>,
        datablock: bool,
        fields: &[(String, FieldValue)],
    ) -> EmitResult<()> {
        self.begin_object(class_name, object_name, datablock)?;

        for (field, value) in fields {
            self.emit_set_cur_object_new();
            self.emit_set_cur_field(field)?;
            self.emit_load_imm(value)?;
            self.emit_save_field(value.kind());
        }

        self.end_object(true)
    }

    /// Emit `$variable = value`
    pub fn emit_variable_assignment(&mut self, variable: &str, value: &FieldValue) -> EmitResult<()> {
        self.emit_set_cur_var(variable)?;
        self.emit_load_imm(value)?;
        self.emit_save_var(value.kind());
        Ok(())
    }
}
