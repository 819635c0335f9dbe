//! High-level emission requests
//!
//! The parser hands the backend an ordered sequence of fully resolved
//! requests; compiling a unit is one pass over that sequence driving a
//! single emission session, terminated by a top-level return. The type is
//! serde-derived so request sequences double as JSON test fixtures.

use crate::emitter::{CodeEmitter, FieldKind};
use crate::error::EmitResult;
use crate::protocol::{FieldValue, IndexValue};
use cinder_bytecode::CompiledScript;
use serde::{Deserialize, Serialize};

/// One high-level emission request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// `object.field = value`
    FieldAssignment {
        /// Target object name
        object: String,
        /// Field name
        field: String,
        /// Assigned value
        value: FieldValue,
    },
    /// `array[index, field] = value`
    ArrayAssignment {
        /// Target array object name
        array: String,
        /// Index expression
        index: IndexValue,
        /// Field name
        field: String,
        /// Assigned value
        value: FieldValue,
    },
    /// Read `array[index, field]`, leaving the value on the VM stack
    ArrayRead {
        /// Target array object name
        array: String,
        /// Index expression
        index: IndexValue,
        /// Field name
        field: String,
        /// Value kind to load
        kind: FieldKind,
    },
    /// `new Class(name) { field = value; ... }`
    ObjectWithFields {
        /// Class name
        class: String,
        /// Optional instance name
        #[serde(default)]
        name: Option<String>,
        /// Datablock flag
        #[serde(default)]
        datablock: bool,
        /// Field assignments, applied in the order given
        fields: Vec<(String, FieldValue)>,
    },
    /// `$variable = value`
    VariableAssignment {
        /// Variable name
        variable: String,
        /// Assigned value
        value: FieldValue,
    },
}

impl CodeEmitter {
    /// Apply one high-level request to this session
    pub fn emit_request(&mut self, request: &Request) -> EmitResult<()> {
        match request {
            Request::FieldAssignment {
                object,
                field,
                value,
            } => self.emit_field_assignment(object, field, value),
            Request::ArrayAssignment {
                array,
                index,
                field,
                value,
            } => self.emit_array_assignment(array, index, field, value),
            Request::ArrayRead {
                array,
                index,
                field,
                kind,
            } => self.emit_array_read(array, index, field, *kind),
            Request::ObjectWithFields {
                class,
                name,
                datablock,
                fields,
            } => self.emit_object_with_fields(class, name.as_deref(), *datablock, fields),
            Request::VariableAssignment { variable, value } => {
                self.emit_variable_assignment(variable, value)
            }
        }
    }
}

/// Compile a request sequence into a finished script
///
/// Requests are emitted in the order given; the unit is terminated with a
/// top-level return, as every compiled script must be.
pub fn compile(requests: &[Request]) -> EmitResult<CompiledScript> {
    let mut emitter = CodeEmitter::new();
    for request in requests {
        emitter.emit_request(request)?;
    }
    emitter.emit_return();
    emitter.finish()
}
