//! Emitted-protocol verification
//!
//! The emitter never tracks VM selector state; the call-sequence
//! invariants it promises (object selected before field, field selected
//! before field I/O, balanced construction blocks, patched end indexes in
//! range) are checked here, over the decoded instruction stream.

use crate::disasm::{disassemble, Instr, Operand};
use crate::opcode::Opcode;
use crate::script::CompiledScript;

/// Protocol verification errors
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Code stream failed to decode
    #[error("Decode error: {0}")]
    Decode(#[from] crate::encoder::DecodeError),

    /// Field selected before any object selection
    #[error("Field selection at instruction {index} with no object selected")]
    FieldSelectWithoutObject {
        /// Index of the offending instruction
        index: u32,
    },

    /// Field load/save before the selector pair is complete
    #[error("Field I/O at instruction {index} with no {missing} selected")]
    FieldIoWithoutSelection {
        /// Index of the offending instruction
        index: u32,
        /// Which selector register was never written ("object" or "field")
        missing: &'static str,
    },

    /// Variable load/save before a variable selection
    #[error("Variable I/O at instruction {index} with no variable selected")]
    VarIoWithoutSelection {
        /// Index of the offending instruction
        index: u32,
    },

    /// A construction block must open with CreateObject directly followed
    /// by AddObject
    #[error("CreateObject at instruction {index} is not followed by AddObject")]
    MissingAddObject {
        /// Index of the CreateObject instruction
        index: u32,
    },

    /// AddObject that does not follow a CreateObject
    #[error("AddObject at instruction {index} does not follow CreateObject")]
    OrphanAddObject {
        /// Index of the offending instruction
        index: u32,
    },

    /// EndObject with no open construction block
    #[error("EndObject at instruction {index} with no open construction block")]
    UnbalancedEndObject {
        /// Index of the offending instruction
        index: u32,
    },

    /// Construction blocks left open at the end of the stream
    #[error("{count} construction block(s) never closed")]
    UnclosedConstruction {
        /// Number of blocks still open
        count: usize,
    },

    /// Patched end index does not land after its own block
    #[error(
        "AddObject at instruction {index} has end index {end_index}, \
         outside ({index}, {op_count}]"
    )]
    EndIndexOutOfRange {
        /// Index of the AddObject instruction
        index: u32,
        /// The patched end index
        end_index: u8,
        /// Total instructions in the stream
        op_count: u32,
    },

    /// A string operand does not resolve in the table
    #[error("Instruction {index} references string offset {offset}, which is unassigned")]
    UnresolvedString {
        /// Index of the offending instruction
        index: u32,
        /// The dangling offset
        offset: u16,
    },
}

/// Verify a compiled script's code stream against the emission protocol
pub fn verify_script(script: &CompiledScript) -> Result<(), VerifyError> {
    let instructions = disassemble(&script.code)?;
    let op_count = instructions.len() as u32;

    let mut have_object = false;
    let mut have_field = false;
    let mut have_var = false;
    let mut pending_create: Option<u32> = None;
    let mut open_blocks = 0usize;

    for instr in &instructions {
        check_string_refs(instr, script)?;

        // AddObject must directly follow CreateObject
        if let Some(create_index) = pending_create.take() {
            if instr.opcode != Opcode::AddObject {
                return Err(VerifyError::MissingAddObject {
                    index: create_index,
                });
            }
        } else if instr.opcode == Opcode::AddObject {
            return Err(VerifyError::OrphanAddObject { index: instr.index });
        }

        match instr.opcode {
            Opcode::SetCurObject | Opcode::SetCurObjectNew => {
                have_object = true;
                have_field = false;
            }
            Opcode::SetCurField | Opcode::SetCurFieldArray => {
                if !have_object {
                    return Err(VerifyError::FieldSelectWithoutObject { index: instr.index });
                }
                have_field = true;
            }
            op if op.is_field_io() => {
                if !have_object {
                    return Err(VerifyError::FieldIoWithoutSelection {
                        index: instr.index,
                        missing: "object",
                    });
                }
                if !have_field {
                    return Err(VerifyError::FieldIoWithoutSelection {
                        index: instr.index,
                        missing: "field",
                    });
                }
            }
            Opcode::SetCurVar => {
                have_var = true;
            }
            Opcode::LoadVarStr
            | Opcode::LoadVarUint
            | Opcode::LoadVarFlt
            | Opcode::SaveVarStr
            | Opcode::SaveVarUint
            | Opcode::SaveVarFlt => {
                if !have_var {
                    return Err(VerifyError::VarIoWithoutSelection { index: instr.index });
                }
            }
            Opcode::CreateObject => {
                pending_create = Some(instr.index);
            }
            Opcode::AddObject => {
                open_blocks += 1;
                if let Operand::EndIndex(end_index) = instr.operand {
                    if (end_index as u32) <= instr.index || (end_index as u32) > op_count {
                        return Err(VerifyError::EndIndexOutOfRange {
                            index: instr.index,
                            end_index,
                            op_count,
                        });
                    }
                }
            }
            Opcode::EndObject => {
                if open_blocks == 0 {
                    return Err(VerifyError::UnbalancedEndObject { index: instr.index });
                }
                open_blocks -= 1;
            }
            Opcode::Return => {
                have_object = false;
                have_field = false;
                have_var = false;
            }
            _ => {}
        }
    }

    if let Some(create_index) = pending_create {
        return Err(VerifyError::MissingAddObject {
            index: create_index,
        });
    }
    if open_blocks > 0 {
        return Err(VerifyError::UnclosedConstruction { count: open_blocks });
    }

    Ok(())
}

fn check_string_refs(instr: &Instr, script: &CompiledScript) -> Result<(), VerifyError> {
    match instr.operand {
        Operand::StringRef(offset) => {
            if script.strings.get(offset).is_none() {
                return Err(VerifyError::UnresolvedString {
                    index: instr.index,
                    offset,
                });
            }
        }
        Operand::Create { class, name, .. } => {
            if script.strings.get(class).is_none() {
                return Err(VerifyError::UnresolvedString {
                    index: instr.index,
                    offset: class,
                });
            }
            // Name offset 0 is the unnamed-object encoding
            if name != 0 && script.strings.get(name).is_none() {
                return Err(VerifyError::UnresolvedString {
                    index: instr.index,
                    offset: name,
                });
            }
        }
        _ => {}
    }
    Ok(())
}
