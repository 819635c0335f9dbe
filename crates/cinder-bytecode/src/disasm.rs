//! Disassembler
//!
//! Decodes a code stream back into structured instructions. This is the
//! independent reader used to check that emitted code round-trips to the
//! statement sequence that produced it, and it powers human-readable
//! listings of compiled scripts.

use crate::encoder::{CodeReader, DecodeError};
use crate::opcode::Opcode;
use crate::script::CompiledScript;
use std::fmt;

/// Decoded operand of a single instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// No operand
    None,
    /// 16-bit string table offset
    StringRef(u16),
    /// Unsigned integer immediate
    Uint(u32),
    /// Float immediate
    Flt(f32),
    /// Object creation block: class offset, name offset, datablock flag
    Create {
        /// String table offset of the class name
        class: u16,
        /// String table offset of the instance name (0 = unnamed)
        name: u16,
        /// Datablock flag
        datablock: bool,
    },
    /// Construction-scope end instruction index (patched byte)
    EndIndex(u8),
    /// Add-to-parent flag
    Flag(bool),
}

/// A decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    /// Zero-based instruction index
    pub index: u32,
    /// Byte offset of the opcode within the code stream
    pub offset: usize,
    /// Decoded opcode
    pub opcode: Opcode,
    /// Decoded operand
    pub operand: Operand,
}

/// Decode an entire code stream into instructions
pub fn disassemble(code: &[u8]) -> Result<Vec<Instr>, DecodeError> {
    let mut reader = CodeReader::new(code);
    let mut instructions = Vec::new();
    let mut index = 0u32;

    while reader.has_more() {
        let offset = reader.position();
        let opcode = reader.read_opcode()?;
        let operand = read_operand(&mut reader, opcode)?;
        instructions.push(Instr {
            index,
            offset,
            opcode,
            operand,
        });
        index += 1;
    }

    Ok(instructions)
}

fn read_operand(reader: &mut CodeReader<'_>, opcode: Opcode) -> Result<Operand, DecodeError> {
    let operand = match opcode {
        Opcode::LoadImmStr
        | Opcode::SetCurVar
        | Opcode::SetCurObject
        | Opcode::SetCurField
        | Opcode::SetCurFieldArray => Operand::StringRef(reader.read_u16()?),

        Opcode::LoadImmUint => Operand::Uint(reader.read_u32()?),
        Opcode::LoadImmFlt => Operand::Flt(reader.read_f32()?),

        Opcode::CreateObject => Operand::Create {
            class: reader.read_u16()?,
            name: reader.read_u16()?,
            datablock: reader.read_u8()? != 0,
        },
        Opcode::AddObject => Operand::EndIndex(reader.read_u8()?),
        Opcode::EndObject => Operand::Flag(reader.read_u8()? != 0),

        _ => Operand::None,
    };
    Ok(operand)
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:4}  {:04x}  {}", self.index, self.offset, self.opcode.name())?;
        match self.operand {
            Operand::None => Ok(()),
            Operand::StringRef(off) => write!(f, " str@{}", off),
            Operand::Uint(v) => write!(f, " {}", v),
            Operand::Flt(v) => write!(f, " {}", v),
            Operand::Create {
                class,
                name,
                datablock,
            } => write!(f, " class@{} name@{} datablock={}", class, name, datablock as u8),
            Operand::EndIndex(idx) => write!(f, " end={}", idx),
            Operand::Flag(flag) => write!(f, " flag={}", flag as u8),
        }
    }
}

/// Render a full listing of a compiled script, resolving string operands
pub fn listing(script: &CompiledScript) -> Result<String, DecodeError> {
    let mut out = String::new();
    for instr in disassemble(&script.code)? {
        out.push_str(&instr.to_string());
        match instr.operand {
            Operand::StringRef(off) => {
                if let Some(s) = script.strings.get(off) {
                    out.push_str(&format!("  ; {:?}", s));
                }
            }
            Operand::Create { class, name, .. } => {
                if let Some(s) = script.strings.get(class) {
                    out.push_str(&format!("  ; class {:?}", s));
                }
                if name != 0 {
                    if let Some(s) = script.strings.get(name) {
                        out.push_str(&format!(" name {:?}", s));
                    }
                }
            }
            _ => {}
        }
        out.push('\n');
    }
    Ok(out)
}
