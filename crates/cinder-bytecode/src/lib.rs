//! Cinder VM bytecode definitions
//!
//! This crate provides the wire format consumed by the Cinder script VM:
//! the instruction set, the byte-level writer and reader, the interned
//! string table, the compiled-script container, and the disassembler and
//! protocol verifier used to check emitted streams.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod disasm;
pub mod encoder;
pub mod opcode;
pub mod script;
pub mod strings;
pub mod verify;

pub use disasm::{disassemble, listing, Instr, Operand};
pub use encoder::{CodeReader, CodeWriter, DecodeError};
pub use opcode::Opcode;
pub use script::{CompiledScript, ScriptError, MAGIC, VERSION};
pub use strings::{StringTable, StringTableError};
pub use verify::{verify_script, VerifyError};
