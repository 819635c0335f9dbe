//! Bytecode opcodes for the Cinder script VM
//!
//! This module defines the instruction set emitted by the code generator.
//! All opcodes are single-byte tags; the operands that follow each tag have
//! a fixed width that never varies per call site.

/// Bytecode opcode enumeration
///
/// Opcodes are organized into categories:
/// - 0x10-0x1F: Immediate constants
/// - 0x20-0x2F: Variable access (current-variable register)
/// - 0x30-0x3F: Selector registers (current object / current field)
/// - 0x40-0x4F: Typed field I/O
/// - 0x50-0x5F: Object construction
/// - 0x60-0x6F: Control
///
/// Multi-byte operands are big-endian on the wire. String-valued operands
/// are 16-bit offsets into the script's string table.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ===== Immediate Constants (0x10-0x1F) =====
    /// Push string constant (operand: u16 string table offset)
    LoadImmStr = 0x10,
    /// Push unsigned integer constant (operand: u32)
    LoadImmUint = 0x11,
    /// Push float constant (operand: f32)
    LoadImmFlt = 0x12,

    // ===== Variable Access (0x20-0x2F) =====
    /// Select the current variable by name (operand: u16 string table offset)
    SetCurVar = 0x20,
    /// Push the current variable's value as a string
    LoadVarStr = 0x21,
    /// Push the current variable's value as an unsigned integer
    LoadVarUint = 0x22,
    /// Push the current variable's value as a float
    LoadVarFlt = 0x23,
    /// Pop a string into the current variable
    SaveVarStr = 0x24,
    /// Pop an unsigned integer into the current variable
    SaveVarUint = 0x25,
    /// Pop a float into the current variable
    SaveVarFlt = 0x26,

    // ===== Selector Registers (0x30-0x3F) =====
    /// Select the current object by name (operand: u16 string table offset)
    SetCurObject = 0x30,
    /// Select the most recently created object
    SetCurObjectNew = 0x31,
    /// Select the current field by name (operand: u16 string table offset)
    SetCurField = 0x32,
    /// Select an indexed field: pops the index from the stack
    /// (operand: u16 string table offset)
    SetCurFieldArray = 0x33,

    // ===== Typed Field I/O (0x40-0x4F) =====
    /// Push the current field's value as a string
    LoadFieldStr = 0x40,
    /// Push the current field's value as an unsigned integer
    LoadFieldUint = 0x41,
    /// Push the current field's value as a float
    LoadFieldFlt = 0x42,
    /// Pop a string into the current field
    SaveFieldStr = 0x43,
    /// Pop an unsigned integer into the current field
    SaveFieldUint = 0x44,
    /// Pop a float into the current field
    SaveFieldFlt = 0x45,

    // ===== Object Construction (0x50-0x5F) =====
    /// Create an object (operands: u16 class offset, u16 name offset,
    /// u8 datablock flag; name offset 0 means unnamed)
    CreateObject = 0x50,
    /// Open the construction block of the object just created
    /// (operand: u8 end instruction index, written by backpatch)
    AddObject = 0x51,
    /// Close a construction block (operand: u8 add-to-parent flag)
    EndObject = 0x52,

    // ===== Control (0x60-0x6F) =====
    /// Return from the compilation unit
    Return = 0x60,
}

impl Opcode {
    /// Convert byte to opcode
    ///
    /// Returns None if the byte does not correspond to a valid opcode.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            // Immediate constants
            0x10 => Some(Self::LoadImmStr),
            0x11 => Some(Self::LoadImmUint),
            0x12 => Some(Self::LoadImmFlt),

            // Variable access
            0x20 => Some(Self::SetCurVar),
            0x21 => Some(Self::LoadVarStr),
            0x22 => Some(Self::LoadVarUint),
            0x23 => Some(Self::LoadVarFlt),
            0x24 => Some(Self::SaveVarStr),
            0x25 => Some(Self::SaveVarUint),
            0x26 => Some(Self::SaveVarFlt),

            // Selector registers
            0x30 => Some(Self::SetCurObject),
            0x31 => Some(Self::SetCurObjectNew),
            0x32 => Some(Self::SetCurField),
            0x33 => Some(Self::SetCurFieldArray),

            // Typed field I/O
            0x40 => Some(Self::LoadFieldStr),
            0x41 => Some(Self::LoadFieldUint),
            0x42 => Some(Self::LoadFieldFlt),
            0x43 => Some(Self::SaveFieldStr),
            0x44 => Some(Self::SaveFieldUint),
            0x45 => Some(Self::SaveFieldFlt),

            // Object construction
            0x50 => Some(Self::CreateObject),
            0x51 => Some(Self::AddObject),
            0x52 => Some(Self::EndObject),

            // Control
            0x60 => Some(Self::Return),

            // Invalid opcodes
            _ => None,
        }
    }

    /// Convert opcode to byte
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Get the human-readable name of the opcode
    pub fn name(self) -> &'static str {
        match self {
            Self::LoadImmStr => "LOAD_IMM_STR",
            Self::LoadImmUint => "LOAD_IMM_UINT",
            Self::LoadImmFlt => "LOAD_IMM_FLT",
            Self::SetCurVar => "SET_CUR_VAR",
            Self::LoadVarStr => "LOAD_VAR_STR",
            Self::LoadVarUint => "LOAD_VAR_UINT",
            Self::LoadVarFlt => "LOAD_VAR_FLT",
            Self::SaveVarStr => "SAVE_VAR_STR",
            Self::SaveVarUint => "SAVE_VAR_UINT",
            Self::SaveVarFlt => "SAVE_VAR_FLT",
            Self::SetCurObject => "SET_CUR_OBJECT",
            Self::SetCurObjectNew => "SET_CUR_OBJECT_NEW",
            Self::SetCurField => "SET_CUR_FIELD",
            Self::SetCurFieldArray => "SET_CUR_FIELD_ARRAY",
            Self::LoadFieldStr => "LOAD_FIELD_STR",
            Self::LoadFieldUint => "LOAD_FIELD_UINT",
            Self::LoadFieldFlt => "LOAD_FIELD_FLT",
            Self::SaveFieldStr => "SAVE_FIELD_STR",
            Self::SaveFieldUint => "SAVE_FIELD_UINT",
            Self::SaveFieldFlt => "SAVE_FIELD_FLT",
            Self::CreateObject => "CREATE_OBJECT",
            Self::AddObject => "ADD_OBJECT",
            Self::EndObject => "END_OBJECT",
            Self::Return => "RETURN",
        }
    }

    /// Get the operand size for this opcode (in bytes)
    pub fn operand_size(self) -> usize {
        match self {
            // No operands
            Self::LoadVarStr
            | Self::LoadVarUint
            | Self::LoadVarFlt
            | Self::SaveVarStr
            | Self::SaveVarUint
            | Self::SaveVarFlt
            | Self::SetCurObjectNew
            | Self::LoadFieldStr
            | Self::LoadFieldUint
            | Self::LoadFieldFlt
            | Self::SaveFieldStr
            | Self::SaveFieldUint
            | Self::SaveFieldFlt
            | Self::Return => 0,

            // Single flag or patched index byte
            Self::AddObject | Self::EndObject => 1,

            // 2-byte operands (u16 string table offset)
            Self::LoadImmStr
            | Self::SetCurVar
            | Self::SetCurObject
            | Self::SetCurField
            | Self::SetCurFieldArray => 2,

            // 4-byte operands
            Self::LoadImmUint | Self::LoadImmFlt => 4,

            // class offset + name offset + datablock flag
            Self::CreateObject => 5,
        }
    }

    /// Check if this opcode writes a selector register
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            Self::SetCurObject | Self::SetCurObjectNew | Self::SetCurField | Self::SetCurFieldArray
        )
    }

    /// Check if this opcode reads or writes the current field
    pub fn is_field_io(self) -> bool {
        matches!(
            self,
            Self::LoadFieldStr
                | Self::LoadFieldUint
                | Self::LoadFieldFlt
                | Self::SaveFieldStr
                | Self::SaveFieldUint
                | Self::SaveFieldFlt
        )
    }

    /// Check if this opcode is part of the construction protocol
    pub fn is_construction(self) -> bool {
        matches!(self, Self::CreateObject | Self::AddObject | Self::EndObject)
    }

    /// Check if this opcode carries a u16 string table offset operand
    pub fn has_string_operand(self) -> bool {
        matches!(
            self,
            Self::LoadImmStr
                | Self::SetCurVar
                | Self::SetCurObject
                | Self::SetCurField
                | Self::SetCurFieldArray
        )
    }
}
