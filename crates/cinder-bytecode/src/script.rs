//! Compiled script container format
//!
//! A compiled script is the unit handed to the VM: one header, the string
//! table section, and the code section, serialized as a single buffer.

use crate::encoder::{CodeReader, CodeWriter, DecodeError};
use crate::strings::{StringTable, StringTableDecodeError};
use std::path::Path;
use thiserror::Error;

/// Magic number for compiled script files: "CSBC"
pub const MAGIC: [u8; 4] = *b"CSBC";

/// Current container version
pub const VERSION: u32 = 1;

/// Container encoding/decoding errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Decode error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// String table section error
    #[error("String table error: {0}")]
    Strings(#[from] StringTableDecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected CSBC, got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {VERSION})")]
    UnsupportedVersion(u32),

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        expected: u32,
        /// Checksum computed over the payload
        actual: u32,
    },

    /// IO failure while writing the serialized script
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A compiled script: string table plus code, ready for the VM
#[derive(Debug, Clone, Default)]
pub struct CompiledScript {
    /// Container flags (reserved)
    pub flags: u32,
    /// Interned string constants
    pub strings: StringTable,
    /// Emitted code stream
    pub code: Vec<u8>,
}

impl CompiledScript {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the script to its binary container format
    ///
    /// Layout:
    /// - Header: magic (4 bytes) + version (u32) + flags (u32) + checksum (u32)
    /// - String table section: u32 length + NUL-terminated entries
    /// - Code section: u32 length + code bytes
    ///
    /// All integers are big-endian. The checksum is a CRC32 of everything
    /// after the header.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = CodeWriter::with_capacity(
            16 + 8 + self.strings.data().len() + self.code.len(),
        );

        writer.buffer.extend_from_slice(&MAGIC);
        writer.emit_u32(VERSION);
        writer.emit_u32(self.flags);
        let checksum_offset = writer.offset();
        writer.emit_u32(0); // patched below

        writer.emit_u32(self.strings.data().len() as u32);
        writer.buffer.extend_from_slice(self.strings.data());

        writer.emit_u32(self.code.len() as u32);
        writer.buffer.extend_from_slice(&self.code);

        let checksum = crc32fast::hash(&writer.buffer()[16..]);
        let bytes = checksum.to_be_bytes();
        for (i, b) in bytes.iter().enumerate() {
            writer.patch_u8(checksum_offset + i, *b);
        }

        writer.into_bytes()
    }

    /// Decode a script from its binary container format
    pub fn decode(data: &[u8]) -> Result<Self, ScriptError> {
        let mut reader = CodeReader::new(data);

        let magic = reader.read_bytes(4)?;
        let magic: [u8; 4] = magic.try_into().unwrap();
        if magic != MAGIC {
            return Err(ScriptError::InvalidMagic(magic));
        }

        let version = reader.read_u32()?;
        if version != VERSION {
            return Err(ScriptError::UnsupportedVersion(version));
        }

        let flags = reader.read_u32()?;
        let stored_checksum = reader.read_u32()?;

        let actual = crc32fast::hash(&data[16..]);
        if stored_checksum != actual {
            return Err(ScriptError::ChecksumMismatch {
                expected: stored_checksum,
                actual,
            });
        }

        let strings_len = reader.read_u32()? as usize;
        let strings_data = reader.read_bytes(strings_len)?;
        let strings = StringTable::from_data(&strings_data)?;

        let code_len = reader.read_u32()? as usize;
        let code = reader.read_bytes(code_len)?;

        Ok(Self {
            flags,
            strings,
            code,
        })
    }

    /// Serialize the script to a file in one scoped write
    ///
    /// There is no partial-write recovery: on failure the caller is
    /// expected to discard the output path.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ScriptError> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    fn sample_script() -> CompiledScript {
        let mut script = CompiledScript::new();
        let obj = script.strings.intern("myobject").unwrap();
        let field = script.strings.intern("name").unwrap();

        let mut writer = CodeWriter::new();
        writer.emit_opcode(Opcode::SetCurObject);
        writer.emit_u16(obj);
        writer.emit_opcode(Opcode::SetCurField);
        writer.emit_u16(field);
        writer.emit_opcode(Opcode::Return);
        script.code = writer.into_bytes();
        script
    }

    #[test]
    fn test_empty_script_roundtrip() {
        let script = CompiledScript::new();
        let bytes = script.encode();
        let decoded = CompiledScript::decode(&bytes).unwrap();

        assert_eq!(decoded.flags, 0);
        assert!(decoded.strings.is_empty());
        assert!(decoded.code.is_empty());
    }

    #[test]
    fn test_script_roundtrip() {
        let script = sample_script();
        let bytes = script.encode();
        let decoded = CompiledScript::decode(&bytes).unwrap();

        assert_eq!(decoded.code, script.code);
        assert_eq!(decoded.strings.len(), 2);
        assert_eq!(decoded.strings.get(0), Some("myobject"));
    }

    #[test]
    fn test_checksum_validation() {
        let script = sample_script();
        let mut bytes = script.encode();

        // Corrupt a payload byte
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let result = CompiledScript::decode(&bytes);
        assert!(matches!(result, Err(ScriptError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = sample_script().encode();
        bytes[0] = b'X';
        let result = CompiledScript::decode(&bytes);
        assert!(matches!(result, Err(ScriptError::InvalidMagic(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let script = CompiledScript::new();
        let mut bytes = script.encode();
        // Version field is bytes 4..8, big-endian
        bytes[4..8].copy_from_slice(&999u32.to_be_bytes());
        // Recompute checksum so only the version check can fail
        let checksum = crc32fast::hash(&bytes[16..]);
        bytes[12..16].copy_from_slice(&checksum.to_be_bytes());

        let result = CompiledScript::decode(&bytes);
        assert!(matches!(result, Err(ScriptError::UnsupportedVersion(999))));
    }

    #[test]
    fn test_truncated_container() {
        let bytes = sample_script().encode();
        let result = CompiledScript::decode(&bytes[..10]);
        assert!(matches!(result, Err(ScriptError::Decode(_))));
    }
}
