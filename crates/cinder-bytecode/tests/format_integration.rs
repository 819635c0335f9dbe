//! Integration tests for the compiled-script container format

use cinder_bytecode::{
    disassemble, listing, verify_script, CodeWriter, CompiledScript, Opcode, ScriptError,
    StringTable,
};

fn build_assignment_script() -> CompiledScript {
    let mut script = CompiledScript::new();
    let obj = script.strings.intern("myobject").unwrap();
    let field = script.strings.intern("name").unwrap();
    let value = script.strings.intern("TestObject").unwrap();

    let mut writer = CodeWriter::new();
    writer.emit_opcode(Opcode::SetCurObject);
    writer.emit_u16(obj);
    writer.emit_opcode(Opcode::SetCurField);
    writer.emit_u16(field);
    writer.emit_opcode(Opcode::LoadImmStr);
    writer.emit_u16(value);
    writer.emit_opcode(Opcode::SaveFieldStr);
    writer.emit_opcode(Opcode::Return);
    script.code = writer.into_bytes();
    script
}

#[test]
fn test_encode_and_decode_script() {
    let script = build_assignment_script();
    let bytes = script.encode();
    assert!(bytes.len() > 16);

    let decoded = CompiledScript::decode(&bytes).unwrap();
    assert_eq!(decoded.code, script.code);
    assert_eq!(decoded.strings.len(), 3);
    assert_eq!(decoded.strings.get(0), Some("myobject"));
    assert_eq!(decoded.strings.get(9), Some("name"));
    assert_eq!(decoded.strings.get(14), Some("TestObject"));
}

#[test]
fn test_decoded_script_passes_verification() {
    let bytes = build_assignment_script().encode();
    let decoded = CompiledScript::decode(&bytes).unwrap();
    verify_script(&decoded).unwrap();
}

#[test]
fn test_decoded_table_preserves_offsets() {
    let mut script = CompiledScript::new();
    let offsets: Vec<u16> = ["alpha", "beta", "gamma", "alpha"]
        .iter()
        .map(|s| script.strings.intern(s).unwrap())
        .collect();
    // Duplicate intern reused the first offset
    assert_eq!(offsets[0], offsets[3]);

    let decoded = CompiledScript::decode(&script.encode()).unwrap();
    for (offset, value) in script.strings.iter() {
        assert_eq!(decoded.strings.get(offset), Some(value));
    }
}

#[test]
fn test_corrupted_payload_rejected() {
    let mut bytes = build_assignment_script().encode();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x55;
    assert!(matches!(
        CompiledScript::decode(&bytes),
        Err(ScriptError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_disassemble_decoded_code() {
    let bytes = build_assignment_script().encode();
    let decoded = CompiledScript::decode(&bytes).unwrap();

    let instrs = disassemble(&decoded.code).unwrap();
    assert_eq!(instrs.len(), 5);
    assert_eq!(instrs[0].opcode, Opcode::SetCurObject);
    assert_eq!(instrs[4].opcode, Opcode::Return);
}

#[test]
fn test_listing_of_decoded_script() {
    let bytes = build_assignment_script().encode();
    let decoded = CompiledScript::decode(&bytes).unwrap();

    let text = listing(&decoded).unwrap();
    assert!(text.contains("SET_CUR_OBJECT"));
    assert!(text.contains("\"myobject\""));
    assert!(text.contains("SAVE_FIELD_STR"));
}

#[test]
fn test_write_to_file() {
    let script = build_assignment_script();
    let path = std::env::temp_dir().join("cinder_format_integration.csb");

    script.write_to(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let decoded = CompiledScript::decode(&bytes).unwrap();
    assert_eq!(decoded.code, script.code);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_large_code_section() {
    let mut script = CompiledScript::new();
    let obj = script.strings.intern("hud").unwrap();

    let mut writer = CodeWriter::new();
    for _ in 0..500 {
        writer.emit_opcode(Opcode::SetCurObject);
        writer.emit_u16(obj);
    }
    writer.emit_opcode(Opcode::Return);
    script.code = writer.into_bytes();

    let decoded = CompiledScript::decode(&script.encode()).unwrap();
    assert_eq!(decoded.code.len(), 500 * 3 + 1);
}

#[test]
fn test_standalone_table_capacity() {
    let mut table = StringTable::new();
    // A single entry close to the full 16-bit range still fits
    let big = "x".repeat(60_000);
    let offset = table.intern(&big).unwrap();
    assert_eq!(offset, 0);

    // The next entry starts past 60_000 and still gets a valid offset
    let second = table.intern("tail").unwrap();
    assert_eq!(second, 60_001);
}
