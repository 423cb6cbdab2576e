//! Integration tests for the class-definition bytecode
//!
//! Tests cover:
//! - Assembling a class body and decoding it back
//! - Chunk serialization and corruption detection
//! - Verifier rejections

use objvm_bytecode::{
    decode_all, param_kind, verify_chunk, BytecodeWriter, ChunkError, ClassChunk, Constant,
    DecodeError, Instruction, Opcode, VerifyError, NO_INDEX, NO_REG,
};

/// class Point { x = 0; Point(x: number) {} }
fn point_chunk() -> ClassChunk {
    let mut chunk = ClassChunk::new("point", 4);
    let point = chunk.constants.add_string("Point");
    let x = chunk.constants.add_string("x");
    let zero = chunk.constants.add_int(0);
    let number = chunk.constants.add_string("number");

    let mut w = BytecodeWriter::new();
    w.emit_def_class(0, point, NO_REG);
    w.emit_load_const(1, zero);
    w.emit_def_field(0, x, 1, 0x1);
    w.emit_load_function(2, 0);
    w.emit_def_method(3, 0, point, 2, 0x1 | 0x40, 1);
    w.emit_def_method_arg_type(3, 0, param_kind::TYPE_NAME, number);
    w.emit_check_member_conflict(0, 3);
    w.emit_check_abstract(0);
    w.emit_return(0);
    chunk.code = w.into_bytes();
    chunk
}

#[test]
fn test_class_body_decodes_in_order() {
    let chunk = point_chunk();
    let opcodes: Vec<_> = verify_chunk(&chunk)
        .unwrap()
        .into_iter()
        .map(|(_, insn)| insn.opcode())
        .collect();
    assert_eq!(
        opcodes,
        [
            Opcode::DefClass,
            Opcode::LoadConst,
            Opcode::DefField,
            Opcode::LoadFunction,
            Opcode::DefMethod,
            Opcode::DefMethodArgType,
            Opcode::CheckMemberConflict,
            Opcode::CheckAbstract,
            Opcode::Return,
        ]
    );
}

#[test]
fn test_offsets_follow_operand_sizes() {
    let chunk = point_chunk();
    let decoded = decode_all(&chunk.code).unwrap();
    for pair in decoded.windows(2) {
        let (offset, insn) = pair[0];
        assert_eq!(pair[1].0, offset + 1 + insn.opcode().operand_size());
    }
}

#[test]
fn test_optional_operands_decode_as_none() {
    let mut w = BytecodeWriter::new();
    w.emit_def_class(0, NO_INDEX, NO_REG);
    w.emit_def_method(1, 0, 0, NO_REG, 0x21, 0);
    let decoded = decode_all(w.buffer()).unwrap();
    assert_eq!(
        decoded[0].1,
        Instruction::DefClass {
            dst: 0,
            name: None,
            super_reg: None
        }
    );
    assert!(matches!(decoded[1].1, Instruction::DefMethod { function: None, .. }));
}

#[test]
fn test_serialized_chunk_survives_and_detects_corruption() {
    let chunk = point_chunk();
    let bytes = chunk.encode();
    let decoded = ClassChunk::decode(&bytes).unwrap();
    assert_eq!(decoded, chunk);
    assert_eq!(decoded.constants.get(2), Some(&Constant::Int(0)));

    let mut corrupted = bytes.clone();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0x55;
    assert!(matches!(
        ClassChunk::decode(&corrupted),
        Err(ChunkError::ChecksumMismatch { .. })
    ));

    let mut wrong_magic = bytes;
    wrong_magic[0] = b'X';
    assert!(matches!(
        ClassChunk::decode(&wrong_magic),
        Err(ChunkError::InvalidMagic(_))
    ));
}

#[test]
fn test_verifier_rejections() {
    let mut chunk = ClassChunk::new("bad", 2);
    let name = chunk.constants.add_string("f");
    let answer = chunk.constants.add_int(42);

    let mut w = BytecodeWriter::new();
    w.emit_def_class(5, NO_INDEX, NO_REG);
    w.emit_return(0);
    chunk.code = w.into_bytes();
    assert!(matches!(
        verify_chunk(&chunk),
        Err(VerifyError::InvalidRegister { register: 5, max: 2, .. })
    ));

    let mut w = BytecodeWriter::new();
    w.emit_def_field(0, answer, NO_REG, 0x1);
    w.emit_return(0);
    chunk.code = w.into_bytes();
    assert!(matches!(
        verify_chunk(&chunk),
        Err(VerifyError::ExpectedString { .. })
    ));

    let mut w = BytecodeWriter::new();
    w.emit_def_method_arg_type(0, 0, 3, NO_INDEX);
    w.emit_return(0);
    chunk.code = w.into_bytes();
    assert!(matches!(
        verify_chunk(&chunk),
        Err(VerifyError::InvalidParamKind { kind: 3, .. })
    ));

    let mut w = BytecodeWriter::new();
    w.emit_def_method_arg_type(0, 0, param_kind::CLASS, NO_INDEX);
    w.emit_return(0);
    chunk.code = w.into_bytes();
    assert!(matches!(
        verify_chunk(&chunk),
        Err(VerifyError::MissingOperand { .. })
    ));

    let mut w = BytecodeWriter::new();
    w.emit_def_method(1, 0, name, NO_REG, 0x21, 0);
    chunk.code = w.into_bytes();
    assert!(matches!(verify_chunk(&chunk), Err(VerifyError::FallOffEnd(0))));

    chunk.code = vec![0xEE];
    assert!(matches!(
        verify_chunk(&chunk),
        Err(VerifyError::Decode(DecodeError::InvalidOpcode(0xEE, 0)))
    ));
}
