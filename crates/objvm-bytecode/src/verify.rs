//! Structural verification of class chunks

use crate::chunk::ClassChunk;
use crate::encoder::DecodeError;
use crate::instruction::{decode_all, Instruction};
use crate::opcode::param_kind;

/// Bytecode verification errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Code could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Register outside the chunk's register file
    #[error("Invalid register r{register} (max {max}) at offset {offset}")]
    InvalidRegister {
        /// Offending register
        register: u16,
        /// Register file size
        max: u16,
        /// Instruction offset
        offset: usize,
    },

    /// Constant index outside the pool
    #[error("Invalid constant pool reference: index {index} at offset {offset}")]
    InvalidConstantRef {
        /// Offending index
        index: u32,
        /// Instruction offset
        offset: usize,
    },

    /// A name operand did not refer to a string constant
    #[error("Constant {index} at offset {offset} is not a string")]
    ExpectedString {
        /// Offending index
        index: u32,
        /// Instruction offset
        offset: usize,
    },

    /// Unknown parameter descriptor kind
    #[error("Invalid parameter kind {kind} at offset {offset}")]
    InvalidParamKind {
        /// Offending kind byte
        kind: u8,
        /// Instruction offset
        offset: usize,
    },

    /// Parameter descriptor needs an operand it was not given
    #[error("Parameter kind {kind} at offset {offset} requires an operand")]
    MissingOperand {
        /// Kind byte
        kind: u8,
        /// Instruction offset
        offset: usize,
    },

    /// Parameter slot can never exist (arity is a single byte)
    #[error("Parameter slot {slot} out of range at offset {offset}")]
    InvalidSlot {
        /// Offending slot
        slot: u8,
        /// Instruction offset
        offset: usize,
    },

    /// Execution falls off end
    #[error("Execution falls off end of chunk at offset {0}")]
    FallOffEnd(usize),
}

/// Verify a chunk and return its decoded instructions
pub fn verify_chunk(chunk: &ClassChunk) -> Result<Vec<(usize, Instruction)>, VerifyError> {
    let instructions = decode_all(&chunk.code)?;

    for &(offset, insn) in &instructions {
        for register in insn.registers() {
            if register >= chunk.register_count {
                return Err(VerifyError::InvalidRegister {
                    register,
                    max: chunk.register_count,
                    offset,
                });
            }
        }
        verify_operands(chunk, offset, insn)?;
    }

    match instructions.last() {
        Some((_, last)) if last.opcode().is_terminator() => Ok(instructions),
        Some(&(offset, _)) => Err(VerifyError::FallOffEnd(offset)),
        None => Err(VerifyError::FallOffEnd(0)),
    }
}

fn verify_operands(chunk: &ClassChunk, offset: usize, insn: Instruction) -> Result<(), VerifyError> {
    let string_ref = |index: u32| -> Result<(), VerifyError> {
        match chunk.constants.get(index) {
            None => Err(VerifyError::InvalidConstantRef { index, offset }),
            Some(c) if c.as_str().is_none() => Err(VerifyError::ExpectedString { index, offset }),
            Some(_) => Ok(()),
        }
    };

    match insn {
        Instruction::LoadConst { index, .. } => {
            if chunk.constants.get(index).is_none() {
                return Err(VerifyError::InvalidConstantRef { index, offset });
            }
        }
        Instruction::DefClass { name: Some(name), .. } => string_ref(name)?,
        Instruction::DefField { name, .. } | Instruction::DefMethod { name, .. } => {
            string_ref(name)?
        }
        Instruction::DefMethodArgType {
            slot,
            kind,
            operand,
            ..
        } => {
            if slot == u8::MAX {
                return Err(VerifyError::InvalidSlot { slot, offset });
            }
            if !param_kind::is_valid(kind) {
                return Err(VerifyError::InvalidParamKind { kind, offset });
            }
            match (kind, operand) {
                (param_kind::TYPE_NAME, Some(index)) => string_ref(index)?,
                (param_kind::CLASS, Some(register)) => {
                    if register >= chunk.register_count as u32 {
                        return Err(VerifyError::InvalidRegister {
                            register: register.min(u16::MAX as u32) as u16,
                            max: chunk.register_count,
                            offset,
                        });
                    }
                }
                (param_kind::TYPE_NAME | param_kind::CLASS, None) => {
                    return Err(VerifyError::MissingOperand { kind, offset });
                }
                _ => {}
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BytecodeWriter;
    use crate::opcode::{NO_INDEX, NO_REG};

    fn chunk_with(registers: u16, build: impl FnOnce(&mut ClassChunk, &mut BytecodeWriter)) -> ClassChunk {
        let mut chunk = ClassChunk::new("test", registers);
        let mut writer = BytecodeWriter::new();
        build(&mut chunk, &mut writer);
        chunk.code = writer.into_bytes();
        chunk
    }

    #[test]
    fn test_valid_chunk() {
        let chunk = chunk_with(2, |c, w| {
            let name = c.constants.add_string("Point");
            w.emit_def_class(0, name, NO_REG);
            w.emit_check_abstract(0);
            w.emit_return(0);
        });
        assert_eq!(verify_chunk(&chunk).unwrap().len(), 3);
    }

    #[test]
    fn test_register_out_of_range() {
        let chunk = chunk_with(1, |_, w| {
            w.emit_load_nil(4);
            w.emit_return(0);
        });
        assert_eq!(
            verify_chunk(&chunk),
            Err(VerifyError::InvalidRegister {
                register: 4,
                max: 1,
                offset: 0
            })
        );
    }

    #[test]
    fn test_name_must_be_string() {
        let chunk = chunk_with(1, |c, w| {
            let n = c.constants.add_int(7);
            w.emit_def_class(0, n, NO_REG);
            w.emit_return(0);
        });
        assert!(matches!(
            verify_chunk(&chunk),
            Err(VerifyError::ExpectedString { index: 0, .. })
        ));
    }

    #[test]
    fn test_param_kind_checks() {
        let chunk = chunk_with(1, |_, w| {
            w.emit_def_method_arg_type(0, 0, 3, NO_INDEX);
            w.emit_return(0);
        });
        assert!(matches!(
            verify_chunk(&chunk),
            Err(VerifyError::InvalidParamKind { kind: 3, .. })
        ));

        let chunk = chunk_with(1, |_, w| {
            w.emit_def_method_arg_type(0, 0, param_kind::TYPE_NAME, NO_INDEX);
            w.emit_return(0);
        });
        assert!(matches!(
            verify_chunk(&chunk),
            Err(VerifyError::MissingOperand { .. })
        ));
    }

    #[test]
    fn test_falls_off_end() {
        let chunk = chunk_with(1, |_, w| w.emit_load_nil(0));
        assert_eq!(verify_chunk(&chunk), Err(VerifyError::FallOffEnd(0)));

        let empty = chunk_with(1, |_, _| {});
        assert_eq!(verify_chunk(&empty), Err(VerifyError::FallOffEnd(0)));
    }
}
