//! Class-definition bytecode
//!
//! This crate provides the fixed instruction set the compiler emits for class
//! bodies, its binary encoding, the chunk container and a structural verifier.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chunk;
pub mod constants;
pub mod encoder;
pub mod instruction;
pub mod opcode;
pub mod verify;

pub use chunk::{ChunkError, ClassChunk};
pub use constants::{Constant, ConstantPool};
pub use encoder::{BytecodeReader, BytecodeWriter, DecodeError};
pub use instruction::{decode_all, Instruction};
pub use opcode::{param_kind, Opcode, NO_INDEX, NO_REG};
pub use verify::{verify_chunk, VerifyError};
