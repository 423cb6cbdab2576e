//! Class chunk format
//!
//! A chunk carries the definition code of one compilation unit: a constant
//! pool, the number of registers the code uses, and the encoded instructions.

use crate::constants::ConstantPool;
use crate::encoder::{BytecodeReader, BytecodeWriter, DecodeError};
use thiserror::Error;

/// Magic number for class chunks: "OBJC"
pub const MAGIC: [u8; 4] = *b"OBJC";

/// Current chunk format version
pub const VERSION: u32 = 1;

const HEADER_LEN: usize = 12;

/// Chunk encoding/decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// Decode error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected OBJC, got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {VERSION})")]
    UnsupportedVersion(u32),

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        expected: u32,
        /// Checksum of the payload as read
        actual: u32,
    },
}

/// A compiled unit of class-definition code
#[derive(Debug, Clone, PartialEq)]
pub struct ClassChunk {
    /// Unit name, used in diagnostics
    pub name: String,
    /// Size of the register file the code addresses
    pub register_count: u16,
    /// Constant pool
    pub constants: ConstantPool,
    /// Encoded instructions
    pub code: Vec<u8>,
}

impl ClassChunk {
    /// Create an empty chunk
    pub fn new(name: impl Into<String>, register_count: u16) -> Self {
        Self {
            name: name.into(),
            register_count,
            constants: ConstantPool::new(),
            code: Vec::new(),
        }
    }

    /// CRC32 of the encoded payload (everything after the header)
    pub fn checksum(&self) -> u32 {
        let mut writer = BytecodeWriter::new();
        self.encode_payload(&mut writer);
        crc32fast::hash(writer.buffer())
    }

    fn encode_payload(&self, writer: &mut BytecodeWriter) {
        writer.emit_string(&self.name);
        writer.emit_u16(self.register_count);
        self.constants.encode(writer);
        writer.emit_u32(self.code.len() as u32);
        writer.emit_bytes(&self.code);
    }

    /// Encode the chunk
    ///
    /// Format:
    /// - Header: magic (4 bytes) + version (u32) + checksum (u32)
    /// - Name, register count
    /// - Constant pool
    /// - Code section
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BytecodeWriter::new();
        writer.emit_bytes(&MAGIC);
        writer.emit_u32(VERSION);
        let checksum_offset = writer.offset();
        writer.emit_u32(0);

        self.encode_payload(&mut writer);

        let checksum = crc32fast::hash(&writer.buffer()[HEADER_LEN..]);
        writer.patch_u32(checksum_offset, checksum);
        writer.into_bytes()
    }

    /// Decode a chunk, verifying magic, version and checksum
    pub fn decode(data: &[u8]) -> Result<Self, ChunkError> {
        let mut reader = BytecodeReader::new(data);

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&reader.read_bytes(4)?);
        if magic != MAGIC {
            return Err(ChunkError::InvalidMagic(magic));
        }

        let version = reader.read_u32()?;
        if version != VERSION {
            return Err(ChunkError::UnsupportedVersion(version));
        }

        let expected = reader.read_u32()?;
        let actual = crc32fast::hash(&data[HEADER_LEN..]);
        if expected != actual {
            return Err(ChunkError::ChecksumMismatch { expected, actual });
        }

        let name = reader.read_string()?;
        let register_count = reader.read_u16()?;
        let constants = ConstantPool::decode(&mut reader)?;
        let code_len = reader.read_u32()? as usize;
        let code = reader.read_bytes(code_len)?;

        Ok(Self {
            name,
            register_count,
            constants,
            code,
        })
    }
}
