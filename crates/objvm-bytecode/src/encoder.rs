//! Bytecode encoding and decoding utilities
//!
//! This module provides tools for encoding and decoding class-definition
//! instructions.

use crate::opcode::Opcode;
use thiserror::Error;

/// Errors that can occur during bytecode decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Unexpected end of bytecode stream
    #[error("Unexpected end of bytecode at offset {0}")]
    UnexpectedEnd(usize),

    /// Invalid UTF-8 string
    #[error("Invalid UTF-8 string at offset {0}")]
    InvalidUtf8(usize),

    /// Invalid opcode
    #[error("Invalid opcode {0} at offset {1}")]
    InvalidOpcode(u8, usize),

    /// Invalid constant tag
    #[error("Invalid constant tag {0} at offset {1}")]
    InvalidConstantTag(u8, usize),
}

/// Bytecode writer for encoding instructions
///
/// Provides methods for emitting opcodes and their operands into a binary buffer.
pub struct BytecodeWriter {
    pub(crate) buffer: Vec<u8>,
}

impl BytecodeWriter {
    /// Create a new bytecode writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new bytecode writer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Get the current bytecode buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return the bytecode buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get the current offset (length of bytecode)
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    // ===== Basic Emission =====

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit unsigned integer (little-endian)
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit unsigned integer (little-endian)
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 64-bit signed integer (little-endian)
    pub fn emit_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 64-bit float (little-endian)
    pub fn emit_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a length-prefixed UTF-8 string
    pub fn emit_string(&mut self, value: &str) {
        self.emit_u32(value.len() as u32);
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Emit raw bytes without a length prefix
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit an opcode without operands
    pub fn emit_opcode(&mut self, opcode: Opcode) {
        self.emit_u8(opcode.to_u8());
    }

    // ===== Register Loads =====

    /// Emit NOP instruction
    pub fn emit_nop(&mut self) {
        self.emit_opcode(Opcode::Nop);
    }

    /// Emit LOADNIL instruction
    pub fn emit_load_nil(&mut self, dst: u16) {
        self.emit_opcode(Opcode::LoadNil);
        self.emit_u16(dst);
    }

    /// Emit LOADK instruction with constant pool index
    pub fn emit_load_const(&mut self, dst: u16, index: u32) {
        self.emit_opcode(Opcode::LoadConst);
        self.emit_u16(dst);
        self.emit_u32(index);
    }

    /// Emit LOADFN instruction with a host function table index
    pub fn emit_load_function(&mut self, dst: u16, index: u32) {
        self.emit_opcode(Opcode::LoadFunction);
        self.emit_u16(dst);
        self.emit_u32(index);
    }

    // ===== Definition =====

    /// Emit DEFCLASS instruction
    ///
    /// `name` is a constant index or [`NO_INDEX`](crate::opcode::NO_INDEX),
    /// `super_reg` a register or [`NO_REG`](crate::opcode::NO_REG).
    pub fn emit_def_class(&mut self, dst: u16, name: u32, super_reg: u16) {
        self.emit_opcode(Opcode::DefClass);
        self.emit_u16(dst);
        self.emit_u32(name);
        self.emit_u16(super_reg);
    }

    /// Emit DEFFIELD instruction
    pub fn emit_def_field(&mut self, class: u16, name: u32, init: u16, flags: u16) {
        self.emit_opcode(Opcode::DefField);
        self.emit_u16(class);
        self.emit_u32(name);
        self.emit_u16(init);
        self.emit_u16(flags);
    }

    /// Emit DEFMETHOD instruction
    pub fn emit_def_method(
        &mut self,
        dst: u16,
        class: u16,
        name: u32,
        function: u16,
        flags: u16,
        arity: u8,
    ) {
        self.emit_opcode(Opcode::DefMethod);
        self.emit_u16(dst);
        self.emit_u16(class);
        self.emit_u32(name);
        self.emit_u16(function);
        self.emit_u16(flags);
        self.emit_u8(arity);
    }

    /// Emit DEFMETHODARGTYPE instruction
    pub fn emit_def_method_arg_type(&mut self, method: u16, slot: u8, kind: u8, operand: u32) {
        self.emit_opcode(Opcode::DefMethodArgType);
        self.emit_u16(method);
        self.emit_u8(slot);
        self.emit_u8(kind);
        self.emit_u32(operand);
    }

    // ===== Prologue and Checks =====

    /// Emit METHODINIT instruction
    pub fn emit_method_init(&mut self, self_reg: u16, super_reg: u16) {
        self.emit_opcode(Opcode::MethodInit);
        self.emit_u16(self_reg);
        self.emit_u16(super_reg);
    }

    /// Emit CKMCONST instruction
    pub fn emit_check_member_conflict(&mut self, class: u16, method: u16) {
        self.emit_opcode(Opcode::CheckMemberConflict);
        self.emit_u16(class);
        self.emit_u16(method);
    }

    /// Emit CKCABSTRACT instruction
    pub fn emit_check_abstract(&mut self, class: u16) {
        self.emit_opcode(Opcode::CheckAbstract);
        self.emit_u16(class);
    }

    /// Emit RETURN instruction
    pub fn emit_return(&mut self, src: u16) {
        self.emit_opcode(Opcode::Return);
        self.emit_u16(src);
    }

    /// Patch a previously emitted u32 value at the given offset
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        let bytes = value.to_le_bytes();
        self.buffer[offset..offset + 4].copy_from_slice(&bytes);
    }
}

impl Default for BytecodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytecode reader for decoding instructions
///
/// Provides methods for reading opcodes and their operands from a binary buffer.
pub struct BytecodeReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BytecodeReader<'a> {
    /// Create a new bytecode reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.position + N;
        let slice = self
            .buffer
            .get(self.position..end)
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(slice);
        self.position = end;
        Ok(bytes)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a 16-bit unsigned integer (little-endian)
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.take().map(u16::from_le_bytes)
    }

    /// Read a 32-bit unsigned integer (little-endian)
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take().map(u32::from_le_bytes)
    }

    /// Read a 64-bit signed integer (little-endian)
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.take().map(i64::from_le_bytes)
    }

    /// Read a 64-bit float (little-endian)
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.take().map(f64::from_le_bytes)
    }

    /// Read a length-prefixed string (u32 length + UTF-8 bytes)
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let len = self.read_u32()? as usize;
        let start = self.position;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(start))
    }

    /// Read a fixed number of bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        if self.position + count > self.buffer.len() {
            return Err(DecodeError::UnexpectedEnd(self.position));
        }
        let bytes = self.buffer[self.position..self.position + count].to_vec();
        self.position += count;
        Ok(bytes)
    }

    /// Read an opcode
    pub fn read_opcode(&mut self) -> Result<Opcode, DecodeError> {
        let byte = self.read_u8()?;
        Opcode::from_u8(byte).ok_or(DecodeError::InvalidOpcode(byte, self.position - 1))
    }
}
