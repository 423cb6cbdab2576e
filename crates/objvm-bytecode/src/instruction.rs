//! Decoded instruction form

use crate::encoder::{BytecodeReader, DecodeError};
use crate::opcode::{Opcode, NO_INDEX, NO_REG};

/// One decoded instruction. Absent optional operands are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// No operation
    Nop,
    /// `dst = nil`
    LoadNil { dst: u16 },
    /// `dst = constants[index]`
    LoadConst { dst: u16, index: u32 },
    /// `dst = functions[index]`
    LoadFunction { dst: u16, index: u32 },
    /// `dst = defineClass(name, super)`
    DefClass {
        dst: u16,
        name: Option<u32>,
        super_reg: Option<u16>,
    },
    /// `defineField(class, name, init, flags)`
    DefField {
        class: u16,
        name: u32,
        init: Option<u16>,
        flags: u16,
    },
    /// `dst = defineMethod(class, name, function, flags, arity)`
    DefMethod {
        dst: u16,
        class: u16,
        name: u32,
        function: Option<u16>,
        flags: u16,
        arity: u8,
    },
    /// `defineMethodParameterType(method, slot, kind, operand)`
    DefMethodArgType {
        method: u16,
        slot: u8,
        kind: u8,
        operand: Option<u32>,
    },
    /// `self_reg, super_reg = self, super`
    MethodInit { self_reg: u16, super_reg: u16 },
    /// Inherited member conflict check
    CheckMemberConflict { class: u16, method: u16 },
    /// Abstract completeness check
    CheckAbstract { class: u16 },
    /// Return a register
    Return { src: u16 },
}

fn opt_reg(reg: u16) -> Option<u16> {
    (reg != NO_REG).then_some(reg)
}

fn opt_index(index: u32) -> Option<u32> {
    (index != NO_INDEX).then_some(index)
}

impl Instruction {
    /// Opcode of this instruction
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::LoadNil { .. } => Opcode::LoadNil,
            Instruction::LoadConst { .. } => Opcode::LoadConst,
            Instruction::LoadFunction { .. } => Opcode::LoadFunction,
            Instruction::DefClass { .. } => Opcode::DefClass,
            Instruction::DefField { .. } => Opcode::DefField,
            Instruction::DefMethod { .. } => Opcode::DefMethod,
            Instruction::DefMethodArgType { .. } => Opcode::DefMethodArgType,
            Instruction::MethodInit { .. } => Opcode::MethodInit,
            Instruction::CheckMemberConflict { .. } => Opcode::CheckMemberConflict,
            Instruction::CheckAbstract { .. } => Opcode::CheckAbstract,
            Instruction::Return { .. } => Opcode::Return,
        }
    }

    /// Every register this instruction reads or writes
    pub fn registers(&self) -> Vec<u16> {
        match *self {
            Instruction::Nop => Vec::new(),
            Instruction::LoadNil { dst }
            | Instruction::LoadConst { dst, .. }
            | Instruction::LoadFunction { dst, .. } => vec![dst],
            Instruction::DefClass { dst, super_reg, .. } => {
                let mut regs = vec![dst];
                regs.extend(super_reg);
                regs
            }
            Instruction::DefField { class, init, .. } => {
                let mut regs = vec![class];
                regs.extend(init);
                regs
            }
            Instruction::DefMethod {
                dst,
                class,
                function,
                ..
            } => {
                let mut regs = vec![dst, class];
                regs.extend(function);
                regs
            }
            Instruction::DefMethodArgType { method, .. } => vec![method],
            Instruction::MethodInit {
                self_reg,
                super_reg,
            } => vec![self_reg, super_reg],
            Instruction::CheckMemberConflict { class, method } => vec![class, method],
            Instruction::CheckAbstract { class } => vec![class],
            Instruction::Return { src } => vec![src],
        }
    }

    /// Decode one instruction at the reader's position
    pub fn decode(reader: &mut BytecodeReader<'_>) -> Result<Self, DecodeError> {
        let instruction = match reader.read_opcode()? {
            Opcode::Nop => Instruction::Nop,
            Opcode::LoadNil => Instruction::LoadNil {
                dst: reader.read_u16()?,
            },
            Opcode::LoadConst => Instruction::LoadConst {
                dst: reader.read_u16()?,
                index: reader.read_u32()?,
            },
            Opcode::LoadFunction => Instruction::LoadFunction {
                dst: reader.read_u16()?,
                index: reader.read_u32()?,
            },
            Opcode::DefClass => Instruction::DefClass {
                dst: reader.read_u16()?,
                name: opt_index(reader.read_u32()?),
                super_reg: opt_reg(reader.read_u16()?),
            },
            Opcode::DefField => Instruction::DefField {
                class: reader.read_u16()?,
                name: reader.read_u32()?,
                init: opt_reg(reader.read_u16()?),
                flags: reader.read_u16()?,
            },
            Opcode::DefMethod => Instruction::DefMethod {
                dst: reader.read_u16()?,
                class: reader.read_u16()?,
                name: reader.read_u32()?,
                function: opt_reg(reader.read_u16()?),
                flags: reader.read_u16()?,
                arity: reader.read_u8()?,
            },
            Opcode::DefMethodArgType => Instruction::DefMethodArgType {
                method: reader.read_u16()?,
                slot: reader.read_u8()?,
                kind: reader.read_u8()?,
                operand: opt_index(reader.read_u32()?),
            },
            Opcode::MethodInit => Instruction::MethodInit {
                self_reg: reader.read_u16()?,
                super_reg: reader.read_u16()?,
            },
            Opcode::CheckMemberConflict => Instruction::CheckMemberConflict {
                class: reader.read_u16()?,
                method: reader.read_u16()?,
            },
            Opcode::CheckAbstract => Instruction::CheckAbstract {
                class: reader.read_u16()?,
            },
            Opcode::Return => Instruction::Return {
                src: reader.read_u16()?,
            },
        };
        Ok(instruction)
    }
}

/// Decode a whole code buffer into `(offset, instruction)` pairs
pub fn decode_all(code: &[u8]) -> Result<Vec<(usize, Instruction)>, DecodeError> {
    let mut reader = BytecodeReader::new(code);
    let mut out = Vec::new();
    while reader.has_more() {
        let offset = reader.position();
        out.push((offset, Instruction::decode(&mut reader)?));
    }
    Ok(out)
}
