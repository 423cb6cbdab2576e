//! Class-definition opcodes
//!
//! This module defines the fixed instruction set the compiler emits for class
//! bodies. Every opcode is a single byte followed by little-endian operands.

/// Sentinel for an absent 16-bit register operand
pub const NO_REG: u16 = u16::MAX;

/// Sentinel for an absent 32-bit constant or register operand
pub const NO_INDEX: u32 = u32::MAX;

/// Parameter descriptor kinds carried by `DEFMETHODARGTYPE`
pub mod param_kind {
    /// Unconstrained slot
    pub const ANY: u8 = 0;
    /// Trailing variadic slot
    pub const VARARG: u8 = 1;
    /// Dynamic type name; operand is a string constant
    pub const TYPE_NAME: u8 = 2;
    /// Class constraint; operand is a register holding the class
    pub const CLASS: u8 = 4;

    /// Whether `kind` is one of the known descriptor kinds
    pub fn is_valid(kind: u8) -> bool {
        matches!(kind, ANY | VARARG | TYPE_NAME | CLASS)
    }
}

/// Bytecode opcode enumeration
///
/// Opcodes are organized into categories:
/// - 0x00-0x0F: Register loads
/// - 0x10-0x1F: Class and member definition
/// - 0x20-0x2F: Method prologue
/// - 0x30-0x3F: Build-time class checks
/// - 0xF0-0xFF: Control
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ===== Register Loads (0x00-0x0F) =====
    /// No operation
    Nop = 0x00,
    /// Load nil into a register (operand: dst u16)
    LoadNil = 0x01,
    /// Load a pool constant (operands: dst u16, const u32)
    LoadConst = 0x02,
    /// Load a host-supplied function (operands: dst u16, func u32)
    LoadFunction = 0x03,

    // ===== Definition (0x10-0x1F) =====
    /// Define a class (operands: dst u16, name const u32, super reg u16)
    DefClass = 0x10,
    /// Define a field (operands: class u16, name u32, init reg u16, flags u16)
    DefField = 0x11,
    /// Define a method (operands: dst u16, class u16, name u32, func reg u16, flags u16, arity u8)
    DefMethod = 0x12,
    /// Set one parameter descriptor (operands: method u16, slot u8, kind u8, operand u32)
    DefMethodArgType = 0x13,

    // ===== Method Prologue (0x20-0x2F) =====
    /// Bind self/super of the running method (operands: self u16, super u16)
    MethodInit = 0x20,

    // ===== Build-time Checks (0x30-0x3F) =====
    /// Reject a member that clashes with an inherited one (operands: class u16, method u16)
    CheckMemberConflict = 0x30,
    /// Reject a class with unimplemented abstract methods (operand: class u16)
    CheckAbstract = 0x31,

    // ===== Control (0xF0-0xFF) =====
    /// Return a register (operand: src u16)
    Return = 0xF0,
}

impl Opcode {
    /// Convert byte to opcode
    ///
    /// Returns None if the byte does not correspond to a valid opcode.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Nop),
            0x01 => Some(Self::LoadNil),
            0x02 => Some(Self::LoadConst),
            0x03 => Some(Self::LoadFunction),

            0x10 => Some(Self::DefClass),
            0x11 => Some(Self::DefField),
            0x12 => Some(Self::DefMethod),
            0x13 => Some(Self::DefMethodArgType),

            0x20 => Some(Self::MethodInit),

            0x30 => Some(Self::CheckMemberConflict),
            0x31 => Some(Self::CheckAbstract),

            0xF0 => Some(Self::Return),

            _ => None,
        }
    }

    /// Convert opcode to byte
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Get the assembler mnemonic of the opcode
    pub fn name(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::LoadNil => "LOADNIL",
            Self::LoadConst => "LOADK",
            Self::LoadFunction => "LOADFN",
            Self::DefClass => "DEFCLASS",
            Self::DefField => "DEFFIELD",
            Self::DefMethod => "DEFMETHOD",
            Self::DefMethodArgType => "DEFMETHODARGTYPE",
            Self::MethodInit => "METHODINIT",
            Self::CheckMemberConflict => "CKMCONST",
            Self::CheckAbstract => "CKCABSTRACT",
            Self::Return => "RETURN",
        }
    }

    /// Size in bytes of the operands that follow the opcode byte
    pub fn operand_size(self) -> usize {
        match self {
            Self::Nop => 0,
            Self::LoadNil | Self::CheckAbstract | Self::Return => 2,
            Self::LoadConst | Self::LoadFunction => 6,
            Self::DefClass => 8,
            Self::DefField => 10,
            Self::DefMethod => 13,
            Self::DefMethodArgType => 8,
            Self::MethodInit | Self::CheckMemberConflict => 4,
        }
    }

    /// Check if this opcode creates or extends a class
    pub fn is_definition(self) -> bool {
        matches!(
            self,
            Self::DefClass | Self::DefField | Self::DefMethod | Self::DefMethodArgType
        )
    }

    /// Check if this opcode is a build-time class check
    pub fn is_check(self) -> bool {
        matches!(self, Self::CheckMemberConflict | Self::CheckAbstract)
    }

    /// Check if this opcode terminates a chunk
    pub fn is_terminator(self) -> bool {
        matches!(self, Self::Return)
    }
}
