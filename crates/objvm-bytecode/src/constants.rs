//! Constant pool for class chunks

use crate::encoder::{BytecodeReader, BytecodeWriter, DecodeError};

const TAG_STR: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;

/// A single pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Interned string (class, member and type names)
    Str(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
}

impl Constant {
    /// Borrow the string payload, if this is a string constant
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordered constant pool. Strings are deduplicated on insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string, returning the index of an existing equal entry if present
    pub fn add_string(&mut self, value: impl Into<String>) -> u32 {
        let value = value.into();
        if let Some(index) = self
            .entries
            .iter()
            .position(|c| c.as_str() == Some(value.as_str()))
        {
            return index as u32;
        }
        self.push(Constant::Str(value))
    }

    /// Add an integer literal
    pub fn add_int(&mut self, value: i64) -> u32 {
        self.push(Constant::Int(value))
    }

    /// Add a float literal
    pub fn add_float(&mut self, value: f64) -> u32 {
        self.push(Constant::Float(value))
    }

    fn push(&mut self, constant: Constant) -> u32 {
        self.entries.push(constant);
        (self.entries.len() - 1) as u32
    }

    /// Look up an entry
    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.entries.get(index as usize)
    }

    /// Look up a string entry
    pub fn get_str(&self, index: u32) -> Option<&str> {
        self.get(index).and_then(Constant::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn encode(&self, writer: &mut BytecodeWriter) {
        writer.emit_u32(self.entries.len() as u32);
        for entry in &self.entries {
            match entry {
                Constant::Str(s) => {
                    writer.emit_u8(TAG_STR);
                    writer.emit_string(s);
                }
                Constant::Int(v) => {
                    writer.emit_u8(TAG_INT);
                    writer.emit_i64(*v);
                }
                Constant::Float(v) => {
                    writer.emit_u8(TAG_FLOAT);
                    writer.emit_f64(*v);
                }
            }
        }
    }

    pub(crate) fn decode(reader: &mut BytecodeReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_u32()? as usize;
        let mut entries = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let offset = reader.position();
            let entry = match reader.read_u8()? {
                TAG_STR => Constant::Str(reader.read_string()?),
                TAG_INT => Constant::Int(reader.read_i64()?),
                TAG_FLOAT => Constant::Float(reader.read_f64()?),
                tag => return Err(DecodeError::InvalidConstantTag(tag, offset)),
            };
            entries.push(entry);
        }
        Ok(Self { entries })
    }
}
