//! Class-definition chunk executor
//!
//! Runs a verified [`ClassChunk`] over a register file. Functions are not
//! serializable, so `LOADFN` indexes a host-supplied function table. The
//! chunk runs in the caller's frame: `METHODINIT` inside a chunk executed by
//! a method body sees that method's receiver.

use std::rc::Rc;

use objvm_bytecode::{verify_chunk, ClassChunk, Constant, Instruction};

use super::Vm;
use crate::object::{AccessFlags, Member, Method, ParamKind, RecordRef};
use crate::value::{Function, Value};
use crate::{VmError, VmResult};

struct Registers {
    slots: Vec<Value>,
}

impl Registers {
    fn new(count: u16) -> Self {
        Self {
            slots: vec![Value::Nil; count as usize],
        }
    }

    fn get(&self, reg: u16) -> &Value {
        &self.slots[reg as usize]
    }

    fn set(&mut self, reg: u16, value: Value) {
        self.slots[reg as usize] = value;
    }

    fn record(&self, reg: u16, what: &str) -> VmResult<RecordRef> {
        self.get(reg).as_record().cloned().ok_or_else(|| {
            VmError::InvalidOperand(format!("{what}: r{reg} holds a {}", self.get(reg).type_name()))
        })
    }

    fn method(&self, reg: u16, what: &str) -> VmResult<Rc<Method>> {
        match self.get(reg) {
            Value::Member(Member::Method(method)) => Ok(method.clone()),
            other => Err(VmError::InvalidOperand(format!(
                "{what}: r{reg} holds a {}, not a method",
                other.type_name()
            ))),
        }
    }
}

fn flags_operand(bits: u16) -> VmResult<AccessFlags> {
    AccessFlags::from_bits(bits)
        .ok_or_else(|| VmError::InvalidOperand(format!("unknown access flag bits {bits:#x}")))
}

fn string_operand(chunk: &ClassChunk, index: u32) -> VmResult<&str> {
    chunk
        .constants
        .get_str(index)
        .ok_or_else(|| VmError::InvalidOperand(format!("constant {index} is not a string")))
}

impl Vm {
    /// Verify and run a class-definition chunk, returning its `RETURN` value
    pub fn execute(&mut self, chunk: &ClassChunk, functions: &[Function]) -> VmResult<Value> {
        let instructions = verify_chunk(chunk)?;
        let mut regs = Registers::new(chunk.register_count);
        tracing::debug!(chunk = %chunk.name, instructions = instructions.len(), "executing chunk");

        for (offset, insn) in instructions {
            tracing::trace!(offset, ?insn, "exec");
            match insn {
                Instruction::Nop => {}
                Instruction::LoadNil { dst } => regs.set(dst, Value::Nil),
                Instruction::LoadConst { dst, index } => {
                    let value = match chunk.constants.get(index) {
                        Some(Constant::Str(s)) => Value::from(s.as_str()),
                        Some(Constant::Int(i)) => Value::Integer(*i),
                        Some(Constant::Float(n)) => Value::Number(*n),
                        None => {
                            return Err(VmError::InvalidOperand(format!(
                                "constant {index} out of range"
                            )))
                        }
                    };
                    regs.set(dst, value);
                }
                Instruction::LoadFunction { dst, index } => {
                    let function = functions.get(index as usize).ok_or_else(|| {
                        VmError::InvalidOperand(format!(
                            "function {index} out of range ({} supplied)",
                            functions.len()
                        ))
                    })?;
                    regs.set(dst, Value::Function(function.clone()));
                }
                Instruction::DefClass {
                    dst,
                    name,
                    super_reg,
                } => {
                    let name = name.map(|index| string_operand(chunk, index)).transpose()?;
                    let super_class = super_reg.map(|reg| regs.get(reg).clone());
                    let class = self.define_class(name, super_class.as_ref())?;
                    regs.set(dst, Value::Record(class));
                }
                Instruction::DefField {
                    class,
                    name,
                    init,
                    flags,
                } => {
                    let class = regs.record(class, "DEFFIELD class")?;
                    let init = init.map(|reg| regs.get(reg).clone());
                    self.define_field(&class, string_operand(chunk, name)?, init, flags_operand(flags)?)?;
                }
                Instruction::DefMethod {
                    dst,
                    class,
                    name,
                    function,
                    flags,
                    arity,
                } => {
                    let class = regs.record(class, "DEFMETHOD class")?;
                    let function = match function.map(|reg| regs.get(reg)) {
                        None | Some(Value::Nil) => None,
                        Some(Value::Function(f)) => Some(f.clone()),
                        Some(other) => {
                            return Err(VmError::InvalidOperand(format!(
                                "DEFMETHOD body must be a function, got {}",
                                other.type_name()
                            )))
                        }
                    };
                    let method = self.define_method(
                        &class,
                        string_operand(chunk, name)?,
                        function,
                        flags_operand(flags)?,
                        arity as usize,
                    )?;
                    regs.set(dst, Value::Member(Member::Method(method)));
                }
                Instruction::DefMethodArgType {
                    method,
                    slot,
                    kind,
                    operand,
                } => {
                    let method = regs.method(method, "DEFMETHODARGTYPE")?;
                    let kind = ParamKind::from_u8(kind).ok_or_else(|| VmError::BadParameterType {
                        method: method.name().to_string(),
                        kind,
                    })?;
                    let operand = match (kind, operand) {
                        (ParamKind::TypeName, Some(index)) => {
                            Some(Value::from(string_operand(chunk, index)?))
                        }
                        (ParamKind::Class, Some(reg)) => {
                            let reg = u16::try_from(reg).map_err(|_| {
                                VmError::InvalidOperand(format!("register {reg} out of range"))
                            })?;
                            Some(regs.get(reg).clone())
                        }
                        _ => None,
                    };
                    self.define_method_param_type(&method, slot as usize, kind, operand.as_ref())?;
                }
                Instruction::MethodInit { self_reg, super_reg } => {
                    let (this, super_value) = self.method_init();
                    regs.set(self_reg, this);
                    regs.set(super_reg, super_value);
                }
                Instruction::CheckMemberConflict { class, method } => {
                    let class = regs.record(class, "CKMCONST class")?;
                    let method = regs.method(method, "CKMCONST")?;
                    self.check_member_conflict(&class, &method)?;
                }
                Instruction::CheckAbstract { class } => {
                    let class = regs.record(class, "CKCABSTRACT class")?;
                    self.check_abstract(&class)?;
                }
                Instruction::Return { src } => return Ok(regs.get(src).clone()),
            }
        }

        // verify_chunk guarantees a trailing RETURN
        Ok(Value::Nil)
    }

    /// Decode a serialized chunk (checking its checksum), then run it
    pub fn execute_bytes(&mut self, data: &[u8], functions: &[Function]) -> VmResult<Value> {
        let chunk = ClassChunk::decode(data)?;
        self.execute(&chunk, functions)
    }
}
