//! Dynamic values
//!
//! The value model the object runtime is embedded in. Records and member
//! handles are "userdata" to scripts; host functions and call proxies are
//! both "function".

use std::fmt;
use std::rc::Rc;

use crate::object::{Member, RecordRef};
use crate::vm::{CallProxy, Vm};
use crate::VmResult;

/// Type name reported for a missing argument
pub const NO_VALUE: &str = "no value";

/// Host function signature
pub type NativeFn = dyn Fn(&mut Vm, &[Value]) -> VmResult<Value>;

/// Host function with a debug name. Identity is pointer identity.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl Function {
    /// Wrap a host closure
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut Vm, &[Value]) -> VmResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_rc(&self) -> Rc<str> {
        self.name.clone()
    }

    /// Whether two handles refer to the same closure
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }

    pub(crate) fn call(&self, vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
        (self.func)(vm, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

/// A dynamic value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Nil,
    /// Boolean
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Float number
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Host function
    Function(Function),
    /// Class or object
    Record(RecordRef),
    /// Bound, not yet resolved member call
    Proxy(Rc<CallProxy>),
    /// Field or method handle
    Member(Member),
}

impl Value {
    /// Dynamic type name, as compared by type-name parameter descriptors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) | Value::Proxy(_) => "function",
            Value::Record(_) | Value::Member(_) => "userdata",
        }
    }

    /// Type name of an argument slot that may be absent
    pub fn type_name_of(arg: Option<&Value>) -> &'static str {
        arg.map_or(NO_VALUE, Value::type_name)
    }

    /// Whether this is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Whether this is callable
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_) | Value::Proxy(_) => true,
            Value::Record(record) => record.is_class(),
            _ => false,
        }
    }

    /// Borrow the record handle
    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric payload of either number representation
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Borrow the member handle
    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Value::Member(m) => Some(m),
            _ => None,
        }
    }

    /// Everything except nil and false is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Proxy(a), Value::Proxy(b)) => Rc::ptr_eq(a, b),
            (Value::Member(a), Value::Member(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Function(func) => write!(f, "function: {}", func.name()),
            Value::Proxy(proxy) => write!(f, "function: {}", proxy.describe()),
            Value::Record(record) => write!(f, "{record}"),
            Value::Member(Member::Field(field)) => write!(f, "field: {}", field.name()),
            Value::Member(Member::Method(method)) => write!(f, "method: {}", method.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<RecordRef> for Value {
    fn from(record: RecordRef) -> Self {
        Value::Record(record)
    }
}

impl From<Member> for Value {
    fn from(member: Member) -> Self {
        Value::Member(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::from(3).type_name(), "number");
        assert_eq!(Value::from(1.5).type_name(), "number");
        assert_eq!(Value::from("s").type_name(), "string");
        assert_eq!(Value::from(true).type_name(), "boolean");
        let f = Function::new("f", |_, _| Ok(Value::Nil));
        assert_eq!(Value::from(f).type_name(), "function");
        assert_eq!(Value::type_name_of(None), NO_VALUE);
    }

    #[test]
    fn test_numeric_equality_crosses_representations() {
        assert_eq!(Value::Integer(2), Value::Number(2.0));
        assert_ne!(Value::Integer(2), Value::from("2"));
    }

    #[test]
    fn test_function_identity() {
        let f = Function::new("f", |_, _| Ok(Value::Nil));
        let g = Function::new("f", |_, _| Ok(Value::Nil));
        assert_eq!(Value::from(f.clone()), Value::from(f.clone()));
        assert_ne!(Value::from(f), Value::from(g));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from(0).is_truthy());
    }
}
