//! Virtual machine
//!
//! The [`Vm`] owns the identity registry and the call stack. Its behaviour is
//! split by concern:
//! - `define`: classes, fields, methods, parameter descriptors
//! - `instantiate`: calling a class
//! - `dispatch`: property reads and writes, call proxies, metamethods
//! - `resolve`: first-match overload resolution
//! - `checks`: build-time member conflict and abstract checks
//! - `exec`: the class-definition opcode executor
//! - `finalize`: `__gc` metamethods of unreachable objects

mod checks;
mod define;
mod dispatch;
mod exec;
mod finalize;
mod instantiate;
mod options;
mod resolve;

pub use dispatch::{CallProxy, ProxyTarget};
pub use finalize::FINALIZER;
pub use options::{VmOptions, DEFAULT_MAX_CALL_DEPTH, DEFAULT_PURGE_THRESHOLD};
pub use resolve::ResolveMode;

use crate::object::{Record, RecordRef};
use crate::registry::IdentityRegistry;
use crate::stack::{CallStack, Frame};
use crate::value::{Function, Value};
use crate::{VmError, VmResult};

/// Object model virtual machine
pub struct Vm {
    options: VmOptions,
    registry: IdentityRegistry,
    stack: CallStack,
    finalizers: Vec<RecordRef>,
}

impl Vm {
    /// Create a VM with default options
    pub fn new() -> Self {
        Self::with_options(VmOptions::default())
    }

    /// Create a VM with specific options
    pub fn with_options(options: VmOptions) -> Self {
        Self {
            registry: IdentityRegistry::new(options.registry_purge_threshold),
            stack: CallStack::new(options.max_call_depth),
            finalizers: Vec::new(),
            options,
        }
    }

    /// Active options
    pub fn options(&self) -> &VmOptions {
        &self.options
    }

    /// Identity registry
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Whether `value` is a registered class or object
    pub fn is_registered(&self, value: &Value) -> bool {
        self.registry.lookup(value).is_some()
    }

    /// Run `__gc` on objects nothing else references, then drop registry
    /// entries of reclaimed records. Returns how many entries were dropped.
    pub fn collect_garbage(&mut self) -> usize {
        self.run_finalizers();
        self.registry.purge()
    }

    /// Current call depth
    pub fn call_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Receiver of the innermost frame: the caller identity for access checks
    pub(crate) fn caller(&self) -> Option<RecordRef> {
        self.stack.receiver().cloned()
    }

    /// `METHODINIT`: `self` and `super` of the running member call, both nil
    /// outside one.
    pub fn method_init(&self) -> (Value, Value) {
        match self.stack.receiver() {
            Some(receiver) => {
                let super_value = receiver
                    .super_record()
                    .map_or(Value::Nil, |s| Value::Record(s.clone()));
                (Value::Record(receiver.clone()), super_value)
            }
            None => (Value::Nil, Value::Nil),
        }
    }

    /// Call any callable value with the current frame as caller
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> VmResult<Value> {
        match callee {
            Value::Function(function) => self.invoke(function, None, args),
            Value::Proxy(proxy) => {
                let caller = self.caller();
                self.call_proxy(proxy, args, caller.as_ref())
            }
            Value::Record(record) => {
                let caller = self.caller();
                self.instantiate_with(record, args, caller.as_ref())
                    .map(Value::Record)
            }
            other => Err(VmError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    /// Run `function` in a new frame, bound to `receiver` for member calls
    pub(crate) fn invoke(
        &mut self,
        function: &Function,
        receiver: Option<RecordRef>,
        args: &[Value],
    ) -> VmResult<Value> {
        let frame = match receiver {
            Some(receiver) => Frame::member(function.name_rc(), receiver),
            None => Frame::plain(function.name_rc()),
        };
        self.stack.push(frame)?;
        let result = function.call(self, args);
        self.stack.pop();
        result
    }

    /// String form of a value, honouring a `__tostring` metamethod
    pub fn to_string(&mut self, value: &Value) -> VmResult<String> {
        if let Value::Record(record) = value {
            if self
                .resolve(record, ResolveMode::Metamethod, "__tostring", &[], true)
                .is_some()
            {
                let result = self.meta_call(record, "__tostring", &[])?;
                return Ok(result.to_string());
            }
        }
        Ok(value.to_string())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `caller` may touch private members reached through `target`
pub(crate) fn has_access(caller: Option<&RecordRef>, target: &Record) -> bool {
    caller.map_or(false, |caller| {
        caller.id() == target.id() || caller.holder_id() == target.holder_id()
    })
}
