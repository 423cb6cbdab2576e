//! Class-based object model runtime
//!
//! This crate layers classes and objects on top of a small dynamic value model:
//! - Class and object records with single inheritance
//! - Definition engine (classes, fields, methods, parameter descriptors)
//! - Instantiation through the super chain
//! - Property dispatch with access control and first-match overload resolution
//! - Weak identity registry and reflection surface
//! - Executor for the class-definition opcodes of `objvm-bytecode`

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod object;
pub mod reflect;
pub mod registry;
pub mod stack;
pub mod value;
pub mod vm;

pub use object::{AccessFlags, Field, Member, Method, ParamKind, ParamType, Record, RecordId, RecordRef};
pub use registry::IdentityRegistry;
pub use stack::{CallStack, Frame};
pub use value::{Function, Value};
pub use vm::{CallProxy, Vm, VmOptions};

use objvm_bytecode::{ChunkError, VerifyError};

/// VM execution errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    /// Call depth guard tripped
    #[error("Stack overflow (call depth exceeds {limit})")]
    StackOverflow {
        /// Configured maximum depth
        limit: usize,
    },

    /// Super class operand is not a registered class
    #[error("Super class must be a registered class, got {found}")]
    BadSuperClass {
        /// Description of the rejected value
        found: String,
    },

    /// Class-only operation applied to something else
    #[error("Not a class '{target}': {operation}")]
    NotAClass {
        /// Description of the rejected value
        target: String,
        /// What was attempted
        operation: &'static str,
    },

    /// Field name already present in the class or an ancestor
    #[error("Field '{field}' is already defined in class '{class}' or its ancestors")]
    DuplicateField {
        /// Field name
        field: String,
        /// Class being extended
        class: String,
    },

    /// Attempt to redefine an engine-owned metamethod
    #[error("Metamethod '{name}' is reserved and cannot be redefined")]
    MetamethodReserved {
        /// Metamethod name
        name: String,
    },

    /// Class constraint does not name a registered class
    #[error("Parameter {slot} of method '{method}' must be constrained to a registered class")]
    BadParameterClass {
        /// Method name
        method: String,
        /// Parameter slot
        slot: usize,
    },

    /// Parameter slot outside the method's arity
    #[error("Parameter slot {slot} out of range for method '{method}' with arity {arity}")]
    BadParameterSlot {
        /// Method name
        method: String,
        /// Requested slot
        slot: usize,
        /// Declared arity
        arity: usize,
    },

    /// Unknown parameter descriptor kind
    #[error("Invalid parameter kind {kind} for method '{method}'")]
    BadParameterType {
        /// Method name
        method: String,
        /// Raw kind value
        kind: u8,
    },

    /// Member flags do not carry exactly one of public/private
    #[error("Member '{member}' must be exactly one of public or private (flags {flags:#x})")]
    InconsistentAccessFlags {
        /// Member name
        member: String,
        /// Raw flag bits
        flags: u16,
    },

    /// Member reuses the name of a different kind of inherited member
    #[error("Member conflict: {kind} '{member}' in class '{class}' conflicts with inherited {inherited}")]
    MemberConflict {
        /// Class being closed
        class: String,
        /// Member name
        member: String,
        /// Kind of the new member
        kind: &'static str,
        /// Kind of the inherited member
        inherited: &'static str,
    },

    /// Abstract method left without an implementation
    #[error("Class '{class}' must implement abstract method '{method}' declared in '{declared_in}'")]
    AbstractNotImplemented {
        /// Class being closed
        class: String,
        /// Abstract method name
        method: String,
        /// Ancestor that declared it
        declared_in: String,
    },

    /// No constructor accepts the arguments
    #[error("Constructor not found for class '{class}'")]
    ConstructorNotFound {
        /// Class name
        class: String,
    },

    /// Private constructor called from outside the class
    #[error("Private constructor can only be called from '{class}'")]
    ConstructorAccessDenied {
        /// Class name
        class: String,
    },

    /// Read of an unknown member
    #[error("Member '{member}' not found in '{target}'")]
    MemberNotFound {
        /// Member name
        member: String,
        /// Receiver description
        target: String,
    },

    /// Private member used from outside the class
    #[error("Private member '{member}' of '{target}' cannot be accessed")]
    PrivateMemberDenied {
        /// Member name
        member: String,
        /// Receiver description
        target: String,
    },

    /// Instance field used through a class
    #[error("Field '{field}' is not static and cannot be accessed through class '{class}'")]
    ObjectFieldAsStatic {
        /// Field name
        field: String,
        /// Class name
        class: String,
    },

    /// Second write to a const field
    #[error("Const field '{field}' cannot be modified")]
    ConstFieldImmutable {
        /// Field name
        field: String,
    },

    /// Write to an undeclared field
    #[error("Field '{field}' not found in '{target}'")]
    FieldNotFound {
        /// Field name
        field: String,
        /// Receiver description
        target: String,
    },

    /// Metamethod dispatch found no candidate
    #[error("Metamethod '{name}' not found")]
    MetamethodNotFound {
        /// Metamethod name
        name: String,
    },

    /// Call on a value that cannot be called
    #[error("Attempt to call a {type_name} value")]
    NotCallable {
        /// Dynamic type of the callee
        type_name: &'static str,
    },

    /// Executor operand has the wrong shape
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    /// Chunk failed to decode
    #[error("Chunk error: {0}")]
    Chunk(#[from] ChunkError),

    /// Chunk failed verification
    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),

    /// Error raised by host code
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// VM execution result
pub type VmResult<T> = Result<T, VmError>;
