//! Field, method and parameter descriptor records
//!
//! Members hold a weak back-edge to the record that declared them. The owning
//! record keeps them alive; a member never keeps its owner alive.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::flags::AccessFlags;
use super::record::{Record, RecordRef};
use crate::value::{Function, Value};

/// Field record: name, owner, flags and one value slot
pub struct Field {
    name: Rc<str>,
    owner: Weak<Record>,
    flags: AccessFlags,
    init_const: Cell<bool>,
    slot: RefCell<Value>,
}

impl Field {
    pub(crate) fn new(name: Rc<str>, owner: &RecordRef, flags: AccessFlags, value: Value) -> Self {
        Self {
            name,
            owner: Rc::downgrade(owner),
            flags,
            init_const: Cell::new(false),
            slot: RefCell::new(value),
        }
    }

    /// Per-instance copy of a declared field with its own slot
    pub(crate) fn instantiate(&self, owner: &RecordRef, value: Value) -> Rc<Field> {
        let field = Field::new(self.name.clone(), owner, self.flags, value);
        field.init_const.set(self.init_const.get());
        Rc::new(field)
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record that declared (or, for instance copies, holds) this field
    pub fn owner(&self) -> Option<RecordRef> {
        self.owner.upgrade()
    }

    /// Access flags
    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Whether a const field has already taken its one write
    pub fn is_locked(&self) -> bool {
        self.init_const.get()
    }

    pub(crate) fn lock(&self) {
        self.init_const.set(true);
    }

    /// Current slot value
    pub fn get(&self) -> Value {
        self.slot.borrow().clone()
    }

    /// Overwrite the slot, ignoring const and access rules
    pub fn set_raw(&self, value: Value) {
        *self.slot.borrow_mut() = value;
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("locked", &self.init_const.get())
            .finish()
    }
}

/// Raw parameter descriptor kinds, as encoded in bytecode
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Unconstrained
    Any = 0,
    /// Trailing variadic slot
    Vararg = 1,
    /// Dynamic type name
    TypeName = 2,
    /// Class constraint
    Class = 4,
}

impl ParamKind {
    /// Decode a kind byte
    pub fn from_u8(kind: u8) -> Option<Self> {
        match kind {
            0 => Some(Self::Any),
            1 => Some(Self::Vararg),
            2 => Some(Self::TypeName),
            4 => Some(Self::Class),
            _ => None,
        }
    }
}

/// One parameter-type descriptor. Exactly one constraint is set.
#[derive(Clone)]
pub enum ParamType {
    /// No constraint
    Any,
    /// Absorbs every remaining argument; only meaningful in the last slot
    Vararg,
    /// Argument's dynamic type name must equal this string
    TypeName(Rc<str>),
    /// Argument must be a registered record descending from this class
    Class(Weak<Record>),
}

impl ParamType {
    /// Descriptor kind
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamType::Any => ParamKind::Any,
            ParamType::Vararg => ParamKind::Vararg,
            ParamType::TypeName(_) => ParamKind::TypeName,
            ParamType::Class(_) => ParamKind::Class,
        }
    }

    /// Whether this is the variadic marker
    pub fn is_vararg(&self) -> bool {
        matches!(self, ParamType::Vararg)
    }

    /// Constraint class, while it is alive
    pub fn class(&self) -> Option<RecordRef> {
        match self {
            ParamType::Class(class) => class.upgrade(),
            _ => None,
        }
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Any => f.write_str("any"),
            ParamType::Vararg => f.write_str("..."),
            ParamType::TypeName(name) => write!(f, "{name}"),
            ParamType::Class(class) => match class.upgrade() {
                Some(class) => write!(f, "{}", class.display_name()),
                None => f.write_str("<dropped class>"),
            },
        }
    }
}

/// Method record
///
/// The function slot is replaceable in place (hot-swap). Parameter slots are
/// allocated to the declared arity; arity zero means an untyped overload.
pub struct Method {
    name: Rc<str>,
    owner: Weak<Record>,
    flags: AccessFlags,
    arity: usize,
    function: RefCell<Option<Function>>,
    params: RefCell<Vec<ParamType>>,
}

impl Method {
    pub(crate) fn new(
        name: Rc<str>,
        owner: &RecordRef,
        flags: AccessFlags,
        function: Option<Function>,
        arity: usize,
    ) -> Self {
        Self {
            name,
            owner: Rc::downgrade(owner),
            flags,
            arity,
            function: RefCell::new(function),
            params: RefCell::new(vec![ParamType::Any; arity]),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring class
    pub fn owner(&self) -> Option<RecordRef> {
        self.owner.upgrade()
    }

    /// Access flags
    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Declared arity
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Whether the method takes part in the typed pass of overload resolution
    pub fn is_typed(&self) -> bool {
        self.arity > 0
    }

    /// Current body; `None` for abstract methods
    pub fn function(&self) -> Option<Function> {
        self.function.borrow().clone()
    }

    pub(crate) fn replace_function(&self, function: Function) {
        *self.function.borrow_mut() = Some(function);
    }

    /// Parameter descriptors in slot order
    pub fn params(&self) -> Ref<'_, Vec<ParamType>> {
        self.params.borrow()
    }

    pub(crate) fn set_param(&self, slot: usize, param: ParamType) -> bool {
        match self.params.borrow_mut().get_mut(slot) {
            Some(entry) => {
                *entry = param;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("params", &*self.params.borrow())
            .finish()
    }
}

/// Handle to either kind of member, as seen by scripts
#[derive(Debug, Clone)]
pub enum Member {
    /// A field record
    Field(Rc<Field>),
    /// A method, constructor, metamethod or abstract method record
    Method(Rc<Method>),
}

impl Member {
    /// Member name
    pub fn name(&self) -> &str {
        match self {
            Member::Field(field) => field.name(),
            Member::Method(method) => method.name(),
        }
    }

    /// Member flags
    pub fn flags(&self) -> AccessFlags {
        match self {
            Member::Field(field) => field.flags(),
            Member::Method(method) => method.flags(),
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Member) -> bool {
        match (self, other) {
            (Member::Field(a), Member::Field(b)) => Rc::ptr_eq(a, b),
            (Member::Method(a), Member::Method(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The method record, if this is one
    pub fn as_method(&self) -> Option<&Rc<Method>> {
        match self {
            Member::Method(method) => Some(method),
            Member::Field(_) => None,
        }
    }

    /// The field record, if this is one
    pub fn as_field(&self) -> Option<&Rc<Field>> {
        match self {
            Member::Field(field) => Some(field),
            Member::Method(_) => None,
        }
    }
}
