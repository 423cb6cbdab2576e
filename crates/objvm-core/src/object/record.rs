//! Class and object records
//!
//! One record type covers both classes and objects. A class has no `class`
//! link (it is its own class holder); an object points at the class it was
//! built from and at the super-object built in lock-step with it.
//!
//! Member lists are immutable slices replaced wholesale on append, so a
//! snapshot taken before a definition never observes it. Objects start from
//! the class's snapshots for constructors, methods, metamethods and abstract
//! methods, and own a fresh field list.

use std::cell::RefCell;
use std::fmt;
use std::iter;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::member::{Field, Method};

/// Shared handle to a record
pub type RecordRef = Rc<Record>;

/// Unique record identity, also the identity registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);
        RecordId(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type MemberList<T> = RefCell<Rc<[Rc<T>]>>;

fn append<T>(list: &MemberList<T>, item: Rc<T>) {
    let mut slot = list.borrow_mut();
    let mut grown = slot.to_vec();
    grown.push(item);
    *slot = grown.into();
}

/// Class or object record
pub struct Record {
    id: RecordId,
    name: Option<Rc<str>>,
    super_record: Option<RecordRef>,
    class: Option<RecordRef>,
    constructors: MemberList<Method>,
    fields: MemberList<Field>,
    methods: MemberList<Method>,
    metamethods: MemberList<Method>,
    abstract_methods: MemberList<Method>,
}

impl Record {
    pub(crate) fn new_class(name: Option<Rc<str>>, super_class: Option<RecordRef>) -> RecordRef {
        Rc::new(Self {
            id: RecordId::next(),
            name,
            super_record: super_class,
            class: None,
            constructors: RefCell::new(Rc::from(Vec::new())),
            fields: RefCell::new(Rc::from(Vec::new())),
            methods: RefCell::new(Rc::from(Vec::new())),
            metamethods: RefCell::new(Rc::from(Vec::new())),
            abstract_methods: RefCell::new(Rc::from(Vec::new())),
        })
    }

    /// Allocate an object of `class`. Fields are filled in by the caller.
    pub(crate) fn new_object(class: &RecordRef, super_object: Option<RecordRef>) -> RecordRef {
        Rc::new(Self {
            id: RecordId::next(),
            name: class.name.clone(),
            super_record: super_object,
            class: Some(class.clone()),
            constructors: RefCell::new(class.constructors()),
            fields: RefCell::new(Rc::from(Vec::new())),
            methods: RefCell::new(class.methods()),
            metamethods: RefCell::new(class.metamethods()),
            abstract_methods: RefCell::new(class.abstract_methods()),
        })
    }

    /// Record identity
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Class name (objects carry their class's name)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for diagnostics
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("<anonymous>")
    }

    /// Whether this record is a class
    pub fn is_class(&self) -> bool {
        self.class.is_none()
    }

    /// Super class for classes, super-object for objects
    pub fn super_record(&self) -> Option<&RecordRef> {
        self.super_record.as_ref()
    }

    /// Originating class of an object; `None` for classes
    pub fn class(&self) -> Option<&RecordRef> {
        self.class.as_ref()
    }

    /// The class holder: the record itself for a class, its class for an object
    pub fn class_holder(self: &Rc<Self>) -> RecordRef {
        self.class.clone().unwrap_or_else(|| self.clone())
    }

    /// Identity of the class holder, the nominal type of the record
    pub fn holder_id(&self) -> RecordId {
        self.class.as_ref().map_or(self.id, |class| class.id)
    }

    /// This record followed by its super chain
    pub fn chain(self: &Rc<Self>) -> impl Iterator<Item = RecordRef> {
        iter::successors(Some(self.clone()), |record| record.super_record.clone())
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(self: &Rc<Self>) -> impl Iterator<Item = RecordRef> {
        self.chain().skip(1)
    }

    /// Whether some record on this chain shares `holder`'s nominal type
    pub fn descends_from(self: &Rc<Self>, holder: &Record) -> bool {
        let wanted = holder.holder_id();
        self.chain().any(|record| record.holder_id() == wanted)
    }

    /// Constructor list snapshot
    pub fn constructors(&self) -> Rc<[Rc<Method>]> {
        self.constructors.borrow().clone()
    }

    /// Field list snapshot
    pub fn fields(&self) -> Rc<[Rc<Field>]> {
        self.fields.borrow().clone()
    }

    /// Method list snapshot
    pub fn methods(&self) -> Rc<[Rc<Method>]> {
        self.methods.borrow().clone()
    }

    /// Metamethod list snapshot
    pub fn metamethods(&self) -> Rc<[Rc<Method>]> {
        self.metamethods.borrow().clone()
    }

    /// Abstract method list snapshot
    pub fn abstract_methods(&self) -> Rc<[Rc<Method>]> {
        self.abstract_methods.borrow().clone()
    }

    /// Field declared directly on this record
    pub fn own_field(&self, name: &str) -> Option<Rc<Field>> {
        self.fields.borrow().iter().find(|f| f.name() == name).cloned()
    }

    pub(crate) fn push_constructor(&self, method: Rc<Method>) {
        append(&self.constructors, method);
    }

    pub(crate) fn push_field(&self, field: Rc<Field>) {
        append(&self.fields, field);
    }

    pub(crate) fn push_method(&self, method: Rc<Method>) {
        append(&self.methods, method);
    }

    pub(crate) fn push_metamethod(&self, method: Rc<Method>) {
        append(&self.metamethods, method);
    }

    pub(crate) fn push_abstract(&self, method: Rc<Method>) {
        append(&self.abstract_methods, method);
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_class() { "class" } else { "object" };
        write!(f, "{}[{}]: {}", kind, self.display_name(), self.id)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_class", &self.is_class())
            .field("super", &self.super_record.as_ref().map(|s| s.id))
            .finish()
    }
}
