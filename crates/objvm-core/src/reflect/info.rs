//! Serializable class snapshots

use serde::Serialize;

use crate::object::{Field, Method, ParamType, RecordRef};

/// Snapshot of one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberInfo {
    /// Member name
    pub name: String,
    /// Raw access flag bits
    pub flags: u16,
    /// Declared arity; `None` for fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
    /// Parameter descriptors rendered as type names
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

/// Snapshot of a class or object record and its declared members
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    /// Record identity
    pub id: u64,
    /// Class name
    pub name: Option<String>,
    /// Whether the record is a class
    pub is_class: bool,
    /// Identity of the super record
    pub super_id: Option<u64>,
    /// Declared fields
    pub fields: Vec<MemberInfo>,
    /// Constructors
    pub constructors: Vec<MemberInfo>,
    /// Regular methods
    pub methods: Vec<MemberInfo>,
    /// Metamethods
    pub metamethods: Vec<MemberInfo>,
    /// Abstract methods
    pub abstract_methods: Vec<MemberInfo>,
}

fn render(param: &ParamType) -> String {
    match param {
        ParamType::Any => "any".to_string(),
        ParamType::Vararg => "...".to_string(),
        ParamType::TypeName(name) => name.to_string(),
        ParamType::Class(_) => match param.class() {
            Some(class) => format!("class {}", class.display_name()),
            None => "class <dropped>".to_string(),
        },
    }
}

fn field_info(field: &Field) -> MemberInfo {
    MemberInfo {
        name: field.name().to_string(),
        flags: field.flags().bits(),
        arity: None,
        params: Vec::new(),
    }
}

fn method_info(method: &Method) -> MemberInfo {
    MemberInfo {
        name: method.name().to_string(),
        flags: method.flags().bits(),
        arity: Some(method.arity()),
        params: method.params().iter().map(render).collect(),
    }
}

fn methods(list: &[std::rc::Rc<Method>]) -> Vec<MemberInfo> {
    list.iter().map(|m| method_info(m)).collect()
}

/// Take a snapshot of `record`'s declared members
pub fn describe_class(record: &RecordRef) -> ClassInfo {
    ClassInfo {
        id: record.id().as_u64(),
        name: record.name().map(str::to_string),
        is_class: record.is_class(),
        super_id: record.super_record().map(|s| s.id().as_u64()),
        fields: record.fields().iter().map(|f| field_info(f)).collect(),
        constructors: methods(&record.constructors()),
        methods: methods(&record.methods()),
        metamethods: methods(&record.metamethods()),
        abstract_methods: methods(&record.abstract_methods()),
    }
}
