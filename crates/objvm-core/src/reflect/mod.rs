//! Reflection surface
//!
//! Read-only views of classes, objects and their members, plus the two
//! mutating escape hatches scripts get: raw field slot access and method
//! hot-swap.
//!
//! - Class queries: [`get_super`], [`get_class`], [`is_class`], [`is_object`]
//! - Member enumeration: [`members`] with declared-only or inherited scope
//! - Member queries: flags, functions, field values, parameter types
//! - Names: [`get_name`] of a member handle, class or object
//! - Runtime predicates: [`type_of`], [`instance_of`]
//! - Snapshots: [`describe_class`] builds a serializable [`ClassInfo`]

mod info;
mod introspection;
mod members;

pub use info::{describe_class, ClassInfo, MemberInfo};
pub use introspection::{
    get_class, get_method_init, get_super, instance_of, is_class, is_object, members, type_of,
    MemberKind, MemberScope,
};
pub use members::{
    get_field_value, get_method_arg_types, get_method_function, get_name, hotfix_method,
    is_abstract, is_const, is_constructor, is_field, is_meta, is_method, is_no_wrap, is_private,
    is_public, is_static, set_field_value,
};
