//! Object model data types
//!
//! Records (classes and objects), member records and access flags.

mod flags;
mod member;
mod record;

pub use flags::AccessFlags;
pub use member::{Field, Member, Method, ParamKind, ParamType};
pub use record::{Record, RecordId, RecordRef};
