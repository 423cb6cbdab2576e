//! Member access flags

use bitflags::bitflags;

use crate::{VmError, VmResult};

bitflags! {
    /// Access and shape flags carried by every field and method
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u16 {
        /// Visible from anywhere
        const PUBLIC = 1 << 0;
        /// Visible only from in-class calls
        const PRIVATE = 1 << 1;
        /// Belongs to the class, shared by every instance
        const STATIC = 1 << 2;
        /// Accepts exactly one write
        const CONST = 1 << 3;
        /// Metamethod override
        const META = 1 << 4;
        /// Declared without a body
        const ABSTRACT = 1 << 5;
        /// Constructor
        const CONSTRUCTOR = 1 << 6;
        /// Field initializer is stored as-is, never invoked
        const NOWRAP = 1 << 7;
        /// Set on every method record
        const ISMETHOD = 1 << 8;
        /// Set on every field record
        const ISFIELD = 1 << 9;
    }
}

impl AccessFlags {
    /// Reject anything that is not exactly one of public/private
    pub(crate) fn validated(self, member: &str) -> VmResult<Self> {
        let visibility = self & (Self::PUBLIC | Self::PRIVATE);
        if visibility == Self::PUBLIC || visibility == Self::PRIVATE {
            Ok(self)
        } else {
            Err(VmError::InconsistentAccessFlags {
                member: member.to_string(),
                flags: self.bits(),
            })
        }
    }

    /// Apply the method shape rules: metamethods are always public and
    /// static, constructors are never static.
    pub(crate) fn for_method(self) -> Self {
        let mut flags = (self - Self::ISFIELD) | Self::ISMETHOD;
        if flags.contains(Self::META) {
            flags = (flags - Self::PRIVATE) | Self::PUBLIC | Self::STATIC;
        }
        if flags.contains(Self::CONSTRUCTOR) {
            flags -= Self::STATIC;
        }
        flags
    }

    pub(crate) fn for_field(self) -> Self {
        (self - (Self::ISMETHOD | Self::META | Self::ABSTRACT | Self::CONSTRUCTOR)) | Self::ISFIELD
    }

    /// Public member
    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    /// Private member
    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    /// Static member
    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Const field
    pub fn is_const(self) -> bool {
        self.contains(Self::CONST)
    }

    /// Metamethod
    pub fn is_meta(self) -> bool {
        self.contains(Self::META)
    }

    /// Abstract method
    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Constructor
    pub fn is_constructor(self) -> bool {
        self.contains(Self::CONSTRUCTOR)
    }

    /// Field whose initializer is never invoked
    pub fn is_no_wrap(self) -> bool {
        self.contains(Self::NOWRAP)
    }

    /// Method record
    pub fn is_method(self) -> bool {
        self.contains(Self::ISMETHOD)
    }

    /// Field record
    pub fn is_field(self) -> bool {
        self.contains(Self::ISFIELD)
    }
}
