//! Call-graph metadata values.
//!
//! A [`Signature`] is the generalized type identifier of a function shape.
//! A [`TypeMetadata`] descriptor attaches one to a function (at offset 0) or
//! to an indirect call instruction (no offset).

use std::fmt;

/// Literal suffix that marks a mangled type name as generalized.
pub const GENERALIZED_SUFFIX: &str = ".generalized";

/// C++ ABI whose type-name mangling signatures follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManglingScheme {
    Itanium,
    Microsoft,
}

impl fmt::Display for ManglingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Itanium => f.write_str("itanium"),
            Self::Microsoft => f.write_str("microsoft"),
        }
    }
}

/// A generalized type signature, tagged with the scheme that produced it.
///
/// The string includes the [`GENERALIZED_SUFFIX`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    scheme: ManglingScheme,
    mangled: String,
}

impl Signature {
    /// Wrap an already-suffixed mangled string.
    ///
    /// # Panics
    ///
    /// Panics if `mangled` does not end in [`GENERALIZED_SUFFIX`].
    pub fn new(scheme: ManglingScheme, mangled: impl Into<String>) -> Self {
        let mangled = mangled.into();
        assert!(
            mangled.ends_with(GENERALIZED_SUFFIX),
            "signature `{mangled}` lacks the `{GENERALIZED_SUFFIX}` marker"
        );
        Self { scheme, mangled }
    }

    #[must_use]
    pub fn scheme(&self) -> ManglingScheme {
        self.scheme
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.mangled
    }

    /// The mangled type name without the generalized marker.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.mangled[..self.mangled.len() - GENERALIZED_SUFFIX.len()]
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mangled)
    }
}

/// A type descriptor attached to a symbol or an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeMetadata {
    /// Byte offset into the symbol; `None` for call-site descriptors.
    pub offset: Option<u64>,
    pub signature: Signature,
}

impl TypeMetadata {
    /// "This symbol is callable with this shape."
    #[must_use]
    pub fn function(signature: Signature) -> Self {
        Self {
            offset: Some(0),
            signature,
        }
    }

    /// "This call expects a callee of this shape."
    #[must_use]
    pub fn call_site(signature: Signature) -> Self {
        Self {
            offset: None,
            signature,
        }
    }
}

impl fmt::Display for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "!{{i64 {offset}, !\"{}\"}}", self.signature),
            None => write!(f, "!{{!\"{}\"}}", self.signature),
        }
    }
}
