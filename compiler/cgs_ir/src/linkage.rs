//! Symbol linkage classes and the predicates the call-graph passes need.

use std::fmt;

/// Linkage of a function or global.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Externally visible, one definition.
    #[default]
    External,
    /// Definition available for inspection only; the real one lives elsewhere.
    AvailableExternally,
    /// Discardable if unused; may be replaced by any other definition.
    LinkOnceAny,
    /// Discardable if unused; all definitions are equivalent.
    LinkOnceOdr,
    /// Kept even if unused; may be replaced by any other definition.
    WeakAny,
    /// Kept even if unused; all definitions are equivalent.
    WeakOdr,
    /// Arrays concatenated across modules.
    Appending,
    /// Visible only within the module.
    Internal,
    /// Like `Internal`, and not present in the symbol table.
    Private,
    /// Weak reference to an external symbol.
    ExternalWeak,
    /// Tentative definition.
    Common,
}

impl Linkage {
    /// `Internal` or `Private`.
    #[must_use]
    pub fn is_local(self) -> bool {
        matches!(self, Self::Internal | Self::Private)
    }

    /// Linkages the linker may merge with other definitions of the symbol.
    #[must_use]
    pub fn is_weak_for_linker(self) -> bool {
        matches!(
            self,
            Self::LinkOnceAny
                | Self::LinkOnceOdr
                | Self::WeakAny
                | Self::WeakOdr
                | Self::Common
                | Self::ExternalWeak
        )
    }

    /// Linkages whose definition may be overridden by a different one at
    /// link or load time.
    ///
    /// `LinkOnceOdr`, `WeakOdr` and `AvailableExternally` are not in this set:
    /// they may be replaced, but only by an equivalent definition.
    #[must_use]
    pub fn is_interposable(self) -> bool {
        matches!(
            self,
            Self::WeakAny | Self::LinkOnceAny | Self::Common | Self::ExternalWeak
        )
    }

    /// IR keyword for the linkage, empty for `External`.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::External => "",
            Self::AvailableExternally => "available_externally",
            Self::LinkOnceAny => "linkonce",
            Self::LinkOnceOdr => "linkonce_odr",
            Self::WeakAny => "weak",
            Self::WeakOdr => "weak_odr",
            Self::Appending => "appending",
            Self::Internal => "internal",
            Self::Private => "private",
            Self::ExternalWeak => "extern_weak",
            Self::Common => "common",
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
