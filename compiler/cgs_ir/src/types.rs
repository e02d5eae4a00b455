//! Source-level types of functions and call sites.
//!
//! These are the formal types a front-end hands to the call-graph passes.
//! They are immutable once formed; generalization produces a separate tree
//! rather than rewriting them.

use std::fmt;

use smallvec::SmallVec;

// ── Primitives ──────────────────────────────────────────────────────

/// Integer kinds, each a fixed width and signedness.
///
/// `Char` is distinct from both `SignedChar` and `UnsignedChar`, as in C.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    WChar,
    Char8,
    Char16,
    Char32,
}

impl IntKind {
    /// Whether values of this kind are signed.
    ///
    /// Plain `char` is treated as signed; the encoders never consult this,
    /// since `char` has its own code in both schemes.
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::SignedChar
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::LongLong
                | Self::Int128
                | Self::WChar
        )
    }

    /// C spelling of the kind.
    #[must_use]
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::SignedChar => "signed char",
            Self::UnsignedChar => "unsigned char",
            Self::Short => "short",
            Self::UnsignedShort => "unsigned short",
            Self::Int => "int",
            Self::UnsignedInt => "unsigned int",
            Self::Long => "long",
            Self::UnsignedLong => "unsigned long",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Int128 => "__int128",
            Self::UnsignedInt128 => "unsigned __int128",
            Self::WChar => "wchar_t",
            Self::Char8 => "char8_t",
            Self::Char16 => "char16_t",
            Self::Char32 => "char32_t",
        }
    }
}

/// Floating-point kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatKind {
    Float16,
    Float,
    Double,
    LongDouble,
    Float128,
}

impl FloatKind {
    /// C spelling of the kind.
    #[must_use]
    pub fn c_name(self) -> &'static str {
        match self {
            Self::Float16 => "_Float16",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
            Self::Float128 => "__float128",
        }
    }
}

/// A primitive type. Generalization preserves these exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Int(IntKind),
    Float(FloatKind),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Int(kind) => f.write_str(kind.c_name()),
            Self::Float(kind) => f.write_str(kind.c_name()),
        }
    }
}

// ── Aggregates ──────────────────────────────────────────────────────

/// The tag keyword of a named aggregate.
///
/// Itanium ignores it; Microsoft encodes it (`U`, `V`, `T`, `W4`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Struct,
    Class,
    Union,
    Enum,
}

impl AggregateKind {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Class => "class",
            Self::Union => "union",
            Self::Enum => "enum",
        }
    }
}

/// Fully qualified name of an aggregate.
///
/// The path lists the name segments outermost first: `ns::inner::S` is
/// `["ns", "inner", "S"]`. A plain C tag has a single segment. The path is
/// never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregateName {
    pub kind: AggregateKind,
    path: SmallVec<[String; 2]>,
}

impl AggregateName {
    /// An unqualified aggregate name.
    pub fn new(kind: AggregateKind, name: impl Into<String>) -> Self {
        let mut path = SmallVec::new();
        path.push(name.into());
        Self { kind, path }
    }

    /// A qualified aggregate name, segments outermost first.
    ///
    /// # Panics
    ///
    /// Panics if `path` is empty.
    pub fn qualified<I, S>(kind: AggregateKind, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: SmallVec<[String; 2]> = path.into_iter().map(Into::into).collect();
        assert!(!path.is_empty(), "aggregate name must have at least one segment");
        Self { kind, path }
    }

    /// All segments, outermost first.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The innermost segment and the scopes enclosing it, outermost first.
    #[must_use]
    pub fn split_innermost(&self) -> (&str, &[String]) {
        match self.path.split_last() {
            Some((last, scopes)) => (last, scopes),
            None => ("", &[]),
        }
    }

    /// The innermost (unqualified) segment.
    #[must_use]
    pub fn unqualified(&self) -> &str {
        self.split_innermost().0
    }

    /// Whether the name has more than one segment.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.path.len() > 1
    }
}

impl fmt::Display for AggregateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.keyword(), self.path.join("::"))
    }
}

/// A named aggregate with its member layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aggregate {
    pub name: AggregateName,
    pub members: Vec<Type>,
}

// ── Types ───────────────────────────────────────────────────────────

/// A formal type as declared in the source language.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    /// Pointer to the inner type. Arrays and function designators are
    /// expected to have decayed to pointers before reaching this IR.
    Pointer(Box<Type>),
    /// A named aggregate passed by value.
    Aggregate(Aggregate),
    /// A type with no portable spelling (vendor extension). Carries the
    /// vendor's name for it.
    Other(String),
}

impl Type {
    pub const VOID: Self = Self::Primitive(Primitive::Void);

    #[must_use]
    pub fn int(kind: IntKind) -> Self {
        Self::Primitive(Primitive::Int(kind))
    }

    #[must_use]
    pub fn float(kind: FloatKind) -> Self {
        Self::Primitive(Primitive::Float(kind))
    }

    #[must_use]
    pub fn pointer_to(pointee: Type) -> Self {
        Self::Pointer(Box::new(pointee))
    }

    /// A single-segment `struct` with the given members.
    pub fn named_struct(name: impl Into<String>, members: Vec<Type>) -> Self {
        Self::Aggregate(Aggregate {
            name: AggregateName::new(AggregateKind::Struct, name),
            members,
        })
    }

    #[must_use]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(prim) => write!(f, "{prim}"),
            Self::Pointer(inner) => write!(f, "{inner}*"),
            Self::Aggregate(agg) => write!(f, "{}", agg.name),
            Self::Other(name) => f.write_str(name),
        }
    }
}

// ── Function types ──────────────────────────────────────────────────

/// The formal type of a function or of the callee at an indirect call.
///
/// `prototyped` is `false` for a K&R-style declaration such as C's
/// `void f()`, which says nothing about its parameters. A prototyped
/// function with no parameters is `void f(void)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub ret: Type,
    pub params: SmallVec<[Type; 4]>,
    pub variadic: bool,
    pub prototyped: bool,
}

impl FunctionType {
    /// A prototyped, non-variadic function type.
    pub fn new(ret: Type, params: impl IntoIterator<Item = Type>) -> Self {
        Self {
            ret,
            params: params.into_iter().collect(),
            variadic: false,
            prototyped: true,
        }
    }

    /// A function type without a prototype (`ret f()` in C).
    #[must_use]
    pub fn unprototyped(ret: Type) -> Self {
        Self {
            ret,
            params: SmallVec::new(),
            variadic: false,
            prototyped: false,
        }
    }

    /// Mark the function type as variadic.
    #[must_use]
    pub fn with_variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        if self.variadic {
            if self.params.is_empty() {
                f.write_str("...")?;
            } else {
                f.write_str(", ...")?;
            }
        } else if self.prototyped && self.params.is_empty() {
            f.write_str("void")?;
        }
        f.write_str(")")
    }
}
