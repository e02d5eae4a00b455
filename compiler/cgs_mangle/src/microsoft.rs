//! Microsoft C++ ABI encoding of generalized function types.
//!
//! Produces the canonical type-name form (`? <type>`) of a function type:
//!
//! ```text
//! ?6 <calling-convention> <return-type> <parameter-list> <throw-spec>
//! ```
//!
//! The calling convention is always `A` (`__cdecl`) and the throw
//! specification is always `Z` (none). The parameter list is `X` for
//! `(void)`, `@` for an unprototyped function, and otherwise the parameter
//! types terminated by `@`, or by `Z` when variadic.
//!
//! # Back-references
//!
//! The first ten parameter types whose encoding is longer than one
//! character are remembered, and repeats are written as a single digit
//! `0`-`9`. The return type never enters that table. Independently, the
//! first ten name segments are remembered and repeats of a segment are also
//! written as a digit. Hence `int *(char *, float *, double *)` encodes its
//! parameters as `PEAX00@`.
//!
//! Types without a builtin code (`_Float16`, `__float128`, vendor types)
//! are spelled as artificial structs such as `U_Float16@__clang@@`. Their
//! names are ordinary name segments, so a second `__clang`-scoped type
//! refers back to the first: `U__bf16@1@`.

use cgs_ir::{AggregateKind, AggregateName, FloatKind, IntKind, PointerWidth, Primitive};

use crate::generalize::{GeneralizedFunctionType, GeneralizedType};

const MAX_BACKREFS: usize = 10;

struct MicrosoftMangler {
    out: String,
    pointer_width: PointerWidth,
    type_backrefs: Vec<GeneralizedType>,
    name_backrefs: Vec<String>,
}

/// Encode a generalized function type as a Microsoft type name, without
/// the generalized marker.
pub fn mangle_function_type(ty: &GeneralizedFunctionType, pointer_width: PointerWidth) -> String {
    let mut mangler = MicrosoftMangler {
        out: String::from("?"),
        pointer_width,
        type_backrefs: Vec::new(),
        name_backrefs: Vec::new(),
    };
    mangler.function_type(ty);
    mangler.out
}

impl MicrosoftMangler {
    fn function_type(&mut self, ty: &GeneralizedFunctionType) {
        self.out.push_str("6A");
        self.return_type(&ty.ret);

        if !ty.prototyped {
            self.out.push('@');
        } else if ty.params.is_empty() && !ty.variadic {
            self.out.push('X');
        } else {
            for param in &ty.params {
                self.parameter(param);
            }
            self.out.push(if ty.variadic { 'Z' } else { '@' });
        }

        self.out.push('Z');
    }

    /// Tag types in return position carry an explicit (empty) qualifier.
    fn return_type(&mut self, ty: &GeneralizedType) {
        if matches!(ty, GeneralizedType::Aggregate(_)) {
            self.out.push_str("?A");
        }
        self.ty(ty);
    }

    fn parameter(&mut self, ty: &GeneralizedType) {
        if let Some(index) = self.type_backrefs.iter().position(|t| t == ty) {
            self.push_backref(index);
            return;
        }
        let before = self.out.len();
        self.ty(ty);
        if self.out.len() - before > 1 && self.type_backrefs.len() < MAX_BACKREFS {
            self.type_backrefs.push(ty.clone());
        }
    }

    fn ty(&mut self, ty: &GeneralizedType) {
        match ty {
            GeneralizedType::Primitive(prim) => match builtin(*prim) {
                Builtin::Code(code) => self.out.push_str(code),
                Builtin::Tag { name, scopes } => self.artificial_tag(name, scopes),
            },
            GeneralizedType::OpaquePointer => {
                self.out.push('P');
                if self.pointer_width == PointerWidth::Bits64 {
                    self.out.push('E');
                }
                // Unqualified `void` pointee.
                self.out.push_str("AX");
            }
            GeneralizedType::Aggregate(name) => self.aggregate(name),
            GeneralizedType::Other(name) => self.artificial_tag(name, &[CLANG_SCOPE]),
        }
    }

    fn aggregate(&mut self, name: &AggregateName) {
        self.out.push_str(match name.kind {
            AggregateKind::Struct => "U",
            AggregateKind::Class => "V",
            AggregateKind::Union => "T",
            AggregateKind::Enum => "W4",
        });
        for segment in name.path().iter().rev() {
            self.source_name(segment);
        }
        self.out.push('@');
    }

    /// A struct the compiler invents to spell a type the ABI has no code
    /// for. `scopes` are outermost first, like an aggregate path.
    fn artificial_tag(&mut self, name: &str, scopes: &[&str]) {
        self.out.push('U');
        self.source_name(name);
        for scope in scopes.iter().rev() {
            self.source_name(scope);
        }
        self.out.push('@');
    }

    fn source_name(&mut self, segment: &str) {
        if let Some(index) = self.name_backrefs.iter().position(|n| n == segment) {
            self.push_backref(index);
            return;
        }
        if self.name_backrefs.len() < MAX_BACKREFS {
            self.name_backrefs.push(segment.to_owned());
        }
        self.out.push_str(segment);
        self.out.push('@');
    }

    fn push_backref(&mut self, index: usize) {
        debug_assert!(index < MAX_BACKREFS);
        self.out.push(char::from(b'0' + index as u8));
    }
}

/// Namespace of the artificial tags that spell vendor types.
const CLANG_SCOPE: &str = "__clang";

enum Builtin {
    Code(&'static str),
    /// Encoded as an artificial struct, so its names take part in
    /// back-referencing.
    Tag {
        name: &'static str,
        scopes: &'static [&'static str],
    },
}

fn builtin(prim: Primitive) -> Builtin {
    let code = match prim {
        Primitive::Void => "X",
        Primitive::Int(kind) => match kind {
            IntKind::Bool => "_N",
            IntKind::Char => "D",
            IntKind::SignedChar => "C",
            IntKind::UnsignedChar => "E",
            IntKind::Short => "F",
            IntKind::UnsignedShort => "G",
            IntKind::Int => "H",
            IntKind::UnsignedInt => "I",
            IntKind::Long => "J",
            IntKind::UnsignedLong => "K",
            IntKind::LongLong => "_J",
            IntKind::UnsignedLongLong => "_K",
            IntKind::Int128 => "_L",
            IntKind::UnsignedInt128 => "_M",
            IntKind::WChar => "_W",
            IntKind::Char8 => "_Q",
            IntKind::Char16 => "_S",
            IntKind::Char32 => "_U",
        },
        Primitive::Float(kind) => match kind {
            FloatKind::Float16 => {
                return Builtin::Tag {
                    name: "_Float16",
                    scopes: &[CLANG_SCOPE],
                }
            }
            FloatKind::Float128 => {
                return Builtin::Tag {
                    name: "__float128",
                    scopes: &[],
                }
            }
            FloatKind::Float => "M",
            FloatKind::Double => "N",
            FloatKind::LongDouble => "O",
        },
    };
    Builtin::Code(code)
}
