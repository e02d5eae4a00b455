//! Itanium C++ ABI encoding of generalized function types.
//!
//! Produces the RTTI type-name form (`_ZTS <type>`) of a function type:
//!
//! ```text
//! <function-type> ::= F <return-type> <bare-function-type> E
//! <bare-function-type> ::= <param-type>+      # v for "(void)", z for "..."
//! ```
//!
//! Only the productions reachable from a [`GeneralizedFunctionType`] are
//! implemented: builtin codes, `Pv` for the opaque pointer, `<source-name>`
//! and `N ... E` nested names for aggregates, and `u <source-name>` for
//! vendor types.
//!
//! # Substitutions
//!
//! Every non-builtin component is a substitution candidate, numbered in
//! order of first appearance. A repeat is written as `S_`, `S0_`, `S1_`, ...
//! (sequence IDs in base 36), which is why three pointer parameters after a
//! pointer return type encode as `PvS_S_S_`.

use std::fmt::Write;

use cgs_ir::{AggregateName, FloatKind, IntKind, Primitive};
use rustc_hash::FxHashMap;

use crate::generalize::{GeneralizedFunctionType, GeneralizedType};

/// RTTI type-name prefix.
const TYPE_NAME_PREFIX: &str = "_ZTS";

/// Substitution candidates. Aggregate names and their nested-name prefixes
/// share one key space: a prefix `ns` and a type `ns` are the same entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Candidate {
    OpaquePointer,
    Name(Vec<String>),
    Vendor(String),
}

#[derive(Default)]
struct ItaniumMangler {
    out: String,
    substitutions: FxHashMap<Candidate, usize>,
}

/// Encode a generalized function type as an Itanium type name, without
/// the generalized marker.
pub fn mangle_function_type(ty: &GeneralizedFunctionType) -> String {
    let mut mangler = ItaniumMangler::default();
    mangler.out.push_str(TYPE_NAME_PREFIX);
    mangler.function_type(ty);
    mangler.out
}

impl ItaniumMangler {
    fn function_type(&mut self, ty: &GeneralizedFunctionType) {
        self.out.push('F');
        self.ty(&ty.ret);
        // An unprototyped type says nothing about its parameters.
        if ty.prototyped {
            if ty.params.is_empty() && !ty.variadic {
                self.out.push('v');
            }
            for param in &ty.params {
                self.ty(param);
            }
            if ty.variadic {
                self.out.push('z');
            }
        }
        self.out.push('E');
    }

    fn ty(&mut self, ty: &GeneralizedType) {
        match ty {
            GeneralizedType::Primitive(prim) => self.out.push_str(builtin_code(*prim)),
            GeneralizedType::OpaquePointer => {
                if !self.try_substitute(&Candidate::OpaquePointer) {
                    self.out.push_str("Pv");
                    self.add_substitution(Candidate::OpaquePointer);
                }
            }
            GeneralizedType::Aggregate(name) => self.aggregate_name(name),
            GeneralizedType::Other(name) => {
                let candidate = Candidate::Vendor(name.clone());
                if !self.try_substitute(&candidate) {
                    self.out.push('u');
                    self.source_name(name);
                    self.add_substitution(candidate);
                }
            }
        }
    }

    fn aggregate_name(&mut self, name: &AggregateName) {
        let candidate = Candidate::Name(name.path().to_vec());
        if self.try_substitute(&candidate) {
            return;
        }
        match name.split_innermost() {
            (last, []) => self.source_name(last),
            (last, scope) => {
                self.out.push('N');
                self.prefix(scope);
                self.source_name(last);
                self.out.push('E');
            }
        }
        self.add_substitution(candidate);
    }

    /// `<prefix> ::= <prefix> <source-name> | <substitution>`
    fn prefix(&mut self, scope: &[String]) {
        let candidate = Candidate::Name(scope.to_vec());
        if self.try_substitute(&candidate) {
            return;
        }
        if let Some((last, outer)) = scope.split_last() {
            if !outer.is_empty() {
                self.prefix(outer);
            }
            self.source_name(last);
        }
        self.add_substitution(candidate);
    }

    /// `<source-name> ::= <positive length number> <identifier>`
    fn source_name(&mut self, name: &str) {
        let _ = write!(self.out, "{}{name}", name.len());
    }

    fn try_substitute(&mut self, candidate: &Candidate) -> bool {
        let Some(&seq) = self.substitutions.get(candidate) else {
            return false;
        };
        self.out.push('S');
        if seq > 0 {
            push_base36(&mut self.out, seq - 1);
        }
        self.out.push('_');
        true
    }

    fn add_substitution(&mut self, candidate: Candidate) {
        let seq = self.substitutions.len();
        self.substitutions.entry(candidate).or_insert(seq);
    }
}

/// Append `n` in base 36 with digits `0-9A-Z`.
fn push_base36(out: &mut String, mut n: usize) {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut buf = [0u8; 16];
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = DIGITS[n % 36];
        n /= 36;
        if n == 0 {
            break;
        }
    }
    for &b in &buf[pos..] {
        out.push(char::from(b));
    }
}

fn builtin_code(prim: Primitive) -> &'static str {
    match prim {
        Primitive::Void => "v",
        Primitive::Int(kind) => match kind {
            IntKind::Bool => "b",
            IntKind::Char => "c",
            IntKind::SignedChar => "a",
            IntKind::UnsignedChar => "h",
            IntKind::Short => "s",
            IntKind::UnsignedShort => "t",
            IntKind::Int => "i",
            IntKind::UnsignedInt => "j",
            IntKind::Long => "l",
            IntKind::UnsignedLong => "m",
            IntKind::LongLong => "x",
            IntKind::UnsignedLongLong => "y",
            IntKind::Int128 => "n",
            IntKind::UnsignedInt128 => "o",
            IntKind::WChar => "w",
            IntKind::Char8 => "Du",
            IntKind::Char16 => "Ds",
            IntKind::Char32 => "Di",
        },
        Primitive::Float(kind) => match kind {
            FloatKind::Float16 => "DF16_",
            FloatKind::Float => "f",
            FloatKind::Double => "d",
            FloatKind::LongDouble => "e",
            FloatKind::Float128 => "g",
        },
    }
}
