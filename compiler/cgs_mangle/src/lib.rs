//! Generalized type signatures for call-graph metadata.
//!
//! A generalized signature identifies a function *shape*: it keeps arity,
//! primitive kinds and by-value aggregate names, and erases everything a
//! pointer points to. Indirect call sites and potential targets with equal
//! signatures are compatible; the downstream call-graph verifier only needs
//! string equality.
//!
//! Two stages, both pure:
//!
//! 1. [`generalize_function`] maps a [`FunctionType`] to a
//!    [`GeneralizedFunctionType`].
//! 2. [`encode_signature`] renders it with the target's C++ ABI mangling
//!    ([`itanium`] or [`microsoft`]) and appends
//!    [`GENERALIZED_SUFFIX`](cgs_ir::GENERALIZED_SUFFIX).
//!
//! | Declaration | Itanium | Microsoft (64-bit) |
//! |-------------|---------|--------------------|
//! | `void f()` | `_ZTSFvE.generalized` | `?6AX@Z.generalized` |
//! | `int f(char, float, double)` | `_ZTSFicfdE.generalized` | `?6AHDMN@Z.generalized` |
//! | `int *f(char *, float *, double *)` | `_ZTSFPvS_S_S_E.generalized` | `?6APEAXPEAX00@Z.generalized` |
//! | `void f(struct st2, struct st2 *)` | `_ZTSFv3st2PvE.generalized` | `?6AXUst2@@PEAX@Z.generalized` |

mod generalize;
pub mod itanium;
pub mod microsoft;

use cgs_ir::{FunctionType, ManglingScheme, Signature, TargetConfig, GENERALIZED_SUFFIX};

pub use generalize::{generalize_function, generalize_type, GeneralizedFunctionType, GeneralizedType};

/// Render a generalized function type as a signature for `target`.
///
/// Never fails: every primitive kind, aggregate name and vendor type has an
/// encoding in both schemes.
pub fn encode_signature(ty: &GeneralizedFunctionType, target: &TargetConfig) -> Signature {
    let mut mangled = match target.mangling() {
        ManglingScheme::Itanium => itanium::mangle_function_type(ty),
        ManglingScheme::Microsoft => microsoft::mangle_function_type(ty, target.pointer_width()),
    };
    mangled.push_str(GENERALIZED_SUFFIX);
    tracing::trace!(scheme = %target.mangling(), signature = %mangled, "encoded signature");
    Signature::new(target.mangling(), mangled)
}

/// Generalize and encode a formal function type in one step.
pub fn generalized_signature(ty: &FunctionType, target: &TargetConfig) -> Signature {
    encode_signature(&generalize_function(ty), target)
}

#[cfg(test)]
mod tests;
