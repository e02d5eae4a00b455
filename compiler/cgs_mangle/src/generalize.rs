//! Type generalization.
//!
//! Rewrites a formal function type into the coarse shape that call-graph
//! signatures are built from:
//!
//! | Formal type | Generalized |
//! |-------------|-------------|
//! | primitive | unchanged |
//! | `T*` for any `T` (including `T**`, `struct S*`, function pointers) | opaque pointer |
//! | `struct S` by value | `struct S`, members dropped |
//! | vendor type | unchanged |
//!
//! Pointees are never visited, so generalization is total and does not
//! recurse beyond one level.

use cgs_ir::{AggregateName, FunctionType, Primitive, Type};
use smallvec::SmallVec;

/// A formal type with pointee information erased.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeneralizedType {
    Primitive(Primitive),
    /// Any pointer, regardless of what it points to.
    OpaquePointer,
    /// A by-value aggregate, identified by its qualified name only.
    Aggregate(AggregateName),
    Other(String),
}

/// A function type built from [`GeneralizedType`]s.
///
/// Two formal function types that differ only in the pointees of their
/// pointer components generalize to equal values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneralizedFunctionType {
    pub ret: GeneralizedType,
    pub params: SmallVec<[GeneralizedType; 4]>,
    pub variadic: bool,
    pub prototyped: bool,
}

/// Generalize a single type.
pub fn generalize_type(ty: &Type) -> GeneralizedType {
    match ty {
        Type::Primitive(prim) => GeneralizedType::Primitive(*prim),
        Type::Pointer(_) => GeneralizedType::OpaquePointer,
        Type::Aggregate(agg) => GeneralizedType::Aggregate(agg.name.clone()),
        Type::Other(name) => GeneralizedType::Other(name.clone()),
    }
}

/// Generalize the return and parameter types of a function type.
pub fn generalize_function(ty: &FunctionType) -> GeneralizedFunctionType {
    GeneralizedFunctionType {
        ret: generalize_type(&ty.ret),
        params: ty.params.iter().map(generalize_type).collect(),
        variadic: ty.variadic,
        prototyped: ty.prototyped,
    }
}
