//! Module IR for call-graph section metadata.
//!
//! This crate provides the data the call-graph passes operate on:
//!
//! - **Source-level types** ([`Type`], [`FunctionType`]): the formal types
//!   of functions and indirect call sites, as declared by the front-end.
//!
//! - **Module IR** ([`Module`], [`Function`], [`Instr`], [`GlobalVar`]): a
//!   flat, per-function instruction list carrying just enough structure to
//!   answer "which calls are indirect" and "where does this function's
//!   address escape".
//!
//! - **Linker groups** ([`ComdatTable`], [`Comdat`], [`ComdatSelection`]):
//!   the module-owned comdat namespace.
//!
//! - **Metadata values** ([`Signature`], [`TypeMetadata`]): the descriptors
//!   attached to functions and call instructions.
//!
//! - **Target configuration** ([`TargetConfig`]): object format, mangling
//!   scheme and pointer width, parsed from a target triple and passed
//!   explicitly to every pass.
//!
//! # Crate Dependencies
//!
//! `cgs_ir` is the leaf of the workspace. `cgs_mangle` builds signatures
//! from its types and `cgs_callgraph` mutates its modules.

pub mod builder;
mod comdat;
mod display;
mod linkage;
mod metadata;
mod module;
mod target;
mod types;

pub use builder::BodyBuilder;
pub use comdat::{Comdat, ComdatId, ComdatSelection, ComdatTable};
pub use linkage::Linkage;
pub use metadata::{ManglingScheme, Signature, TypeMetadata, GENERALIZED_SUFFIX};
pub use module::{
    Call, FuncId, Function, GlobalId, GlobalVar, InstrId, Instr, Intrinsic, Module, Operand,
    VarId,
};
pub use target::{ConfigError, ObjectFormat, PointerWidth, TargetConfig, TripleComponents};
pub use types::{
    Aggregate, AggregateKind, AggregateName, FloatKind, FunctionType, IntKind, Primitive, Type,
};
