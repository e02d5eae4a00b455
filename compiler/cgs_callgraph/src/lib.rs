//! Call-graph section passes.
//!
//! Two passes prepare a module for call-graph verification:
//!
//! - [`attach_type_metadata`] records, for every function and every indirect
//!   call, the generalized signature of its type. An indirect call may only
//!   reach functions with an equal signature.
//!
//! - [`assign_comdats`] places every function that may need a call-graph
//!   record into a comdat named after it, so the linker discards the record
//!   whenever it discards the function.
//!
//! [`run_call_graph_pipeline`] runs both, gated on [`CallGraphConfig`];
//! [`run_on_modules`] does so for many independent modules in parallel.
//! [`collect_records`] computes what the emitted section would contain.
//!
//! # Debugging
//!
//! Call [`init_tracing`] and set `RUST_LOG=cgs_callgraph=debug` for a
//! summary per pass, or `RUST_LOG=cgs_callgraph=trace,cgs_mangle=trace` for
//! every signature and comdat decision.

mod address_taken;
mod attach;
mod comdat;
mod pipeline;
mod records;

use std::sync::Once;

pub use address_taken::{has_address_taken, AddressTakenPolicy, AddressTakenSet};
pub use attach::{attach_type_metadata, AttachStats};
pub use comdat::{assign_comdats, assign_comdats_detailed, ComdatOutcome};
pub use pipeline::{run_call_graph_pipeline, run_on_modules, CallGraphConfig, PreservedAnalyses};
pub use records::{collect_records, CallGraphRecords, CallSiteRecord, FunctionRecord};

static TRACING_INIT: Once = Once::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Only the first call has any effect, and only when `RUST_LOG` is set and
/// parses. A subscriber installed elsewhere beforehand is left in place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Ok(filter) = EnvFilter::try_from_default_env() else {
            return;
        };
        let installed = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .try_init()
            .is_ok();
        tracing::debug!(installed, "call-graph tracing");
    });
}
