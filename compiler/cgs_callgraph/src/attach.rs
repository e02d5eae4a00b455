//! Metadata attachment.
//!
//! Every function receives a function-level descriptor for its declared
//! type at offset 0; every indirect call receives a call-site descriptor
//! for the callee type it expects. Direct calls are left alone: their
//! target is already known to the call graph.

use cgs_ir::{Function, Module, TargetConfig, TypeMetadata};
use cgs_mangle::generalized_signature;

/// Descriptors attached by one run of [`attach_type_metadata`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachStats {
    /// Function-level descriptors newly attached.
    pub functions: usize,
    /// Call-site descriptors newly attached.
    pub call_sites: usize,
}

impl AttachStats {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions == 0 && self.call_sites == 0
    }
}

/// Attach generalized type descriptors to every function and every
/// indirect call in `module`.
///
/// Additive and idempotent: existing descriptors are kept, and a function
/// or call that already carries the descriptor is not given a second one.
pub fn attach_type_metadata(module: &mut Module, target: &TargetConfig) -> AttachStats {
    let mut stats = AttachStats::default();

    for func in &mut module.functions {
        if attach_to_function(func, target) {
            stats.functions += 1;
        }
        stats.call_sites += attach_to_call_sites(func, target);
    }

    tracing::debug!(
        module = %module.name,
        functions = stats.functions,
        call_sites = stats.call_sites,
        "attached type metadata"
    );
    stats
}

fn attach_to_function(func: &mut Function, target: &TargetConfig) -> bool {
    let descriptor = TypeMetadata::function(generalized_signature(&func.ty, target));
    if func.type_metadata.contains(&descriptor) {
        return false;
    }
    tracing::trace!(function = %func.name, signature = %descriptor.signature, "function descriptor");
    func.type_metadata.push(descriptor);
    true
}

fn attach_to_call_sites(func: &mut Function, target: &TargetConfig) -> usize {
    let Some(body) = func.body.as_mut() else {
        return 0;
    };

    let mut attached = 0;
    for call in body.iter_mut().filter_map(|instr| instr.as_call_mut()) {
        if !call.is_indirect() || call.type_metadata.is_some() {
            continue;
        }
        let signature = generalized_signature(&call.callee_ty, target);
        tracing::trace!(function = %func.name, signature = %signature, "call-site descriptor");
        call.type_metadata = Some(TypeMetadata::call_site(signature));
        attached += 1;
    }
    attached
}
