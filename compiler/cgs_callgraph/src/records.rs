//! Call-graph records.
//!
//! The records are what a call-graph section would contain: one entry per
//! defined function and one per indirect call site. Signatures are
//! recomputed from types rather than read back from attached metadata, so
//! the records double as a check on the attacher.

use cgs_ir::{FuncId, InstrId, Module, Signature, TargetConfig};
use cgs_mangle::generalized_signature;
use rustc_hash::FxHashMap;

use crate::address_taken::{AddressTakenPolicy, AddressTakenSet};

/// The call-graph entry for a defined function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionRecord {
    pub function: FuncId,
    pub signature: Signature,
    /// Externally visible, or its address escapes.
    pub is_potential_indirect_target: bool,
    pub contains_indirect_call: bool,
}

/// The call-graph entry for an indirect call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSiteRecord {
    /// The function containing the call.
    pub caller: FuncId,
    pub instr: InstrId,
    pub signature: Signature,
}

/// All records of one module.
#[derive(Clone, Debug, Default)]
pub struct CallGraphRecords {
    pub functions: Vec<FunctionRecord>,
    pub call_sites: Vec<CallSiteRecord>,
    by_function: FxHashMap<FuncId, usize>,
}

impl CallGraphRecords {
    #[must_use]
    pub fn function(&self, id: FuncId) -> Option<&FunctionRecord> {
        self.by_function.get(&id).map(|&i| &self.functions[i])
    }

    /// Indirect call sites inside `caller`.
    pub fn call_sites_in(&self, caller: FuncId) -> impl Iterator<Item = &CallSiteRecord> {
        self.call_sites.iter().filter(move |r| r.caller == caller)
    }

    /// Potential indirect targets whose signature matches `site`.
    pub fn compatible_targets<'a>(
        &'a self,
        site: &'a CallSiteRecord,
    ) -> impl Iterator<Item = FuncId> + 'a {
        self.functions
            .iter()
            .filter(move |r| r.is_potential_indirect_target && r.signature == site.signature)
            .map(|r| r.function)
    }
}

/// Compute the records of every defined function and every indirect call.
pub fn collect_records(
    module: &Module,
    target: &TargetConfig,
    policy: &AddressTakenPolicy,
) -> CallGraphRecords {
    let taken = AddressTakenSet::compute(module, policy);
    let mut records = CallGraphRecords::default();

    for id in module.function_ids() {
        let func = module.function(id);
        if func.is_declaration() {
            continue;
        }

        records.by_function.insert(id, records.functions.len());
        records.functions.push(FunctionRecord {
            function: id,
            signature: generalized_signature(&func.ty, target),
            is_potential_indirect_target: taken.is_potential_indirect_target(module, id),
            contains_indirect_call: func.has_indirect_calls(),
        });

        for (instr, call) in func.indirect_calls() {
            records.call_sites.push(CallSiteRecord {
                caller: id,
                instr,
                signature: generalized_signature(&call.callee_ty, target),
            });
        }
    }

    tracing::debug!(
        module = %module.name,
        functions = records.functions.len(),
        call_sites = records.call_sites.len(),
        "collected call-graph records"
    );
    records
}
