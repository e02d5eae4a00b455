//! Comdat assignment.
//!
//! A function's call-graph record must be discarded together with the
//! function. Placing each function that needs a record into its own named
//! comdat makes the linker keep or drop both as a unit.
//!
//! Per function, in order:
//!
//! 1. Declarations emit no code and are skipped.
//! 2. Object formats without comdats are skipped.
//! 3. Interposable functions are skipped: the definition that survives
//!    linking may not be this one.
//! 4. Functions that are neither potential indirect targets nor contain an
//!    indirect call need no record.
//! 5. A function already in a comdat keeps it.
//! 6. Otherwise the comdat named after the function is looked up or
//!    created and attached.
//! 7. On ELF, and on COFF for functions that are not weak for the linker,
//!    the comdat's selection becomes `nodeduplicate`. Elsewhere the
//!    existing selection is left as is.

use cgs_ir::{ComdatSelection, FuncId, Module, ObjectFormat, TargetConfig};

use crate::address_taken::{AddressTakenPolicy, AddressTakenSet};

/// What the comdat pass did with one function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComdatOutcome {
    /// No code is emitted for the function in this module.
    Declaration,
    /// The target object format has no comdats.
    UnsupportedFormat,
    /// The function may be replaced at link or load time.
    Interposable,
    /// Not reachable indirectly and makes no indirect calls.
    NotEligible,
    /// The function was already in a comdat.
    AlreadyGrouped,
    /// The function was placed in a comdat with this selection.
    Assigned(ComdatSelection),
}

impl ComdatOutcome {
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

/// Run the comdat pass over every function, reporting the outcome of each
/// in function order.
pub fn assign_comdats_detailed(
    module: &mut Module,
    target: &TargetConfig,
    policy: &AddressTakenPolicy,
) -> Vec<ComdatOutcome> {
    let taken = AddressTakenSet::compute(module, policy);
    let ids: Vec<FuncId> = module.function_ids().collect();

    ids.into_iter()
        .map(|id| {
            let outcome = assign_one(module, id, target, &taken);
            tracing::trace!(function = %module.function(id).name, ?outcome, "comdat");
            outcome
        })
        .collect()
}

/// Run the comdat pass. Returns whether the module was modified.
pub fn assign_comdats(
    module: &mut Module,
    target: &TargetConfig,
    policy: &AddressTakenPolicy,
) -> bool {
    let outcomes = assign_comdats_detailed(module, target, policy);
    let assigned = outcomes.iter().filter(|o| o.changed()).count();
    tracing::debug!(
        module = %module.name,
        format = ?target.object_format(),
        assigned,
        "comdat assignment"
    );
    assigned > 0
}

fn assign_one(
    module: &mut Module,
    id: FuncId,
    target: &TargetConfig,
    taken: &AddressTakenSet,
) -> ComdatOutcome {
    let format = target.object_format();
    let func = module.function(id);

    if func.is_declaration_for_linker() {
        return ComdatOutcome::Declaration;
    }
    if !format.supports_comdat() {
        return ComdatOutcome::UnsupportedFormat;
    }
    if module.is_interposable(id) {
        return ComdatOutcome::Interposable;
    }
    if !taken.is_potential_indirect_target(module, id) && !func.has_indirect_calls() {
        return ComdatOutcome::NotEligible;
    }
    if func.comdat.is_some() {
        return ComdatOutcome::AlreadyGrouped;
    }

    assert!(!func.name.is_empty(), "cannot name a comdat after an unnamed function");
    let weak = func.is_weak_for_linker();
    let name = func.name.clone();
    let comdat = module.comdats.get_or_insert(&name);
    module.set_comdat(id, comdat);

    let entry = module.comdats.get_mut(comdat);
    if format == ObjectFormat::Elf || (format == ObjectFormat::Coff && !weak) {
        entry.selection = ComdatSelection::NoDeduplicate;
    }
    ComdatOutcome::Assigned(entry.selection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
