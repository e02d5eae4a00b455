//! Address-taken analysis.
//!
//! A function whose address is observed anywhere other than as the callee
//! of a matching direct call may be reached through an indirect call, and
//! so needs call-graph metadata.
//!
//! # Policy
//!
//! Some uses of a function's address never let it flow to an indirect call,
//! and some do so in ways the verifier already accounts for. Which of these
//! are ignored is configurable through [`AddressTakenPolicy`]:
//!
//! | Use | Default | [`strict`](AddressTakenPolicy::strict) |
//! |-----|---------|--------|
//! | callee of a direct call with the function's own type | ignored | ignored |
//! | callee of a direct call with a different type | taken | taken |
//! | argument in a broker's declared callback position | ignored | taken |
//! | operand of an assume-like intrinsic | ignored | taken |
//! | entry in the retained-symbols list | taken | taken |
//! | anything else (store, compare, return, plain argument, global initializer, indirect callee) | taken | taken |
//!
//! Ignoring retained-symbol uses is opt-in: a symbol kept alive by that
//! list is by construction reachable by means the compiler cannot see.

use cgs_ir::{Call, FuncId, Instr, Module, Operand};
use rustc_hash::FxHashSet;

/// Which uses of a function's address do not count as escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressTakenPolicy {
    /// Ignore uses as an argument in a parameter position the callee
    /// declares as a callback.
    pub ignore_callback_uses: bool,
    /// Ignore operands of assume-like intrinsics.
    pub ignore_assume_like_uses: bool,
    /// Ignore appearances in the module's retained-symbols list.
    pub ignore_retained_symbol_uses: bool,
}

impl Default for AddressTakenPolicy {
    fn default() -> Self {
        Self {
            ignore_callback_uses: true,
            ignore_assume_like_uses: true,
            ignore_retained_symbol_uses: false,
        }
    }
}

impl AddressTakenPolicy {
    /// Every use other than a matching direct call counts as escaping.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            ignore_callback_uses: false,
            ignore_assume_like_uses: false,
            ignore_retained_symbol_uses: false,
        }
    }

    #[must_use]
    pub fn with_ignore_callback_uses(mut self, ignore: bool) -> Self {
        self.ignore_callback_uses = ignore;
        self
    }

    #[must_use]
    pub fn with_ignore_assume_like_uses(mut self, ignore: bool) -> Self {
        self.ignore_assume_like_uses = ignore;
        self
    }

    #[must_use]
    pub fn with_ignore_retained_symbol_uses(mut self, ignore: bool) -> Self {
        self.ignore_retained_symbol_uses = ignore;
        self
    }
}

/// The set of functions whose address escapes, computed in one scan of
/// the module.
#[derive(Debug, Clone, Default)]
pub struct AddressTakenSet {
    taken: FxHashSet<FuncId>,
}

impl AddressTakenSet {
    /// Scan every instruction, global initializer and the retained-symbols
    /// list of `module`.
    pub fn compute(module: &Module, policy: &AddressTakenPolicy) -> Self {
        let mut taken = FxHashSet::default();

        for func in &module.functions {
            for instr in func.instrs() {
                collect_instr(module, instr, policy, &mut taken);
            }
        }
        for global in &module.globals {
            taken.extend(func_operands(&global.initializer));
        }
        if !policy.ignore_retained_symbol_uses {
            taken.extend(func_operands(&module.retained));
        }

        tracing::trace!(module = %module.name, count = taken.len(), "address-taken functions");
        Self { taken }
    }

    #[must_use]
    pub fn contains(&self, id: FuncId) -> bool {
        self.taken.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    /// Externally visible, or address escapes: the function may be reached
    /// by an indirect call.
    #[must_use]
    pub fn is_potential_indirect_target(&self, module: &Module, id: FuncId) -> bool {
        !module.function(id).has_local_linkage() || self.contains(id)
    }
}

/// Whether `id`'s address escapes under `policy`.
///
/// Computes the full set; when querying many functions, build an
/// [`AddressTakenSet`] once instead.
pub fn has_address_taken(module: &Module, id: FuncId, policy: &AddressTakenPolicy) -> bool {
    AddressTakenSet::compute(module, policy).contains(id)
}

fn func_operands(ops: &[Operand]) -> impl Iterator<Item = FuncId> + '_ {
    ops.iter().filter_map(|op| match op {
        Operand::Func(id) => Some(*id),
        _ => None,
    })
}

fn collect_instr(
    module: &Module,
    instr: &Instr,
    policy: &AddressTakenPolicy,
    taken: &mut FxHashSet<FuncId>,
) {
    match instr {
        Instr::Call(call) => collect_call(module, call, policy, taken),
        Instr::Intrinsic { intrinsic, args } => {
            if !(policy.ignore_assume_like_uses && intrinsic.is_assume_like()) {
                taken.extend(func_operands(args));
            }
        }
        other => taken.extend(func_operands(&other.operands())),
    }
}

fn collect_call(
    module: &Module,
    call: &Call,
    policy: &AddressTakenPolicy,
    taken: &mut FxHashSet<FuncId>,
) {
    if let Some(callee) = call.direct_callee() {
        // Calling through a mismatched type treats the symbol as a pointer.
        if call.callee_ty != module.function(callee).ty {
            taken.insert(callee);
        }
    }

    let callbacks = call
        .direct_callee()
        .map(|broker| module.function(broker).callback_params.as_slice())
        .unwrap_or_default();

    for (index, arg) in call.args.iter().enumerate() {
        let Operand::Func(id) = *arg else {
            continue;
        };
        let is_callback = u32::try_from(index).is_ok_and(|i| callbacks.contains(&i));
        if !(policy.ignore_callback_uses && is_callback) {
            taken.insert(id);
        }
    }
}

#[cfg(test)]
mod tests;
