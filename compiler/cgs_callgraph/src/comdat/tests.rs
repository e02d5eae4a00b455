use cgs_ir::{
    BodyBuilder, ComdatSelection, FuncId, Function, FunctionType, GlobalVar, Linkage,
    ManglingScheme, Module, ObjectFormat, Operand, PointerWidth, TargetConfig, Type,
};
use pretty_assertions::assert_eq;

use super::{assign_comdats, assign_comdats_detailed, ComdatOutcome};
use crate::AddressTakenPolicy;

fn target(format: ObjectFormat) -> TargetConfig {
    let mangling = if format == ObjectFormat::Coff {
        ManglingScheme::Microsoft
    } else {
        ManglingScheme::Itanium
    };
    TargetConfig::new(format, mangling, PointerWidth::Bits64)
}

fn void_fn() -> FunctionType {
    FunctionType::new(Type::VOID, [])
}

fn single(function: Function) -> (Module, FuncId) {
    let mut module = Module::new("m");
    let id = module.add_function(function);
    (module, id)
}

fn run(module: &mut Module, format: ObjectFormat) -> Vec<ComdatOutcome> {
    assign_comdats_detailed(module, &target(format), &AddressTakenPolicy::default())
}

fn selection_of(module: &Module, id: FuncId) -> Option<ComdatSelection> {
    module.comdat_of(id).map(|c| c.selection)
}

/// A body containing one indirect call.
fn calls_through_pointer() -> Vec<cgs_ir::Instr> {
    let mut b = BodyBuilder::new();
    let fp = b.load(Operand::Null);
    b.call_void(Operand::Var(fp), vec![], void_fn());
    b.finish()
}

#[test]
fn elf_external_definition_is_nodeduplicate() {
    let (mut module, id) = single(Function::definition("foo", void_fn(), vec![]));
    assert!(assign_comdats(&mut module, &target(ObjectFormat::Elf), &AddressTakenPolicy::default()));

    let comdat = module.comdat_of(id).unwrap();
    assert_eq!(comdat.name(), "foo");
    assert_eq!(comdat.selection, ComdatSelection::NoDeduplicate);
}

#[test]
fn coff_strong_is_nodeduplicate_and_weak_keeps_any() {
    let mut module = Module::new("m");
    let strong = module.add_function(Function::definition("strong", void_fn(), vec![]));
    let weak = module.add_function(
        Function::definition("weak", void_fn(), vec![]).with_linkage(Linkage::LinkOnceOdr),
    );

    let outcomes = run(&mut module, ObjectFormat::Coff);
    assert_eq!(
        outcomes,
        vec![
            ComdatOutcome::Assigned(ComdatSelection::NoDeduplicate),
            ComdatOutcome::Assigned(ComdatSelection::Any),
        ]
    );
    assert_eq!(selection_of(&module, strong), Some(ComdatSelection::NoDeduplicate));
    assert_eq!(selection_of(&module, weak), Some(ComdatSelection::Any));
}

#[test]
fn elf_weak_odr_is_still_nodeduplicate() {
    let (mut module, id) = single(
        Function::definition("inl", void_fn(), vec![]).with_linkage(Linkage::LinkOnceOdr),
    );
    run(&mut module, ObjectFormat::Elf);
    assert_eq!(selection_of(&module, id), Some(ComdatSelection::NoDeduplicate));
}

#[test]
fn wasm_gets_default_selection() {
    let (mut module, id) = single(Function::definition("foo", void_fn(), vec![]));
    run(&mut module, ObjectFormat::Wasm);
    assert_eq!(selection_of(&module, id), Some(ComdatSelection::Any));
}

#[test]
fn formats_without_comdats_are_untouched() {
    for format in [ObjectFormat::MachO, ObjectFormat::XCoff, ObjectFormat::SpirV] {
        let (mut module, id) = single(Function::definition("foo", void_fn(), vec![]));
        assert!(!assign_comdats(&mut module, &target(format), &AddressTakenPolicy::default()));
        assert_eq!(run(&mut module, format), vec![ComdatOutcome::UnsupportedFormat]);
        assert!(module.comdats.is_empty());
        assert_eq!(module.function(id).comdat, None);
    }
}

#[test]
fn declarations_are_skipped() {
    let mut module = Module::new("m");
    module.add_function(Function::declaration("ext", void_fn()));
    module.add_function(
        Function::definition("avail", void_fn(), vec![]).with_linkage(Linkage::AvailableExternally),
    );

    assert_eq!(
        run(&mut module, ObjectFormat::Elf),
        vec![ComdatOutcome::Declaration, ComdatOutcome::Declaration]
    );
    assert!(module.comdats.is_empty());
}

#[test]
fn interposable_functions_are_skipped() {
    for linkage in [Linkage::WeakAny, Linkage::LinkOnceAny, Linkage::Common] {
        let (mut module, id) = single(Function::definition("w", void_fn(), vec![]).with_linkage(linkage));
        assert_eq!(run(&mut module, ObjectFormat::Elf), vec![ComdatOutcome::Interposable]);
        assert_eq!(module.function(id).comdat, None);
    }
}

#[test]
fn semantic_interposition_skips_preemptible_definitions() {
    let mut module = Module::new("m");
    module.semantic_interposition = true;
    module.add_function(Function::definition("preemptible", void_fn(), vec![]).with_dso_local(false));
    module.add_function(Function::definition("local", void_fn(), vec![]));

    assert_eq!(
        run(&mut module, ObjectFormat::Elf),
        vec![
            ComdatOutcome::Interposable,
            ComdatOutcome::Assigned(ComdatSelection::NoDeduplicate),
        ]
    );
}

#[test]
fn internal_function_needs_a_reason() {
    let mut module = Module::new("m");
    let quiet = module.add_function(
        Function::definition("quiet", void_fn(), vec![]).with_linkage(Linkage::Internal),
    );
    let caller = module.add_function(
        Function::definition("caller", void_fn(), calls_through_pointer())
            .with_linkage(Linkage::Internal),
    );
    let escaped = module.add_function(
        Function::definition("escaped", void_fn(), vec![]).with_linkage(Linkage::Private),
    );
    module.add_global(GlobalVar::new("table", vec![Operand::Func(escaped)]));

    let outcomes = run(&mut module, ObjectFormat::Elf);
    assert_eq!(outcomes[quiet.index()], ComdatOutcome::NotEligible);
    assert!(outcomes[caller.index()].changed());
    assert!(outcomes[escaped.index()].changed());
    assert_eq!(module.comdats.len(), 2);
}

#[test]
fn direct_calls_alone_do_not_make_internal_functions_eligible() {
    let mut module = Module::new("m");
    let helper = module.add_function(
        Function::definition("helper", void_fn(), vec![]).with_linkage(Linkage::Internal),
    );
    let mut b = BodyBuilder::new();
    b.call_direct(helper, vec![], void_fn());
    module.add_function(Function::definition("main", void_fn(), b.finish()));

    let outcomes = run(&mut module, ObjectFormat::Elf);
    assert_eq!(outcomes[helper.index()], ComdatOutcome::NotEligible);
}

#[test]
fn second_run_changes_nothing() {
    let mut module = Module::new("m");
    module.add_function(Function::definition("a", void_fn(), vec![]));
    module.add_function(Function::definition("b", void_fn(), calls_through_pointer()));
    let config = target(ObjectFormat::Elf);
    let policy = AddressTakenPolicy::default();

    assert!(assign_comdats(&mut module, &config, &policy));
    let functions = module.functions.clone();
    let comdats = module.comdats.len();

    assert!(!assign_comdats(&mut module, &config, &policy));
    assert_eq!(module.functions, functions);
    assert_eq!(module.comdats.len(), comdats);
    assert!(run(&mut module, ObjectFormat::Elf)
        .iter()
        .all(|o| *o == ComdatOutcome::AlreadyGrouped));
}

#[test]
fn existing_membership_is_kept() {
    let (mut module, id) = single(Function::definition("foo", void_fn(), vec![]));
    let group = module.comdats.get_or_insert("group");
    module.set_comdat(id, group);

    assert_eq!(run(&mut module, ObjectFormat::Elf), vec![ComdatOutcome::AlreadyGrouped]);
    assert_eq!(module.comdat_of(id).unwrap().name(), "group");
    assert_eq!(module.comdats.lookup("foo"), None);
}

#[test]
fn same_named_comdat_is_reused() {
    let mut module = Module::new("m");
    let existing = module.comdats.get_or_insert("foo");
    module.comdats.get_mut(existing).selection = ComdatSelection::Largest;
    let mut global = GlobalVar::new("foo.data", vec![]);
    global.comdat = Some(existing);
    module.add_global(global);
    let id = module.add_function(
        Function::definition("foo", void_fn(), vec![]).with_linkage(Linkage::WeakOdr),
    );

    // Weak on COFF: the existing selection is left alone.
    assert_eq!(
        run(&mut module, ObjectFormat::Coff),
        vec![ComdatOutcome::Assigned(ComdatSelection::Largest)]
    );
    assert_eq!(module.comdats.len(), 1);
    assert_eq!(module.function(id).comdat, Some(existing));
}

#[test]
#[should_panic(expected = "unnamed function")]
fn unnamed_function_is_a_contract_breach() {
    let (mut module, _) = single(Function::definition("", void_fn(), vec![]));
    run(&mut module, ObjectFormat::Elf);
}
