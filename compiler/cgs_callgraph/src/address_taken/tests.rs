use cgs_ir::{
    BodyBuilder, FuncId, Function, FunctionType, GlobalVar, IntKind, Intrinsic, Linkage, Module,
    Operand, Type,
};

use super::{has_address_taken, AddressTakenPolicy, AddressTakenSet};

fn void_fn() -> FunctionType {
    FunctionType::new(Type::VOID, [])
}

fn void_ptr() -> Type {
    Type::pointer_to(Type::VOID)
}

/// A module with one internal function `target` and an empty external
/// function `user` whose body the test fills in.
fn module_with_target() -> (Module, FuncId, FuncId) {
    let mut module = Module::new("m");
    let target = module.add_function(
        Function::definition("target", void_fn(), vec![]).with_linkage(Linkage::Internal),
    );
    let user = module.add_function(Function::definition("user", void_fn(), vec![]));
    (module, target, user)
}

fn taken(module: &Module, id: FuncId) -> bool {
    has_address_taken(module, id, &AddressTakenPolicy::default())
}

fn taken_strict(module: &Module, id: FuncId) -> bool {
    has_address_taken(module, id, &AddressTakenPolicy::strict())
}

#[test]
fn unused_function_is_not_taken() {
    let (module, target, _) = module_with_target();
    assert!(!taken(&module, target));
    assert!(!taken_strict(&module, target));
}

#[test]
fn matching_direct_call_is_not_a_use() {
    let (mut module, target, user) = module_with_target();
    let mut b = BodyBuilder::new();
    b.call_direct(target, vec![], void_fn());
    module.define(user, b.finish());

    assert!(!taken(&module, target));
    assert!(!taken_strict(&module, target));
}

#[test]
fn mismatched_direct_call_takes_address() {
    let (mut module, target, user) = module_with_target();
    let mut b = BodyBuilder::new();
    b.call_direct(target, vec![Operand::Int(1)], FunctionType::new(Type::VOID, [Type::int(IntKind::Int)]));
    module.define(user, b.finish());

    assert!(taken(&module, target));
}

#[test]
fn store_compare_and_return_take_address() {
    let builders: [fn(&mut BodyBuilder, FuncId); 3] = [
        |b: &mut BodyBuilder, f: FuncId| b.store(Operand::Func(f), Operand::Null),
        |b: &mut BodyBuilder, f: FuncId| {
            b.compare(Operand::Func(f), Operand::Null);
        },
        |b: &mut BodyBuilder, f: FuncId| b.ret(Some(Operand::Func(f))),
    ];
    for build in builders {
        let (mut module, target, user) = module_with_target();
        let mut b = BodyBuilder::new();
        build(&mut b, target);
        module.define(user, b.finish());
        assert!(taken(&module, target));
    }
}

#[test]
fn indirect_call_through_loaded_pointer_takes_address() {
    let (mut module, target, user) = module_with_target();
    let mut b = BodyBuilder::new();
    let fp = b.copy(Operand::Func(target));
    b.call_void(Operand::Var(fp), vec![], void_fn());
    module.define(user, b.finish());

    assert!(taken(&module, target));
}

#[test]
fn callback_argument_follows_policy() {
    let (mut module, target, user) = module_with_target();
    let spawn_ty = FunctionType::new(Type::int(IntKind::Int), [void_ptr(), void_ptr(), void_ptr()]);
    let spawn = module.add_function(Function::declaration("spawn", spawn_ty.clone()).with_callback_param(1));

    let mut b = BodyBuilder::new();
    b.call(
        Operand::Func(spawn),
        vec![Operand::Null, Operand::Func(target), Operand::Null],
        spawn_ty,
    );
    module.define(user, b.finish());

    assert!(!taken(&module, target));
    assert!(taken_strict(&module, target));
    let policy = AddressTakenPolicy::default().with_ignore_callback_uses(false);
    assert!(has_address_taken(&module, target, &policy));
}

#[test]
fn non_callback_position_takes_address() {
    let (mut module, target, user) = module_with_target();
    let spawn_ty = FunctionType::new(Type::VOID, [void_ptr(), void_ptr()]);
    let spawn = module.add_function(Function::declaration("spawn", spawn_ty.clone()).with_callback_param(0));

    let mut b = BodyBuilder::new();
    b.call_direct(spawn, vec![Operand::Null, Operand::Func(target)], spawn_ty);
    module.define(user, b.finish());

    assert!(taken(&module, target));
}

#[test]
fn argument_to_indirect_call_takes_address() {
    let (mut module, target, user) = module_with_target();
    let ty = FunctionType::new(Type::VOID, [void_ptr()]);
    let mut b = BodyBuilder::new();
    let fp = b.load(Operand::Null);
    b.call_void(Operand::Var(fp), vec![Operand::Func(target)], ty);
    module.define(user, b.finish());

    assert!(taken(&module, target));
}

#[test]
fn assume_like_intrinsics_follow_policy() {
    let (mut module, target, user) = module_with_target();
    let mut b = BodyBuilder::new();
    b.intrinsic(Intrinsic::Assume, vec![Operand::Func(target)]);
    b.intrinsic(Intrinsic::DbgValue, vec![Operand::Func(target)]);
    module.define(user, b.finish());

    assert!(!taken(&module, target));
    assert!(taken_strict(&module, target));
}

#[test]
fn memory_intrinsics_take_address() {
    let (mut module, target, user) = module_with_target();
    let mut b = BodyBuilder::new();
    b.intrinsic(Intrinsic::Memcpy, vec![Operand::Null, Operand::Func(target), Operand::Int(8)]);
    module.define(user, b.finish());

    assert!(taken(&module, target));
}

#[test]
fn global_initializer_takes_address() {
    let (mut module, target, _) = module_with_target();
    module.add_global(GlobalVar::new("table", vec![Operand::Func(target), Operand::Null]));

    assert!(taken(&module, target));
}

#[test]
fn retained_list_follows_policy() {
    let (mut module, target, _) = module_with_target();
    module.retained.push(Operand::Func(target));

    assert!(taken(&module, target));
    let policy = AddressTakenPolicy::default().with_ignore_retained_symbol_uses(true);
    assert!(!has_address_taken(&module, target, &policy));
}

#[test]
fn set_matches_single_queries() {
    let (mut module, target, user) = module_with_target();
    let other = module.add_function(
        Function::definition("other", void_fn(), vec![]).with_linkage(Linkage::Private),
    );
    let mut b = BodyBuilder::new();
    b.store(Operand::Func(other), Operand::Null);
    b.call_direct(target, vec![], void_fn());
    module.define(user, b.finish());

    let set = AddressTakenSet::compute(&module, &AddressTakenPolicy::default());
    assert_eq!(set.len(), 1);
    assert!(set.contains(other));
    assert!(!set.contains(target));
    for id in module.function_ids() {
        assert_eq!(set.contains(id), taken(&module, id));
    }
}

#[test]
fn potential_indirect_targets() {
    let (mut module, target, user) = module_with_target();
    let set = AddressTakenSet::compute(&module, &AddressTakenPolicy::default());
    assert!(set.is_empty());
    // External linkage alone makes a function reachable from elsewhere.
    assert!(set.is_potential_indirect_target(&module, user));
    assert!(!set.is_potential_indirect_target(&module, target));

    module.globals.push(GlobalVar::new("fp", vec![Operand::Func(target)]));
    let set = AddressTakenSet::compute(&module, &AddressTakenPolicy::default());
    assert!(set.is_potential_indirect_target(&module, target));
}
