use cgs_ir::{
    FloatKind, FunctionType, IntKind, ManglingScheme, ObjectFormat, PointerWidth, TargetConfig,
    Type,
};
use pretty_assertions::assert_eq;

use crate::{encode_signature, generalize_function, generalized_signature};

fn itanium() -> TargetConfig {
    TargetConfig::new(ObjectFormat::Elf, ManglingScheme::Itanium, PointerWidth::Bits64)
}

fn microsoft() -> TargetConfig {
    TargetConfig::new(ObjectFormat::Coff, ManglingScheme::Microsoft, PointerWidth::Bits64)
}

#[test]
fn suffix_and_scheme_tag() {
    let ty = FunctionType::unprototyped(Type::VOID);
    let sig = generalized_signature(&ty, &itanium());
    assert_eq!(sig.as_str(), "_ZTSFvE.generalized");
    assert_eq!(sig.type_name(), "_ZTSFvE");
    assert_eq!(sig.scheme(), ManglingScheme::Itanium);

    let sig = encode_signature(&generalize_function(&ty), &microsoft());
    assert_eq!(sig.as_str(), "?6AX@Z.generalized");
    assert_eq!(sig.scheme(), ManglingScheme::Microsoft);
}

#[test]
fn void_and_all_pointer_functions_differ() {
    let void_fn = FunctionType::new(Type::VOID, []);
    let ptr_fn = FunctionType::new(
        Type::pointer_to(Type::VOID),
        [Type::pointer_to(Type::int(IntKind::Int))],
    );
    for target in [itanium(), microsoft()] {
        assert_ne!(
            generalized_signature(&void_fn, &target),
            generalized_signature(&ptr_fn, &target)
        );
    }
}

#[test]
fn arity_is_significant() {
    let one = FunctionType::new(Type::VOID, [Type::pointer_to(Type::VOID)]);
    let two = FunctionType::new(
        Type::VOID,
        [Type::pointer_to(Type::VOID), Type::pointer_to(Type::VOID)],
    );
    for target in [itanium(), microsoft()] {
        assert_ne!(
            generalized_signature(&one, &target),
            generalized_signature(&two, &target)
        );
    }
}

#[test]
fn primitive_kinds_are_significant() {
    let baz = FunctionType::new(
        Type::int(IntKind::Int),
        [
            Type::int(IntKind::Char),
            Type::float(FloatKind::Float),
            Type::float(FloatKind::Double),
        ],
    );
    let baz2 = FunctionType::new(
        Type::int(IntKind::Int),
        [
            Type::int(IntKind::Char),
            Type::int(IntKind::Char),
            Type::int(IntKind::Char),
        ],
    );
    for target in [itanium(), microsoft()] {
        assert_ne!(
            generalized_signature(&baz, &target),
            generalized_signature(&baz2, &target)
        );
    }
}

// === Property tests ===

#[allow(
    clippy::disallowed_types,
    reason = "proptest macros internally use Arc"
)]
mod proptest_signatures {
    use cgs_ir::{FloatKind, FunctionType, IntKind, Type};
    use proptest::prelude::*;

    use super::{itanium, microsoft};
    use crate::generalized_signature;

    const INT_KINDS: [IntKind; 18] = [
        IntKind::Bool,
        IntKind::Char,
        IntKind::SignedChar,
        IntKind::UnsignedChar,
        IntKind::Short,
        IntKind::UnsignedShort,
        IntKind::Int,
        IntKind::UnsignedInt,
        IntKind::Long,
        IntKind::UnsignedLong,
        IntKind::LongLong,
        IntKind::UnsignedLongLong,
        IntKind::Int128,
        IntKind::UnsignedInt128,
        IntKind::WChar,
        IntKind::Char8,
        IntKind::Char16,
        IntKind::Char32,
    ];

    const FLOAT_KINDS: [FloatKind; 5] = [
        FloatKind::Float16,
        FloatKind::Float,
        FloatKind::Double,
        FloatKind::LongDouble,
        FloatKind::Float128,
    ];

    fn primitive() -> impl Strategy<Value = Type> {
        prop_oneof![
            prop::sample::select(INT_KINDS.to_vec()).prop_map(Type::int),
            prop::sample::select(FLOAT_KINDS.to_vec()).prop_map(Type::float),
        ]
    }

    /// Any type, used as a pointee.
    fn pointee() -> impl Strategy<Value = Type> {
        prop_oneof![primitive(), Just(Type::VOID)].prop_recursive(3, 12, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(Type::pointer_to),
                (
                    prop::sample::select(vec!["st1", "st2", "node"]),
                    prop::collection::vec(inner, 0..3)
                )
                    .prop_map(|(name, members)| Type::named_struct(name, members)),
            ]
        })
    }

    /// A parameter position: either a fixed by-value type, or a pointer
    /// whose pointee differs between the two functions under comparison.
    #[derive(Clone, Debug)]
    enum Slot {
        Value(Type),
        Pointer(Type, Type),
    }

    fn slot() -> impl Strategy<Value = Slot> {
        prop_oneof![
            primitive().prop_map(Slot::Value),
            prop::sample::select(vec!["st1", "st2"])
                .prop_map(|name| Slot::Value(Type::named_struct(name, vec![]))),
            (pointee(), pointee()).prop_map(|(a, b)| Slot::Pointer(a, b)),
        ]
    }

    fn pick(slot: &Slot, first: bool) -> Type {
        match slot {
            Slot::Value(ty) => ty.clone(),
            Slot::Pointer(a, b) => Type::pointer_to(if first { a.clone() } else { b.clone() }),
        }
    }

    fn twins(ret: &Slot, params: &[Slot]) -> (FunctionType, FunctionType) {
        let make = |first| FunctionType::new(pick(ret, first), params.iter().map(|s| pick(s, first)));
        (make(true), make(false))
    }

    proptest! {
        #[test]
        fn pointee_types_never_affect_signature(
            ret in slot(),
            params in prop::collection::vec(slot(), 0..6),
        ) {
            let (f, g) = twins(&ret, &params);
            for target in [itanium(), microsoft()] {
                prop_assert_eq!(
                    generalized_signature(&f, &target),
                    generalized_signature(&g, &target)
                );
            }
        }

        #[test]
        fn distinct_primitive_lists_never_merge(
            a in prop::collection::vec(primitive(), 0..5),
            b in prop::collection::vec(primitive(), 0..5),
        ) {
            prop_assume!(a != b);
            let f = FunctionType::new(Type::VOID, a);
            let g = FunctionType::new(Type::VOID, b);
            for target in [itanium(), microsoft()] {
                prop_assert_ne!(
                    generalized_signature(&f, &target),
                    generalized_signature(&g, &target)
                );
            }
        }

        #[test]
        fn distinct_aggregate_names_never_merge(
            a in "[a-z_][a-z0-9_]{0,8}",
            b in "[a-z_][a-z0-9_]{0,8}",
        ) {
            prop_assume!(a != b);
            let f = FunctionType::new(Type::VOID, [Type::named_struct(a, vec![])]);
            let g = FunctionType::new(Type::VOID, [Type::named_struct(b, vec![])]);
            for target in [itanium(), microsoft()] {
                prop_assert_ne!(
                    generalized_signature(&f, &target),
                    generalized_signature(&g, &target)
                );
            }
        }
    }
}
