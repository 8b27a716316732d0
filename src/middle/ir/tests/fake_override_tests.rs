//! 伪覆盖解析测试

use crate::middle::ir::*;

#[test]
fn test_non_fake_resolves_to_itself() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app").unwrap();
    let file = b.file(module, "app", "main.yx").unwrap();
    let f = b.function(file, "f").unwrap();
    assert_eq!(resolve_fake_override(&arena, f).unwrap(), Some(f));
}

#[test]
fn test_fake_override_chain() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app").unwrap();
    let file = b.file(module, "app", "main.yx").unwrap();

    let a = b
        .class_with(file, "A", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    let a_m = b
        .function_with(
            a,
            "m",
            FunctionOptions {
                modality: Modality::Open,
                ..FunctionOptions::default()
            },
        )
        .unwrap();
    let bb = b
        .class_with(file, "B", ClassKind::Class, Modality::Open, &[a])
        .unwrap();
    let b_m = b.fake_override(bb, "m", &[a_m]).unwrap();
    let c = b
        .class_with(file, "C", ClassKind::Class, Modality::Final, &[bb])
        .unwrap();
    let c_m = b.fake_override(c, "m", &[b_m]).unwrap();

    assert_eq!(resolve_fake_override(&arena, c_m).unwrap(), Some(a_m));
    assert_eq!(collect_real_overrides(&arena, c_m, false).unwrap(), vec![a_m]);
}

#[test]
fn test_prefers_class_implementation_over_interface() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app").unwrap();
    let file = b.file(module, "app", "main.yx").unwrap();

    let i = b
        .class_with(file, "I", ClassKind::Interface, Modality::Abstract, &[])
        .unwrap();
    let i_m = b
        .function_with(
            i,
            "m",
            FunctionOptions {
                modality: Modality::Open,
                ..FunctionOptions::default()
            },
        )
        .unwrap();
    let base = b
        .class_with(file, "Base", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    let base_m = b.override_function(base, "m", &[]).unwrap();
    let d = b
        .class_with(file, "D", ClassKind::Class, Modality::Final, &[base, i])
        .unwrap();
    let d_m = b.fake_override(d, "m", &[i_m, base_m]).unwrap();

    assert_eq!(resolve_fake_override(&arena, d_m).unwrap(), Some(base_m));
}

#[test]
fn test_abstract_only_resolves_to_none() {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app").unwrap();
    let file = b.file(module, "app", "main.yx").unwrap();

    let a = b
        .class_with(file, "A", ClassKind::Class, Modality::Abstract, &[])
        .unwrap();
    let a_m = b
        .function_with(
            a,
            "m",
            FunctionOptions {
                modality: Modality::Abstract,
                ..FunctionOptions::default()
            },
        )
        .unwrap();
    let c = b
        .class_with(file, "C", ClassKind::Class, Modality::Abstract, &[a])
        .unwrap();
    let c_m = b.fake_override(c, "m", &[a_m]).unwrap();

    assert_eq!(resolve_fake_override(&arena, c_m).unwrap(), None);
    assert_eq!(collect_real_overrides(&arena, c_m, true).unwrap(), vec![a_m]);
}
