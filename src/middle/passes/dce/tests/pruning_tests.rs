//! 剪枝测试

use crate::middle::ir::*;

use super::*;

fn names(
    arena: &IrArena,
    container: NodeId,
) -> Vec<String> {
    arena
        .declarations(container)
        .unwrap()
        .iter()
        .map(|d| arena.data(*d).unwrap().name().unwrap().to_string())
        .collect()
}

#[test]
fn test_prune_preserves_order() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let f1 = b.function(file, "f1").unwrap();
    b.function(file, "f2").unwrap();
    let f3 = b.function(file, "f3").unwrap();
    b.export(f1).unwrap();
    b.export(f3).unwrap();

    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert_eq!(arena.declarations(file).unwrap(), &[f1, f3]);
    assert_eq!(report.removed, vec!["app.f2".to_string()]);
    assert!(report.released_nodes >= 2);
}

#[test]
fn test_prune_nested_members() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let class = b.class(file, "Service").unwrap();
    let start = b.function(class, "start").unwrap();
    b.function(class, "stop").unwrap();
    b.function(class, "restart").unwrap();
    b.function(file, "unused").unwrap();
    b.export(start).unwrap();

    let config = DceConfig::release();
    shake(&mut arena, &config);
    assert_eq!(names(&arena, file), vec!["Service"]);
    assert_eq!(names(&arena, class), vec!["start"]);
}

#[test]
fn test_prune_is_idempotent() {
    let config = DceConfig::default();
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let class = b
        .class_with(file, "Widget", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    let ctor = b.constructor(class).unwrap();
    let spare = b.constructor(class).unwrap();
    let default = b.const_int(3).unwrap();
    b.value_parameter(spare, "size", Some(default)).unwrap();
    let draw = b.override_function(class, "draw", &[]).unwrap();
    b.function(class, "unused").unwrap();
    let main = b.function(file, "main").unwrap();
    let construct = b.constructor_call(ctor, Vec::new()).unwrap();
    let receiver = b.const_int(0).unwrap();
    let call = b.virtual_call(draw, receiver, Vec::new()).unwrap();
    b.add_statement(main, construct).unwrap();
    b.add_statement(main, call).unwrap();

    let (useful, first) = shake(&mut arena, &config);
    assert!(!first.is_noop());

    let policy = policy_for(&config, &arena).unwrap();
    let second = prune(&mut arena, &useful, policy.as_ref(), &config).unwrap();
    assert!(second.is_noop(), "second prune changed the tree: {:?}", second);
}

#[test]
fn test_reanalysis_reaches_fixed_point() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let base = b
        .class_with(file, "Base", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    let base_m = b.override_function(base, "m", &[]).unwrap();
    let mid = b
        .class_with(file, "Mid", ClassKind::Class, Modality::Open, &[base])
        .unwrap();
    let mid_m = b.override_function(mid, "m", &[base_m]).unwrap();
    let leaf = b
        .class_with(file, "Leaf", ClassKind::Class, Modality::Final, &[mid])
        .unwrap();
    let leaf_ctor = b.constructor(leaf).unwrap();
    b.override_function(leaf, "m", &[mid_m]).unwrap();
    b.export(base_m).unwrap();
    let main = b.function(file, "main").unwrap();
    let construct = b.constructor_call(leaf_ctor, Vec::new()).unwrap();
    b.add_statement(main, construct).unwrap();

    let config = DceConfig::default();
    let (useful, _) = shake(&mut arena, &config);
    let (_, again) = analyze(&arena, &config);
    let before: std::collections::HashSet<NodeId> = useful.iter().collect();
    let after: std::collections::HashSet<NodeId> = again.iter().collect();
    assert_eq!(before, after);
}

#[test]
fn test_overrides_relinked_past_removed_declarations() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let base = b
        .class_with(file, "Base", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    let base_m = b.override_function(base, "m", &[]).unwrap();
    let mid = b
        .class_with(file, "Mid", ClassKind::Class, Modality::Open, &[base])
        .unwrap();
    let mid_m = b.override_function(mid, "m", &[base_m]).unwrap();
    let leaf = b
        .class_with(file, "Leaf", ClassKind::Class, Modality::Final, &[mid])
        .unwrap();
    let leaf_ctor = b.constructor(leaf).unwrap();
    let leaf_m = b.override_function(leaf, "m", &[mid_m]).unwrap();
    b.export(base_m).unwrap();
    let main = b.function(file, "main").unwrap();
    let construct = b.constructor_call(leaf_ctor, Vec::new()).unwrap();
    b.add_statement(main, construct).unwrap();

    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert!(report.removed.contains(&"app.Mid.m".to_string()));
    assert!(!arena.is_live(mid_m));
    let base_symbol = arena.symbol_of(base_m).unwrap();
    match arena.data(leaf_m).unwrap() {
        NodeData::SimpleFunction(f) => assert_eq!(f.overridden_symbols, vec![base_symbol]),
        other => panic!("unexpected {:?}", other.kind()),
    }
    assert_eq!(report.relinked_overrides, 1);
    assert!(find_dangling_references(&arena).unwrap().is_empty());
}

#[test]
fn test_unused_property_parts_are_unlinked() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let property = b.property(file, "name", true, true, true).unwrap();
    let (field, getter, setter) = match b.arena().data(property).unwrap() {
        NodeData::Property(p) => (p.backing_field.unwrap(), p.getter.unwrap(), p.setter.unwrap()),
        _ => unreachable!(),
    };
    let read = b.get_field(field, None).unwrap();
    b.add_statement(getter, read).unwrap();
    let main = b.function(file, "main").unwrap();
    let call = b.call(getter, Vec::new()).unwrap();
    b.add_statement(main, call).unwrap();

    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert_eq!(report.unlinked_parts, 1);
    assert!(!arena.is_live(setter));
    match arena.data(property).unwrap() {
        NodeData::Property(p) => {
            assert_eq!(p.getter, Some(getter));
            assert_eq!(p.backing_field, Some(field));
            assert_eq!(p.setter, None);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_property_without_useful_parts_is_removed() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let property = b.property(file, "unused", true, true, false).unwrap();
    b.function(file, "main").unwrap();

    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert!(!arena.is_live(property));
    assert_eq!(report.removed, vec!["app.unused".to_string()]);
}

#[test]
fn test_initializer_stores_of_removed_fields() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let dropped = b.field(file, "dropped", None).unwrap();
    let effectful = b.field(file, "effectful", None).unwrap();
    let used = b.field(file, "used", None).unwrap();
    let effect = b.function(file, "compute").unwrap();
    let init = b
        .function_with(
            file,
            "init$fields",
            FunctionOptions {
                origin: DeclarationOrigin::FieldInitializer,
                ..FunctionOptions::default()
            },
        )
        .unwrap();
    let pure_value = b.const_int(1).unwrap();
    let store_dropped = b.set_field(dropped, None, pure_value).unwrap();
    let effect_call = b.call(effect, Vec::new()).unwrap();
    let store_effectful = b.set_field(effectful, None, effect_call).unwrap();
    let used_value = b.const_int(2).unwrap();
    let store_used = b.set_field(used, None, used_value).unwrap();
    for store in [store_dropped, store_effectful, store_used] {
        b.add_statement(init, store).unwrap();
    }
    let main = b.function(file, "main").unwrap();
    let call = b.call(init, Vec::new()).unwrap();
    let read = b.get_field(used, None).unwrap();
    b.add_statement(main, call).unwrap();
    b.add_statement(main, read).unwrap();

    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert_eq!(report.dropped_initializers, 1);
    assert_eq!(report.preserved_initializers, 1);
    assert!(!arena.is_live(dropped));
    assert!(!arena.is_live(effectful));
    assert!(arena.is_live(used));

    let body = arena.data(init).unwrap().body().unwrap();
    let statements = arena.data(body).unwrap().statements().unwrap().to_vec();
    assert_eq!(statements, vec![effect_call, store_used]);
    assert_eq!(arena.parent(effect_call).unwrap(), Some(body));
    assert!(!arena.is_live(store_dropped));
    assert!(!arena.is_live(store_effectful));
    assert!(find_dangling_references(&arena).unwrap().is_empty());
}

#[test]
fn test_constructor_stubs() {
    fn build() -> (IrArena, NodeId, NodeId, NodeId) {
        let (mut arena, _module, file) = app();
        let mut b = IrBuilder::new(&mut arena);
        let class = b.class(file, "Point").unwrap();
        let primary = b.constructor(class).unwrap();
        let secondary = b.constructor(class).unwrap();
        let helper = b.function(file, "helper").unwrap();
        let default = b.call(helper, Vec::new()).unwrap();
        let parameter = b.value_parameter(secondary, "x", Some(default)).unwrap();
        let delegation = b.delegating_constructor_call(primary).unwrap();
        b.add_statement(secondary, delegation).unwrap();
        let main = b.function(file, "main").unwrap();
        let construct = b.constructor_call(primary, Vec::new()).unwrap();
        b.add_statement(main, construct).unwrap();
        (arena, class, secondary, parameter)
    }

    let (mut arena, class, secondary, parameter) = build();
    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert_eq!(report.stubbed_constructors.len(), 1);
    assert!(arena.is_live(secondary));
    let body = arena.data(secondary).unwrap().body().unwrap();
    assert!(arena.data(body).unwrap().statements().unwrap().is_empty());
    match arena.data(parameter).unwrap() {
        NodeData::ValueParameter(p) => assert!(p.default_value.is_none()),
        _ => unreachable!(),
    }
    assert_eq!(arena.declarations(class).unwrap().len(), 2);
    assert!(find_dangling_references(&arena).unwrap().is_empty());

    // 发布配置不保留空壳
    let (mut arena, class, secondary, _) = build();
    shake(&mut arena, &DceConfig::release());
    assert!(!arena.is_live(secondary));
    assert_eq!(arena.declarations(class).unwrap().len(), 1);

    // 其他后端没有空壳
    let (mut arena, _, secondary, _) = build();
    shake(&mut arena, &backend(Backend::Wasm));
    assert!(!arena.is_live(secondary));
}

#[test]
fn test_annotations_referencing_removed_declarations_are_dropped() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let marker = b
        .class_with(file, "Marker", ClassKind::Annotation, Modality::Final, &[])
        .unwrap();
    let marker_ctor = b.constructor(marker).unwrap();
    let api = b.function(file, "api").unwrap();
    b.annotate(api, marker_ctor).unwrap();
    b.export(api).unwrap();

    let (_, report) = shake(&mut arena, &DceConfig::default());
    assert!(!arena.is_live(marker));
    assert_eq!(report.dropped_annotations, 1);
    assert!(arena
        .data(api)
        .unwrap()
        .declaration_info()
        .unwrap()
        .annotations
        .is_empty());
    assert!(find_dangling_references(&arena).unwrap().is_empty());
}

#[test]
fn test_removed_instance_accessor_is_cleared() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let object = b
        .class_with(file, "Cache", ClassKind::Object, Modality::Final, &[])
        .unwrap();
    let accessor = b.function(file, "Cache_getInstance").unwrap();
    b.set_instance_accessor(object, accessor).unwrap();
    let main = b.function(file, "main").unwrap();
    let reference = b.class_reference(object).unwrap();
    b.add_statement(main, reference).unwrap();

    shake(&mut arena, &DceConfig::default());
    assert!(arena.is_live(object));
    assert!(!arena.is_live(accessor));
    match arena.data(object).unwrap() {
        NodeData::Class(c) => assert!(c.instance_accessor.is_none()),
        _ => unreachable!(),
    }
    assert!(find_dangling_references(&arena).unwrap().is_empty());
}

#[test]
fn test_dce_pass_run() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let main = b.function(file, "main").unwrap();
    let used = b.function(file, "used").unwrap();
    b.function(file, "unused").unwrap();
    let call = b.call(used, Vec::new()).unwrap();
    b.add_statement(main, call).unwrap();

    let mut pass = DcePass::new(DceConfig::default());
    let outcome = pass.run(&mut arena).unwrap();
    assert_eq!(outcome.roots, vec![main]);
    assert_eq!(outcome.stats.roots, 1);
    assert_eq!(outcome.stats.reachable, 2);
    assert_eq!(outcome.stats.removed, 1);
    assert_eq!(arena.declarations(file).unwrap(), &[main, used]);
    assert!(outcome.stats.format().starts_with("DCE Statistics:"));
}

#[test]
fn test_disabled_pass_keeps_everything() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    b.function(file, "main").unwrap();
    b.function(file, "unused").unwrap();

    let mut pass = DcePass::new(DceConfig {
        enabled: false,
        ..DceConfig::default()
    });
    let outcome = pass.run(&mut arena).unwrap();
    assert!(outcome.report.is_noop());
    assert_eq!(arena.declarations(file).unwrap().len(), 2);
}
