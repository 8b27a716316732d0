//! 可达性追踪与统计测试

use crate::middle::ir::*;

use super::*;

fn traced() -> DceConfig {
    DceConfig {
        print_reachability_info: true,
        ..DceConfig::default()
    }
}

#[test]
fn test_format_edge() {
    assert_eq!(
        format_edge("app.main", "app.f", "function access", false),
        "\"app.main\" -> \"app.f\" // function access"
    );
    assert_eq!(format_edge("app.main", "app.f", "", false), "\"app.main\" -> \"app.f\"");
    assert_eq!(
        format_edge("<ROOT>", "app.Base.m", "", true),
        "\"<ROOT>\" -> \"app.Base.m\" // [CONTAGIOUS!]"
    );
    assert_eq!(
        format_edge("app.C", "app.C.m", "overridden", true),
        "\"app.C\" -> \"app.C.m\" // overridden[CONTAGIOUS!]"
    );
}

#[test]
fn test_trace_records_roots_and_edges() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let base = b
        .class_with(file, "Base", ClassKind::Class, Modality::Open, &[])
        .unwrap();
    let m = b.override_function(base, "m", &[]).unwrap();
    b.export(m).unwrap();
    let main = b.function(file, "main").unwrap();
    let f = b.function(file, "f").unwrap();
    let first = b.call(f, Vec::new()).unwrap();
    let second = b.call(f, Vec::new()).unwrap();
    b.add_statement(main, first).unwrap();
    b.add_statement(main, second).unwrap();

    let (_, useful) = analyze(&arena, &traced());
    assert!(useful.contains(main));
    let trace = useful.trace.as_ref().unwrap();
    let lines: Vec<&str> = trace.lines().collect();

    assert_eq!(lines[0], "\"<ROOT>\" -> \"app.Base.m\" // [CONTAGIOUS!]");
    assert_eq!(lines[1], "\"<ROOT>\" -> \"app.main\"");
    assert!(lines.contains(&"\"app.Base.m\" -> \"app.Base\" // parent class"));
    // 同一条边只记录一次
    let calls = lines
        .iter()
        .filter(|l| **l == "\"app.main\" -> \"app.f\" // function access")
        .count();
    assert_eq!(calls, 1);
    assert_eq!(trace.len(), lines.len());
}

#[test]
fn test_trace_disabled_by_default() {
    let (mut arena, _module, file) = app();
    IrBuilder::new(&mut arena).function(file, "main").unwrap();

    let (_, useful) = analyze(&arena, &DceConfig::default());
    assert!(useful.trace.is_none());
}

#[test]
fn test_trace_static_initializer_edge() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let class = b.class(file, "Holder").unwrap();
    let init = b.anonymous_initializer(class, true).unwrap();
    let main = b.function(file, "main").unwrap();
    let reference = b.class_reference(class).unwrap();
    b.add_statement(main, reference).unwrap();

    let (_, useful) = analyze(&arena, &traced());
    assert!(useful.contains(init));
    let trace = useful.trace.as_ref().unwrap();
    // 匿名初始化块没有自己的名字，显示为所在类的名字
    assert!(trace
        .lines()
        .any(|l| l == "\"app.Holder\" -> \"app.Holder\" // static initializer"));
    assert!(trace
        .lines()
        .any(|l| l == "\"app.main\" -> \"app.Holder\" // class reference"));
}

#[test]
fn test_stats_format() {
    let stats = DceStats {
        roots: 2,
        reachable: 6,
        contagious: 1,
        constructed_classes: 1,
        outer_iterations: 2,
        removed: 2,
        retained: 6,
        released_nodes: 5,
        dropped_initializers: 1,
        preserved_initializers: 0,
        stubbed_constructors: 1,
        removal_rate: 0.25,
    };
    let text = stats.format();
    assert!(text.starts_with("DCE Statistics:\n"));
    assert!(text.contains("- Roots: 2"));
    assert!(text.contains("- Retained: 6"));
    assert!(text.contains("- Removed: 2 (25.0%)"));
    assert!(text.contains("- Constructor stubs: 1"));
}

#[test]
fn test_stats_from_analysis_and_report() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let main = b.function(file, "main").unwrap();
    let f = b.function(file, "f").unwrap();
    b.function(file, "g").unwrap();
    b.function(file, "h").unwrap();
    let call = b.call(f, Vec::new()).unwrap();
    b.add_statement(main, call).unwrap();

    let config = DceConfig::default();
    let (roots, useful) = analyze(&arena, &config);
    let policy = policy_for(&config, &arena).unwrap();
    let report = prune(&mut arena, &useful, policy.as_ref(), &config).unwrap();

    let mut stats = DceStats::new();
    stats.update_from_analysis(roots.len(), &useful);
    stats.update_from_report(&report);
    assert_eq!(stats.roots, 1);
    assert_eq!(stats.reachable, 2);
    assert_eq!(stats.removed, 2);
    assert_eq!(stats.retained, 2);
    assert_eq!(stats.outer_iterations, 1);
    assert!((stats.removal_rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_removal_rate_counts_container_declarations() {
    let (mut arena, _module, file) = app();
    let mut b = IrBuilder::new(&mut arena);
    let main = b.function(file, "main").unwrap();
    let n = b.value_parameter(main, "n", None).unwrap();
    let read = b.get_value(n).unwrap();
    b.add_statement(main, read).unwrap();
    b.function(file, "dead").unwrap();
    let class = b.class(file, "Config").unwrap();
    b.property(class, "level", true, true, true).unwrap();
    let api = b.property(file, "api", true, true, true).unwrap();
    let getter = match b.arena().data(api).unwrap() {
        NodeData::Property(p) => p.getter.unwrap(),
        _ => unreachable!(),
    };
    let mut config = DceConfig::default();
    config.extra_roots = vec![arena.fq_name(getter).unwrap()];

    let (roots, useful) = analyze(&arena, &config);
    assert!(useful.contains(n));
    let policy = policy_for(&config, &arena).unwrap();
    let report = prune(&mut arena, &useful, policy.as_ref(), &config).unwrap();

    let mut stats = DceStats::new();
    stats.update_from_analysis(roots.len(), &useful);
    stats.update_from_report(&report);

    // 保留：main、api、<get-api>；删除：dead、Config、api$field、<set-api>
    assert_eq!(stats.retained, 3);
    assert_eq!(stats.removed, 4);
    assert!(stats.reachable > stats.retained);
    assert!((stats.removal_rate - 4.0 / 7.0).abs() < 1e-9);
}
