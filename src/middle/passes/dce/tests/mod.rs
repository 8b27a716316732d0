//! DCE 测试

mod property_tests;
mod pruning_tests;
mod trace_tests;

use crate::middle::ir::{IrArena, IrBuilder, NodeId};

use super::*;

/// 一个模块、一个 `app` 包文件
fn app() -> (IrArena, NodeId, NodeId) {
    let mut arena = IrArena::new();
    let mut b = IrBuilder::new(&mut arena);
    let module = b.module("app").unwrap();
    let file = b.file(module, "app", "main.yx").unwrap();
    (arena, module, file)
}

/// 收集根并做可达性分析（不剪枝）
fn analyze(
    arena: &IrArena,
    config: &DceConfig,
) -> (Vec<NodeId>, UsefulDeclarations) {
    let policy = policy_for(config, arena).unwrap();
    let roots = collect_roots(arena, &DeclarationFlagsOracle, policy.as_ref(), config).unwrap();
    let useful = collect_useful_declarations(
        arena,
        &roots,
        policy.as_ref(),
        &DeclarationFlagsOracle,
        config.print_reachability_info,
        config.remove_unused_associated_objects,
    )
    .unwrap();
    (roots, useful)
}

/// 分析并剪枝
fn shake(
    arena: &mut IrArena,
    config: &DceConfig,
) -> (UsefulDeclarations, PruneReport) {
    let (_, useful) = analyze(arena, config);
    let policy = policy_for(config, arena).unwrap();
    let report = prune(arena, &useful, policy.as_ref(), config).unwrap();
    (useful, report)
}

fn backend(backend: Backend) -> DceConfig {
    DceConfig {
        backend,
        ..DceConfig::default()
    }
}
