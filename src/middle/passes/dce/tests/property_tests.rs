//! 可达性与剪枝的性质测试

use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;

use crate::middle::ir::*;

use super::*;

/// 随机调用图：`n` 个顶层函数、调用边和导出标记
#[derive(Debug, Clone)]
struct CallGraph {
    n: usize,
    edges: Vec<(usize, usize)>,
    exported: Vec<bool>,
}

fn call_graph_strategy() -> impl Strategy<Value = CallGraph> {
    (1..12usize).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..n * 2),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(|(n, edges, exported)| CallGraph { n, edges, exported })
    })
}

impl CallGraph {
    fn build(&self) -> (IrArena, NodeId, Vec<NodeId>) {
        let (mut arena, _module, file) = app();
        let mut b = IrBuilder::new(&mut arena);
        let functions: Vec<NodeId> = (0..self.n)
            .map(|i| b.function(file, &format!("f{}", i)).unwrap())
            .collect();
        for &(from, to) in &self.edges {
            let call = b.call(functions[to], Vec::new()).unwrap();
            b.add_statement(functions[from], call).unwrap();
        }
        for (i, exported) in self.exported.iter().enumerate() {
            if *exported {
                b.export(functions[i]).unwrap();
            }
        }
        (arena, file, functions)
    }

    /// 直接在图上做广度优先搜索
    fn reachable(&self) -> HashSet<usize> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<usize> = (0..self.n).filter(|i| self.exported[*i]).collect();
        while let Some(i) = queue.pop_front() {
            if !seen.insert(i) {
                continue;
            }
            for &(from, to) in &self.edges {
                if from == i && !seen.contains(&to) {
                    queue.push_back(to);
                }
            }
        }
        seen
    }
}

/// 随机类链：`Base <- C1 <- ... <- Ck`，每层覆盖 `m`，随机构造其中一些
#[derive(Debug, Clone)]
struct ClassChain {
    open: Vec<bool>,
    constructed: Vec<bool>,
}

fn class_chain_strategy() -> impl Strategy<Value = ClassChain> {
    (1..6usize).prop_flat_map(|k| {
        (
            prop::collection::vec(any::<bool>(), k),
            prop::collection::vec(any::<bool>(), k),
        )
            .prop_map(|(open, constructed)| ClassChain { open, constructed })
    })
}

/// 混合模块：调用图之外再加顶层属性和一个带成员的类，提供各种声明作为候选根
#[derive(Debug, Clone)]
struct MixedModule {
    graph: CallGraph,
    /// 每个顶层属性的 getter 调用的函数
    properties: Vec<usize>,
}

fn mixed_module_strategy() -> impl Strategy<Value = MixedModule> {
    call_graph_strategy().prop_flat_map(|graph| {
        let n = graph.n;
        prop::collection::vec(0..n, 0..4)
            .prop_map(move |properties| MixedModule { graph: graph.clone(), properties })
    })
}

impl MixedModule {
    /// 返回 arena 和候选根（函数、属性及其部件、类及其成员）
    fn build(&self) -> (IrArena, Vec<NodeId>) {
        let (mut arena, file, functions) = self.graph.build();
        let mut b = IrBuilder::new(&mut arena);
        let mut pool = functions.clone();

        for (i, &callee) in self.properties.iter().enumerate() {
            pool.extend(property_with_parts(&mut b, file, &format!("p{}", i), functions[callee]));
        }

        let class = b
            .class_with(file, "Box", ClassKind::Class, Modality::Open, &[])
            .unwrap();
        pool.push(class);
        pool.push(b.constructor(class).unwrap());
        pool.push(b.override_function(class, "open", &[]).unwrap());
        pool.push(b.function(class, "helper").unwrap());
        pool.push(b.field(class, "raw", None).unwrap());
        pool.extend(property_with_parts(&mut b, class, "size", functions[0]));

        (arena, pool)
    }
}

/// 带幕后字段和访问器的属性，getter 调用 `callee`；返回属性及其部件
fn property_with_parts(
    b: &mut IrBuilder<'_>,
    container: NodeId,
    name: &str,
    callee: NodeId,
) -> Vec<NodeId> {
    let property = b.property(container, name, true, true, true).unwrap();
    let (field, getter, setter) = match b.arena().data(property).unwrap() {
        NodeData::Property(p) => (p.backing_field.unwrap(), p.getter.unwrap(), p.setter.unwrap()),
        _ => unreachable!(),
    };
    let call = b.call(callee, Vec::new()).unwrap();
    b.add_statement(getter, call).unwrap();
    vec![property, field, getter, setter]
}

/// 直接以给定的声明为根做可达性分析
fn reach_from(
    arena: &IrArena,
    roots: &[NodeId],
) -> UsefulDeclarations {
    let config = DceConfig::default();
    let policy = policy_for(&config, arena).unwrap();
    collect_useful_declarations(arena, roots, policy.as_ref(), &DeclarationFlagsOracle, false, true)
        .unwrap()
}

proptest! {
    #[test]
    fn test_result_is_reachable_set(graph in call_graph_strategy()) {
        let (arena, _file, functions) = graph.build();
        let (_, useful) = analyze(&arena, &DceConfig::default());

        let expected = graph.reachable();
        for (i, f) in functions.iter().enumerate() {
            prop_assert_eq!(useful.contains(*f), expected.contains(&i), "f{}", i);
        }
    }

    #[test]
    fn test_more_roots_never_shrink_result(graph in call_graph_strategy(), extra in 0..12usize) {
        let (arena, _file, functions) = graph.build();
        let (_, before) = analyze(&arena, &DceConfig::default());

        let mut wider = graph.clone();
        wider.exported[extra % graph.n] = true;
        let (arena, _file, _) = wider.build();
        let (_, after) = analyze(&arena, &DceConfig::default());

        // 两次构建的节点编号一致
        for f in &functions {
            prop_assert!(!before.contains(*f) || after.contains(*f));
        }
    }

    #[test]
    fn test_prune_keeps_order_and_references(graph in call_graph_strategy()) {
        let (mut arena, file, functions) = graph.build();
        let (useful, _) = shake(&mut arena, &DceConfig::default());

        let expected: Vec<NodeId> = functions
            .iter()
            .copied()
            .filter(|f| useful.contains(*f))
            .collect();
        prop_assert_eq!(arena.declarations(file).unwrap(), expected.as_slice());
        prop_assert!(find_dangling_references(&arena).unwrap().is_empty());
    }

    #[test]
    fn test_prune_is_idempotent_and_stable(graph in call_graph_strategy()) {
        let config = DceConfig::default();
        let (mut arena, _file, _) = graph.build();
        let (useful, _) = shake(&mut arena, &config);

        let (_, again) = analyze(&arena, &config);
        let before: HashSet<NodeId> = useful.iter().collect();
        let after: HashSet<NodeId> = again.iter().collect();
        prop_assert_eq!(before, after);

        let policy = policy_for(&config, &arena).unwrap();
        let report = prune(&mut arena, &again, policy.as_ref(), &config).unwrap();
        prop_assert!(report.is_noop());
    }

    #[test]
    fn test_contagious_overrides_in_class_chain(chain in class_chain_strategy()) {
        let (mut arena, _module, file) = app();
        let mut b = IrBuilder::new(&mut arena);
        let base = b
            .class_with(file, "Base", ClassKind::Class, Modality::Open, &[])
            .unwrap();
        let base_m = b.override_function(base, "m", &[]).unwrap();
        b.export(base_m).unwrap();
        let main = b.function(file, "main").unwrap();

        let mut parent = base;
        let mut parent_m = base_m;
        let mut members = Vec::new();
        for (i, open) in chain.open.iter().enumerate() {
            let modality = if *open { Modality::Open } else { Modality::Final };
            let class = b
                .class_with(file, &format!("C{}", i), ClassKind::Class, modality, &[parent])
                .unwrap();
            let m = b.override_function(class, "m", &[parent_m]).unwrap();
            if chain.constructed[i] {
                let ctor = b.constructor(class).unwrap();
                let construct = b.constructor_call(ctor, Vec::new()).unwrap();
                b.add_statement(main, construct).unwrap();
            }
            members.push((class, m));
            parent = class;
            parent_m = m;
        }

        let (_, useful) = analyze(&arena, &DceConfig::default());
        for decl in useful.contagious.iter() {
            prop_assert!(useful.contains(*decl));
        }

        // 每个被构造的类都保留自己的 `m`
        for (i, (class, m)) in members.iter().enumerate() {
            prop_assert_eq!(useful.constructed_classes.contains(class), chain.constructed[i]);
            if chain.constructed[i] {
                prop_assert!(useful.contains(*m), "C{}.m", i);
            }
        }
    }

    #[test]
    fn test_every_root_kind_is_in_result(
        module in mixed_module_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..6),
        extra in any::<prop::sample::Index>(),
    ) {
        let (mut arena, pool) = module.build();
        let roots: Vec<NodeId> = picks.iter().map(|i| *i.get(&pool)).collect();
        let useful = reach_from(&arena, &roots);
        for root in &roots {
            prop_assert!(useful.contains(*root), "root {} missing", root);
        }

        // 多一个根，结果只会变大
        let mut wider = roots.clone();
        wider.push(*extra.get(&pool));
        let more = reach_from(&arena, &wider);
        for decl in useful.iter() {
            prop_assert!(more.contains(decl));
        }

        // 剪枝不会删掉根
        let config = DceConfig::default();
        let policy = policy_for(&config, &arena).unwrap();
        prune(&mut arena, &useful, policy.as_ref(), &config).unwrap();
        for root in &roots {
            prop_assert!(arena.is_live(*root), "root {} released", root);
        }
    }
}
