//! 声明剪枝
//!
//! 按可达结果从每个容器（文件、类）中摘除不可达声明，保持保留声明的相对顺序。
//! 摘除之后修补保留下来的节点，使其不再引用被删除的声明：
//! 覆盖链重新连接到最近的保留祖先、失效的单例访问器清空、
//! 字段初始化函数中写入已删除字段的语句丢弃（有副作用的值保留）、
//! 引用已删除声明的注解去掉。最后释放被删除的子树。

use hashbrown::HashSet;
use tracing::{debug, info, trace};

use crate::middle::ir::node::StatementList;
use crate::middle::ir::{
    rewrite_statements, DeclarationOrigin, IrArena, IrResult, NodeBase, NodeData, NodeId,
    NodeKind, SymbolId, SymbolState,
};
use crate::util::config::DceConfig;

use super::policy::ReachabilityPolicy;
use super::purity::is_side_effect_free;
use super::usefulness::UsefulDeclarations;
use super::DceError;

/// 剪枝报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// 被删除声明的全限定名（遍历顺序）
    pub removed: Vec<String>,
    /// 容器与属性中保留下来的声明数（含构造器空壳），与 `removed` 同口径
    pub retained: usize,
    /// 释放的节点数
    pub released_nodes: usize,
    /// 丢弃的初始化语句
    pub dropped_initializers: usize,
    /// 目标字段被删除、但值有副作用而保留下来的初始化语句
    pub preserved_initializers: usize,
    /// 保留为空壳的构造器
    pub stubbed_constructors: Vec<String>,
    /// 从属性上摘下的无用部件
    pub unlinked_parts: usize,
    /// 重新连接的覆盖关系
    pub relinked_overrides: usize,
    /// 去掉的注解
    pub dropped_annotations: usize,
}

impl PruneReport {
    /// 是否什么都没改
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty()
            && self.released_nodes == 0
            && self.dropped_initializers == 0
            && self.preserved_initializers == 0
            && self.stubbed_constructors.is_empty()
            && self.unlinked_parts == 0
            && self.relinked_overrides == 0
            && self.dropped_annotations == 0
    }
}

/// 按可达结果剪枝所有模块
pub fn prune(
    arena: &mut IrArena,
    useful: &UsefulDeclarations,
    policy: &dyn ReachabilityPolicy,
    config: &DceConfig,
) -> Result<PruneReport, DceError> {
    let mut pruner = Pruner {
        useful,
        keep_stubs: policy.keeps_constructor_stubs() && config.keep_unused_constructor_stubs,
        removed: HashSet::new(),
        removed_roots: Vec::new(),
        stubs: Vec::new(),
        initializer_functions: Vec::new(),
        retained_classes: Vec::new(),
        report: PruneReport::default(),
    };

    // 1. 从容器中摘除不可达声明
    let files: Vec<NodeId> = arena
        .modules()
        .iter()
        .map(|module| arena.children(*module))
        .collect::<IrResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();
    for file in files {
        pruner.prune_container(arena, file)?;
    }

    // 2. 修补指向被删除声明的链接（释放前，被删除节点的数据仍可读）
    pruner.relink_overrides(arena)?;
    pruner.clear_instance_accessors(arena)?;

    // 3. 字段初始化函数
    pruner.rewrite_initializers(arena)?;

    // 4. 构造器空壳
    pruner.stub_constructors(arena)?;

    // 5. 释放被删除的子树
    for root in std::mem::take(&mut pruner.removed_roots) {
        if arena.is_live(root) {
            pruner.report.released_nodes += arena.release_subtree(root)?;
        }
    }

    // 6. 引用已释放声明的注解
    pruner.drop_dangling_annotations(arena)?;

    let report = pruner.report;
    info!(
        "pruned {} declarations, kept {}, released {} nodes ({} initializers dropped, {} preserved, {} stubs)",
        report.removed.len(),
        report.retained,
        report.released_nodes,
        report.dropped_initializers,
        report.preserved_initializers,
        report.stubbed_constructors.len()
    );
    Ok(report)
}

struct Pruner<'u> {
    useful: &'u UsefulDeclarations,
    keep_stubs: bool,
    removed: HashSet<NodeId>,
    removed_roots: Vec<NodeId>,
    stubs: Vec<NodeId>,
    initializer_functions: Vec<NodeId>,
    retained_classes: Vec<NodeId>,
    report: PruneReport,
}

impl Pruner<'_> {
    fn prune_container(
        &mut self,
        arena: &mut IrArena,
        container: NodeId,
    ) -> IrResult<()> {
        let is_class = arena.kind(container)? == NodeKind::Class;
        let declarations = arena.declarations(container)?.to_vec();

        let mut keep = HashSet::with_capacity(declarations.len());
        for &decl in &declarations {
            if self.useful.is_retained(arena, decl)? {
                keep.insert(decl);
                self.report.retained += 1;
            } else if is_class && self.keep_stubs && arena.kind(decl)? == NodeKind::Constructor {
                keep.insert(decl);
                self.stubs.push(decl);
                self.report.retained += 1;
            } else {
                // 名字要在摘除前计算，摘除后父指针已断开
                self.report.removed.push(arena.fq_name(decl)?);
                self.mark_removed(decl);
            }
        }
        let removed = arena.retain_declarations(container, |id| keep.contains(&id))?;
        if !removed.is_empty() {
            debug!("removed {} declarations from {}", removed.len(), container);
        }

        for decl in declarations.into_iter().filter(|d| keep.contains(d)) {
            match arena.data(decl)? {
                NodeData::Class(_) => {
                    self.retained_classes.push(decl);
                    self.prune_container(arena, decl)?;
                }
                NodeData::EnumEntry(entry) => {
                    if let Some(class) = entry.corresponding_class {
                        self.retained_classes.push(class);
                        self.prune_container(arena, class)?;
                    }
                }
                NodeData::Property(_) => self.unlink_unused_parts(arena, decl)?,
                NodeData::SimpleFunction(_)
                    if arena.node(decl)?.base.origin == DeclarationOrigin::FieldInitializer =>
                {
                    self.initializer_functions.push(decl);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn mark_removed(
        &mut self,
        decl: NodeId,
    ) {
        if self.removed.insert(decl) {
            self.removed_roots.push(decl);
        }
    }

    /// 摘下属性上不可达的幕后字段与访问器
    fn unlink_unused_parts(
        &mut self,
        arena: &mut IrArena,
        property: NodeId,
    ) -> IrResult<()> {
        let NodeData::Property(data) = arena.data(property)? else {
            return Ok(());
        };
        let (parts, kept): (Vec<NodeId>, Vec<NodeId>) =
            [data.backing_field, data.getter, data.setter]
                .into_iter()
                .flatten()
                .partition(|part| !self.useful.contains(*part));
        self.report.retained += kept.len();
        for part in parts {
            self.report.removed.push(arena.fq_name(part)?);
            arena.detach_child(property, part)?;
            self.mark_removed(part);
            self.report.unlinked_parts += 1;
        }
        Ok(())
    }

    /// 节点自身或某个祖先被删除
    fn is_gone(
        &self,
        arena: &IrArena,
        node: NodeId,
    ) -> IrResult<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.removed.contains(&id) {
                return Ok(true);
            }
            current = arena.parent(id)?;
        }
        Ok(false)
    }

    /// 符号的声明是否仍保留；已释放的符号视为已删除
    fn is_symbol_gone(
        &self,
        arena: &IrArena,
        symbol: SymbolId,
    ) -> IrResult<bool> {
        match arena.symbol_entry(symbol)?.state {
            SymbolState::Released => Ok(true),
            _ => self.is_gone(arena, arena.owner(symbol)?),
        }
    }

    /// 覆盖列表中被删除的目标替换为它们覆盖的声明，直到遇到保留的声明
    fn surviving_overrides(
        &self,
        arena: &IrArena,
        symbols: &[SymbolId],
    ) -> IrResult<Vec<SymbolId>> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<SymbolId> = symbols.iter().rev().copied().collect();
        while let Some(symbol) = stack.pop() {
            if !visited.insert(symbol) {
                continue;
            }
            if arena.symbol_entry(symbol)?.state == SymbolState::Released {
                continue;
            }
            let target = arena.owner(symbol)?;
            if !self.is_gone(arena, target)? {
                out.push(symbol);
                continue;
            }
            if let Some(member) = arena.data(target)?.as_overridable() {
                stack.extend(member.overridden_symbols().iter().rev().copied());
            }
        }
        Ok(out)
    }

    fn relink_overrides(
        &mut self,
        arena: &mut IrArena,
    ) -> IrResult<()> {
        let mut updates = Vec::new();
        for module in arena.modules().to_vec() {
            for node in arena.descendants(module)? {
                let Some(member) = arena.data(node)?.as_overridable() else {
                    continue;
                };
                let current = member.overridden_symbols();
                let surviving = self.surviving_overrides(arena, current)?;
                if surviving != current {
                    updates.push((node, surviving));
                }
            }
        }
        for (node, surviving) in updates {
            trace!("relink overrides of {}", node);
            if let Some(member) = arena.data_mut(node)?.as_overridable_mut() {
                *member.overridden_symbols_mut() = surviving;
            }
            self.report.relinked_overrides += 1;
        }
        Ok(())
    }

    fn clear_instance_accessors(
        &mut self,
        arena: &mut IrArena,
    ) -> IrResult<()> {
        for class in self.retained_classes.clone() {
            let accessor = match arena.data(class)? {
                NodeData::Class(data) => data.instance_accessor,
                _ => None,
            };
            let Some(accessor) = accessor else { continue };
            if self.is_symbol_gone(arena, accessor)? {
                if let NodeData::Class(data) = arena.data_mut(class)? {
                    data.instance_accessor = None;
                }
            }
        }
        Ok(())
    }

    fn rewrite_initializers(
        &mut self,
        arena: &mut IrArena,
    ) -> IrResult<()> {
        let mut dropped_total = 0;
        let mut preserved_total = 0;
        for function in self.initializer_functions.clone() {
            let Some(body) = arena.data(function)?.body() else {
                continue;
            };
            let mut dropped_count = 0;
            let mut preserved_count = 0;
            let dropped = rewrite_statements(arena, body, |arena, statement| {
                let NodeData::SetField(set) = arena.data(statement)? else {
                    return Ok(Some(statement));
                };
                let (symbol, value) = (set.symbol, set.value);
                let eager = match arena.symbol_entry(symbol)?.state {
                    SymbolState::Released => false,
                    _ => {
                        let field = arena.owner(symbol)?;
                        if !self.is_gone(arena, field)? {
                            return Ok(Some(statement));
                        }
                        arena
                            .data(field)?
                            .declaration_info()
                            .is_some_and(|info| info.flags.eager_initialization)
                    }
                };
                if eager || !is_side_effect_free(arena, value)? {
                    preserved_count += 1;
                    Ok(Some(value))
                } else {
                    dropped_count += 1;
                    Ok(None)
                }
            })?;
            for statement in dropped {
                self.report.released_nodes += arena.release_subtree(statement)?;
            }
            dropped_total += dropped_count;
            preserved_total += preserved_count;
        }
        self.report.dropped_initializers += dropped_total;
        self.report.preserved_initializers += preserved_total;
        Ok(())
    }

    /// 未使用的构造器保留为空函数体、无默认参数的空壳
    fn stub_constructors(
        &mut self,
        arena: &mut IrArena,
    ) -> IrResult<()> {
        for constructor in std::mem::take(&mut self.stubs) {
            let NodeData::Constructor(data) = arena.data(constructor)? else {
                continue;
            };
            let body_is_empty = match data.body {
                Some(body) => matches!(
                    arena.data(body)?,
                    NodeData::BlockBody(b) if b.statements.is_empty()
                ),
                None => false,
            };
            let mut defaults = Vec::new();
            for parameter in &data.value_parameters {
                if let NodeData::ValueParameter(p) = arena.data(*parameter)? {
                    if let Some(default) = p.default_value {
                        defaults.push((*parameter, default));
                    }
                }
            }
            if body_is_empty && defaults.is_empty() {
                continue;
            }

            if !body_is_empty {
                let empty = arena.add_node(
                    NodeBase::default(),
                    NodeData::BlockBody(StatementList {
                        statements: Vec::new(),
                    }),
                )?;
                if let Some(old) = arena.set_body(constructor, empty)? {
                    self.report.released_nodes += arena.release_subtree(old)?;
                }
            }
            for (parameter, default) in defaults {
                arena.detach_child(parameter, default)?;
                self.report.released_nodes += arena.release_subtree(default)?;
            }
            self.report.stubbed_constructors.push(arena.fq_name(constructor)?);
        }
        Ok(())
    }

    fn drop_dangling_annotations(
        &mut self,
        arena: &mut IrArena,
    ) -> IrResult<()> {
        let mut doomed = Vec::new();
        for module in arena.modules().to_vec() {
            for node in arena.descendants(module)? {
                let annotations = match arena.data(node)? {
                    NodeData::File(f) => f.annotations.as_slice(),
                    other => match other.declaration_info() {
                        Some(info) => info.annotations.as_slice(),
                        None => continue,
                    },
                };
                for &annotation in annotations {
                    if references_released(arena, annotation)? {
                        doomed.push((node, annotation));
                    }
                }
            }
        }
        for (owner, annotation) in doomed {
            arena.detach_child(owner, annotation)?;
            self.report.released_nodes += arena.release_subtree(annotation)?;
            self.report.dropped_annotations += 1;
        }
        Ok(())
    }
}

fn references_released(
    arena: &IrArena,
    root: NodeId,
) -> IrResult<bool> {
    for node in arena.descendants(root)? {
        for symbol in arena.data(node)?.referenced_symbols() {
            if arena.symbol_entry(symbol)?.state == SymbolState::Released {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
