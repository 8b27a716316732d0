//! 可达声明收集
//!
//! 工作表算法：
//! 1. 根入队
//! 2. 逐个出队处理：按种类补充边（父类、超类型、伪覆盖的真实实现、构造的类……），
//!    再用 [`BodyVisitor`] 遍历函数体
//! 3. 队列清空后处理关联对象，并重新扫描所有被构造类的成员：
//!    覆盖链上连到传染性声明的成员也可能被动态派发调用，入队
//! 4. 重复直到一轮外层循环不再产生新声明
//!
//! `result` 只增不减，声明总数有限，因此必然终止。

use std::collections::VecDeque;

use indexmap::IndexSet;
use tracing::{debug, info, trace};

use crate::middle::ir::{accept, resolve_fake_override, IrArena, IrResult, NodeData, NodeId};

use super::annotations::{
    annotation_constructor, annotations_of, associated_key_marker, associated_object,
};
use super::body_visitor::BodyVisitor;
use super::policy::{member_class, ReachabilityPolicy};
use super::roots::RootOracle;
use super::trace::ReachabilityTrace;
use super::DceError;

/// 可达性分析结果
#[derive(Debug, Clone, Default)]
pub struct UsefulDeclarations {
    /// 可达声明（发现顺序）
    pub result: IndexSet<NodeId>,
    /// 传染性可达的可覆盖声明，总是 `result` 的子集
    pub contagious: IndexSet<NodeId>,
    /// 构造器可达的类
    pub constructed_classes: IndexSet<NodeId>,
    /// 外层不动点循环次数
    pub outer_iterations: usize,
    /// 可达性追踪（开启时）
    pub trace: Option<ReachabilityTrace>,
}

impl UsefulDeclarations {
    pub fn contains(
        &self,
        decl: NodeId,
    ) -> bool {
        self.result.contains(&decl)
    }

    pub fn is_contagious(
        &self,
        decl: NodeId,
    ) -> bool {
        self.contagious.contains(&decl)
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.result.iter().copied()
    }

    /// 属性的任一部件可达即视为保留
    pub fn is_retained(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        if self.contains(decl) {
            return Ok(true);
        }
        match arena.data(decl)? {
            NodeData::Property(p) => Ok([p.backing_field, p.getter, p.setter]
                .into_iter()
                .flatten()
                .any(|part| self.contains(part))),
            _ => Ok(false),
        }
    }

    /// 类中保留下来的成员（声明顺序），供后端构建虚表
    pub fn retained_members(
        &self,
        arena: &IrArena,
        class: NodeId,
    ) -> IrResult<Vec<NodeId>> {
        let mut members = Vec::new();
        for member in arena.declarations(class)? {
            if self.is_retained(arena, *member)? {
                members.push(*member);
            }
        }
        Ok(members)
    }
}

/// 可达声明处理器
///
/// 工作表与各个集合只属于一次分析调用。
pub struct UsefulDeclarationProcessor<'a> {
    arena: &'a IrArena,
    policy: &'a dyn ReachabilityPolicy,
    oracle: &'a dyn RootOracle,
    remove_unused_associated_objects: bool,
    queue: VecDeque<NodeId>,
    result: IndexSet<NodeId>,
    contagious: IndexSet<NodeId>,
    constructed_classes: IndexSet<NodeId>,
    classes_with_object_associations: IndexSet<NodeId>,
    trace: Option<ReachabilityTrace>,
}

impl<'a> UsefulDeclarationProcessor<'a> {
    pub fn new(
        arena: &'a IrArena,
        policy: &'a dyn ReachabilityPolicy,
        oracle: &'a dyn RootOracle,
    ) -> Self {
        Self {
            arena,
            policy,
            oracle,
            remove_unused_associated_objects: true,
            queue: VecDeque::new(),
            result: IndexSet::new(),
            contagious: IndexSet::new(),
            constructed_classes: IndexSet::new(),
            classes_with_object_associations: IndexSet::new(),
            trace: None,
        }
    }

    /// 记录可达性追踪
    pub fn with_trace(
        mut self,
        enabled: bool,
    ) -> Self {
        self.trace = enabled.then(ReachabilityTrace::new);
        self
    }

    /// 只在 `getAssociatedObject` 可达时保留关联对象
    pub fn with_remove_unused_associated_objects(
        mut self,
        remove: bool,
    ) -> Self {
        self.remove_unused_associated_objects = remove;
        self
    }

    pub fn arena(&self) -> &'a IrArena {
        self.arena
    }

    pub fn policy(&self) -> &'a dyn ReachabilityPolicy {
        self.policy
    }

    pub fn oracle(&self) -> &'a dyn RootOracle {
        self.oracle
    }

    pub fn is_useful(
        &self,
        decl: NodeId,
    ) -> bool {
        self.result.contains(&decl)
    }

    /// 声明入队
    ///
    /// 非外部属性不入队（只有它的部件会被后端使用）。`contagious` 为真且策略认为
    /// 该声明具有传染性时，即使它已经可达也会加入传染性集合。
    pub fn enqueue(
        &mut self,
        decl: NodeId,
        from: Option<NodeId>,
        description: &str,
        contagious: bool,
    ) -> IrResult<()> {
        let arena = self.arena;
        let data = arena.data(decl)?;
        if let NodeData::Property(p) = data {
            if !p.info.flags.external {
                return Ok(());
            }
        }

        let is_contagious = contagious
            && data.as_overridable().is_some()
            && self.policy.is_contagious(arena, decl)?;
        if is_contagious {
            self.contagious.insert(decl);
        }
        if self.result.insert(decl) {
            self.queue.push_back(decl);
        }
        if let Some(trace) = &mut self.trace {
            trace.record(arena, from, decl, description, is_contagious)?;
        }
        Ok(())
    }

    /// 从 `from` 出发的普通入队
    pub fn enqueue_from(
        &mut self,
        decl: NodeId,
        from: NodeId,
        description: &str,
    ) -> IrResult<()> {
        self.enqueue(decl, Some(from), description, true)
    }

    /// 从根出发收集可达声明
    pub fn collect(
        mut self,
        roots: &[NodeId],
    ) -> Result<UsefulDeclarations, DceError> {
        let arena = self.arena;
        for &root in roots {
            let kind = arena.kind(root)?;
            if !kind.is_declaration() {
                return Err(DceError::NotADeclaration { node: root, kind });
            }
            if let NodeData::Property(p) = arena.data(root)? {
                if !p.info.flags.external {
                    // 属性本身不会被处理，改为以它的部件为根
                    self.result.insert(root);
                    for part in [p.backing_field, p.getter, p.setter].into_iter().flatten() {
                        self.enqueue(part, None, "", true)?;
                    }
                    continue;
                }
            }
            self.enqueue(root, None, "", true)?;
        }

        let mut outer_iterations = 0;
        loop {
            outer_iterations += 1;
            while let Some(decl) = self.queue.pop_front() {
                self.process(decl)?;
            }
            self.handle_associated_objects()?;
            self.rescan_constructed_classes()?;
            debug!(
                "outer iteration {}: {} useful, {} contagious, {} constructed classes",
                outer_iterations,
                self.result.len(),
                self.contagious.len(),
                self.constructed_classes.len()
            );
            if self.queue.is_empty() {
                break;
            }
        }

        info!(
            "reachability ({}): {} roots, {} useful declarations after {} iterations",
            self.policy.name(),
            roots.len(),
            self.result.len(),
            outer_iterations
        );
        Ok(UsefulDeclarations {
            result: self.result,
            contagious: self.contagious,
            constructed_classes: self.constructed_classes,
            outer_iterations,
            trace: self.trace,
        })
    }

    fn process(
        &mut self,
        decl: NodeId,
    ) -> IrResult<()> {
        let arena = self.arena;
        trace!("process {} {:?}", decl, arena.kind(decl)?);

        if let Some(class) = member_class(arena, decl)? {
            self.enqueue_from(class, decl, "parent class")?;
        }

        match arena.data(decl)? {
            NodeData::Class(_) => self.process_class(decl)?,
            NodeData::SimpleFunction(_) => self.process_simple_function(decl)?,
            NodeData::Constructor(_) => self.process_constructor(decl)?,
            NodeData::EnumEntry(entry) => {
                if let Some(class) = entry.corresponding_class {
                    self.enqueue_from(class, decl, "enum entry class")?;
                }
            }
            _ => {}
        }

        for body in executable_parts(arena, decl)? {
            let mut visitor = BodyVisitor::new(self);
            accept(&mut visitor, arena, body, decl)?;
        }
        Ok(())
    }

    fn process_class(
        &mut self,
        class: NodeId,
    ) -> IrResult<()> {
        let arena = self.arena;
        let NodeData::Class(data) = arena.data(class)? else {
            return Ok(());
        };

        for ty in &data.super_types {
            if let Some(symbol) = ty.classifier() {
                let (owner, owner_data) = arena.owner_data(symbol)?;
                if matches!(owner_data, NodeData::Class(_)) {
                    self.enqueue_from(owner, class, "superTypes")?;
                }
            }
        }

        if let Some(accessor) = data.instance_accessor {
            if self.oracle.is_exported(arena, class)? {
                let accessor = arena.owner(accessor)?;
                self.enqueue_from(accessor, class, "Exported object getInstance function")?;
            }
        }

        for annotation in &data.info.annotations {
            if associated_key_marker(arena, self.policy.runtime(), *annotation)?.is_some() {
                self.classes_with_object_associations.insert(class);
            }
        }

        for member in &data.declarations {
            if let NodeData::AnonymousInitializer(init) = arena.data(*member)? {
                if init.is_static {
                    self.enqueue_from(*member, class, "static initializer")?;
                }
            }
        }
        Ok(())
    }

    fn process_simple_function(
        &mut self,
        function: NodeId,
    ) -> IrResult<()> {
        let is_fake = self
            .arena
            .data(function)?
            .as_overridable()
            .is_some_and(|m| m.is_fake_override());
        if is_fake {
            if let Some(real) = resolve_fake_override(self.arena, function)? {
                if real != function {
                    // 伪覆盖只是链接语法糖，不构成动态派发的依据
                    self.enqueue(real, Some(function), "real overridden fun", false)?;
                }
            }
        }
        Ok(())
    }

    fn process_constructor(
        &mut self,
        constructor: NodeId,
    ) -> IrResult<()> {
        let arena = self.arena;
        let Some(class) = arena.parent_class(constructor)? else {
            return Ok(());
        };
        self.constructed_classes.insert(class);
        for member in arena.declarations(class)? {
            if let NodeData::AnonymousInitializer(init) = arena.data(*member)? {
                if !init.is_static {
                    self.enqueue_from(*member, class, "anonymous initializer")?;
                }
            }
        }
        Ok(())
    }

    fn handle_associated_objects(&mut self) -> IrResult<()> {
        let arena = self.arena;
        let runtime = self.policy.runtime();
        if self.remove_unused_associated_objects {
            match runtime.get_associated_object {
                Some(intrinsic) if self.is_useful(intrinsic) => {}
                _ => return Ok(()),
            }
        }

        let classes: Vec<NodeId> = self.classes_with_object_associations.iter().copied().collect();
        for class in classes {
            for annotation in annotations_of(arena, class)? {
                let Some(marker) = associated_key_marker(arena, runtime, annotation)? else {
                    continue;
                };
                let Some(object) = associated_object(arena, annotation)? else {
                    continue;
                };
                // 注解与键标记都要保留，剪枝后关联关系仍然可见
                if let Some(ctor) = annotation_constructor(arena, annotation)? {
                    self.enqueue_from(ctor, class, "associated object annotation")?;
                }
                if let Some(ctor) = annotation_constructor(arena, marker)? {
                    self.enqueue_from(ctor, class, "associated object key")?;
                }
                self.enqueue_from(object, class, "associated object")?;
                if let NodeData::Class(object_data) = arena.data(object)? {
                    if let Some(accessor) = object_data.instance_accessor {
                        let accessor = arena.owner(accessor)?;
                        self.enqueue_from(accessor, class, "associated object factory")?;
                    }
                }
            }
        }
        Ok(())
    }

    /// 重新扫描全部被构造类的全部成员
    fn rescan_constructed_classes(&mut self) -> IrResult<()> {
        let arena = self.arena;
        let policy = self.policy;
        let classes: Vec<NodeId> = self.constructed_classes.iter().copied().collect();
        for class in classes {
            let members = arena.declarations(class)?.to_vec();
            for member in members {
                if self.is_useful(member) {
                    continue;
                }
                match arena.data(member)? {
                    NodeData::SimpleFunction(_) => {
                        if self.overrides_useful_declaration(member)? {
                            self.enqueue_from(member, class, "overrides useful declaration")?;
                        }
                    }
                    NodeData::Property(p) => {
                        let accessors = [
                            (p.getter, "(getter) overrides useful declaration"),
                            (p.setter, "(setter) overrides useful declaration"),
                        ];
                        for (accessor, description) in accessors {
                            let Some(accessor) = accessor else { continue };
                            if !self.is_useful(accessor)
                                && self.overrides_useful_declaration(accessor)?
                            {
                                self.enqueue_from(accessor, member, description)?;
                            }
                        }
                    }
                    _ => {}
                }
                policy.process_constructed_class_member(self, class, member)?;
            }
        }
        Ok(())
    }

    /// 覆盖链上是否有传染性可达的声明
    fn overrides_useful_declaration(
        &self,
        decl: NodeId,
    ) -> IrResult<bool> {
        let mut visited = IndexSet::new();
        let mut stack = overridden_declarations(self.arena, decl)?;
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if self.contagious.contains(&current) {
                return Ok(true);
            }
            stack.extend(overridden_declarations(self.arena, current)?);
        }
        Ok(false)
    }
}

/// 直接被覆盖的声明
///
/// 访问器自身没有覆盖记录时，取所属属性覆盖的属性上同一角色的访问器。
pub fn overridden_declarations(
    arena: &IrArena,
    decl: NodeId,
) -> IrResult<Vec<NodeId>> {
    let data = arena.data(decl)?;
    let Some(member) = data.as_overridable() else {
        return Ok(Vec::new());
    };
    let mut out = member
        .overridden_symbols()
        .iter()
        .map(|s| arena.owner(*s))
        .collect::<IrResult<Vec<_>>>()?;

    if let NodeData::SimpleFunction(f) = data {
        if out.is_empty() {
            if let Some(property_symbol) = f.corresponding_property {
                let (_, property) = arena.owner_data(property_symbol)?;
                if let NodeData::Property(property) = property {
                    let is_getter = property.getter == Some(decl);
                    for symbol in &property.overridden_symbols {
                        if let (_, NodeData::Property(overridden)) = arena.owner_data(*symbol)? {
                            let accessor = if is_getter { overridden.getter } else { overridden.setter };
                            out.extend(accessor);
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

/// 声明中会被执行的部分：函数体、参数默认值、初始化表达式
fn executable_parts(
    arena: &IrArena,
    decl: NodeId,
) -> IrResult<Vec<NodeId>> {
    let data = arena.data(decl)?;
    let mut parts = Vec::new();
    match data {
        NodeData::SimpleFunction(f) => {
            parameter_defaults(arena, &f.value_parameters, &mut parts)?;
            parts.extend(f.body);
        }
        NodeData::Constructor(c) => {
            parameter_defaults(arena, &c.value_parameters, &mut parts)?;
            parts.extend(c.body);
        }
        NodeData::Field(f) => parts.extend(f.initializer),
        NodeData::Variable(v) => parts.extend(v.initializer),
        NodeData::AnonymousInitializer(a) => parts.push(a.body),
        NodeData::EnumEntry(e) => parts.extend(e.initializer_expression),
        _ => {}
    }
    Ok(parts)
}

fn parameter_defaults(
    arena: &IrArena,
    parameters: &[NodeId],
    out: &mut Vec<NodeId>,
) -> IrResult<()> {
    for parameter in parameters {
        if let NodeData::ValueParameter(p) = arena.data(*parameter)? {
            out.extend(p.default_value);
        }
    }
    Ok(())
}

/// 用给定策略与根预言收集可达声明
pub fn collect_useful_declarations(
    arena: &IrArena,
    roots: &[NodeId],
    policy: &dyn ReachabilityPolicy,
    oracle: &dyn RootOracle,
    print_reachability_info: bool,
    remove_unused_associated_objects: bool,
) -> Result<UsefulDeclarations, DceError> {
    UsefulDeclarationProcessor::new(arena, policy, oracle)
        .with_trace(print_reachability_info)
        .with_remove_unused_associated_objects(remove_unused_associated_objects)
        .collect(roots)
}
