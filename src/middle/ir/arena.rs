//! IR arena
//!
//! 节点以 [`NodeId`] 索引存放；被释放的节点变成空槽，再次访问会返回
//! [`IrError::ReleasedNode`]。父指针随挂接/摘除同步维护。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::error::{IrError, IrResult};
use super::ids::{NodeId, SymbolId};
use super::kind::NodeKind;
use super::node::{Children, Node, NodeBase, NodeData};
use super::symbol::{SymbolEntry, SymbolKind, SymbolTable};

/// 节点与符号的存储
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrArena {
    nodes: Vec<Option<Node>>,
    symbols: SymbolTable,
    modules: Vec<NodeId>,
}

impl IrArena {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- 符号 ----

    /// 声明未绑定符号
    pub fn declare_symbol(
        &mut self,
        kind: SymbolKind,
        name: impl Into<String>,
    ) -> SymbolId {
        self.symbols.declare(kind, name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbol_entry(
        &self,
        symbol: SymbolId,
    ) -> IrResult<&SymbolEntry> {
        self.symbols.entry(symbol)
    }

    /// 解引用符号到其声明节点
    pub fn owner(
        &self,
        symbol: SymbolId,
    ) -> IrResult<NodeId> {
        self.symbols.owner(symbol)
    }

    /// 解引用符号并取出声明数据
    pub fn owner_data(
        &self,
        symbol: SymbolId,
    ) -> IrResult<(NodeId, &NodeData)> {
        let owner = self.owner(symbol)?;
        Ok((owner, self.data(owner)?))
    }

    /// 声明的身份符号
    ///
    /// 错误节点没有符号；请求时返回 [`IrError::ErrorNodeSymbol`]。
    pub fn symbol_of(
        &self,
        node: NodeId,
    ) -> IrResult<SymbolId> {
        let data = self.data(node)?;
        if let NodeData::ErrorDeclaration(err) = data {
            return Err(IrError::ErrorNodeSymbol {
                node,
                description: err.description.clone(),
            });
        }
        data.symbol().ok_or(IrError::NotASymbolOwner {
            node,
            kind: data.kind(),
        })
    }

    // ---- 节点 ----

    /// 加入节点并接管其子节点
    ///
    /// 每个子节点必须存活且尚无父节点；声明自带的符号在此绑定。
    pub fn add_node(
        &mut self,
        base: NodeBase,
        data: NodeData,
    ) -> IrResult<NodeId> {
        let children = data.children();
        for child in &children {
            if let Some(parent) = self.node(*child)?.base.parent {
                return Err(IrError::AlreadyOwned {
                    child: *child,
                    parent,
                });
            }
        }

        let id = NodeId::new(self.nodes.len());
        let kind = data.kind();
        if let Some(symbol) = data.symbol() {
            self.symbols.bind(symbol, id, kind)?;
        }
        for child in &children {
            self.node_mut(*child)?.base.parent = Some(id);
        }
        if kind == NodeKind::ModuleFragment {
            self.modules.push(id);
        }
        self.nodes.push(Some(Node { base, data }));
        trace!("add {} {:?}", id, kind);
        Ok(id)
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> IrResult<&Node> {
        match self.nodes.get(id.index()) {
            Some(Some(node)) => Ok(node),
            Some(None) => Err(IrError::ReleasedNode(id)),
            None => Err(IrError::UnknownNode(id)),
        }
    }

    pub fn node_mut(
        &mut self,
        id: NodeId,
    ) -> IrResult<&mut Node> {
        match self.nodes.get_mut(id.index()) {
            Some(Some(node)) => Ok(node),
            Some(None) => Err(IrError::ReleasedNode(id)),
            None => Err(IrError::UnknownNode(id)),
        }
    }

    pub fn data(
        &self,
        id: NodeId,
    ) -> IrResult<&NodeData> {
        Ok(&self.node(id)?.data)
    }

    pub fn data_mut(
        &mut self,
        id: NodeId,
    ) -> IrResult<&mut NodeData> {
        Ok(&mut self.node_mut(id)?.data)
    }

    pub fn kind(
        &self,
        id: NodeId,
    ) -> IrResult<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    pub fn parent(
        &self,
        id: NodeId,
    ) -> IrResult<Option<NodeId>> {
        Ok(self.node(id)?.base.parent)
    }

    pub fn children(
        &self,
        id: NodeId,
    ) -> IrResult<Children> {
        Ok(self.data(id)?.children())
    }

    pub fn is_live(
        &self,
        id: NodeId,
    ) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    /// 模块片段（加入顺序）
    pub fn modules(&self) -> &[NodeId] {
        &self.modules
    }

    /// 存活节点数
    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// 所有存活节点
    pub fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId::new(i), n)))
    }

    /// 以 `root` 为根的前序遍历
    pub fn descendants(
        &self,
        root: NodeId,
    ) -> IrResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children = self.children(id)?;
            stack.extend(children.iter().rev().copied());
        }
        Ok(out)
    }

    /// 直接父类（成员声明所在的类）
    pub fn parent_class(
        &self,
        id: NodeId,
    ) -> IrResult<Option<NodeId>> {
        match self.parent(id)? {
            Some(parent) if self.kind(parent)? == NodeKind::Class => Ok(Some(parent)),
            _ => Ok(None),
        }
    }

    /// 所在文件
    pub fn file_of(
        &self,
        id: NodeId,
    ) -> IrResult<Option<NodeId>> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.kind(node)? == NodeKind::File {
                return Ok(Some(node));
            }
            current = self.parent(node)?;
        }
        Ok(None)
    }

    /// 全限定名：包名 + 外层类 + 自身名，以 `.` 连接
    pub fn fq_name(
        &self,
        id: NodeId,
    ) -> IrResult<String> {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let data = self.data(node)?;
            match data {
                NodeData::File(file) => {
                    if !file.package.is_empty() {
                        parts.push(file.package.clone());
                    }
                    break;
                }
                NodeData::Class(_)
                | NodeData::SimpleFunction(_)
                | NodeData::Constructor(_)
                | NodeData::Property(_)
                | NodeData::Field(_)
                | NodeData::EnumEntry(_)
                | NodeData::TypeAlias(_) => {
                    if let Some(info) = data.declaration_info() {
                        parts.push(info.name.clone());
                    }
                }
                _ => {}
            }
            current = self.parent(node)?;
        }
        parts.reverse();
        Ok(parts.join("."))
    }

    // ---- 结构修改 ----

    fn adopt(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> IrResult<()> {
        let node = self.node_mut(child)?;
        if let Some(existing) = node.base.parent {
            return Err(IrError::AlreadyOwned {
                child,
                parent: existing,
            });
        }
        node.base.parent = Some(parent);
        Ok(())
    }

    fn container_mut(
        &mut self,
        container: NodeId,
    ) -> IrResult<&mut Vec<NodeId>> {
        let node = self.node_mut(container)?;
        let kind = node.kind();
        node.data
            .as_container_mut()
            .map(|c| c.declarations_mut())
            .ok_or(IrError::NotAContainer {
                node: container,
                kind,
            })
    }

    /// 容器的声明列表
    pub fn declarations(
        &self,
        container: NodeId,
    ) -> IrResult<&[NodeId]> {
        let data = self.data(container)?;
        data.as_container()
            .map(|c| c.declarations())
            .ok_or(IrError::NotAContainer {
                node: container,
                kind: data.kind(),
            })
    }

    /// 在容器末尾加入声明
    pub fn add_declaration(
        &mut self,
        container: NodeId,
        child: NodeId,
    ) -> IrResult<()> {
        self.insert_declaration(container, usize::MAX, child)
    }

    /// 在容器指定位置加入声明（越界则追加）
    pub fn insert_declaration(
        &mut self,
        container: NodeId,
        index: usize,
        child: NodeId,
    ) -> IrResult<()> {
        if !self.kind(child)?.is_declaration() {
            return Err(IrError::NotADeclaration {
                node: child,
                kind: self.kind(child)?,
            });
        }
        self.container_mut(container)?;
        self.adopt(container, child)?;
        let list = self.container_mut(container)?;
        let index = index.min(list.len());
        list.insert(index, child);
        Ok(())
    }

    /// 从容器中摘除声明（不释放）
    pub fn remove_declaration(
        &mut self,
        container: NodeId,
        child: NodeId,
    ) -> IrResult<()> {
        let list = self.container_mut(container)?;
        let before = list.len();
        list.retain(|id| *id != child);
        if list.len() == before {
            return Err(IrError::NotAChild {
                parent: container,
                child,
            });
        }
        self.node_mut(child)?.base.parent = None;
        Ok(())
    }

    /// 只保留满足条件的声明，返回被摘除的声明（保持原相对顺序）
    pub fn retain_declarations(
        &mut self,
        container: NodeId,
        mut keep: impl FnMut(NodeId) -> bool,
    ) -> IrResult<Vec<NodeId>> {
        let list = self.container_mut(container)?;
        let mut removed = Vec::new();
        list.retain(|id| {
            if keep(*id) {
                true
            } else {
                removed.push(*id);
                false
            }
        });
        for id in &removed {
            self.node_mut(*id)?.base.parent = None;
        }
        Ok(removed)
    }

    fn attach_with(
        &mut self,
        parent: NodeId,
        child: NodeId,
        slot: impl FnOnce(&mut NodeData) -> bool,
    ) -> IrResult<()> {
        if let Some(existing) = self.parent(child)? {
            return Err(IrError::AlreadyOwned {
                child,
                parent: existing,
            });
        }
        let node = self.node_mut(parent)?;
        let kind = node.kind();
        if !slot(&mut node.data) {
            return Err(IrError::NotAContainer { node: parent, kind });
        }
        self.node_mut(child)?.base.parent = Some(parent);
        Ok(())
    }

    /// 把文件加入模块片段
    pub fn add_file(
        &mut self,
        module: NodeId,
        file: NodeId,
    ) -> IrResult<()> {
        self.attach_with(module, file, |data| match data {
            NodeData::ModuleFragment(m) => {
                m.files.push(file);
                true
            }
            _ => false,
        })
    }

    /// 在语句列表末尾追加语句（块体、Block、Composite）
    pub fn add_statement(
        &mut self,
        container: NodeId,
        statement: NodeId,
    ) -> IrResult<()> {
        self.attach_with(container, statement, |data| match data.statements_mut() {
            Some(list) => {
                list.push(statement);
                true
            }
            None => false,
        })
    }

    /// 给声明加注解
    pub fn add_annotation(
        &mut self,
        decl: NodeId,
        annotation: NodeId,
    ) -> IrResult<()> {
        self.attach_with(decl, annotation, |data| match data {
            NodeData::File(f) => {
                f.annotations.push(annotation);
                true
            }
            other => match other.declaration_info_mut() {
                Some(info) => {
                    info.annotations.push(annotation);
                    true
                }
                None => false,
            },
        })
    }

    /// 设置函数或构造器的函数体，旧函数体被摘除并返回
    pub fn set_body(
        &mut self,
        function: NodeId,
        body: NodeId,
    ) -> IrResult<Option<NodeId>> {
        let old = self.data(function)?.body();
        if let Some(old) = old {
            self.detach_child(function, old)?;
        }
        self.attach_with(function, body, |data| match data {
            NodeData::SimpleFunction(f) => {
                f.body = Some(body);
                true
            }
            NodeData::Constructor(c) => {
                c.body = Some(body);
                true
            }
            _ => false,
        })?;
        Ok(old)
    }

    /// 设置字段的初始化表达式，旧表达式被摘除并返回
    pub fn set_initializer(
        &mut self,
        field: NodeId,
        initializer: NodeId,
    ) -> IrResult<Option<NodeId>> {
        let old = match self.data(field)? {
            NodeData::Field(f) => f.initializer,
            _ => None,
        };
        if let Some(old) = old {
            self.detach_child(field, old)?;
        }
        self.attach_with(field, initializer, |data| match data {
            NodeData::Field(f) => {
                f.initializer = Some(initializer);
                true
            }
            _ => false,
        })?;
        Ok(old)
    }

    /// 摘除可选/列表槽位中的子节点（不释放）
    pub fn detach_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> IrResult<()> {
        if !self.node_mut(parent)?.data.detach_child(child) {
            return Err(IrError::NotAChild { parent, child });
        }
        self.node_mut(child)?.base.parent = None;
        Ok(())
    }

    /// 断开节点与其父节点的所有权，使它可以挂到别处
    ///
    /// 可选/列表槽位会被清空；必填槽位仍指向该节点，父节点随后应被替换或释放。
    pub fn orphan(
        &mut self,
        child: NodeId,
    ) -> IrResult<()> {
        if let Some(parent) = self.parent(child)? {
            if self.is_live(parent) {
                self.node_mut(parent)?.data.detach_child(child);
            }
            self.node_mut(child)?.base.parent = None;
        }
        Ok(())
    }

    /// 用 `new` 替换 `parent` 中的子节点 `old`
    ///
    /// `new` 必须尚无父节点，且类别与原位置兼容；`old` 被摘除但不释放。
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> IrResult<()> {
        if old == new {
            return Ok(());
        }
        let old_kind = self.kind(old)?;
        let new_kind = self.kind(new)?;
        if !old_kind.is_compatible_replacement(new_kind) {
            return Err(IrError::IncompatibleReplacement {
                parent,
                old: old_kind,
                new: new_kind,
            });
        }
        if let Some(existing) = self.parent(new)? {
            return Err(IrError::AlreadyOwned {
                child: new,
                parent: existing,
            });
        }

        let mut replaced = false;
        self.node_mut(parent)?.data.for_each_child_mut(&mut |slot| {
            if !replaced && *slot == old {
                *slot = new;
                replaced = true;
            }
        });
        if !replaced {
            return Err(IrError::NotAChild { parent, child: old });
        }
        self.node_mut(old)?.base.parent = None;
        self.node_mut(new)?.base.parent = Some(parent);
        Ok(())
    }

    /// 释放子树：节点变成空槽，子树中声明的符号变为已释放
    ///
    /// 若根仍挂在父节点上，会先从父节点摘除。返回释放的节点数。
    pub fn release_subtree(
        &mut self,
        root: NodeId,
    ) -> IrResult<usize> {
        if let Some(parent) = self.parent(root)? {
            if self.is_live(parent) {
                let detached = self.node_mut(parent)?.data.detach_child(root);
                if !detached {
                    // 必填槽位：只断开父指针，由调用方负责替换
                    trace!("release {} from required slot of {}", root, parent);
                }
            }
        }

        // 只沿父指针仍指向自身的子节点下行：被移走的子节点不随旧父节点释放
        let mut doomed = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            doomed.push(id);
            for child in self.children(id)? {
                if self.is_live(child) && self.parent(child)? == Some(id) {
                    stack.push(child);
                }
            }
        }

        let mut released = HashSet::with_capacity(doomed.len());
        for id in doomed {
            if !released.insert(id) {
                continue;
            }
            let node = self.nodes[id.index()].take();
            if let Some(node) = node {
                if let Some(symbol) = node.data.symbol() {
                    if self.symbols.owner(symbol).ok() == Some(id) {
                        self.symbols.release(symbol);
                    }
                }
                if node.kind() == NodeKind::ModuleFragment {
                    self.modules.retain(|m| *m != id);
                }
            }
        }
        trace!("released {} nodes under {}", released.len(), root);
        Ok(released.len())
    }
}
