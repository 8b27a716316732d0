//! 节点与符号标识
//!
//! IR 中所有节点都存放在 [`IrArena`](super::IrArena) 里，
//! 节点之间的所有权边与引用边都用这里的索引表示。

use std::fmt;

use serde::{Deserialize, Serialize};

/// IR 节点在 arena 中的索引
///
/// 拥有关系（父节点持有子节点）和非拥有关系（符号引用）都通过索引表达，
/// 因此引用图中的环不会造成任何释放问题。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// 从原始下标创建
    #[inline]
    pub fn new(value: usize) -> Self {
        NodeId(value as u32)
    }

    /// 返回原始下标
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 符号标识
///
/// 符号与声明节点相互独立：符号可以在声明节点创建之前存在（未绑定），
/// 在声明节点挂入 arena 后再绑定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn new(value: usize) -> Self {
        SymbolId(value as u32)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}
