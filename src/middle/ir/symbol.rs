//! 符号表
//!
//! 符号是声明的稳定身份。声明节点可以晚于符号创建（前向声明、反序列化、
//! lowering 中合成的成员），因此符号有 未绑定 / 已绑定 / 已释放 三种状态。

use serde::{Deserialize, Serialize};

use super::error::{IrError, IrResult};
use super::ids::{NodeId, SymbolId};
use super::kind::NodeKind;

/// 符号种类，决定它能绑定到哪种声明
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    File,
    Class,
    SimpleFunction,
    Constructor,
    Property,
    Field,
    TypeParameter,
    ValueParameter,
    EnumEntry,
    TypeAlias,
    Variable,
    AnonymousInitializer,
}

impl SymbolKind {
    /// 该符号种类对应的声明节点种类
    pub fn owner_kind(&self) -> NodeKind {
        match self {
            SymbolKind::File => NodeKind::File,
            SymbolKind::Class => NodeKind::Class,
            SymbolKind::SimpleFunction => NodeKind::SimpleFunction,
            SymbolKind::Constructor => NodeKind::Constructor,
            SymbolKind::Property => NodeKind::Property,
            SymbolKind::Field => NodeKind::Field,
            SymbolKind::TypeParameter => NodeKind::TypeParameter,
            SymbolKind::ValueParameter => NodeKind::ValueParameter,
            SymbolKind::EnumEntry => NodeKind::EnumEntry,
            SymbolKind::TypeAlias => NodeKind::TypeAlias,
            SymbolKind::Variable => NodeKind::Variable,
            SymbolKind::AnonymousInitializer => NodeKind::AnonymousInitializer,
        }
    }

    /// 是否是值声明（变量或参数），可以被 GetValue/SetValue 访问
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            SymbolKind::Variable | SymbolKind::ValueParameter | SymbolKind::Field
        )
    }
}

/// 绑定状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolState {
    /// 尚未绑定到声明
    Unbound,
    /// 已绑定
    Bound(NodeId),
    /// 声明已被剪枝释放
    Released,
}

/// 符号表条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// 符号种类
    pub kind: SymbolKind,
    /// 调试用名称（签名提示）
    pub name: String,
    /// 绑定状态
    pub state: SymbolState,
}

/// 符号表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建未绑定的符号
    pub fn declare(
        &mut self,
        kind: SymbolKind,
        name: impl Into<String>,
    ) -> SymbolId {
        let id = SymbolId::new(self.entries.len());
        self.entries.push(SymbolEntry {
            kind,
            name: name.into(),
            state: SymbolState::Unbound,
        });
        id
    }

    pub fn entry(
        &self,
        symbol: SymbolId,
    ) -> IrResult<&SymbolEntry> {
        self.entries
            .get(symbol.index())
            .ok_or(IrError::UnknownSymbol(symbol))
    }

    /// 绑定符号
    ///
    /// 重复绑定到同一节点是允许的（反序列化后重新链接）。
    pub fn bind(
        &mut self,
        symbol: SymbolId,
        owner: NodeId,
        owner_kind: NodeKind,
    ) -> IrResult<()> {
        let entry = self
            .entries
            .get_mut(symbol.index())
            .ok_or(IrError::UnknownSymbol(symbol))?;
        if entry.kind.owner_kind() != owner_kind {
            return Err(IrError::SymbolKindMismatch {
                symbol,
                expected: entry.kind,
                found: owner_kind,
            });
        }
        match entry.state {
            SymbolState::Bound(existing) if existing != owner => Err(IrError::AlreadyBound {
                symbol,
                owner: existing,
            }),
            _ => {
                entry.state = SymbolState::Bound(owner);
                Ok(())
            }
        }
    }

    /// 解引用符号
    pub fn owner(
        &self,
        symbol: SymbolId,
    ) -> IrResult<NodeId> {
        let entry = self.entry(symbol)?;
        match entry.state {
            SymbolState::Bound(owner) => Ok(owner),
            SymbolState::Unbound => Err(IrError::UnboundSymbol {
                symbol,
                name: entry.name.clone(),
            }),
            SymbolState::Released => Err(IrError::ReleasedSymbol {
                symbol,
                name: entry.name.clone(),
            }),
        }
    }

    pub fn is_bound(
        &self,
        symbol: SymbolId,
    ) -> bool {
        matches!(
            self.entries.get(symbol.index()).map(|e| e.state),
            Some(SymbolState::Bound(_))
        )
    }

    pub(crate) fn release(
        &mut self,
        symbol: SymbolId,
    ) {
        if let Some(entry) = self.entries.get_mut(symbol.index()) {
            entry.state = SymbolState::Released;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历所有符号
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (SymbolId::new(i), e))
    }
}
