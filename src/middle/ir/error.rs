//! IR 错误类型
//!
//! 这些错误都表示编译器内部缺陷（前端或 lowering 的 bug），
//! 而不是用户输入错误，调用方应当立即向上传播。

use thiserror::Error;

use super::ids::{NodeId, SymbolId};
use super::kind::NodeKind;
use super::symbol::SymbolKind;

/// IR 操作错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    /// 解引用尚未绑定的符号
    #[error("Unbound symbol {symbol} ({name})")]
    UnboundSymbol { symbol: SymbolId, name: String },

    /// 符号的声明已在剪枝中释放
    #[error("Symbol {symbol} ({name}) refers to a released declaration")]
    ReleasedSymbol { symbol: SymbolId, name: String },

    /// 访问错误节点的身份符号
    #[error("Error node {node} has no symbol: {description}")]
    ErrorNodeSymbol { node: NodeId, description: String },

    /// 节点已被释放
    #[error("Node {0} was released")]
    ReleasedNode(NodeId),

    /// 节点不存在
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// 符号不存在
    #[error("Unknown symbol {0}")]
    UnknownSymbol(SymbolId),

    /// 节点不是声明容器
    #[error("Node {node} ({kind:?}) is not a declaration container")]
    NotAContainer { node: NodeId, kind: NodeKind },

    /// 节点不是声明
    #[error("Node {node} ({kind:?}) is not a declaration")]
    NotADeclaration { node: NodeId, kind: NodeKind },

    /// 节点不持有符号
    #[error("Node {node} ({kind:?}) does not own a symbol")]
    NotASymbolOwner { node: NodeId, kind: NodeKind },

    /// 符号绑定到了不匹配的声明种类
    #[error("Symbol {symbol} of kind {expected:?} cannot be bound to {found:?}")]
    SymbolKindMismatch {
        symbol: SymbolId,
        expected: SymbolKind,
        found: NodeKind,
    },

    /// 符号已绑定到其他节点
    #[error("Symbol {symbol} is already bound to {owner}")]
    AlreadyBound { symbol: SymbolId, owner: NodeId },

    /// 节点已经有父节点，不能被第二个父节点拥有
    #[error("Node {child} is already owned by {parent}")]
    AlreadyOwned { child: NodeId, parent: NodeId },

    /// 容器中不存在该子节点
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// 替换节点与原位置的类别不兼容
    #[error("Cannot replace {old:?} with {new:?} in {parent}")]
    IncompatibleReplacement {
        parent: NodeId,
        old: NodeKind,
        new: NodeKind,
    },
}

/// IR 结果类型
pub type IrResult<T> = Result<T, IrError>;
