//! 悬空引用检查
//!
//! 剪枝之后，挂在模块上的节点不应再引用已释放或未绑定的声明。
//! 类型中的分类器不在检查范围内（后端擦除类型）。

use std::fmt;

use super::arena::IrArena;
use super::error::IrResult;
use super::ids::{NodeId, SymbolId};
use super::kind::NodeKind;
use super::symbol::SymbolState;

/// 一条悬空引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// 引用方节点
    pub node: NodeId,
    pub kind: NodeKind,
    pub symbol: SymbolId,
    pub name: String,
    pub state: SymbolState,
}

impl fmt::Display for DanglingReference {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = match self.state {
            SymbolState::Released => "released",
            SymbolState::Unbound => "unbound",
            SymbolState::Bound(_) => "bound",
        };
        write!(
            f,
            "{} ({:?}) references {} symbol {} ({})",
            self.node, self.kind, state, self.symbol, self.name
        )
    }
}

/// 找出所有从模块可达节点指向已释放/未绑定符号的引用
pub fn find_dangling_references(arena: &IrArena) -> IrResult<Vec<DanglingReference>> {
    let mut dangling = Vec::new();
    for module in arena.modules() {
        for node in arena.descendants(*module)? {
            let data = arena.data(node)?;
            for symbol in data.referenced_symbols() {
                let entry = arena.symbol_entry(symbol)?;
                if !matches!(entry.state, SymbolState::Bound(_)) {
                    dangling.push(DanglingReference {
                        node,
                        kind: data.kind(),
                        symbol,
                        name: entry.name.clone(),
                        state: entry.state,
                    });
                }
            }
        }
    }
    Ok(dangling)
}
