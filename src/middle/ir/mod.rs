//! IR 树
//!
//! 声明 / 表达式 / 函数体节点存放在 [`IrArena`] 中，以 [`NodeId`] 索引。
//! 所有权边（子节点）构成森林；符号引用边（调用目标、覆盖关系等）
//! 经由 [`SymbolId`] 间接指向声明，可以成环，永不拥有。
//!
//! - [`visitor`]：只读遍历
//! - [`transformer`]：就地重写
//! - [`builder`]：构造节点并绑定符号
//! - [`fake_override`]：伪覆盖解析
//! - [`validate`]：悬空引用检查

pub mod arena;
pub mod builder;
pub mod dump;
pub mod error;
pub mod fake_override;
pub mod ids;
pub mod kind;
pub mod node;
pub mod symbol;
pub mod traits;
pub mod transformer;
pub mod types;
pub mod validate;
pub mod visitor;

pub use arena::IrArena;
pub use builder::{FunctionOptions, IrBuilder};
pub use dump::{dump_modules, dump_tree};
pub use error::{IrError, IrResult};
pub use fake_override::{collect_real_overrides, resolve_fake_override};
pub use ids::{NodeId, SymbolId};
pub use kind::{NodeCategory, NodeKind};
pub use node::{DeclarationFlags, DeclarationInfo, Node, NodeBase, NodeData};
pub use symbol::{SymbolKind, SymbolState, SymbolTable};
pub use traits::{DeclarationContainer, DeclarationWithName, OverridableDeclaration, SymbolOwner};
pub use transformer::{accept_transform, rewrite_statements, transform_children, IrTransformer};
pub use types::{
    ClassKind, ConstValue, DeclarationOrigin, IrType, Modality, TypeOperator, Visibility,
};
pub use validate::{find_dangling_references, DanglingReference};
pub use visitor::{accept, accept_children, IrVisitor};

#[cfg(test)]
mod tests;
