//! 声明能力 trait
//!
//! 跨种类的统一访问："有名字的声明"、"持有符号"、"可被覆盖"、"声明容器"。

use super::ids::{NodeId, SymbolId};
use super::node::{
    ClassDecl, DeclarationInfo, FileData, FunctionDecl, NodeData, PropertyDecl,
};
use super::types::Modality;

/// 有名字的声明
pub trait DeclarationWithName {
    fn info(&self) -> &DeclarationInfo;

    fn name(&self) -> &str {
        &self.info().name
    }
}

/// 持有身份符号的声明
pub trait SymbolOwner {
    fn symbol(&self) -> SymbolId;
}

/// 可被覆盖的成员（函数、属性）
pub trait OverridableDeclaration: SymbolOwner + DeclarationWithName {
    fn modality(&self) -> Modality;
    fn overridden_symbols(&self) -> &[SymbolId];
    fn overridden_symbols_mut(&mut self) -> &mut Vec<SymbolId>;
    fn is_fake_override(&self) -> bool;
}

/// 持有声明列表的节点（文件、类）
pub trait DeclarationContainer {
    fn declarations(&self) -> &[NodeId];
    fn declarations_mut(&mut self) -> &mut Vec<NodeId>;
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(
            impl DeclarationWithName for $ty {
                fn info(&self) -> &DeclarationInfo {
                    &self.info
                }
            }

            impl SymbolOwner for $ty {
                fn symbol(&self) -> SymbolId {
                    self.symbol
                }
            }
        )*
    };
}

impl_named!(ClassDecl, FunctionDecl, PropertyDecl);

macro_rules! impl_overridable {
    ($($ty:ty),*) => {
        $(
            impl OverridableDeclaration for $ty {
                fn modality(&self) -> Modality {
                    self.modality
                }

                fn overridden_symbols(&self) -> &[SymbolId] {
                    &self.overridden_symbols
                }

                fn overridden_symbols_mut(&mut self) -> &mut Vec<SymbolId> {
                    &mut self.overridden_symbols
                }

                fn is_fake_override(&self) -> bool {
                    self.is_fake_override
                }
            }
        )*
    };
}

impl_overridable!(FunctionDecl, PropertyDecl);

impl DeclarationContainer for FileData {
    fn declarations(&self) -> &[NodeId] {
        &self.declarations
    }

    fn declarations_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.declarations
    }
}

impl DeclarationContainer for ClassDecl {
    fn declarations(&self) -> &[NodeId] {
        &self.declarations
    }

    fn declarations_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.declarations
    }
}

impl NodeData {
    pub fn as_overridable(&self) -> Option<&dyn OverridableDeclaration> {
        match self {
            NodeData::SimpleFunction(f) => Some(f),
            NodeData::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_overridable_mut(&mut self) -> Option<&mut dyn OverridableDeclaration> {
        match self {
            NodeData::SimpleFunction(f) => Some(f),
            NodeData::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&dyn DeclarationContainer> {
        match self {
            NodeData::File(f) => Some(f),
            NodeData::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut dyn DeclarationContainer> {
        match self {
            NodeData::File(f) => Some(f),
            NodeData::Class(c) => Some(c),
            _ => None,
        }
    }

    /// 声明名；非声明节点返回 `None`
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeData::File(f) => Some(&f.path),
            NodeData::ModuleFragment(m) => Some(&m.name),
            other => other.declaration_info().map(|info| info.name.as_str()),
        }
    }
}
