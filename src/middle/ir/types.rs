//! IR 类型与标量属性
//!
//! 类型按值存放在节点中，通过分类器符号引用类或类型参数；
//! 它们不是所有权边，也不参与可达性（后端会擦除类型）。

use serde::{Deserialize, Serialize};

use super::ids::SymbolId;

/// IR 类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrType {
    /// 由类或类型参数构成的简单类型
    Simple {
        classifier: SymbolId,
        arguments: Vec<IrType>,
        nullable: bool,
    },
    /// 动态类型（JS `dynamic`）
    Dynamic,
    /// 无法解析的类型
    Error,
}

impl IrType {
    /// 以类符号构造非空简单类型
    pub fn simple(classifier: SymbolId) -> Self {
        IrType::Simple {
            classifier,
            arguments: Vec::new(),
            nullable: false,
        }
    }

    /// 可空版本
    pub fn nullable(classifier: SymbolId) -> Self {
        IrType::Simple {
            classifier,
            arguments: Vec::new(),
            nullable: true,
        }
    }

    /// 分类器符号
    pub fn classifier(&self) -> Option<SymbolId> {
        match self {
            IrType::Simple { classifier, .. } => Some(*classifier),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, IrType::Simple { nullable: true, .. } | IrType::Dynamic)
    }
}

/// 常量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Null,
    Boolean(bool),
    Char(char),
    Int(i64),
    Float(f64),
    String(String),
}

/// 类的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    /// 单例对象
    Object,
    EnumClass,
    Annotation,
}

/// 可继承性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Modality {
    #[default]
    Final,
    Open,
    Abstract,
    Sealed,
}

/// 可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
    Local,
}

/// 节点来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeclarationOrigin {
    #[default]
    Defined,
    /// 继承但未显式声明的成员
    FakeOverride,
    /// lowering 合成的字段初始化函数
    FieldInitializer,
    /// 属性的默认访问器
    DefaultAccessor,
    /// 属性的幕后字段
    BackingField,
    /// 其他合成声明
    Synthetic,
}

/// 类型运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeOperator {
    Cast,
    ImplicitCast,
    SafeCast,
    InstanceOf,
    NotInstanceOf,
    ImplicitCoercionToUnit,
}

/// 合成函数体的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntheticBodyKind {
    EnumValues,
    EnumValueOf,
    EnumEntries,
}
