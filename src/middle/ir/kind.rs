//! 节点种类标签
//!
//! [`NodeKind`] 是不可变的种类标签，每个种类对应 IR 节点 schema 中的一个元素。
//! `child_fields` 给出该种类拥有的子节点字段（按遍历顺序），
//! 与 [`ir_tree_schema`](crate::middle::schema::tree::ir_tree_schema) 解析出的可遍历子节点集合保持一致。

use serde::{Deserialize, Serialize};

/// 节点大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    ModuleFragment,
    File,
    Declaration,
    Body,
    Expression,
    Branch,
    Catch,
    SpreadElement,
}

macro_rules! node_kinds {
    ($( $kind:ident => $schema:literal, $category:ident, [$($child:literal),*] );* $(;)?) => {
        /// IR 节点种类
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum NodeKind {
            $($kind),*
        }

        impl NodeKind {
            /// 全部种类
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind),*];

            /// schema 中对应的元素名
            pub fn schema_name(&self) -> &'static str {
                match self {
                    $(NodeKind::$kind => $schema),*
                }
            }

            /// 节点大类
            pub fn category(&self) -> NodeCategory {
                match self {
                    $(NodeKind::$kind => NodeCategory::$category),*
                }
            }

            /// 拥有的子节点字段，按遍历顺序
            pub fn child_fields(&self) -> &'static [&'static str] {
                match self {
                    $(NodeKind::$kind => &[$($child),*]),*
                }
            }
        }
    };
}

node_kinds! {
    ModuleFragment => "module_fragment", ModuleFragment, ["files"];
    File => "file", File, ["annotations", "declarations"];

    Class => "class", Declaration, ["annotations", "type_parameters", "declarations"];
    SimpleFunction => "simple_function", Declaration, ["annotations", "type_parameters", "dispatch_receiver_parameter", "value_parameters", "body"];
    Constructor => "constructor", Declaration, ["annotations", "type_parameters", "dispatch_receiver_parameter", "value_parameters", "body"];
    Property => "property", Declaration, ["annotations", "backing_field", "getter", "setter"];
    Field => "field", Declaration, ["annotations", "initializer"];
    TypeParameter => "type_parameter", Declaration, ["annotations"];
    ValueParameter => "value_parameter", Declaration, ["annotations", "default_value"];
    EnumEntry => "enum_entry", Declaration, ["annotations", "initializer_expression", "corresponding_class"];
    TypeAlias => "type_alias", Declaration, ["annotations", "type_parameters"];
    Variable => "variable", Declaration, ["annotations", "initializer"];
    AnonymousInitializer => "anonymous_initializer", Declaration, ["annotations", "body"];
    ErrorDeclaration => "error_declaration", Declaration, ["annotations"];

    BlockBody => "block_body", Body, ["statements"];
    ExpressionBody => "expression_body", Body, ["expression"];
    SyntheticBody => "synthetic_body", Body, [];

    Block => "block", Expression, ["statements"];
    Composite => "composite", Expression, ["statements"];
    Return => "return", Expression, ["value"];
    Throw => "throw", Expression, ["value"];
    Call => "call", Expression, ["dispatch_receiver", "extension_receiver", "arguments"];
    ConstructorCall => "constructor_call", Expression, ["dispatch_receiver", "extension_receiver", "arguments"];
    DelegatingConstructorCall => "delegating_constructor_call", Expression, ["dispatch_receiver", "extension_receiver", "arguments"];
    EnumConstructorCall => "enum_constructor_call", Expression, ["dispatch_receiver", "extension_receiver", "arguments"];
    InstanceInitializerCall => "instance_initializer_call", Expression, [];
    GetField => "get_field", Expression, ["receiver"];
    SetField => "set_field", Expression, ["receiver", "value"];
    GetValue => "get_value", Expression, [];
    SetValue => "set_value", Expression, ["value"];
    GetObjectValue => "get_object_value", Expression, [];
    GetEnumValue => "get_enum_value", Expression, [];
    Const => "const", Expression, [];
    StringConcatenation => "string_concatenation", Expression, ["arguments"];
    TypeOperatorCall => "type_operator_call", Expression, ["argument"];
    When => "when", Expression, ["branches"];
    WhileLoop => "while_loop", Expression, ["condition", "body"];
    DoWhileLoop => "do_while_loop", Expression, ["condition", "body"];
    Break => "break", Expression, [];
    Continue => "continue", Expression, [];
    Try => "try", Expression, ["try_result", "catches", "finally_expression"];
    Vararg => "vararg", Expression, ["elements"];
    FunctionReference => "function_reference", Expression, ["dispatch_receiver", "extension_receiver", "arguments"];
    PropertyReference => "property_reference", Expression, ["dispatch_receiver", "extension_receiver", "arguments"];
    FunctionExpression => "function_expression", Expression, ["function"];
    ClassReference => "class_reference", Expression, [];
    RawFunctionReference => "raw_function_reference", Expression, [];
    ErrorExpression => "error_expression", Expression, [];
    ErrorCallExpression => "error_call_expression", Expression, ["explicit_receiver", "arguments"];

    Branch => "branch", Branch, ["condition", "result"];
    ElseBranch => "else_branch", Branch, ["condition", "result"];
    Catch => "catch", Catch, ["catch_parameter", "result"];
    SpreadElement => "spread_element", SpreadElement, ["expression"];
}

impl NodeKind {
    /// 是否为声明
    pub fn is_declaration(&self) -> bool {
        self.category() == NodeCategory::Declaration
    }

    /// 是否为表达式
    pub fn is_expression(&self) -> bool {
        self.category() == NodeCategory::Expression
    }

    /// 是否为错误节点
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            NodeKind::ErrorDeclaration | NodeKind::ErrorExpression | NodeKind::ErrorCallExpression
        )
    }

    /// 替换子节点时种类是否兼容
    ///
    /// 语句位置既可以放声明也可以放表达式，vararg 元素位置既可以放表达式也可以放 spread。
    pub fn is_compatible_replacement(
        &self,
        new: NodeKind,
    ) -> bool {
        use NodeCategory::*;
        match (self.category(), new.category()) {
            (a, b) if a == b => true,
            (Declaration, Expression) | (Expression, Declaration) => true,
            (Expression, SpreadElement) | (SpreadElement, Expression) => true,
            _ => false,
        }
    }
}
