//! 只读访问者
//!
//! 每个节点种类一个 `visit_*` 方法，默认委托给更一般的方法
//! （`visit_call` → `visit_member_access` → `visit_expression` → `visit_element`），
//! 最终默认行为是访问全部子节点。调用方通过 [`accept`] 分派。

use super::arena::IrArena;
use super::error::IrResult;
use super::ids::NodeId;
use super::kind::NodeKind;

macro_rules! delegate {
    ($($name:ident => $parent:ident;)*) => {
        $(
            fn $name(
                &mut self,
                arena: &IrArena,
                node: NodeId,
                data: D,
            ) -> IrResult<Self::Output> {
                self.$parent(arena, node, data)
            }
        )*
    };
}

/// IR 访问者，`D` 为沿树向下传递的上下文
pub trait IrVisitor<D: Clone> {
    type Output: Default;

    /// 最一般的访问：访问全部子节点
    fn visit_element(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        data: D,
    ) -> IrResult<Self::Output> {
        accept_children(self, arena, node, data)?;
        Ok(Self::Output::default())
    }

    delegate! {
        visit_module_fragment => visit_element;
        visit_file => visit_element;
        visit_declaration => visit_element;
        visit_body => visit_element;
        visit_expression => visit_element;
        visit_branch => visit_element;
        visit_catch => visit_element;
        visit_spread_element => visit_element;

        visit_class => visit_declaration;
        visit_function => visit_declaration;
        visit_simple_function => visit_function;
        visit_constructor => visit_function;
        visit_property => visit_declaration;
        visit_field => visit_declaration;
        visit_type_parameter => visit_declaration;
        visit_value_parameter => visit_declaration;
        visit_enum_entry => visit_declaration;
        visit_type_alias => visit_declaration;
        visit_variable => visit_declaration;
        visit_anonymous_initializer => visit_declaration;
        visit_error_declaration => visit_declaration;

        visit_block_body => visit_body;
        visit_expression_body => visit_body;
        visit_synthetic_body => visit_body;

        visit_container_expression => visit_expression;
        visit_block => visit_container_expression;
        visit_composite => visit_container_expression;
        visit_return => visit_expression;
        visit_throw => visit_expression;
        visit_member_access => visit_expression;
        visit_call => visit_member_access;
        visit_constructor_call => visit_member_access;
        visit_delegating_constructor_call => visit_member_access;
        visit_enum_constructor_call => visit_member_access;
        visit_function_reference => visit_member_access;
        visit_property_reference => visit_member_access;
        visit_instance_initializer_call => visit_expression;
        visit_field_access => visit_expression;
        visit_get_field => visit_field_access;
        visit_set_field => visit_field_access;
        visit_value_access => visit_expression;
        visit_get_value => visit_value_access;
        visit_set_value => visit_value_access;
        visit_singleton_value => visit_expression;
        visit_get_object_value => visit_singleton_value;
        visit_get_enum_value => visit_singleton_value;
        visit_const => visit_expression;
        visit_string_concatenation => visit_expression;
        visit_type_operator_call => visit_expression;
        visit_when => visit_expression;
        visit_loop => visit_expression;
        visit_while_loop => visit_loop;
        visit_do_while_loop => visit_loop;
        visit_break_continue => visit_expression;
        visit_break => visit_break_continue;
        visit_continue => visit_break_continue;
        visit_try => visit_expression;
        visit_vararg => visit_expression;
        visit_function_expression => visit_expression;
        visit_class_reference => visit_expression;
        visit_raw_function_reference => visit_expression;
        visit_error_expression => visit_expression;
        visit_error_call_expression => visit_error_expression;

        visit_else_branch => visit_branch;
    }
}

/// 按节点种类分派到对应的 `visit_*`
pub fn accept<D: Clone, V: IrVisitor<D> + ?Sized>(
    visitor: &mut V,
    arena: &IrArena,
    node: NodeId,
    data: D,
) -> IrResult<V::Output> {
    let a = arena;
    let n = node;
    match arena.kind(node)? {
        NodeKind::ModuleFragment => visitor.visit_module_fragment(a, n, data),
        NodeKind::File => visitor.visit_file(a, n, data),
        NodeKind::Class => visitor.visit_class(a, n, data),
        NodeKind::SimpleFunction => visitor.visit_simple_function(a, n, data),
        NodeKind::Constructor => visitor.visit_constructor(a, n, data),
        NodeKind::Property => visitor.visit_property(a, n, data),
        NodeKind::Field => visitor.visit_field(a, n, data),
        NodeKind::TypeParameter => visitor.visit_type_parameter(a, n, data),
        NodeKind::ValueParameter => visitor.visit_value_parameter(a, n, data),
        NodeKind::EnumEntry => visitor.visit_enum_entry(a, n, data),
        NodeKind::TypeAlias => visitor.visit_type_alias(a, n, data),
        NodeKind::Variable => visitor.visit_variable(a, n, data),
        NodeKind::AnonymousInitializer => visitor.visit_anonymous_initializer(a, n, data),
        NodeKind::ErrorDeclaration => visitor.visit_error_declaration(a, n, data),
        NodeKind::BlockBody => visitor.visit_block_body(a, n, data),
        NodeKind::ExpressionBody => visitor.visit_expression_body(a, n, data),
        NodeKind::SyntheticBody => visitor.visit_synthetic_body(a, n, data),
        NodeKind::Block => visitor.visit_block(a, n, data),
        NodeKind::Composite => visitor.visit_composite(a, n, data),
        NodeKind::Return => visitor.visit_return(a, n, data),
        NodeKind::Throw => visitor.visit_throw(a, n, data),
        NodeKind::Call => visitor.visit_call(a, n, data),
        NodeKind::ConstructorCall => visitor.visit_constructor_call(a, n, data),
        NodeKind::DelegatingConstructorCall => visitor.visit_delegating_constructor_call(a, n, data),
        NodeKind::EnumConstructorCall => visitor.visit_enum_constructor_call(a, n, data),
        NodeKind::InstanceInitializerCall => visitor.visit_instance_initializer_call(a, n, data),
        NodeKind::GetField => visitor.visit_get_field(a, n, data),
        NodeKind::SetField => visitor.visit_set_field(a, n, data),
        NodeKind::GetValue => visitor.visit_get_value(a, n, data),
        NodeKind::SetValue => visitor.visit_set_value(a, n, data),
        NodeKind::GetObjectValue => visitor.visit_get_object_value(a, n, data),
        NodeKind::GetEnumValue => visitor.visit_get_enum_value(a, n, data),
        NodeKind::Const => visitor.visit_const(a, n, data),
        NodeKind::StringConcatenation => visitor.visit_string_concatenation(a, n, data),
        NodeKind::TypeOperatorCall => visitor.visit_type_operator_call(a, n, data),
        NodeKind::When => visitor.visit_when(a, n, data),
        NodeKind::WhileLoop => visitor.visit_while_loop(a, n, data),
        NodeKind::DoWhileLoop => visitor.visit_do_while_loop(a, n, data),
        NodeKind::Break => visitor.visit_break(a, n, data),
        NodeKind::Continue => visitor.visit_continue(a, n, data),
        NodeKind::Try => visitor.visit_try(a, n, data),
        NodeKind::Vararg => visitor.visit_vararg(a, n, data),
        NodeKind::FunctionReference => visitor.visit_function_reference(a, n, data),
        NodeKind::PropertyReference => visitor.visit_property_reference(a, n, data),
        NodeKind::FunctionExpression => visitor.visit_function_expression(a, n, data),
        NodeKind::ClassReference => visitor.visit_class_reference(a, n, data),
        NodeKind::RawFunctionReference => visitor.visit_raw_function_reference(a, n, data),
        NodeKind::ErrorExpression => visitor.visit_error_expression(a, n, data),
        NodeKind::ErrorCallExpression => visitor.visit_error_call_expression(a, n, data),
        NodeKind::Branch => visitor.visit_branch(a, n, data),
        NodeKind::ElseBranch => visitor.visit_else_branch(a, n, data),
        NodeKind::Catch => visitor.visit_catch(a, n, data),
        NodeKind::SpreadElement => visitor.visit_spread_element(a, n, data),
    }
}

/// 依次访问全部子节点，遇到错误立即返回
pub fn accept_children<D: Clone, V: IrVisitor<D> + ?Sized>(
    visitor: &mut V,
    arena: &IrArena,
    node: NodeId,
    data: D,
) -> IrResult<()> {
    for child in arena.children(node)? {
        accept(visitor, arena, child, data.clone())?;
    }
    Ok(())
}
