//! 变换器
//!
//! 与访问者相同的分派结构，但每个 `transform_*` 返回替换节点。
//! 默认行为：变换全部子节点，把被替换的子节点写回原槽位并重新设置父指针，
//! 然后返回自身。

use super::arena::IrArena;
use super::error::IrResult;
use super::ids::NodeId;
use super::kind::NodeKind;

macro_rules! delegate {
    ($($name:ident => $parent:ident;)*) => {
        $(
            fn $name(
                &mut self,
                arena: &mut IrArena,
                node: NodeId,
                data: D,
            ) -> IrResult<NodeId> {
                self.$parent(arena, node, data)
            }
        )*
    };
}

/// IR 变换器
pub trait IrTransformer<D: Clone> {
    fn transform_element(
        &mut self,
        arena: &mut IrArena,
        node: NodeId,
        data: D,
    ) -> IrResult<NodeId> {
        transform_children(self, arena, node, data)?;
        Ok(node)
    }

    delegate! {
        transform_module_fragment => transform_element;
        transform_file => transform_element;
        transform_declaration => transform_element;
        transform_body => transform_element;
        transform_expression => transform_element;
        transform_branch => transform_element;
        transform_catch => transform_element;
        transform_spread_element => transform_element;

        transform_class => transform_declaration;
        transform_function => transform_declaration;
        transform_simple_function => transform_function;
        transform_constructor => transform_function;
        transform_property => transform_declaration;
        transform_field => transform_declaration;
        transform_value_parameter => transform_declaration;
        transform_enum_entry => transform_declaration;
        transform_variable => transform_declaration;
        transform_anonymous_initializer => transform_declaration;

        transform_block_body => transform_body;
        transform_expression_body => transform_body;

        transform_container_expression => transform_expression;
        transform_member_access => transform_expression;
        transform_call => transform_member_access;
        transform_constructor_call => transform_member_access;
        transform_field_access => transform_expression;
        transform_get_field => transform_field_access;
        transform_set_field => transform_field_access;
        transform_value_access => transform_expression;
        transform_get_value => transform_value_access;
        transform_set_value => transform_value_access;
        transform_const => transform_expression;
        transform_when => transform_expression;
        transform_loop => transform_expression;
        transform_try => transform_expression;
    }
}

/// 按节点种类分派到对应的 `transform_*`
pub fn accept_transform<D: Clone, T: IrTransformer<D> + ?Sized>(
    transformer: &mut T,
    arena: &mut IrArena,
    node: NodeId,
    data: D,
) -> IrResult<NodeId> {
    let t = transformer;
    let a = arena;
    let n = node;
    match a.kind(node)? {
        NodeKind::ModuleFragment => t.transform_module_fragment(a, n, data),
        NodeKind::File => t.transform_file(a, n, data),
        NodeKind::Class => t.transform_class(a, n, data),
        NodeKind::SimpleFunction => t.transform_simple_function(a, n, data),
        NodeKind::Constructor => t.transform_constructor(a, n, data),
        NodeKind::Property => t.transform_property(a, n, data),
        NodeKind::Field => t.transform_field(a, n, data),
        NodeKind::ValueParameter => t.transform_value_parameter(a, n, data),
        NodeKind::EnumEntry => t.transform_enum_entry(a, n, data),
        NodeKind::Variable => t.transform_variable(a, n, data),
        NodeKind::AnonymousInitializer => t.transform_anonymous_initializer(a, n, data),
        NodeKind::TypeParameter | NodeKind::TypeAlias | NodeKind::ErrorDeclaration => {
            t.transform_declaration(a, n, data)
        }
        NodeKind::BlockBody => t.transform_block_body(a, n, data),
        NodeKind::ExpressionBody => t.transform_expression_body(a, n, data),
        NodeKind::SyntheticBody => t.transform_body(a, n, data),
        NodeKind::Block | NodeKind::Composite => t.transform_container_expression(a, n, data),
        NodeKind::Call => t.transform_call(a, n, data),
        NodeKind::ConstructorCall => t.transform_constructor_call(a, n, data),
        NodeKind::DelegatingConstructorCall
        | NodeKind::EnumConstructorCall
        | NodeKind::FunctionReference
        | NodeKind::PropertyReference => t.transform_member_access(a, n, data),
        NodeKind::GetField => t.transform_get_field(a, n, data),
        NodeKind::SetField => t.transform_set_field(a, n, data),
        NodeKind::GetValue => t.transform_get_value(a, n, data),
        NodeKind::SetValue => t.transform_set_value(a, n, data),
        NodeKind::Const => t.transform_const(a, n, data),
        NodeKind::When => t.transform_when(a, n, data),
        NodeKind::WhileLoop | NodeKind::DoWhileLoop => t.transform_loop(a, n, data),
        NodeKind::Try => t.transform_try(a, n, data),
        NodeKind::Branch | NodeKind::ElseBranch => t.transform_branch(a, n, data),
        NodeKind::Catch => t.transform_catch(a, n, data),
        NodeKind::SpreadElement => t.transform_spread_element(a, n, data),
        _ => t.transform_expression(a, n, data),
    }
}

/// 变换全部子节点并写回替换结果
///
/// 替换节点若仍挂在别处（例如把 `x = v` 替换成 `v`），先断开它与旧父节点的所有权。
pub fn transform_children<D: Clone, T: IrTransformer<D> + ?Sized>(
    transformer: &mut T,
    arena: &mut IrArena,
    node: NodeId,
    data: D,
) -> IrResult<()> {
    let children = arena.children(node)?;
    for child in children {
        let replacement = accept_transform(transformer, arena, child, data.clone())?;
        if replacement != child {
            if arena.parent(replacement)?.is_some() {
                arena.orphan(replacement)?;
            }
            arena.replace_child(node, child, replacement)?;
        }
    }
    Ok(())
}

/// 变换语句列表，`rewrite` 返回 `None` 表示删除该语句
///
/// 被删除或替换的语句只摘除不释放，由调用方决定是否释放。
pub fn rewrite_statements(
    arena: &mut IrArena,
    node: NodeId,
    mut rewrite: impl FnMut(&mut IrArena, NodeId) -> IrResult<Option<NodeId>>,
) -> IrResult<Vec<NodeId>> {
    let statements = match arena.data(node)?.statements() {
        Some(list) => list.to_vec(),
        None => return Ok(Vec::new()),
    };

    let mut kept = Vec::with_capacity(statements.len());
    let mut dropped = Vec::new();
    for statement in statements {
        match rewrite(arena, statement)? {
            Some(new) if new == statement => kept.push(statement),
            Some(new) => {
                arena.orphan(new)?;
                arena.node_mut(new)?.base.parent = Some(node);
                kept.push(new);
                dropped.push(statement);
            }
            None => dropped.push(statement),
        }
    }

    for id in &dropped {
        if arena.is_live(*id) && arena.parent(*id)? == Some(node) {
            arena.node_mut(*id)?.base.parent = None;
        }
    }
    if let Some(list) = arena.data_mut(node)?.statements_mut() {
        *list = kept;
    }
    Ok(dropped)
}
