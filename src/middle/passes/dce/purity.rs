//! 表达式副作用判断
//!
//! 保守判断：只有常量、值读取、引用和由它们组成的拼接/转换算作无副作用。
//! 单例读取可能触发对象初始化，不算无副作用。

use crate::middle::ir::{IrArena, IrResult, NodeData, NodeId, TypeOperator};

/// `expr` 求值是否可证明无副作用
pub fn is_side_effect_free(
    arena: &IrArena,
    expr: NodeId,
) -> IrResult<bool> {
    let pure = match arena.data(expr)? {
        NodeData::Const(_)
        | NodeData::GetValue(_)
        | NodeData::GetEnumValue(_)
        | NodeData::ClassReference(_)
        | NodeData::RawFunctionReference(_) => true,
        NodeData::FunctionReference(access) => {
            access.dispatch_receiver.is_none() && access.extension_receiver.is_none()
        }
        NodeData::GetField(get) => match get.receiver {
            Some(receiver) => is_side_effect_free(arena, receiver)?,
            None => true,
        },
        NodeData::StringConcatenation(concat) => all_pure(arena, &concat.arguments)?,
        NodeData::Vararg(vararg) => all_pure(arena, &vararg.elements)?,
        NodeData::SpreadElement(spread) => is_side_effect_free(arena, spread.expression)?,
        NodeData::TypeOperatorCall(op) => {
            matches!(
                op.operator,
                TypeOperator::ImplicitCast
                    | TypeOperator::ImplicitCoercionToUnit
                    | TypeOperator::InstanceOf
                    | TypeOperator::NotInstanceOf
            ) && is_side_effect_free(arena, op.argument)?
        }
        NodeData::Composite(block) | NodeData::Block(block) => all_pure(arena, &block.statements)?,
        _ => false,
    };
    Ok(pure)
}

fn all_pure(
    arena: &IrArena,
    nodes: &[NodeId],
) -> IrResult<bool> {
    for node in nodes {
        if !is_side_effect_free(arena, *node)? {
            return Ok(false);
        }
    }
    Ok(true)
}
