//! 伪覆盖解析
//!
//! 伪覆盖是子类中继承而未重新声明的成员，没有自己的函数体。
//! 解析时沿 `overridden_symbols` 链向上，找到真正声明实现的成员。

use indexmap::IndexSet;

use super::arena::IrArena;
use super::error::IrResult;
use super::ids::NodeId;
use super::node::NodeData;
use super::types::{ClassKind, Modality};

/// 收集 `decl` 背后的全部真实覆盖（非伪覆盖）
///
/// 结果中被其他结果覆盖的成员会被去掉，只留下最具体的实现。
pub fn collect_real_overrides(
    arena: &IrArena,
    decl: NodeId,
    allow_abstract: bool,
) -> IrResult<Vec<NodeId>> {
    let mut visited = IndexSet::new();
    let mut real = IndexSet::new();
    let mut stack = vec![decl];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        let Some(member) = arena.data(current)?.as_overridable() else {
            continue;
        };
        if member.is_fake_override() {
            for symbol in member.overridden_symbols().iter().rev() {
                stack.push(arena.owner(*symbol)?);
            }
        } else if allow_abstract || member.modality() != Modality::Abstract {
            real.insert(current);
        }
    }

    // 去掉被集合中其他成员覆盖的声明
    let mut overridden = IndexSet::new();
    for &candidate in &real {
        let mut stack: Vec<NodeId> = Vec::new();
        if let Some(member) = arena.data(candidate)?.as_overridable() {
            for symbol in member.overridden_symbols() {
                stack.push(arena.owner(*symbol)?);
            }
        }
        while let Some(current) = stack.pop() {
            if !overridden.insert(current) {
                continue;
            }
            if let Some(member) = arena.data(current)?.as_overridable() {
                for symbol in member.overridden_symbols() {
                    stack.push(arena.owner(*symbol)?);
                }
            }
        }
    }

    Ok(real.into_iter().filter(|id| !overridden.contains(id)).collect())
}

/// 解析伪覆盖到真实声明
///
/// 非伪覆盖原样返回。多个候选时优先类中的实现，其次第一个候选；
/// 没有非抽象实现时返回 `None`。
pub fn resolve_fake_override(
    arena: &IrArena,
    decl: NodeId,
) -> IrResult<Option<NodeId>> {
    let is_fake = arena
        .data(decl)?
        .as_overridable()
        .is_some_and(|m| m.is_fake_override());
    if !is_fake {
        return Ok(Some(decl));
    }

    let candidates = collect_real_overrides(arena, decl, false)?;
    for &candidate in &candidates {
        let in_interface = match arena.parent_class(candidate)? {
            Some(class) => matches!(
                arena.data(class)?,
                NodeData::Class(c) if c.class_kind == ClassKind::Interface
            ),
            None => false,
        };
        if !in_interface {
            return Ok(Some(candidate));
        }
    }
    Ok(candidates.first().copied())
}
