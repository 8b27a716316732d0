//! 注解查询
//!
//! 注解是声明拥有的构造器调用；注解类即被调用构造器所在的类。

use crate::middle::ir::{IrArena, IrResult, NodeData, NodeId};

use super::policy::RuntimeSymbols;

/// 声明上的注解调用
pub fn annotations_of(
    arena: &IrArena,
    decl: NodeId,
) -> IrResult<Vec<NodeId>> {
    Ok(match arena.data(decl)? {
        NodeData::File(file) => file.annotations.clone(),
        other => other
            .declaration_info()
            .map(|info| info.annotations.clone())
            .unwrap_or_default(),
    })
}

/// 注解调用的构造器
pub fn annotation_constructor(
    arena: &IrArena,
    annotation: NodeId,
) -> IrResult<Option<NodeId>> {
    match arena.data(annotation)?.member_access() {
        Some(access) => {
            let (owner, data) = arena.owner_data(access.symbol)?;
            Ok(matches!(data, NodeData::Constructor(_)).then_some(owner))
        }
        None => Ok(None),
    }
}

/// 注解类
pub fn annotation_class(
    arena: &IrArena,
    annotation: NodeId,
) -> IrResult<Option<NodeId>> {
    match annotation_constructor(arena, annotation)? {
        Some(ctor) => arena.parent_class(ctor),
        None => Ok(None),
    }
}

/// `decl` 上第一个类为 `class` 的注解
pub fn find_annotation(
    arena: &IrArena,
    decl: NodeId,
    class: NodeId,
) -> IrResult<Option<NodeId>> {
    for annotation in annotations_of(arena, decl)? {
        if annotation_class(arena, annotation)? == Some(class) {
            return Ok(Some(annotation));
        }
    }
    Ok(None)
}

/// 注解类上的关联对象键标记（其自身的注解）
pub fn associated_key_marker(
    arena: &IrArena,
    runtime: &RuntimeSymbols,
    annotation: NodeId,
) -> IrResult<Option<NodeId>> {
    let Some(marker_class) = runtime.associated_object_key else {
        return Ok(None);
    };
    match annotation_class(arena, annotation)? {
        Some(class) => find_annotation(arena, class, marker_class),
        None => Ok(None),
    }
}

/// 关联对象：注解实参中第一个类引用指向的单例
pub fn associated_object(
    arena: &IrArena,
    annotation: NodeId,
) -> IrResult<Option<NodeId>> {
    let Some(access) = arena.data(annotation)?.member_access() else {
        return Ok(None);
    };
    for argument in &access.arguments {
        if let NodeData::ClassReference(reference) = arena.data(*argument)? {
            return Ok(Some(arena.owner(reference.symbol)?));
        }
    }
    Ok(None)
}
