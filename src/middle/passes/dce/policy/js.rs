//! JS 后端策略

use crate::middle::ir::{IrArena, IrResult, NodeData, NodeId};

use super::super::annotations::{annotation_constructor, find_annotation};
use super::super::purity::is_side_effect_free;
use super::super::usefulness::UsefulDeclarationProcessor;
use super::{
    inline_class_backing_field, member_class, type_argument_class, ReachabilityPolicy,
    RuntimeSymbols,
};

/// JS 后端策略
///
/// - `jsClass<T>()` 使 `T` 可达
/// - 装箱使内联类的主构造器可达，拆箱使其幕后字段可达
/// - 运行时包之外、初始化有副作用的顶层字段是根
/// - 被构造类中带 `JsName` 注解的成员保留（宿主代码可能按名字调用）
#[derive(Debug, Clone)]
pub struct JsPolicy {
    runtime: RuntimeSymbols,
    runtime_package_prefix: String,
}

impl JsPolicy {
    pub fn new(
        runtime: RuntimeSymbols,
        runtime_package_prefix: String,
    ) -> Self {
        Self {
            runtime,
            runtime_package_prefix,
        }
    }

    fn in_runtime_package(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        let Some(file) = arena.file_of(decl)? else {
            return Ok(false);
        };
        Ok(match arena.data(file)? {
            NodeData::File(f) => {
                f.package == self.runtime_package_prefix
                    || f.package.starts_with(&format!("{}.", self.runtime_package_prefix))
            }
            _ => false,
        })
    }

    /// 成员自身或其所属属性上的 `JsName` 注解
    fn js_name_annotation(
        &self,
        arena: &IrArena,
        member: NodeId,
    ) -> IrResult<Option<NodeId>> {
        let Some(js_name) = self.runtime.js_name else {
            return Ok(None);
        };
        if let Some(annotation) = find_annotation(arena, member, js_name)? {
            return Ok(Some(annotation));
        }
        let property = match arena.data(member)? {
            NodeData::Field(f) => f.corresponding_property,
            NodeData::SimpleFunction(f) => f.corresponding_property,
            _ => None,
        };
        match property {
            Some(symbol) => find_annotation(arena, arena.owner(symbol)?, js_name),
            None => Ok(None),
        }
    }
}

fn primary_constructor(
    arena: &IrArena,
    class: NodeId,
) -> IrResult<Option<NodeId>> {
    for member in arena.declarations(class)? {
        if let NodeData::Constructor(c) = arena.data(*member)? {
            if c.is_primary {
                return Ok(Some(*member));
            }
        }
    }
    Ok(None)
}

impl ReachabilityPolicy for JsPolicy {
    fn name(&self) -> &'static str {
        "js"
    }

    fn runtime(&self) -> &RuntimeSymbols {
        &self.runtime
    }

    fn is_root(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        let NodeData::Field(field) = arena.data(decl)? else {
            return Ok(false);
        };
        let Some(initializer) = field.initializer else {
            return Ok(false);
        };
        // 属性的幕后字段挂在属性下面，也算类成员
        if member_class(arena, decl)?.is_some() && !field.is_static {
            return Ok(false);
        }
        Ok(!self.in_runtime_package(arena, decl)? && !is_side_effect_free(arena, initializer)?)
    }

    fn visit_call(
        &self,
        processor: &mut UsefulDeclarationProcessor<'_>,
        call: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        let arena = processor.arena();
        let Some(access) = arena.data(call)?.member_access() else {
            return Ok(());
        };
        let callee = Some(arena.owner(access.symbol)?);

        if callee == self.runtime.js_class {
            if let Some(class) = type_argument_class(arena, call, 0)? {
                processor.enqueue_from(class, from, "intrinsic: jsClass")?;
            }
        } else if callee == self.runtime.box_intrinsic {
            if let Some(class) = type_argument_class(arena, call, 0)? {
                if let Some(ctor) = primary_constructor(arena, class)? {
                    processor.enqueue_from(ctor, from, "intrinsic: jsBoxIntrinsic")?;
                }
            }
        } else if callee == self.runtime.unbox_intrinsic {
            if let Some(class) = type_argument_class(arena, call, 0)? {
                if let Some(field) = inline_class_backing_field(arena, class)? {
                    processor.enqueue_from(field, from, "intrinsic: jsUnboxIntrinsic")?;
                }
            }
        }
        Ok(())
    }

    fn process_constructed_class_member(
        &self,
        processor: &mut UsefulDeclarationProcessor<'_>,
        class: NodeId,
        member: NodeId,
    ) -> IrResult<()> {
        let arena = processor.arena();
        let candidates: Vec<NodeId> = match arena.data(member)? {
            NodeData::Property(p) => [p.backing_field, p.getter, p.setter]
                .into_iter()
                .flatten()
                .collect(),
            _ => vec![member],
        };
        for candidate in candidates {
            if processor.is_useful(candidate) {
                continue;
            }
            if let NodeData::SimpleFunction(f) = arena.data(candidate)? {
                if f.info.name == "valueOf" {
                    processor.enqueue_from(candidate, class, "valueOf")?;
                    continue;
                }
            }
            if let Some(annotation) = self.js_name_annotation(arena, candidate)? {
                processor.enqueue_from(candidate, class, "annotated by @JsName")?;
                // 注解本身也要保留，否则剪枝后这条规则不再成立
                if let Some(ctor) = annotation_constructor(arena, annotation)? {
                    processor.enqueue_from(ctor, candidate, "@JsName annotation")?;
                }
            }
        }
        Ok(())
    }

    fn keeps_constructor_stubs(&self) -> bool {
        true
    }
}
