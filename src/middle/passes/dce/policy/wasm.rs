//! Wasm 后端策略

use crate::middle::ir::{
    ClassKind, ConstValue, DeclarationOrigin, IrArena, IrResult, Modality, NodeData, NodeId,
};

use super::super::usefulness::UsefulDeclarationProcessor;
use super::{
    inline_class_backing_field, member_class, type_argument_class, ReachabilityPolicy,
    RuntimeSymbols,
};

/// Wasm 后端策略
#[derive(Debug, Clone)]
pub struct WasmPolicy {
    runtime: RuntimeSymbols,
}

impl WasmPolicy {
    pub fn new(runtime: RuntimeSymbols) -> Self {
        Self { runtime }
    }

    /// 虚调用需要的派发支持函数
    fn visit_virtual_call(
        &self,
        processor: &mut UsefulDeclarationProcessor<'_>,
        callee: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        let arena = processor.arena();
        let overridable = arena
            .data(callee)?
            .as_overridable()
            .is_some_and(|m| m.modality() != Modality::Final);
        if !overridable {
            return Ok(());
        }
        let Some(class) = member_class(arena, callee)? else {
            return Ok(());
        };
        let is_interface = matches!(
            arena.data(class)?,
            NodeData::Class(c) if c.class_kind == ClassKind::Interface
        );
        if is_interface {
            processor.enqueue_from(class, from, "receiver class")?;
            if let Some(support) = self.runtime.get_interface_impl_id {
                processor.enqueue_from(support, from, "interface call")?;
            }
        } else if let Some(support) = self.runtime.get_virtual_method_id {
            processor.enqueue_from(support, from, "virtual call")?;
        }
        Ok(())
    }
}

impl ReachabilityPolicy for WasmPolicy {
    fn name(&self) -> &'static str {
        "wasm"
    }

    fn runtime(&self) -> &RuntimeSymbols {
        &self.runtime
    }

    /// 合成的字段初始化函数总是根
    fn is_root(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        Ok(matches!(arena.data(decl)?, NodeData::SimpleFunction(_))
            && arena.node(decl)?.base.origin == DeclarationOrigin::FieldInitializer)
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
        let callee = arena.owner(access.symbol)?;
        let intrinsic = Some(callee);

        if intrinsic == self.runtime.box_intrinsic {
            if let Some(class) = type_argument_class(arena, call, 0)? {
                processor.enqueue_from(class, from, "intrinsic: boxIntrinsic")?;
            }
        } else if intrinsic == self.runtime.unbox_intrinsic {
            if let Some(class) = type_argument_class(arena, call, 0)? {
                if let Some(field) = inline_class_backing_field(arena, class)? {
                    processor.enqueue_from(field, from, "intrinsic: unboxIntrinsic")?;
                }
            }
        } else if intrinsic == self.runtime.class_id_intrinsic
            || intrinsic == self.runtime.interface_id_intrinsic
        {
            if let Some(class) = type_argument_class(arena, call, 0)? {
                processor.enqueue_from(class, from, "intrinsic: classId")?;
            }
        }

        if access.dispatch_receiver.is_some() && access.super_qualifier.is_none() {
            self.visit_virtual_call(processor, callee, from)?;
        }
        Ok(())
    }

    fn visit_const(
        &self,
        processor: &mut UsefulDeclarationProcessor<'_>,
        constant: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        let arena = processor.arena();
        if let NodeData::Const(c) = arena.data(constant)? {
            if let (ConstValue::String(_), Some(literal)) = (&c.value, self.runtime.string_get_literal) {
                processor.enqueue_from(literal, from, "string literal")?;
            }
        }
        Ok(())
    }
}
