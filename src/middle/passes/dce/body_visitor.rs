//! 函数体访问者
//!
//! 遍历可达声明的函数体与初始化表达式，把其中引用到的声明入队。
//! 沿树向下传递的上下文是正在处理的声明（边的起点）。

use crate::middle::ir::{
    accept_children, DeclarationOrigin, IrArena, IrResult, IrVisitor, NodeData, NodeId, NodeKind,
    SymbolId,
};

use super::usefulness::UsefulDeclarationProcessor;

/// 函数体访问者
pub struct BodyVisitor<'p, 'a> {
    processor: &'p mut UsefulDeclarationProcessor<'a>,
}

impl<'p, 'a> BodyVisitor<'p, 'a> {
    pub fn new(processor: &'p mut UsefulDeclarationProcessor<'a>) -> Self {
        Self { processor }
    }

    fn enqueue_symbol(
        &mut self,
        arena: &IrArena,
        symbol: SymbolId,
        from: NodeId,
        description: &str,
    ) -> IrResult<()> {
        let target = arena.owner(symbol)?;
        self.processor.enqueue_from(target, from, description)
    }
}

impl IrVisitor<NodeId> for BodyVisitor<'_, '_> {
    type Output = ();

    fn visit_member_access(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        let data = arena.data(node)?;
        if let Some(access) = data.member_access() {
            let description = match data.kind() {
                NodeKind::Call => "function access",
                NodeKind::ConstructorCall => "constructor call",
                NodeKind::DelegatingConstructorCall => "delegating constructor call",
                NodeKind::EnumConstructorCall => "enum constructor call",
                NodeKind::FunctionReference => "function reference",
                _ => "property reference",
            };
            self.enqueue_symbol(arena, access.symbol, from, description)?;
            if let Some(qualifier) = access.super_qualifier {
                self.enqueue_symbol(arena, qualifier, from, "super qualifier")?;
            }
        }
        if let NodeData::PropertyReference(reference) = data {
            for part in [reference.getter, reference.setter, reference.field]
                .into_iter()
                .flatten()
            {
                self.enqueue_symbol(arena, part, from, "property reference")?;
            }
        }
        if data.kind() == NodeKind::Call {
            let policy = self.processor.policy();
            policy.visit_call(self.processor, node, from)?;
        }
        accept_children(self, arena, node, from)
    }

    fn visit_raw_function_reference(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::RawFunctionReference(reference) = arena.data(node)? {
            self.enqueue_symbol(arena, reference.symbol, from, "raw function access")?;
        }
        Ok(())
    }

    fn visit_value_access(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        let symbol = match arena.data(node)? {
            NodeData::GetValue(get) => Some(get.symbol),
            NodeData::SetValue(set) => Some(set.symbol),
            _ => None,
        };
        if let Some(symbol) = symbol {
            self.enqueue_symbol(arena, symbol, from, "variable access")?;
        }
        accept_children(self, arena, node, from)
    }

    fn visit_get_field(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::GetField(get) = arena.data(node)? {
            self.enqueue_symbol(arena, get.symbol, from, "field access")?;
        }
        accept_children(self, arena, node, from)
    }

    fn visit_set_field(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        // 字段初始化函数里的存储不使字段可达，只访问被存储的值
        let in_initializer = arena.node(from)?.base.origin == DeclarationOrigin::FieldInitializer;
        if let NodeData::SetField(set) = arena.data(node)? {
            if !in_initializer {
                self.enqueue_symbol(arena, set.symbol, from, "field access")?;
            }
        }
        accept_children(self, arena, node, from)
    }

    fn visit_get_object_value(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::GetObjectValue(get) = arena.data(node)? {
            let (object, object_data) = arena.owner_data(get.symbol)?;
            self.processor.enqueue_from(object, from, "object access")?;
            if let NodeData::Class(class) = object_data {
                if let Some(accessor) = class.instance_accessor {
                    self.enqueue_symbol(arena, accessor, from, "object instance accessor")?;
                }
            }
        }
        Ok(())
    }

    fn visit_get_enum_value(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::GetEnumValue(get) = arena.data(node)? {
            self.enqueue_symbol(arena, get.symbol, from, "enum entry access")?;
        }
        Ok(())
    }

    fn visit_class_reference(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::ClassReference(reference) = arena.data(node)? {
            let (owner, owner_data) = arena.owner_data(reference.symbol)?;
            if matches!(owner_data, NodeData::Class(_)) {
                self.processor.enqueue_from(owner, from, "class reference")?;
            }
        }
        Ok(())
    }

    fn visit_string_concatenation(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let Some(to_string) = self.processor.policy().runtime().to_string {
            self.processor
                .enqueue_from(to_string, from, "string concatenation")?;
        }
        accept_children(self, arena, node, from)
    }

    fn visit_type_operator_call(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::TypeOperatorCall(op) = arena.data(node)? {
            if let Some(symbol) = op.type_operand.classifier() {
                let (owner, owner_data) = arena.owner_data(symbol)?;
                if matches!(owner_data, NodeData::Class(_)) {
                    self.processor.enqueue_from(owner, from, "type operator")?;
                }
            }
        }
        accept_children(self, arena, node, from)
    }

    fn visit_instance_initializer_call(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        if let NodeData::InstanceInitializerCall(call) = arena.data(node)? {
            self.enqueue_symbol(arena, call.class_symbol, from, "instance initializer call")?;
        }
        Ok(())
    }

    fn visit_const(
        &mut self,
        _arena: &IrArena,
        node: NodeId,
        from: NodeId,
    ) -> IrResult<()> {
        let policy = self.processor.policy();
        policy.visit_const(self.processor, node, from)
    }
}
