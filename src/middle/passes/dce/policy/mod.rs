//! 后端可达性策略
//!
//! 不同后端对"可达"的理解不同：哪些声明是额外的根、内建函数调用隐含哪些边、
//! 哪些可覆盖成员具有传染性。引擎只通过 [`ReachabilityPolicy`] 询问这些问题。

mod js;
mod native;
mod wasm;

pub use js::JsPolicy;
pub use native::NativePolicy;
pub use wasm::WasmPolicy;

use tracing::debug;

use crate::middle::ir::{ClassKind, IrArena, IrResult, Modality, NodeData, NodeId};
use crate::util::config::{Backend, DceConfig};

use super::usefulness::UsefulDeclarationProcessor;

/// 运行时支持声明
///
/// 都是可选的：输入中没有运行时包时，对应的边不会产生。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeSymbols {
    pub box_intrinsic: Option<NodeId>,
    pub unbox_intrinsic: Option<NodeId>,
    pub class_id_intrinsic: Option<NodeId>,
    pub interface_id_intrinsic: Option<NodeId>,
    pub get_virtual_method_id: Option<NodeId>,
    pub get_interface_impl_id: Option<NodeId>,
    pub string_get_literal: Option<NodeId>,
    /// `Any.toString`，字符串拼接隐式调用
    pub to_string: Option<NodeId>,
    pub js_class: Option<NodeId>,
    /// `JsName` 注解类
    pub js_name: Option<NodeId>,
    pub get_associated_object: Option<NodeId>,
    /// 标记"关联对象键"注解的注解类
    pub associated_object_key: Option<NodeId>,
}

impl RuntimeSymbols {
    /// 按全限定名在 `prefix` 包下查找支持声明
    pub fn discover(
        arena: &IrArena,
        prefix: &str,
    ) -> IrResult<Self> {
        let mut symbols = RuntimeSymbols::default();
        let mut stack = Vec::new();
        for module in arena.modules() {
            for file in arena.children(*module)? {
                if let NodeData::File(data) = arena.data(file)? {
                    if data.package == prefix || data.package.starts_with(&format!("{}.", prefix)) {
                        stack.extend(data.declarations.iter().rev().copied());
                    }
                }
            }
        }

        while let Some(decl) = stack.pop() {
            if let NodeData::Class(class) = arena.data(decl)? {
                stack.extend(class.declarations.iter().rev().copied());
            }
            let name = arena.fq_name(decl)?;
            let Some(local) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
            else {
                continue;
            };
            let slot = match local {
                "boxIntrinsic" => &mut symbols.box_intrinsic,
                "unboxIntrinsic" => &mut symbols.unbox_intrinsic,
                "wasmClassId" => &mut symbols.class_id_intrinsic,
                "wasmInterfaceId" => &mut symbols.interface_id_intrinsic,
                "getVirtualMethodId" => &mut symbols.get_virtual_method_id,
                "getInterfaceImplId" => &mut symbols.get_interface_impl_id,
                "stringGetLiteral" => &mut symbols.string_get_literal,
                "Any.toString" => &mut symbols.to_string,
                "jsClass" => &mut symbols.js_class,
                "JsName" => &mut symbols.js_name,
                "getAssociatedObject" => &mut symbols.get_associated_object,
                "AssociatedObjectKey" => &mut symbols.associated_object_key,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(decl);
            }
        }
        debug!("runtime symbols under `{}`: {:?}", prefix, symbols);
        Ok(symbols)
    }
}

/// 后端可达性策略
pub trait ReachabilityPolicy {
    fn name(&self) -> &'static str;

    fn runtime(&self) -> &RuntimeSymbols;

    /// 是否为额外的根
    fn is_root(
        &self,
        _arena: &IrArena,
        _decl: NodeId,
    ) -> IrResult<bool> {
        Ok(false)
    }

    /// 可覆盖成员的可达性是否要传播给所有覆盖者
    fn is_contagious(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        default_is_contagious(arena, decl)
    }

    /// 普通调用的额外边（内建函数等）
    fn visit_call(
        &self,
        _processor: &mut UsefulDeclarationProcessor<'_>,
        _call: NodeId,
        _from: NodeId,
    ) -> IrResult<()> {
        Ok(())
    }

    /// 常量的额外边
    fn visit_const(
        &self,
        _processor: &mut UsefulDeclarationProcessor<'_>,
        _constant: NodeId,
        _from: NodeId,
    ) -> IrResult<()> {
        Ok(())
    }

    /// 重新扫描被构造类的成员时的额外规则
    fn process_constructed_class_member(
        &self,
        _processor: &mut UsefulDeclarationProcessor<'_>,
        _class: NodeId,
        _member: NodeId,
    ) -> IrResult<()> {
        Ok(())
    }

    /// 未使用的构造器是否保留为空桩
    fn keeps_constructor_stubs(&self) -> bool {
        false
    }
}

/// 成员所属的类；属性访问器和幕后字段归属于属性所在的类
pub fn member_class(
    arena: &IrArena,
    decl: NodeId,
) -> IrResult<Option<NodeId>> {
    let Some(parent) = arena.parent(decl)? else {
        return Ok(None);
    };
    match arena.data(parent)? {
        NodeData::Class(_) => Ok(Some(parent)),
        NodeData::Property(_) => arena.parent_class(parent),
        _ => Ok(None),
    }
}

/// 默认规则：可被继续覆盖的类成员具有传染性
///
/// 成员必须是函数或属性，所在类是接口，或者类与成员都不是 final。
pub fn default_is_contagious(
    arena: &IrArena,
    decl: NodeId,
) -> IrResult<bool> {
    let modality = match arena.data(decl)?.as_overridable() {
        Some(member) => effective_modality(arena, decl, member.modality())?,
        None => return Ok(false),
    };
    let Some(class) = member_class(arena, decl)? else {
        return Ok(false);
    };
    match arena.data(class)? {
        NodeData::Class(c) if c.class_kind == ClassKind::Interface => Ok(true),
        NodeData::Class(c) => Ok(c.modality != Modality::Final && modality != Modality::Final),
        _ => Ok(false),
    }
}

/// 访问器的可覆盖性取自所属属性
fn effective_modality(
    arena: &IrArena,
    decl: NodeId,
    own: Modality,
) -> IrResult<Modality> {
    if let NodeData::SimpleFunction(f) = arena.data(decl)? {
        if let Some(property) = f.corresponding_property {
            if let Ok((_, NodeData::Property(p))) = arena.owner_data(property) {
                return Ok(p.modality);
            }
        }
    }
    Ok(own)
}

/// 调用的第 `index` 个类型实参对应的类
pub fn type_argument_class(
    arena: &IrArena,
    call: NodeId,
    index: usize,
) -> IrResult<Option<NodeId>> {
    let Some(access) = arena.data(call)?.member_access() else {
        return Ok(None);
    };
    let Some(symbol) = access.type_arguments.get(index).and_then(|t| t.classifier()) else {
        return Ok(None);
    };
    let (owner, data) = arena.owner_data(symbol)?;
    Ok(matches!(data, NodeData::Class(_)).then_some(owner))
}

/// 内联值类的幕后字段：第一个字段或第一个属性的幕后字段
pub fn inline_class_backing_field(
    arena: &IrArena,
    class: NodeId,
) -> IrResult<Option<NodeId>> {
    for member in arena.declarations(class)? {
        match arena.data(*member)? {
            NodeData::Field(_) => return Ok(Some(*member)),
            NodeData::Property(p) if p.backing_field.is_some() => return Ok(p.backing_field),
            _ => {}
        }
    }
    Ok(None)
}

/// 按配置构造策略
pub fn policy_for(
    config: &DceConfig,
    arena: &IrArena,
) -> IrResult<Box<dyn ReachabilityPolicy>> {
    let runtime = RuntimeSymbols::discover(arena, &config.runtime_package_prefix)?;
    let policy: Box<dyn ReachabilityPolicy> = match config.backend {
        Backend::Js => Box::new(JsPolicy::new(runtime, config.runtime_package_prefix.clone())),
        Backend::Wasm => Box::new(WasmPolicy::new(runtime)),
        Backend::Native => Box::new(NativePolicy::new(runtime)),
    };
    Ok(policy)
}
