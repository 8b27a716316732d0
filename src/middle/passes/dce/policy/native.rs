//! Native 后端策略

use crate::middle::ir::{IrArena, IrResult, NodeId};

use super::{member_class, ReachabilityPolicy, RuntimeSymbols};

/// Native 后端策略
///
/// 虚表按类整体生成，任何类成员的可覆盖声明都具有传染性，包括 final 类中的成员。
#[derive(Debug, Clone)]
pub struct NativePolicy {
    runtime: RuntimeSymbols,
}

impl NativePolicy {
    pub fn new(runtime: RuntimeSymbols) -> Self {
        Self { runtime }
    }
}

impl ReachabilityPolicy for NativePolicy {
    fn name(&self) -> &'static str {
        "native"
    }

    fn runtime(&self) -> &RuntimeSymbols {
        &self.runtime
    }

    fn is_contagious(
        &self,
        arena: &IrArena,
        decl: NodeId,
    ) -> IrResult<bool> {
        Ok(arena.data(decl)?.as_overridable().is_some() && member_class(arena, decl)?.is_some())
    }
}
