//! 死代码消除 (Dead Code Elimination)
//!
//! 以声明为粒度，从根出发做可达性分析，再把不可达的声明从模块中删除。
//!
//! 工作流程：
//! 1. 按后端构造可达性策略，发现运行时支持声明
//! 2. 收集根（导出、外部、入口点、配置中的额外根、后端特有的根）
//! 3. 工作表 + 外层不动点收集可达声明
//! 4. 剪枝并释放被删除的子树
//!
//! 可覆盖成员的可达性按"传染性"保守传播：一个类一旦被构造，它覆盖了
//! 传染性可达声明的成员都会被保留。

pub mod annotations;
pub mod body_visitor;
pub mod policy;
pub mod pruning;
pub mod purity;
pub mod roots;
pub mod stats;
pub mod trace;
pub mod usefulness;

#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::{debug, info};

use crate::middle::ir::{IrArena, IrError, NodeId, NodeKind};

pub use crate::util::config::{Backend, DceConfig};
pub use policy::{policy_for, JsPolicy, NativePolicy, ReachabilityPolicy, RuntimeSymbols, WasmPolicy};
pub use pruning::{prune, PruneReport};
pub use roots::{collect_roots, DeclarationFlagsOracle, RootOracle};
pub use stats::DceStats;
pub use trace::{format_edge, ReachabilityTrace};
pub use usefulness::{collect_useful_declarations, UsefulDeclarationProcessor, UsefulDeclarations};

/// DCE 错误
#[derive(Debug, Error)]
pub enum DceError {
    #[error(transparent)]
    Ir(#[from] IrError),

    /// 根不是声明
    #[error("Root {node} ({kind:?}) is not a declaration")]
    NotADeclaration { node: NodeId, kind: NodeKind },

    /// `keep_patterns` 中的正则无效
    #[error("Invalid keep pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `extra_roots` 中的名字没有对应的声明
    #[error("Extra root `{0}` does not name any declaration")]
    UnknownRoot(String),
}

/// 一次 DCE 的结果
#[derive(Debug, Clone, Default)]
pub struct DceOutcome {
    /// 根（声明顺序）
    pub roots: Vec<NodeId>,
    /// 可达声明，供后端做进一步过滤
    pub useful: UsefulDeclarations,
    pub report: PruneReport,
    pub stats: DceStats,
}

/// 死代码消除 pass
#[derive(Debug)]
pub struct DcePass {
    /// 配置
    config: DceConfig,
    /// 统计信息
    stats: DceStats,
}

impl Default for DcePass {
    fn default() -> Self {
        Self::new(DceConfig::default())
    }
}

impl DcePass {
    /// 创建新的 DCE pass；环境变量可以打开可达性追踪
    pub fn new(config: DceConfig) -> Self {
        Self {
            config: config.with_env_overrides(),
            stats: DceStats::new(),
        }
    }

    pub fn config(&self) -> &DceConfig {
        &self.config
    }

    /// 上一次运行之后的统计（`run` 会取走）
    pub fn stats(&self) -> &DceStats {
        &self.stats
    }

    /// 用声明标志判断导出与外部性，对所有模块执行 DCE
    pub fn run(
        &mut self,
        arena: &mut IrArena,
    ) -> Result<DceOutcome, DceError> {
        self.run_with_oracle(arena, &DeclarationFlagsOracle)
    }

    /// 对所有模块执行 DCE
    pub fn run_with_oracle(
        &mut self,
        arena: &mut IrArena,
        oracle: &dyn RootOracle,
    ) -> Result<DceOutcome, DceError> {
        if !self.config.enabled {
            debug!("dce disabled, keeping every declaration");
            return Ok(DceOutcome {
                stats: std::mem::take(&mut self.stats),
                ..DceOutcome::default()
            });
        }

        // 1. 后端策略
        let policy = policy_for(&self.config, arena)?;

        // 2. 收集根
        let roots = collect_roots(arena, oracle, policy.as_ref(), &self.config)?;

        // 3. 可达性分析
        let useful = collect_useful_declarations(
            arena,
            &roots,
            policy.as_ref(),
            oracle,
            self.config.print_reachability_info,
            self.config.remove_unused_associated_objects,
        )?;
        if let Some(trace) = &useful.trace {
            trace.print();
        }

        // 4. 剪枝
        let report = prune(arena, &useful, policy.as_ref(), &self.config)?;

        // 5. 更新统计
        self.stats.update_from_analysis(roots.len(), &useful);
        self.stats.update_from_report(&report);

        // 6. 输出统计
        if self.config.print_stats {
            eprintln!("{}", self.stats.format());
        }
        info!(
            "dce ({}) kept {} of {} declarations",
            policy.name(),
            self.stats.retained,
            self.stats.retained + self.stats.removed
        );

        Ok(DceOutcome {
            roots,
            useful,
            report,
            stats: std::mem::take(&mut self.stats),
        })
    }
}
