//! DCE 统计信息

use super::pruning::PruneReport;
use super::usefulness::UsefulDeclarations;

/// DCE 统计信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DceStats {
    /// 根声明数
    pub roots: usize,
    /// 可达声明数
    pub reachable: usize,
    /// 传染性可达声明数
    pub contagious: usize,
    /// 被构造的类数
    pub constructed_classes: usize,
    /// 外层不动点循环次数
    pub outer_iterations: usize,
    /// 删除的声明数
    pub removed: usize,
    /// 剪枝后保留的声明数
    pub retained: usize,
    /// 释放的节点数
    pub released_nodes: usize,
    /// 丢弃的初始化语句
    pub dropped_initializers: usize,
    /// 保留的初始化语句
    pub preserved_initializers: usize,
    /// 构造器空壳
    pub stubbed_constructors: usize,
    /// 删除比例
    pub removal_rate: f64,
}

impl DceStats {
    /// 创建新的统计信息
    pub fn new() -> Self {
        Self::default()
    }

    /// 从可达性结果更新统计
    pub fn update_from_analysis(
        &mut self,
        roots: usize,
        useful: &UsefulDeclarations,
    ) {
        self.roots = roots;
        self.reachable = useful.len();
        self.contagious = useful.contagious.len();
        self.constructed_classes = useful.constructed_classes.len();
        self.outer_iterations = useful.outer_iterations;
    }

    /// 从剪枝报告更新统计
    pub fn update_from_report(
        &mut self,
        report: &PruneReport,
    ) {
        self.removed = report.removed.len();
        self.retained = report.retained;
        self.released_nodes = report.released_nodes;
        self.dropped_initializers = report.dropped_initializers;
        self.preserved_initializers = report.preserved_initializers;
        self.stubbed_constructors = report.stubbed_constructors.len();
        // 可达集合里还有局部变量和参数，比例只按容器中的声明计算
        let total = self.retained + self.removed;
        self.removal_rate = if total == 0 {
            0.0
        } else {
            self.removed as f64 / total as f64
        };
    }

    /// 格式化统计信息
    pub fn format(&self) -> String {
        format!(
            "DCE Statistics:\n\
             - Roots: {}\n\
             - Reachable: {}\n\
             - Contagious: {}\n\
             - Constructed classes: {}\n\
             - Outer iterations: {}\n\
             - Retained: {}\n\
             - Removed: {} ({:.1}%)\n\
             - Released nodes: {}\n\
             - Initializers dropped: {}\n\
             - Initializers preserved: {}\n\
             - Constructor stubs: {}",
            self.roots,
            self.reachable,
            self.contagious,
            self.constructed_classes,
            self.outer_iterations,
            self.retained,
            self.removed,
            self.removal_rate * 100.0,
            self.released_nodes,
            self.dropped_initializers,
            self.preserved_initializers,
            self.stubbed_constructors,
        )
    }
}
