//! 可达性追踪
//!
//! 每条边一行：`"from" -> "to" // comment`，按发现顺序记录并去重。
//! 这是独立于日志的调试产物，只在开启时打印到标准输出。

use indexmap::IndexSet;

use crate::middle::ir::{IrArena, IrResult, NodeId};

/// 根声明的来源名
pub const ROOT_MARKER: &str = "<ROOT>";

/// 传染性入队的注释后缀
pub const CONTAGIOUS_MARKER: &str = "[CONTAGIOUS!]";

/// 可达性追踪记录
#[derive(Debug, Clone, Default)]
pub struct ReachabilityTrace {
    lines: IndexSet<String>,
}

impl ReachabilityTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条边；`from` 为 `None` 表示根
    pub fn record(
        &mut self,
        arena: &IrArena,
        from: Option<NodeId>,
        to: NodeId,
        description: &str,
        contagious: bool,
    ) -> IrResult<()> {
        let from_name = match from {
            Some(from) => display_name(arena, from)?,
            None => ROOT_MARKER.to_string(),
        };
        let to_name = display_name(arena, to)?;
        self.lines
            .insert(format_edge(&from_name, &to_name, description, contagious));
        Ok(())
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 打印到标准输出
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }
}

/// 一条追踪行
pub fn format_edge(
    from: &str,
    to: &str,
    description: &str,
    contagious: bool,
) -> String {
    let mut comment = description.to_string();
    if contagious {
        comment.push_str(CONTAGIOUS_MARKER);
    }
    if comment.trim().is_empty() {
        format!("\"{}\" -> \"{}\"", from, to)
    } else {
        format!("\"{}\" -> \"{}\" // {}", from, to, comment)
    }
}

fn display_name(
    arena: &IrArena,
    node: NodeId,
) -> IrResult<String> {
    let name = arena.fq_name(node)?;
    if name.is_empty() {
        Ok(format!("<{}>", node))
    } else {
        Ok(name)
    }
}
