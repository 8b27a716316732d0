//! 树形转储
//!
//! 调试用的缩进文本表示，每个节点一行，例如：
//!
//! ```text
//! MODULE_FRAGMENT name=app
//!   FILE path=main.yx package=app
//!     FUN name=main
//!       BLOCK_BODY
//! ```

use std::fmt::Write;

use super::arena::IrArena;
use super::error::IrResult;
use super::ids::NodeId;
use super::node::NodeData;
use super::types::DeclarationOrigin;
use super::visitor::{accept, accept_children, IrVisitor};

struct DumpVisitor {
    out: String,
}

impl DumpVisitor {
    fn line(
        &self,
        arena: &IrArena,
        node: NodeId,
    ) -> IrResult<String> {
        let n = arena.node(node)?;
        let tag = n.kind().schema_name().to_uppercase();
        let mut line = match &n.data {
            NodeData::ModuleFragment(m) => format!("MODULE_FRAGMENT name={}", m.name),
            NodeData::File(f) => format!("FILE path={} package={}", f.path, f.package),
            NodeData::Class(c) => format!(
                "CLASS name={} kind={:?} modality={:?}",
                c.info.name, c.class_kind, c.modality
            ),
            NodeData::SimpleFunction(f) => {
                let mut s = format!("FUN name={} modality={:?}", f.info.name, f.modality);
                if f.is_fake_override {
                    s.push_str(" fake_override");
                }
                s
            }
            NodeData::Constructor(c) => {
                format!("CONSTRUCTOR name={} primary={}", c.info.name, c.is_primary)
            }
            NodeData::Property(p) => format!("PROPERTY name={} var={}", p.info.name, p.is_var),
            NodeData::Field(f) => format!("FIELD name={} static={}", f.info.name, f.is_static),
            NodeData::ErrorDeclaration(e) => format!("ERROR_DECLARATION {}", e.description),
            NodeData::Const(c) => format!("CONST {:?}", c.value),
            NodeData::Call(a) | NodeData::ConstructorCall(a) | NodeData::FunctionReference(a) => {
                let name = &arena.symbol_entry(a.symbol)?.name;
                format!("{} symbol={}", tag, name)
            }
            NodeData::GetField(g) => {
                format!("GET_FIELD symbol={}", arena.symbol_entry(g.symbol)?.name)
            }
            NodeData::SetField(s) => {
                format!("SET_FIELD symbol={}", arena.symbol_entry(s.symbol)?.name)
            }
            NodeData::GetValue(g) => {
                format!("GET_VALUE symbol={}", arena.symbol_entry(g.symbol)?.name)
            }
            NodeData::TypeOperatorCall(t) => format!("TYPE_OP {:?}", t.operator),
            NodeData::ErrorExpression(e) => format!("ERROR_EXPRESSION {}", e.description),
            other => match other.declaration_info() {
                Some(info) => format!("{} name={}", tag, info.name),
                None => tag,
            },
        };
        if n.base.origin != DeclarationOrigin::Defined {
            let _ = write!(line, " origin={:?}", n.base.origin);
        }
        Ok(line)
    }
}

impl IrVisitor<usize> for DumpVisitor {
    type Output = ();

    fn visit_element(
        &mut self,
        arena: &IrArena,
        node: NodeId,
        depth: usize,
    ) -> IrResult<()> {
        let line = self.line(arena, node)?;
        let _ = writeln!(self.out, "{}{}", "  ".repeat(depth), line);
        accept_children(self, arena, node, depth + 1)
    }
}

/// 以 `root` 为根转储子树
pub fn dump_tree(
    arena: &IrArena,
    root: NodeId,
) -> IrResult<String> {
    let mut visitor = DumpVisitor { out: String::new() };
    accept(&mut visitor, arena, root, 0)?;
    Ok(visitor.out)
}

/// 转储全部模块片段
pub fn dump_modules(arena: &IrArena) -> IrResult<String> {
    let mut out = String::new();
    for module in arena.modules() {
        out.push_str(&dump_tree(arena, *module)?);
    }
    Ok(out)
}
