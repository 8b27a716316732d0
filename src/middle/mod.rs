//! 中间层
//!
//! IR 树、描述 IR 节点层次的 schema 模型，以及作用在 IR 上的 pass。

pub mod ir;
pub mod passes;
pub mod schema;
