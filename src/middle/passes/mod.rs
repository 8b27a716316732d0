//! 编译器各个阶段
//!
//! 包含中间层作用在 IR 树上的 pass。

pub mod dce;
