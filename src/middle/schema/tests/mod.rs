//! schema 测试

mod kind_tests;
mod tree_tests;
