//! IR 树测试

mod fake_override_tests;
