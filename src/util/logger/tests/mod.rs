//! 日志模块测试

use super::*;

#[test]
fn test_level_from_verbosity() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Trace);
    assert_eq!(LogLevel::from_verbosity(9), LogLevel::Trace);
}

#[test]
fn test_level_into_tracing() {
    assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
}

#[test]
fn test_repeated_init_is_ignored() {
    init_debug();
    init();
    tracing::debug!("logger initialised twice");
}
