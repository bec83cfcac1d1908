//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 安装全局 tracing subscriber
///
/// 优先使用 `RUST_LOG`，否则默认 `info`，`verbose` 为 true 时为 `debug`。
/// 重复调用不会报错（测试中多次初始化时只有第一次生效）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
