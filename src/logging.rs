// ==========================================
// 报关单生成系统 - 日志初始化
// ==========================================
// 输出: 一律写 stderr，stdout 留给转换结果
// 级别: RUST_LOG 优先；文本模式缺省 info，JSON 模式缺省 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 命令行日志（json = true 时输出结构化 JSON）
pub fn init(json: bool) {
    let builder = fmt().with_writer(std::io::stderr);
    if json {
        builder.json().with_env_filter(env_filter("warn")).init();
    } else {
        builder
            .with_env_filter(env_filter("info"))
            .with_line_number(true)
            .init();
    }
}

/// 测试日志，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("customs_sheet=debug"))
        .with_test_writer()
        .try_init();
}
