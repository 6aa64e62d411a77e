use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins; otherwise this crate at info, or debug with `--verbose`.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("databricks_connector=debug,info")
        } else {
            EnvFilter::new("databricks_connector=info")
        }
    })
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_target(verbose).compact())
        .init();
}

/// 容器內執行時使用 JSON 格式，方便 Cloud Logging 解析
pub fn init_json_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().json().flatten_event(true).with_current_span(false))
        .init();
}

/// `LOG_FORMAT=json` 切換成 JSON 輸出
pub fn init_logger(verbose: bool) {
    match std::env::var("LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => init_json_logger(verbose),
        _ => init_cli_logger(verbose),
    }
}

