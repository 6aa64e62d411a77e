use clap::Parser;
use databricks_connector::domain::model::SOURCE_TYPE;
use databricks_connector::utils::logger;
use databricks_connector::{run_connector, CliConfig, EtlError};

fn report_failure(e: &EtlError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Connector failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    // 參數錯誤一律視為設定錯誤，結束碼 1
    let cli = match CliConfig::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(cli.verbose);

    tracing::info!("Starting {} connector", SOURCE_TYPE);

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 驗證配置
    let config = match cli.into_connector_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            report_failure(&e);
        }
    };
    tracing::debug!("Connector config: {:?}", config);

    match run_connector(config, SOURCE_TYPE, monitor_enabled).await {
        Ok(report) => {
            println!("✅ {} entries written to {}", report.entries_count, report.output_path.display());
            if let Some(location) = &report.uploaded_to {
                println!("📁 Uploaded to: {}", location);
            }
        }
        Err(e) => report_failure(&e),
    }
}
