use clap::Parser;
use databricks_connector::config::toml_config::TomlConfig;
use databricks_connector::utils::{logger, validation::Validate};
use databricks_connector::{run_connector, ConnectorConfig, OutputMode};

#[derive(Parser)]
#[command(name = "toml-connector")]
#[command(about = "Metadata connector with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "connector-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show what would be extracted without connecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based metadata connector");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    let connector_config = match config.validate().and_then(|_| config.to_connector_config()) {
        Ok(connector_config) => connector_config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &connector_config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No connection will be made");
        return;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run_connector(connector_config, config.source_type(), monitor_enabled).await {
        Ok(report) => {
            println!(
                "✅ {} entries written to {}",
                report.entries_count,
                report.output_path.display()
            );
            if let Some(location) = &report.uploaded_to {
                println!("📁 Uploaded to: {}", location);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Connector failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}

fn display_config_summary(config: &TomlConfig, connector_config: &ConnectorConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Source: {} ({})", config.source_type(), connector_config.server_hostname);
    println!("  HTTP path: {}", connector_config.http_path);
    println!(
        "  Target: projects/{}/locations/{}/entryGroups/{}",
        connector_config.target_project_id,
        connector_config.target_location_id,
        connector_config.target_entry_group_id
    );
    println!("  Output file: {}", connector_config.output_file_path().display());

    match &connector_config.output {
        OutputMode::LocalOnly => println!("  Upload: disabled (local only)"),
        OutputMode::Bucket { bucket, folder } => match folder {
            Some(folder) => println!("  Upload: gs://{}/{}", bucket, folder),
            None => println!("  Upload: gs://{}", bucket),
        },
    }

    if let Some(min) = connector_config.min_expected_entries {
        println!("  Min expected entries: {}", min);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
