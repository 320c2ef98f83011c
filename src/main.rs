use anyhow::Context;
use clap::Parser;
use tabbench::core::stats;
use tabbench::utils::error::ErrorSeverity;
use tabbench::utils::{logger, validation::Validate};
use tabbench::{CliConfig, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting tabbench");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 合併 TOML 與命令列參數後驗證
    let settings = match cli.resolve().and_then(|settings| {
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "🔍 Sampling every {} ms ({:?} CPU)",
        settings.monitor.sample_interval_ms,
        settings.monitor.cpu_scope
    );

    let orchestrator = Orchestrator::from_config(&settings)
        .context("failed to set up extraction backends")?;

    match orchestrator.run(&settings.run.input_folder).await {
        Ok(results) => {
            println!(
                "✅ {} jobs finished, {} tables extracted",
                results.len(),
                results.total_tables()
            );
            for summary in stats::summarize(&results)
                .iter()
                .filter(|summary| summary.metric == "extraction_time")
            {
                println!(
                    "⏱️  {:<10} mean {:.4}s  min {:.4}s  max {:.4}s",
                    summary.method, summary.mean, summary.min, summary.max
                );
            }
            println!(
                "📁 Metrics saved to: {}",
                orchestrator.sink().performance_file().display()
            );
        }
        Err(e) => {
            tracing::error!("❌ Benchmark failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
