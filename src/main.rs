use anyhow::{Context, Result};
use shotform_analyzer::config::AnalysisConfig;
use shotform_analyzer::pipeline::Analyzer;
use std::fs;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("shotform-analyzer {}", env!("GIT_VERSION"));
        eprintln!("使い方: {} <payload.json> [config.toml]", args[0]);
        std::process::exit(1);
    }

    let config_path = args.get(2).map(String::as_str).unwrap_or(CONFIG_PATH);
    let config = AnalysisConfig::load_or_default(config_path);

    let payload = fs::read_to_string(&args[1])
        .with_context(|| format!("ペイロードを読み込めません: {}", args[1]))?;

    let analyzer = Analyzer::new(config);
    let report = analyzer
        .analyze_json(&payload)
        .context("解析に失敗しました")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
