use anyhow::Result;
use sevakendra::extract::ReportExtractor;
use sevakendra::llm::OpenRouterVision;
use sevakendra::{AppConfig, ConsultationPipeline};
use std::env;
use std::path::Path;

/// Runs one report through the specialist panel from the command line.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <report.txt|report.pdf>", args[0]);
        std::process::exit(1);
    }
    let report_path = Path::new(&args[1]);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Example: export OPENROUTER_API_KEY='your_key_here'");
            std::process::exit(1);
        }
    };

    println!("SevaKendra report consultation");
    println!("==============================");
    println!("Report: {}", report_path.display());
    println!("Model: {}", config.specialist_model);
    println!();

    let vision = OpenRouterVision::new(
        &config.openrouter_api_key,
        &config.ocr_model,
        config.http_timeout,
    )?;
    let report = match ReportExtractor::new(vision).extract(report_path).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Failed to read report: {}", e);
            std::process::exit(1);
        }
    };
    println!("Extracted {} characters", report.as_str().len());

    let pipeline = ConsultationPipeline::from_config(&config);
    let outcome = pipeline.run(&report).await;

    println!();
    println!("Specialists answered: {}/3", outcome.findings.present_count());
    if !outcome.findings.absent_roles().is_empty() {
        println!("Missing: {:?}", outcome.findings.absent_roles());
    }
    println!();
    println!("{}", outcome.diagnosis);
    println!();
    println!("Saved to {}", pipeline.result_path().display());

    Ok(())
}
