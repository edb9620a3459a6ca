use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vocal_consensus::{AudioInput, Config, VocalAnalyzer};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: analyze <audio-file>");
        return ExitCode::from(2);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Set GEMINI_API_KEY in the environment or in .env");
            return ExitCode::from(2);
        }
    };

    let analyzer = match VocalAnalyzer::from_config(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = match AudioInput::from_path(&path, config.max_upload_bytes).await {
        Ok(input) => input,
        Err(e) => {
            error!(path = %path, "Cannot load audio: {}", e);
            eprintln!("Please provide an audio file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(path = %path, model = %config.oracle.model, "Running vocal analysis");

    match analyzer.analyze(&input).await {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(failure) => {
            eprintln!("{}", failure);
            ExitCode::FAILURE
        }
    }
}
