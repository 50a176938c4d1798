use std::io::Read;
use std::process::ExitCode;

use datalake_ingest::config::HandlerConfig;
use datalake_ingest::handler::Handler;
use datalake_ingest::logging::init_tracing;

const ENV_CONTENT_TYPE: &str = "INGEST_CONTENT_TYPE";

fn main() -> ExitCode {
    let config = match HandlerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = init_tracing(&config.log) {
        eprintln!("failed to open log file: {e}");
        return ExitCode::from(2);
    }

    let content_type = std::env::var(ENV_CONTENT_TYPE).unwrap_or_else(|_| "application/json".to_string());
    let mut body = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut body) {
        tracing::error!(error = %e, "failed to read request body from stdin");
        return ExitCode::from(2);
    }

    let handler = Handler::from_config(&config);
    match handler.handle(&content_type, &body) {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "ingestion failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
