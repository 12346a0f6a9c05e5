//! # Keystone Entry Point
//!
//! ```text
//! keystone pay inv-1042 250.00 check
//!     │
//!     ▼
//! keystone_cli::run(args) ──► Ok(Output)  ──► stdout, exit 0
//!                         └─► Err(ApiError) ──► stderr as JSON, exit 1
//! ```

use std::process::ExitCode;

use keystone_cli::Output;

#[tokio::main]
async fn main() -> ExitCode {
    keystone_cli::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match keystone_cli::run(&args).await {
        Ok(Output::Text(text)) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Ok(Output::Json(value)) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to encode output: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            match serde_json::to_string_pretty(&err) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", err),
            }
            ExitCode::FAILURE
        }
    }
}
