//! Crochet console.
//!
//! A line-oriented interface for recording multi-character conversations
//! and watching character personalities evolve:
//!
//! ```bash
//! cargo run -p crochet -- --thread physics --name "Physics questions"
//! ```
//!
//! Storage directories come from `CROCHET_THREAD_DIR` and
//! `CROCHET_PERSONALITY_DIR` (a `.env` file is honored). Logs go to stderr,
//! filtered by `RUST_LOG`.

mod headless;

use crochet_core::CrochetConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = CrochetConfig::from_env()?;
    let headless = headless::parse_config_from_args(&args);
    headless::run_headless(config, headless).await?;
    Ok(())
}

fn print_help() {
    println!("crochet - nonlinear multi-character conversation console");
    println!();
    println!("USAGE:");
    println!("    crochet [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --thread <ID>    Thread to open or create (default: default)");
    println!("    --name <NAME>    Name for a newly created thread");
    println!("    -h, --help       Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    CROCHET_THREAD_DIR          Thread documents (default: threads)");
    println!("    CROCHET_PERSONALITY_DIR     Personality documents (default: personalities)");
    println!("    CROCHET_DEFAULT_CONFIDENCE  Weight of each trait observation (default: 0.1)");
    println!("    RUST_LOG                    Log filter (default: info)");
}
