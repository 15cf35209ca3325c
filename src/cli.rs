use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "status-probe",
    about = "Smoke-test a status-check API: health, CORS, create and list"
)]
pub struct Cli {
    /// API root to test (default: http://localhost:8001/api)
    #[arg(long)]
    pub base_url: Option<String>,

    /// TOML file overriding probe settings (origin, client_name, timeouts, ...)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the results as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Also write the results as JUnit XML to this path
    #[arg(long)]
    pub junit: Option<PathBuf>,

    /// Print full response bodies instead of snippets
    #[arg(long)]
    pub verbose: bool,
}
