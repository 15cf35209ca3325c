mod checks;
mod cli;
mod config;
mod http;
mod progress;
mod report;
mod runner;
#[cfg(test)]
mod testing;
mod types;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match config::resolve(cli.config.as_deref(), cli.base_url.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e:#}");
            std::process::exit(2);
        }
    };

    let body_limit = if cli.verbose { None } else { Some(types::SNIPPET_LIMIT) };
    let suite = match runner::Suite::new(cfg, body_limit) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    };

    report::print_header(suite.base_url());
    let outcome = suite.run().await;
    report::print_summary(&outcome);

    if let Some(path) = &cli.json {
        if let Err(e) = report::write_json(&outcome, path) {
            eprintln!("Error writing JSON: {e:#}");
            std::process::exit(2);
        }
        println!("Results written to {}", path.display());
    }
    if let Some(path) = &cli.junit {
        if let Err(e) = report::write_junit(&outcome, path) {
            eprintln!("Error writing JUnit XML: {e:#}");
            std::process::exit(2);
        }
        println!("JUnit XML written to {}", path.display());
    }

    std::process::exit(outcome.exit_code());
}
