use anyhow::Result;
use blogforge::{config::Config, pipeline};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn read_url() -> Result<String> {
    print!("Enter website URL: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blogforge=info")),
        )
        .init();

    let config = Config::from_env()?;

    let url = read_url()?;
    if url.is_empty() {
        println!("No URL provided. Exiting.");
        return Ok(());
    }

    let report = pipeline::run_site(&config, &url).await?;
    println!("{report}");
    println!("Artifacts are under {}", config.output_dir().display());
    Ok(())
}
