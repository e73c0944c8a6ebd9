//! Gondola - supermarket category page collector
//!
//! Main entry point for the CLI application.

use clap::Parser;
use gondola::collector::save_report;
use gondola::core::logging::init_logging;
use gondola::{BrowserExecutor, Collector, Config, GondolaError};
use std::path::PathBuf;
use tracing::info;

/// Gondola - collect product listings from a storefront category page
#[derive(Parser, Debug)]
#[command(name = "gondola")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Category page URL
    #[arg(long)]
    url: Option<String>,

    /// Delivery postal code (CEP), digits only
    #[arg(long)]
    cep: Option<String>,

    /// Products per page to select
    #[arg(long)]
    page_size: Option<usize>,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Product list output file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Statistics output file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// agent-browser session name
    #[arg(long)]
    session: Option<String>,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print the default configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Args {
    /// Apply CLI overrides on top of the loaded configuration
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.url {
            config.target.url = url;
        }
        if let Some(cep) = self.cep {
            config.target.postal_code = cep;
        }
        if let Some(page_size) = self.page_size {
            config.target.page_size = page_size;
        }
        if self.max_pages.is_some() {
            config.target.max_pages = self.max_pages;
        }
        if let Some(output) = self.output {
            config.output.products_path = output;
        }
        if let Some(stats) = self.stats {
            config.output.stats_path = stats;
        }
        if let Some(session) = self.session {
            config.browser.session_name = session;
        }
        if self.headed {
            config.browser.headed = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(());
    }

    init_logging(args.debug)?;

    // Build configuration
    let save_config = args.save_config;
    let mut config = Config::load();
    args.apply(&mut config);
    config.validate()?;

    if save_config {
        let path = config.save()?;
        info!(path = %path.display(), "configuration saved");
        return Ok(());
    }

    if !BrowserExecutor::is_available().await {
        return Err(GondolaError::AgentBrowserNotFound.into());
    }

    let driver = BrowserExecutor::from_config(&config.browser);
    let mut collector = Collector::new(driver, config.clone());
    let report = collector.run().await?;

    let totals = save_report(&report, &config.output)?;
    info!(
        products = totals.complete,
        output = %config.output.products_path.display(),
        stats = %config.output.stats_path.display(),
        "done"
    );

    Ok(())
}
