use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use stonks::{
    config, Catalog, Company, FetchError, Quote, QuoteFetcher, SelectionListener, Session, Trend,
};

#[derive(Debug, Parser)]
#[command(name = "stonks", version, about = "Latest stock quote and logo for a few companies")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the companies that can be selected
    List,
    /// Fetch the quote and logo for one company
    Show {
        /// Catalog index or ticker (e.g. `0` or `AAPL`)
        company: String,
        /// Write the logo image to this file
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Pick companies interactively from stdin
    Browse,
}

fn render_quote(quote: &Quote) -> String {
    let arrow = match quote.trend() {
        Trend::Up => "▲",
        Trend::Down => "▼",
        Trend::Flat => " ",
    };
    format!(
        "{} ({})  {}  {} {}",
        quote.company_name, quote.symbol, quote.price, quote.change, arrow
    )
}

fn resolve(catalog: &Catalog, company: &str) -> Result<usize> {
    let index = match company.parse::<usize>() {
        Ok(index) => index,
        Err(_) => catalog
            .position(company)
            .ok_or_else(|| anyhow!("unknown ticker {company}; see `stonks list`"))?,
    };
    catalog
        .get(index)
        .map(|_| index)
        .ok_or_else(|| anyhow!("no company at index {index}; see `stonks list`"))
}

async fn ask_retry(lines: &mut Lines<BufReader<Stdin>>, what: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("Could not load the {what}. Retry? [y/N] ").as_bytes())
        .await?;
    stdout.flush().await?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn list(catalog: &Catalog) {
    for (i, company) in catalog.iter().enumerate() {
        println!("{i:>2}  {:<10} {}", company.display_name, company.ticker);
    }
}

async fn show(fetcher: &QuoteFetcher, company: Company, logo_path: Option<PathBuf>) -> Result<()> {
    let ticker = company.ticker;
    let (mut quote, mut logo) = tokio::join!(fetcher.fetch_quote(ticker), fetcher.fetch_logo(ticker));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // manual retry only: each failed fetch is re-issued on request
    loop {
        match &quote {
            Ok(q) => {
                println!("{}", render_quote(q));
                break;
            }
            Err(e) => {
                log::error!("{e}");
                if !ask_retry(&mut lines, "quote").await? {
                    break;
                }
                quote = fetcher.fetch_quote(ticker).await;
            }
        }
    }

    loop {
        match &logo {
            Ok(bytes) => {
                match &logo_path {
                    Some(path) => {
                        tokio::fs::write(path, bytes)
                            .await
                            .with_context(|| format!("failed to write logo to {}", path.display()))?;
                        println!("logo written: {}", path.display());
                    }
                    None => println!("logo: {} bytes", bytes.len()),
                }
                break;
            }
            Err(e) => {
                log::error!("{e}");
                if !ask_retry(&mut lines, "logo").await? {
                    break;
                }
                logo = fetcher.fetch_logo(ticker).await;
            }
        }
    }

    match (quote, logo) {
        (Ok(_), Ok(_)) => Ok(()),
        (Err(e), _) | (_, Err(e)) => Err(e.into()),
    }
}

// prints results as they land and remembers which fetch failed so `r` can
// re-issue it
#[derive(Default)]
struct PrintListener {
    quote_failed: AtomicBool,
    logo_failed: AtomicBool,
}

impl SelectionListener for PrintListener {
    fn on_quote(&self, ticker: &str, result: Result<Quote, FetchError>) {
        self.quote_failed.store(result.is_err(), Ordering::SeqCst);
        match result {
            Ok(quote) => println!("{}", render_quote(&quote)),
            Err(e) => println!("{ticker}: {e} (r to retry)"),
        }
    }

    fn on_logo(&self, ticker: &str, result: Result<Bytes, FetchError>) {
        self.logo_failed.store(result.is_err(), Ordering::SeqCst);
        match result {
            Ok(bytes) => println!("{ticker}: logo {} bytes", bytes.len()),
            Err(e) => println!("{ticker}: logo {e} (r to retry)"),
        }
    }
}

async fn browse(fetcher: QuoteFetcher, catalog: Catalog) -> Result<()> {
    let listener = Arc::new(PrintListener::default());
    let session = Session::new(catalog, fetcher, listener.clone());

    list(session.catalog());
    println!("number: select, r: retry, q: quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "q" => break,
            "r" => {
                let quote_failed = listener.quote_failed.swap(false, Ordering::SeqCst);
                let logo_failed = listener.logo_failed.swap(false, Ordering::SeqCst);
                if !quote_failed && !logo_failed {
                    println!("nothing to retry");
                    continue;
                }
                if quote_failed {
                    session.retry_quote()?;
                }
                if logo_failed {
                    session.retry_logo()?;
                }
            }
            input => match resolve(session.catalog(), input) {
                Ok(index) => {
                    listener.quote_failed.store(false, Ordering::SeqCst);
                    listener.logo_failed.store(false, Ordering::SeqCst);
                    let company = session.select(index)?;
                    println!("loading {} ...", company.display_name);
                }
                Err(e) => println!("{e}"),
            },
        }
    }

    session.cancel_all();
    Ok(())
}

fn load_fetcher(path: &Path) -> Result<QuoteFetcher> {
    let config =
        config::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    Ok(QuoteFetcher::from_config(&config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let catalog = Catalog::default();

    match cli.command {
        // listing needs no network, so no token either
        Command::List => {
            list(&catalog);
            Ok(())
        }
        Command::Show { company, logo } => {
            let fetcher = load_fetcher(&cli.config)?;
            let index = resolve(&catalog, &company)?;
            let company = *catalog
                .get(index)
                .ok_or_else(|| anyhow!("no company at index {index}"))?;
            show(&fetcher, company, logo).await
        }
        Command::Browse => browse(load_fetcher(&cli.config)?, catalog).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_accepts_index_or_ticker() {
        let catalog = Catalog::default();
        assert_eq!(resolve(&catalog, "2").unwrap(), 2);
        assert_eq!(resolve(&catalog, "amzn").unwrap(), 3);
        assert!(resolve(&catalog, "7").is_err());
        assert!(resolve(&catalog, "TSLA").is_err());
    }

    #[test]
    fn render_marks_direction() {
        let quote = Quote {
            company_name: String::from("Apple Inc."),
            symbol: String::from("AAPL"),
            price: 150.0,
            change: -1.25,
        };
        assert_eq!(render_quote(&quote), "Apple Inc. (AAPL)  150  -1.25 ▼");
    }

    #[test]
    fn cli_parses_show_with_logo() {
        let cli = Cli::try_parse_from(["stonks", "show", "AAPL", "--logo", "apple.png"]).unwrap();
        match cli.command {
            Command::Show { company, logo } => {
                assert_eq!(company, "AAPL");
                assert_eq!(logo, Some(PathBuf::from("apple.png")));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }
}
