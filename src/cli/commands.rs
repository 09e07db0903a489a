//! CLI implementation for the import pipeline.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::auth::{self, AuthContext};
use crate::config::{Settings, DEFAULT_BASE_URL};
use crate::favicon::HttpIconResolver;
use crate::services::{ImportEvent, ImportOptions, ImportService};
use crate::sql;
use crate::store::HttpRecordStore;

#[derive(Parser)]
#[command(name = "lsync")]
#[command(about = "Import legacy SQL link dumps into a LinkSync record store")]
#[command(version)]
pub struct Cli {
    /// Path to the SQL dump file
    #[arg(long, default_value = "links.sql")]
    sql_file: PathBuf,

    /// Skip favicon fetching (faster, but imported links will have no icons)
    #[arg(long)]
    skip_favicons: bool,

    /// Record store base URL
    #[arg(long, env = "LSYNC_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Bearer token or full auth JSON; prompted for interactively when absent
    #[arg(long, env = "LSYNC_TOKEN")]
    token: Option<String>,

    /// Verify TLS certificates when scraping pages for favicons.
    /// Off by default: favicon discovery targets arbitrary sites with
    /// broken certificates, and the store connection is unaffected.
    #[arg(long)]
    strict_tls: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings {
        accept_invalid_certs: !cli.strict_tls,
        ..Settings::default()
    }
    .with_base_url(&cli.url);

    println!("\n{}", style("LinkSync SQL Importer").bold());
    println!("{} Record store: {}", style("ℹ").blue(), settings.base_url);
    println!(
        "{} SQL file: {}",
        style("ℹ").blue(),
        cli.sql_file.display()
    );
    println!(
        "{} Favicon fetching: {}",
        style("ℹ").blue(),
        if cli.skip_favicons {
            "disabled"
        } else {
            "enabled"
        }
    );

    let records = sql::extract_file(&cli.sql_file);
    if records.is_empty() {
        println!(
            "{} No links found in {}",
            style("✗").red(),
            cli.sql_file.display()
        );
        std::process::exit(1);
    }
    println!(
        "{} Parsed {} links from SQL file",
        style("✓").green(),
        records.len()
    );

    let auth = match establish_auth(cli.token.as_deref()) {
        Ok(auth) => auth,
        Err(e) => {
            println!("{} Authentication failed: {e}", style("✗").red());
            std::process::exit(1);
        }
    };
    println!(
        "{} Importing as user {} (token valid until {})",
        style("✓").green(),
        style(&auth.owner_user_id).cyan(),
        auth.expires_at.format("%Y-%m-%d %H:%M UTC")
    );

    let store = HttpRecordStore::new(&settings);
    let resolver = HttpIconResolver::new(&settings);
    let service = ImportService::new(store, resolver);
    let options = ImportOptions {
        skip_icons: cli.skip_favicons,
        record_delay: settings.record_delay,
        ..ImportOptions::default()
    };

    let (event_tx, event_rx) = mpsc::channel(64);
    let renderer = tokio::spawn(render_progress(records.len() as u64, event_rx));
    let summary = service.run(&records, &auth, &options, event_tx).await;
    let _ = renderer.await;

    println!("\n{}", style("Import Summary").bold());
    println!("{}", "-".repeat(14));
    println!("  Total links processed: {}", summary.processed);
    println!(
        "  {} Successfully imported: {}",
        style("✓").green(),
        summary.succeeded
    );
    if !cli.skip_favicons {
        println!(
            "  {} Links with favicons: {}",
            style("ℹ").blue(),
            summary.with_icon
        );
    }
    if summary.failed > 0 {
        println!("  {} Failed to import: {}", style("✗").red(), summary.failed);
    }
    if summary.stopped_early {
        println!(
            "  {} Stopped early: {} of {} records dispatched",
            style("!").yellow(),
            summary.processed,
            summary.total
        );
    }

    if summary.succeeded > 0 {
        println!(
            "\n{} View your links at {}/_/#/collections/links/records",
            style("ℹ").blue(),
            settings.base_url
        );
    }

    Ok(())
}

/// Obtain the `(token, user id)` pair and validate the session.
///
/// The token comes from `--token`/`LSYNC_TOKEN` when provided, otherwise
/// from an interactive paste. Either a bare JWT or the full auth JSON blob
/// the web app stores is accepted.
fn establish_auth(cli_token: Option<&str>) -> anyhow::Result<AuthContext> {
    let pasted = match cli_token {
        Some(token) => token.to_string(),
        None => prompt_for_token()?,
    };

    let (token, user_id) = auth::parse_pasted_auth(&pasted)?;
    let mut context = AuthContext::validate(&token)?;
    // Prefer the id carried by the auth blob; a bare token resolves to the
    // same value from its own payload.
    context.owner_user_id = user_id;
    Ok(context)
}

fn prompt_for_token() -> anyhow::Result<String> {
    println!(
        "\n{}",
        style("Paste the authentication data from your browser:").bold()
    );
    println!("  1. Log into the LinkSync app");
    println!("  2. Open Developer Tools → Application → Local Storage");
    println!("  3. Copy the 'pocketbase_auth_v2' value (or just the token)");
    print!("\n> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim().to_string();
    if line.is_empty() {
        anyhow::bail!("no authentication data entered");
    }
    Ok(line)
}

/// Render import events as a progress bar with per-record status glyphs.
async fn render_progress(total: u64, mut events: mpsc::Receiver<ImportEvent>) {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap(),
    );

    while let Some(event) = events.recv().await {
        match event {
            ImportEvent::Started { name, .. } => {
                pb.set_message(format!("⚙ {}", truncate(&name, 40)));
            }
            ImportEvent::Finished { name, outcome, .. } => {
                pb.inc(1);
                let glyph = if !outcome.succeeded {
                    style("✗").red().to_string()
                } else if outcome.icon_attached {
                    style("✓").green().to_string()
                } else {
                    style("·").dim().to_string()
                };
                pb.set_message(format!("{} {}", glyph, truncate(&name, 40)));
                if let Some(reason) = outcome.reason {
                    pb.println(format!(
                        "{} {}: {}",
                        style("✗").red(),
                        truncate(&name, 40),
                        reason
                    ));
                }
            }
            ImportEvent::HealthCheck { healthy } => {
                if healthy {
                    pb.println(format!(
                        "{} Multiple failures, but the store is still up; continuing",
                        style("!").yellow()
                    ));
                }
            }
            ImportEvent::Stopped { failed } => {
                pb.println(format!(
                    "{} Stopping after {} failures: record store unreachable",
                    style("✗").red(),
                    failed
                ));
            }
        }
    }

    pb.finish_and_clear();
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let cut: String = name.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_name_unchanged() {
        assert_eq!(truncate("short", 40), "short");
    }

    #[test]
    fn test_truncate_long_name() {
        let long = "x".repeat(50);
        let truncated = truncate(&long, 40);
        assert_eq!(truncated.chars().count(), 43);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let name = "é".repeat(45);
        let truncated = truncate(&name, 40);
        assert!(truncated.ends_with("..."));
    }
}
