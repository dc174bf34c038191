// apd - command line front end for APD declaration files
//
// Usage:
//     apd check declaration.txt
//     apd split declaration.txt -o split.txt
//     apd report declaration.txt

use anyhow::{Context, Result};
use apd_codec::{
    apd_catalog, contributions_csv, document_json, fingerprint, generate_report_blocks,
    labelled_dump, read_document, write_document, ApdConfig, Document,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "apd", version, about = "Read, check and rewrite APD contribution declarations")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, env = "APD_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare header totals with the contribution lines
    Check { file: PathBuf },

    /// Rewrite header totals from the contribution lines
    Fix {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a category-18 copy after every contribution line
    Split {
        file: PathBuf,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the declaration report
    Report { file: PathBuf },

    /// Print every record with labelled fields
    Dump { file: PathBuf },

    /// Write contribution rows as CSV and/or the document as JSON
    Export {
        file: PathBuf,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print the record layouts
    Schema,

    /// SHA-256 of the file as it would be written back
    Fingerprint { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ApdConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Check { file } => run_check(&file, &config)?,
        Command::Fix { file, output } => run_fix(&file, output.as_deref(), &config)?,
        Command::Split { file, from, to, output } => {
            let from = from.unwrap_or(config.split_from);
            let to = to.unwrap_or(config.split_to);
            run_split(&file, from, to, output.as_deref(), &config)?
        }
        Command::Report { file } => {
            let doc = open(&file)?;
            let blocks = generate_report_blocks(&doc).context("Failed to build report")?;
            print!("{}", blocks.to_text());
        }
        Command::Dump { file } => {
            let doc = open(&file)?;
            println!("{}", labelled_dump(&doc)?);
        }
        Command::Export { file, csv, json } => run_export(&file, csv.as_deref(), json.as_deref())?,
        Command::Schema => println!("{}", apd_catalog()?.describe()),
        Command::Fingerprint { file } => {
            let doc = open(&file)?;
            println!("{}  {}", fingerprint(&doc)?, file.display());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open(path: &Path) -> Result<Document> {
    let catalog = apd_catalog()?;
    read_document(catalog, path).with_context(|| format!("Failed to read {}", path.display()))
}

fn save(doc: &mut Document, path: &Path, config: &ApdConfig) -> Result<()> {
    config.line_ending.apply(doc);
    write_document(doc, path).with_context(|| format!("Failed to write {}", path.display()))
}

fn run_check(file: &Path, config: &ApdConfig) -> Result<()> {
    println!("🔍 Checking {}", file.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let doc = open(file)?;
    let report = doc.reconciliation_report()?;
    println!("{}", report.summary());

    if report.is_balanced() {
        println!("✅ Header totals match the contribution lines");
        return Ok(());
    }

    for discrepancy in &report.discrepancies {
        println!("⚠️  {}", discrepancy);
    }
    if config.fail_on_discrepancy {
        eprintln!("❌ {} discrepancies", report.discrepancies.len());
        process::exit(2);
    }
    Ok(())
}

fn run_fix(file: &Path, output: Option<&Path>, config: &ApdConfig) -> Result<()> {
    let mut doc = open(file)?;
    let before = doc.validate()?;
    doc.reconcile_header()?;

    let target = output.unwrap_or(file);
    save(&mut doc, target, config)?;
    println!("✓ Corrected {} header totals", before.len());
    println!("💾 Wrote {}", target.display());
    Ok(())
}

fn run_split(
    file: &Path,
    from: NaiveDate,
    to: NaiveDate,
    output: Option<&Path>,
    config: &ApdConfig,
) -> Result<()> {
    let mut doc = open(file)?;
    let inserted = doc
        .split_contribution_records_by_category(from, to)
        .context("Failed to split contribution records")?;

    let target = output.unwrap_or(file);
    save(&mut doc, target, config)?;
    println!("✓ Inserted {} category-18 records ({} .. {})", inserted, from, to);
    println!("💾 Wrote {}", target.display());
    Ok(())
}

fn run_export(file: &Path, csv: Option<&Path>, json: Option<&Path>) -> Result<()> {
    if csv.is_none() && json.is_none() {
        anyhow::bail!("Nothing to export: pass --csv and/or --json");
    }

    let doc = open(file)?;
    if let Some(path) = csv {
        fs::write(path, contributions_csv(&doc)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("📄 CSV: {}", path.display());
    }
    if let Some(path) = json {
        fs::write(path, document_json(&doc)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("📄 JSON: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_path_read_from_environment() {
        let cmd = Cli::command();
        let config = cmd.get_arguments().find(|a| a.get_id() == "config").unwrap();
        assert_eq!(config.get_env(), Some(OsStr::new("APD_CONFIG")));
    }

    #[test]
    fn test_split_dates_parse() {
        let cli = Cli::try_parse_from(["apd", "split", "in.txt", "--from", "2020-04-15"]).unwrap();
        match cli.command {
            Command::Split { from, to, .. } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2020, 4, 15));
                assert_eq!(to, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
