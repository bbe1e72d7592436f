//! Loyalsift CLI - filter customer CSV exports for loyalty import.
//!
//! ```bash
//! loyalsift filter export.csv       # filter + reshape, write both CSVs
//! loyalsift inspect export.csv      # encoding/delimiter/column report
//! loyalsift schema                  # required columns and import layout
//! loyalsift serve                   # HTTP API on port 3000
//! ```

use clap::{Parser, Subcommand};
use loyalsift::{
    filter_file, parse_bytes, rules_for, serialize_csv, validate_columns, Derivation,
    FilterOptions, Variant, EXCLUDED_FILE_NAME, KEPT_FILE_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "loyalsift")]
#[command(about = "Filter customer CSV exports for loyalty import", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the exclusion rules and write both output CSVs
    Filter {
        /// Input CSV file
        input: PathBuf,

        /// Rule set to apply
        #[arg(short, long, value_enum, default_value_t = Variant::Extended)]
        variant: Variant,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Kept-rows output file (default: filtered_output.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Excluded-rows output file (default: excluded_rows.csv)
        #[arg(short, long)]
        excluded: Option<PathBuf>,
    },

    /// Parse a CSV file and report encoding, delimiter, and columns
    Inspect {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Show required columns, exclusion terms, and the import layout
    Schema {
        /// Rule set to describe
        #[arg(short, long, value_enum, default_value_t = Variant::Extended)]
        variant: Variant,
    },

    /// Start the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Filter {
            input,
            variant,
            delimiter,
            output,
            excluded,
        } => cmd_filter(
            &input,
            variant,
            delimiter,
            output.as_deref(),
            excluded.as_deref(),
        ),

        Commands::Inspect { input, delimiter } => cmd_inspect(&input, delimiter),

        Commands::Schema { variant } => cmd_schema(variant),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_filter(
    input: &Path,
    variant: Variant,
    delimiter: Option<char>,
    output: Option<&Path>,
    excluded: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {} ({} rule set)", input.display(), variant);

    let options = FilterOptions { variant, delimiter };
    let report = filter_file(input, &options)?;

    eprintln!("   Encoding: {}", report.csv_info.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        format_delimiter(report.csv_info.delimiter)
    );
    eprintln!("   Rows: {}", report.csv_info.row_count);

    eprintln!("\n📊 Results:");
    eprintln!("   Total rows:     {}", report.counts.total);
    eprintln!("   Rows kept:      {}", report.counts.kept);
    eprintln!("   Rows excluded:  {}", report.counts.excluded);

    let kept_path = output.unwrap_or(Path::new(KEPT_FILE_NAME));
    fs::write(kept_path, serialize_csv(&report.kept)?)?;
    eprintln!("\n💾 Kept rows written to: {}", kept_path.display());

    let excluded_path = excluded.unwrap_or(Path::new(EXCLUDED_FILE_NAME));
    fs::write(excluded_path, serialize_csv(&report.excluded)?)?;
    eprintln!("💾 Excluded rows written to: {}", excluded_path.display());

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_inspect(input: &Path, delimiter: Option<char>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let bytes = fs::read(input)?;
    let parsed = parse_bytes(&bytes, delimiter)?;

    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(parsed.delimiter),
        if delimiter.is_none() {
            " (auto-detected)"
        } else {
            ""
        }
    );
    eprintln!("✅ Parsed {} rows", parsed.table.row_count());

    println!("Columns ({}):", parsed.table.headers().len());
    for (i, col) in parsed.table.headers().iter().enumerate() {
        println!("  [{:2}] {}", i + 1, col);
    }

    println!();
    for variant in [Variant::Minimal, Variant::Extended] {
        match validate_columns(&parsed.table, variant.required_columns()) {
            Ok(()) => println!("✅ {} rule set: all required columns present", variant),
            Err(e) => println!(
                "❌ {} rule set: missing {}",
                variant,
                e.missing.join(", ")
            ),
        }
    }

    Ok(())
}

fn cmd_schema(variant: Variant) -> Result<(), Box<dyn std::error::Error>> {
    println!("Required columns ({} rule set):", variant);
    for col in variant.required_columns() {
        println!("  - {}", col);
    }

    println!("\nExclusion terms: {}", variant.exclusion_terms().join(", "));

    match rules_for(variant) {
        Some(rules) => {
            println!("\nImport layout ({} columns):", rules.len());
            for rule in rules {
                match &rule.derivation {
                    Derivation::Copy { source } => {
                        println!("  {} → {}", source, rule.target);
                    }
                    Derivation::Literal { value } => {
                        println!("  (literal \"{}\") → {}", value, rule.target);
                    }
                    Derivation::Concat { sources, .. } => {
                        println!("  [{}] → {}", sources.join(" + "), rule.target);
                    }
                    Derivation::StripChars { source, chars } => {
                        println!("  {} minus '{}' → {}", source, chars, rule.target);
                    }
                    Derivation::PresenceFlag {
                        probe,
                        present,
                        blank,
                    } => {
                        println!(
                            "  {} present? \"{}\" else \"{}\" → {}",
                            probe, present, blank, rule.target
                        );
                    }
                    Derivation::PresentOr { probe, fallback } => {
                        println!("  {} or \"{}\" → {}", probe, fallback, rule.target);
                    }
                    Derivation::Truncate { source, max_chars } => {
                        println!("  {} first {} chars → {}", source, max_chars, rule.target);
                    }
                }
            }
        }
        None => println!("\nNo reshape: kept rows keep the input schema."),
    }

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    loyalsift::server::start_server(port).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
