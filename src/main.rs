use anyhow::Result;
use clap::{Parser, Subcommand};
use deduper_rs::config::DedupConfig;
use deduper_rs::dedup::{BoundaryEmission, DedupOptions, WindowMode};
use deduper_rs::position::ReverseArithmetic;
use deduper_rs::stream::deduplicate_sam_file;
use deduper_rs::umi::load_umi_list;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deduper-rs")]
#[command(about = "Reference-based PCR duplicate removal for single-end UMI SAM files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove PCR duplicates from a coordinate-sorted SAM file
    Dedup {
        /// Input SAM file path (must end in .sam)
        #[arg(short, long)]
        file: PathBuf,

        /// UMI list file (one UMI per line)
        #[arg(short, long)]
        umi: Option<PathBuf>,

        /// Input is paired-end (currently unsupported)
        #[arg(short, long)]
        paired: bool,

        /// Output SAM path [default: <input file name>_deduped]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scope of the duplicate window
        #[arg(long, value_enum, default_value_t = WindowMode::PerChromosome)]
        window: WindowMode,

        /// How the reverse-strand 5' end is accumulated from the CIGAR
        #[arg(long, value_enum, default_value_t = ReverseArithmetic::DeletionAware)]
        reverse_arithmetic: ReverseArithmetic,

        /// Emission of the first record of each new chromosome
        #[arg(long, value_enum, default_value_t = BoundaryEmission::Single)]
        boundary_emission: BoundaryEmission,

        /// Use the earlier Python deduper's arithmetic and boundary doubling
        #[arg(long, conflicts_with_all = ["window", "reverse_arithmetic", "boundary_emission"])]
        legacy: bool,

        /// Print run statistics as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Dedup {
            file,
            umi,
            paired,
            output,
            window,
            reverse_arithmetic,
            boundary_emission,
            legacy,
            json,
        } => {
            let options = if legacy {
                DedupOptions::legacy()
            } else {
                DedupOptions {
                    window,
                    reverse_arithmetic,
                    boundary_emission,
                }
            };
            let config = DedupConfig::validate(file, umi, output, paired, options)?;

            eprintln!("Deduper-rs");
            eprintln!("==========");
            eprintln!();
            eprintln!("Loading UMI list from: {}", config.umi_list.display());

            let whitelist = load_umi_list(&config.umi_list)?;
            eprintln!("  ✓ Loaded {} UMIs", whitelist.len());
            if whitelist.is_empty() {
                log::warn!("UMI list {} is empty; every record will be discarded", config.umi_list.display());
            }

            eprintln!();
            eprintln!("Deduplicating SAM: {} -> {}", config.input.display(), config.output.display());

            let start = std::time::Instant::now();
            let report = deduplicate_sam_file(&config.input, &config.output, &whitelist, config.options)?;
            let duration = start.elapsed();

            eprintln!("  ✓ Complete in {:.3}s", duration.as_secs_f64());
            eprintln!();

            let stats = &report.stats;
            if json {
                let json = serde_json::json!({
                    "header_lines": report.header_lines,
                    "total_records": stats.total_records,
                    "emitted_records": stats.emitted_records,
                    "duplicate_records": stats.duplicate_records,
                    "invalid_umi_records": stats.invalid_umi_records,
                    "chromosome_revisits": stats.chromosome_revisits,
                    "duplicate_percent": report.duplicate_rate(),
                    "duration_seconds": duration.as_secs_f64(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }

            eprintln!("Statistics:");
            eprintln!("  Records processed: {:>12}", format_number(stats.total_records));
            eprintln!("  Records emitted:   {:>12}", format_number(stats.emitted_records));
            eprintln!("  Duplicates:        {:>12}", format_number(stats.duplicate_records));
            eprintln!("  Invalid UMIs:      {:>12}", format_number(stats.invalid_umi_records));
            eprintln!();

            info!("Run finished in {:.3}s", duration.as_secs_f64());
            println!("{}", report.summary());
        }
    }

    Ok(())
}

fn format_number(n: usize) -> String {
    n.to_string()
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(",")
}
