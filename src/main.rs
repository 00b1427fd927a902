use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use asmpatch::PatchResult;
use asmpatch::config::PatchConfig;
use asmpatch::recipe::PatchRecipe;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormatArg {
    #[default]
    Hex,
    Json,
    CArray,
}

#[derive(Parser)]
#[command(name = "asmpatch")]
#[command(about = "Assemble 32-bit x86 runtime patches", long_about = None)]
struct Cli {
    /// Log debug events to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a patch recipe and print the bytes
    Assemble {
        /// The recipe file (TOML)
        recipe: PathBuf,

        /// Output format (hex, json, c-array)
        #[arg(long, value_enum, default_value = "hex")]
        format: OutputFormatArg,
    },
    /// Print the effective configuration
    Config {
        /// Configuration file (defaults to built-in values)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "asmpatch=debug" } else { "asmpatch=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render(patch: &PatchResult, format: OutputFormatArg) -> Result<String, String> {
    match format {
        OutputFormatArg::Hex => Ok(format!("{:#010x}: {}", patch.address(), patch.to_hex())),
        OutputFormatArg::Json => serde_json::to_string_pretty(patch)
            .map_err(|e| format!("failed to serialize patch: {}", e)),
        OutputFormatArg::CArray => {
            let body = patch
                .bytes()
                .iter()
                .map(|b| format!("0x{:02X}", b))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!(
                "/* {:#010x}, {} bytes */\nstatic const unsigned char patch[] = {{ {} }};",
                patch.address(),
                patch.len(),
                body
            ))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assemble { recipe, format } => {
            let patch = match PatchRecipe::load(&recipe).and_then(|r| r.assemble()) {
                Ok(patch) => patch,
                Err(e) => {
                    eprintln!("error: {}: {}", recipe.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            match render(&patch, format) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Commands::Config { config } => {
            let loaded = match config {
                Some(path) => PatchConfig::load(&path),
                None => Ok(PatchConfig::default()),
            };
            match loaded.and_then(|c| c.to_toml_string()) {
                Ok(text) => print!("{}", text),
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
