#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::uninlined_format_args)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

use namely_core::DEFAULT_WIDTH;

#[derive(Parser, Debug)]
#[command(name = "namely")]
#[command(author, version, about = "Recover natural identifier names in minified JavaScript", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted logs (machine-readable, to stderr)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Extract aggregated context records into a training log
    Extract {
        /// Input file, or a newline-separated list of files with --listmode
        #[arg(short, long)]
        file: PathBuf,

        /// Treat the input as a list of paths and process them in parallel
        #[arg(short, long)]
        listmode: bool,

        /// Context half-width (tokens kept on each side of an identifier)
        #[arg(short, long, default_value_t = DEFAULT_WIDTH)]
        width: usize,

        /// Output log for the extracted records
        #[arg(short, long, default_value = "contexts.txt")]
        outfile: PathBuf,

        /// Append to the output log instead of truncating it
        #[arg(short, long)]
        append: bool,
    },

    /// Recover names by querying the prediction oracle
    Recover {
        /// Input file, or a newline-separated list of files with --listmode
        #[arg(short, long)]
        file: PathBuf,

        /// Treat the input as a list of paths and process them in parallel
        #[arg(short, long)]
        listmode: bool,

        /// Context half-width (tokens kept on each side of an identifier)
        #[arg(short, long, default_value_t = DEFAULT_WIDTH)]
        width: usize,

        /// Oracle host
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        /// Oracle port
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Write the recovered source here (single-file mode; default stdout)
        #[arg(short, long)]
        outfile: Option<PathBuf>,

        /// Derive each output path by replacing the input extension
        #[arg(long)]
        ext: Option<String>,

        /// Write per-file timing next to each output
        #[arg(short, long)]
        stats: bool,

        /// Also reserve committed names in the declaring scope itself
        #[arg(long)]
        strict_boundary: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json);

    match cli.command {
        Commands::Extract {
            file,
            listmode,
            width,
            outfile,
            append,
        } => commands::extract::run(&commands::extract::ExtractAction {
            file,
            listmode,
            width,
            outfile,
            append,
        }),
        Commands::Recover {
            file,
            listmode,
            width,
            ip,
            port,
            outfile,
            ext,
            stats,
            strict_boundary,
        } => commands::recover::run(&commands::recover::RecoverAction {
            file,
            listmode,
            width,
            ip,
            port,
            outfile,
            ext,
            stats,
            strict_boundary,
        }),
    }
}
