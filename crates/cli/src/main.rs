mod commands;
mod logging;
mod report;
mod runner;
mod tap;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Output format for diagnostics and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// super-ini compiler.
#[derive(Parser)]
#[command(name = "superini", version, about = "super-ini to INI compiler")]
struct Cli {
    /// Diagnostic format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    format: OutputFormat,

    /// Suppress banner lines and warnings
    #[arg(long, global = true)]
    quiet: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a super-ini file to INI
    Compile {
        /// Path to the super-ini source file
        input: PathBuf,
        /// Output path (defaults to the `output` key of a setenv scope)
        output: Option<PathBuf>,
        /// Print the compiled INI to stdout instead of writing a file
        #[arg(short = 'd', long, conflicts_with = "output")]
        dump: bool,
        /// Order scopes and keys lexicographically
        #[arg(long)]
        sorted: bool,
    },

    /// Compile without writing output; report warnings and stats
    Check {
        /// Path to the super-ini source file
        input: PathBuf,
    },

    /// Run the conformance test suite
    Test {
        /// Path to the conformance suite directory
        #[arg(default_value = "conformance")]
        suite_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            output,
            dump,
            sorted,
        } => {
            commands::compile::cmd_compile(commands::compile::CompileOptions {
                input: &input,
                output: output.as_deref(),
                dump,
                sorted,
                format: cli.format,
                quiet: cli.quiet,
            });
        }
        Commands::Check { input } => {
            commands::check::cmd_check(&input, cli.format, cli.quiet);
        }
        Commands::Test { suite_dir } => {
            commands::test::cmd_test(&suite_dir, cli.format, cli.quiet);
        }
    }
}
