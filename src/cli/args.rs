use clap::{Parser, Subcommand};

/// depgate - verify service dependencies before startup
#[derive(Parser, Debug)]
#[command(name = "depgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Default per-probe timeout in milliseconds (overrides DEPGATE_DEFAULT_TIMEOUT_MS)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub default_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate dependencies once and exit 0 (pass) or 1 (fail)
    Check {
        /// Print the validation report as JSON to stdout
        #[arg(long)]
        json: bool,
    },
    /// Validate dependencies, then start the service command only if they pass
    Run {
        /// Print the validation report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Service command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}
