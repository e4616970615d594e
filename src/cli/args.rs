//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::application::valid_sas_file;

/// Run SAS programs and inspect SAS libraries from the command line
#[derive(Parser, Debug)]
#[command(name = "sas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose logging to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (INI); default: ~/.config/sascli/sascli.ini
    #[arg(long, global = true, env = "SASCLI_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a SAS program
    Run {
        /// The SAS (.sas) program to run
        #[arg(value_name = "FILE", value_parser = valid_sas_file, value_hint = ValueHint::FilePath)]
        file: PathBuf,

        /// Print the log live while the program runs
        #[arg(long)]
        show_log: bool,
    },

    /// Show column information and rows of a dataset
    Data {
        /// Dataset as [libref.]table
        dataset: String,

        /// Library of the dataset (overrides a libref in DATASET)
        #[arg(short, long)]
        libref: Option<String>,

        /// Maximum number of rows (default from config, 10)
        #[arg(long)]
        obs: Option<usize>,

        /// Columns to keep
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        keep: Vec<String>,

        /// Columns to drop
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        drop: Vec<String>,

        /// Row filter, passed to the engine as is
        #[arg(long = "where", value_name = "EXPR")]
        where_clause: Option<String>,

        /// Only show column information
        #[arg(long)]
        info_only: bool,
    },

    /// List the tables in a library
    Lib {
        /// Library reference
        libref: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,

    /// Show config file path
    Path,

    /// Create config template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
