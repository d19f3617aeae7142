pub mod commands;
pub mod terminal;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::doc::DocCategory;
use crate::error::Result;
use crate::retrieval::RetrievalScope;

#[derive(Parser)]
#[command(name = "sfref")]
#[command(about = "Browse and open Salesforce developer documentation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the Apex reference
    Apex {
        /// Print the chosen link instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Browse the Visualforce component reference
    Visualforce {
        /// Print the chosen link instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Browse the Service Console methods
    ServiceConsole {
        /// Print the chosen link instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Browse every category enabled for the all-documentation command
    All {
        /// Print the chosen link instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Keep the index in memory and browse repeatedly
    Session {
        /// Print chosen links instead of opening them
        #[arg(long)]
        print: bool,
    },

    /// Print the titles of a scope without prompting
    List {
        #[arg(value_enum)]
        scope: ScopeArg,

        /// Emit entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open the entry at a position printed by `list` (negative means cancel)
    Open {
        #[arg(value_enum)]
        scope: ScopeArg,

        #[arg(allow_negative_numbers = true)]
        index: i64,

        /// Print the link instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Apex,
    Visualforce,
    ServiceConsole,
    All,
}

impl From<ScopeArg> for RetrievalScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Apex => RetrievalScope::Category(DocCategory::Apex),
            ScopeArg::Visualforce => RetrievalScope::Category(DocCategory::Visualforce),
            ScopeArg::ServiceConsole => RetrievalScope::Category(DocCategory::ServiceConsole),
            ScopeArg::All => RetrievalScope::All,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // These never read the configuration file, so a missing or broken
        // one cannot stop them.
        match self.command {
            Commands::Init { force } => {
                let config = Config::from_env();
                let _log_guard = commands::init_logging(self.debug, self.verbose, &config.logging)?;
                return commands::init(&config, self.config, force);
            }
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                return Ok(());
            }
            _ => {}
        }

        let config = Config::resolve(self.config.as_deref())?;

        // Held until the command returns so buffered file logs are flushed.
        let _log_guard = commands::init_logging(self.debug, self.verbose, &config.logging)?;

        match self.command {
            Commands::Apex { print } => {
                commands::browse(config, RetrievalScope::Category(DocCategory::Apex), print).await
            }
            Commands::Visualforce { print } => {
                commands::browse(config, RetrievalScope::Category(DocCategory::Visualforce), print)
                    .await
            }
            Commands::ServiceConsole { print } => {
                commands::browse(config, RetrievalScope::Category(DocCategory::ServiceConsole), print)
                    .await
            }
            Commands::All { print } => commands::browse(config, RetrievalScope::All, print).await,
            Commands::Session { print } => commands::session(config, print).await,
            Commands::List { scope, json } => commands::list(config, scope.into(), json).await,
            Commands::Open { scope, index, print } => {
                commands::open(config, scope.into(), index, print).await
            }
            Commands::Init { .. } | Commands::Completions { .. } => Ok(()),
        }
    }
}
