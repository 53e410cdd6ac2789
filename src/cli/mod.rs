// Command-line interface
// Argument definitions; handlers live in `commands`, text output in `render`.

mod commands;
pub mod render;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::review::Language;

pub use commands::{dispatch, PlanDraft, WeightOverride};

#[derive(Debug, Parser)]
#[command(name = "stratplan", version, about = "Strategic planning and budget approval client")]
pub struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.stratplan/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Viewing organization, overrides the session and config
    #[arg(long, global = true, value_name = "ID")]
    pub organization: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List strategic objectives
    Objectives,
    /// Inspect, export and move plans through review
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },
    /// Team/Desk plans cascaded from a LEO/EO plan
    Desk {
        #[command(subcommand)]
        action: DeskCommand,
    },
    /// Initiative feeds offered when planning
    Feeds {
        /// Include inactive feeds
        #[arg(long)]
        all: bool,
    },
    /// Run a costing calculator on a TOML input file
    Cost {
        #[command(subcommand)]
        tool: CostCommand,
    },
    /// Plan status and budget overviews
    Dashboard {
        #[command(subcommand)]
        view: DashboardCommand,
    },
    /// Show the logged-in user and their organizations
    Whoami,
}

#[derive(Debug, Subcommand)]
pub enum PlanCommand {
    /// Print a plan with its objectives, initiatives, measures and activities
    Show { id: u64 },
    /// Write a plan to an xlsx, csv or pdf file
    Export {
        id: u64,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,
        /// en or am (pdf output is always English)
        #[arg(short, long, default_value = "en")]
        language: Language,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Build a plan from a draft file, preview it and submit it for review
    New {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Preview only, do not create the plan
        #[arg(long)]
        dry_run: bool,
    },
    /// Submit an existing draft plan for review
    Submit { id: u64 },
    /// Approve a submitted plan
    Approve {
        id: u64,
        #[arg(short, long)]
        feedback: Option<String>,
    },
    /// Reject a submitted plan; feedback is required
    Reject {
        id: u64,
        #[arg(short, long)]
        feedback: String,
    },
    /// Plans waiting for an evaluator decision
    Pending,
}

#[derive(Debug, Subcommand)]
pub enum DeskCommand {
    /// List Team/Desk plans, optionally only those under one LEO/EO plan
    List {
        #[arg(long, value_name = "ID")]
        plan: Option<u64>,
    },
    /// Print the parent plan restricted to the items this Team/Desk plan carries
    Show { id: u64 },
    Submit { id: u64 },
    Approve {
        id: u64,
        #[arg(short, long)]
        feedback: Option<String>,
    },
    /// Reject a Team/Desk plan; feedback is required
    Reject {
        id: u64,
        #[arg(short, long)]
        feedback: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

#[derive(Debug, Args)]
pub struct CostArgs {
    /// Calculator inputs
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Reference tables saved as JSON, used instead of fetching them
    #[arg(long, value_name = "FILE")]
    pub tables: Option<PathBuf>,

    /// Print the budget draft as JSON instead of the breakdown
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum CostCommand {
    /// Meeting or workshop
    Meeting(CostArgs),
    Printing(CostArgs),
    Procurement(CostArgs),
    /// Supervision visit
    Supervision(CostArgs),
}

impl CostCommand {
    pub fn args(&self) -> &CostArgs {
        match self {
            CostCommand::Meeting(args)
            | CostCommand::Printing(args)
            | CostCommand::Procurement(args)
            | CostCommand::Supervision(args) => args,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum DashboardCommand {
    /// Status counts and budgets across all organizations
    Admin,
    /// Review queue for the evaluator's organizations
    Evaluator,
}
