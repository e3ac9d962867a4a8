//! edumate CLI: administration front end for the edumate back end.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::curriculum::CurriculumCommand;
use commands::generate::GenerateCommand;
use commands::points::PointsCommand;
use commands::reward::RewardCommand;
use commands::user::UserCommand;

#[derive(Parser)]
#[command(
    name = "edumate",
    version,
    about = "Curriculum, question bank, points and rewards administration"
)]
struct Cli {
    /// Config file path (default: ./edumate.toml, then ~/.config/edumate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and seed the data file
    Init {
        /// Skip the sample curriculum
        #[arg(long)]
        no_sample: bool,
    },

    /// Bulk-import questions from a CSV file
    Import {
        /// CSV with columns subject,topic,question,option_a..option_d,correct[,difficulty,explanation]
        #[arg(long)]
        csv: PathBuf,
    },

    /// Point rules, awards and the ledger
    Points {
        #[command(subcommand)]
        command: PointsCommand,
    },

    /// Parent rewards and redemption requests
    Reward {
        #[command(subcommand)]
        command: RewardCommand,
    },

    /// Set who a parent, teacher or student is linked to
    Link {
        /// User id, email or name
        #[arg(long)]
        user: String,

        /// Comma-separated users to link; empty clears all links
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        to: Vec<String>,
    },

    /// AI-assisted content generation (sample content when offline)
    Generate {
        #[command(subcommand)]
        command: GenerateCommand,
    },

    /// Topic mastery for a student
    Mastery {
        /// Student id, email or name
        #[arg(long)]
        student: String,
    },

    /// Show a user's dashboard
    Dashboard {
        /// User id, email or name
        #[arg(long)]
        user: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Manage subjects and topics
    Curriculum {
        #[command(subcommand)]
        command: CurriculumCommand,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "edumate=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init { no_sample } => commands::init::execute(config, !no_sample).await,
        Commands::Import { csv } => commands::import::execute(config, csv).await,
        Commands::Points { command } => commands::points::execute(config, command).await,
        Commands::Reward { command } => commands::reward::execute(config, command).await,
        Commands::Link { user, to } => commands::link::execute(config, user, to).await,
        Commands::Generate { command } => commands::generate::execute(config, command).await,
        Commands::Mastery { student } => commands::mastery::execute(config, student).await,
        Commands::Dashboard { user, json } => commands::dashboard::execute(config, user, json).await,
        Commands::User { command } => commands::user::execute(config, command).await,
        Commands::Curriculum { command } => commands::curriculum::execute(config, command).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
