use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, import, intake, respond, reviews, serve, wizard};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reviewgate")]
#[command(about = "ReviewGate - Review intake and triage for local businesses")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a review (rating and feedback)
    #[command(long_about = "Validate, classify and store a review, then print where the customer goes next. The session token printed here is required by the feedback and contact steps.")]
    Submit {
        /// Star rating, 1-5
        #[arg(long)]
        rating: String,

        /// Feedback text
        #[arg(long)]
        feedback: String,

        /// Client key used for rate limiting
        #[arg(long, default_value = "cli")]
        client: String,
    },
    /// Add improvement details to a submitted review
    Feedback {
        /// Session token returned by `submit`
        #[arg(long)]
        token: String,

        /// What could be improved
        #[arg(long, default_value = "")]
        text: String,

        /// Improvement area (repeatable)
        #[arg(long = "area")]
        areas: Vec<String>,
    },
    /// Record whether and how the customer wants to be contacted
    Contact {
        /// Session token returned by `submit`
        #[arg(long)]
        token: String,

        /// Customer does not want to be contacted
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["name", "email", "phone", "preferred"])]
        no_contact: bool,

        #[arg(long, required_unless_present = "no_contact")]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Preferred contact method: email or phone
        #[arg(long, default_value = "email")]
        preferred: String,
    },
    /// Walk through the whole review flow interactively
    Wizard {
        #[arg(long, default_value = "cli")]
        client: String,
    },
    /// Respond to a review as staff
    Respond {
        #[arg(long)]
        review: u64,

        #[arg(long)]
        responder: u64,

        #[arg(long)]
        text: String,
    },
    /// Mark a review as read
    Read {
        #[arg(long)]
        review: u64,
    },
    /// List the most recent reviews for the configured business
    Reviews {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Serve intake requests as JSON lines on stdin/stdout
    #[command(long_about = "Read one JSON request per line from stdin and write one JSON response per line to stdout. Rate-limit windows are compacted on a schedule while serving. Logs go to stderr, or to --log-file with daily rotation.")]
    Serve {
        /// Write logs to this file instead of stderr
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,
    },
    /// Import historical reviews from a JSON file
    Import {
        file: PathBuf,

        /// Delete the business's existing reviews first
        #[arg(long, action = ArgAction::SetTrue)]
        replace: bool,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Clear stored data
    #[command(long_about = "Delete the review store or the stored credentials. Use --store, --credentials, or --all.")]
    Clear {
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        store: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (API key masked)
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store the API key for the external classifier
    SetApiKey {
        /// API key (prompted for if omitted)
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve { log_file } => log_file.clone(),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Submit { rating, feedback, client } => {
            intake::run_submit(&rating, &feedback, &client, &output).await
        }
        Commands::Feedback { token, text, areas } => intake::run_feedback(&token, &text, &areas, &output).await,
        Commands::Contact { token, no_contact, name, email, phone, preferred } => {
            let contact = intake::contact_submission(no_contact, name, email, phone, &preferred)?;
            intake::run_contact(&token, &contact, &output).await
        }
        Commands::Wizard { client } => wizard::run_wizard(&client, &output).await,
        Commands::Respond { review, responder, text } => respond::run_respond(review, responder, &text, &output).await,
        Commands::Read { review } => respond::run_mark_read(review, &output).await,
        Commands::Reviews { limit } => reviews::run_reviews(limit, &output).await,
        Commands::Serve { .. } => serve::run_serve().await,
        Commands::Import { file, replace } => import::run_import(&file, replace, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
        Commands::Clear { all, store, credentials } => clear::run_clear(all, store, credentials, &output).await,
    }
}
