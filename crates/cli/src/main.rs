//! Command-line client for the travel marketplace.

mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use services::services::{
    config::{Config, tracker_path},
    tracker::LocalTracker,
};
use tracing_subscriber::EnvFilter;
use url::Url;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "waylocal",
    version,
    about = "Travel marketplace client: requests, proposals and acceptance"
)]
struct Cli {
    /// Override the API base URL.
    #[arg(long, env = "WAYLOCAL_API_URL", global = true)]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token on this device
    Login {
        handle: String,
    },
    /// Show the signed-in profile
    Me,
    /// Drop the stored session token
    Logout,
    /// Role-aware inbox: matching buckets derived from your requests and
    /// proposals
    Inbox {
        #[arg(long, value_enum, default_value = "traveler")]
        role: Role,
    },
    /// Browse open travel requests
    Requests,
    /// Show one request with its proposals
    Request {
        id: Uuid,
    },
    /// Create a travel request
    NewRequest {
        #[arg(long)]
        title: String,
        #[arg(long)]
        place_id: Uuid,
        #[arg(long)]
        starts_on: NaiveDate,
        #[arg(long)]
        ends_on: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        people: u32,
        #[arg(long)]
        experience: String,
        #[arg(long)]
        guide: bool,
        #[arg(long)]
        public: bool,
        /// Solicit a custom variant of this proposal (direct request)
        #[arg(long)]
        root_id: Option<Uuid>,
    },
    /// Browse proposals, or only your own
    Proposals {
        #[arg(long)]
        mine: bool,
    },
    /// Accept a proposal for one of your requests
    Accept {
        request_id: Uuid,
        proposal_id: Uuid,
    },
    /// Follow the received-proposals view live
    Watch,
    /// List your wishlists
    Wishlists,
    /// Browse recent stories
    Stories,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    Traveler,
    Local,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    let api = config.api_client()?;
    let tracker = LocalTracker::open(tracker_path());

    match cli.command {
        Command::Login { handle } => commands::login(&api, &handle).await,
        Command::Me => commands::me(&api).await,
        Command::Logout => commands::logout(&api),
        Command::Inbox { role: Role::Traveler } => commands::traveler_inbox(&api, &tracker).await,
        Command::Inbox { role: Role::Local } => commands::local_inbox(&api, &config).await,
        Command::Requests => commands::requests(&api).await,
        Command::Request { id } => commands::request_detail(&api, id).await,
        Command::NewRequest {
            title,
            place_id,
            starts_on,
            ends_on,
            people,
            experience,
            guide,
            public,
            root_id,
        } => {
            commands::new_request(
                &api,
                &tracker,
                commands::NewRequestArgs {
                    title,
                    place_id,
                    starts_on,
                    ends_on,
                    people,
                    experience,
                    guide,
                    public,
                    root_id,
                },
            )
            .await
        }
        Command::Proposals { mine } => commands::proposals(&api, mine).await,
        Command::Accept {
            request_id,
            proposal_id,
        } => commands::accept(&api, request_id, proposal_id).await,
        Command::Watch => commands::watch(&api, &config).await,
        Command::Wishlists => commands::wishlists(&api).await,
        Command::Stories => commands::stories(&api).await,
    }
}
