use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ficscout::browse::SessionManager;
use ficscout::commands::{CommandService, SearchReply};
use ficscout::config::Config;
use ficscout::model::AutoresponseLocation;
use ficscout::providers::http::build_provider_client;
use ficscout::providers::{Ao3Client, AtlasClient, FichubClient, StoryProvider};
use ficscout::render::{Renderer, StoryCard};
use ficscout::resolve::{Family, ResolutionEngine};
use ficscout::sites::SiteRegistry;
use ficscout::store::AutoresponseStore;

#[derive(Parser)]
#[command(name = "ficscout", about = "Web fiction metadata resolver", version)]
struct Cli {
    /// Path to config.toml; defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search one source family for a story by title or URL.
    Search { family: Family, query: String },

    /// Scan a text blob and print a card for every recognized story link.
    Scan { text: String },

    /// Manage per-channel autoresponse opt-ins.
    Autoresponse {
        #[command(subcommand)]
        command: AutoresponseCommand,
    },
}

#[derive(Subcommand)]
enum AutoresponseCommand {
    /// List the channels opted in for a guild.
    Get { guild: i64 },
    /// Opt channels in.
    Add { guild: i64, channels: Vec<i64> },
    /// Opt channels out.
    Remove { guild: i64, channels: Vec<i64> },
    /// Drop every opt-in for a guild.
    Clear { guild: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let service = build_service(&config).await?;

    match cli.command {
        Command::Search { family, query } => {
            match service.search("cli", family, &query).await {
                SearchReply::Card(card) => print_card(&card),
                SearchReply::Browse { session_id, page } => {
                    print_card(&page.card);
                    println!(
                        "(series session {session_id}: next {}, previous {})",
                        enabled(page.flags.next_enabled),
                        enabled(page.flags.previous_enabled)
                    );
                }
            }
        }
        Command::Scan { text } => {
            let cards = service.scan_text(&text).await;
            if cards.is_empty() {
                println!("no story links resolved");
            }
            for card in &cards {
                print_card(card);
            }
        }
        Command::Autoresponse { command } => match command {
            AutoresponseCommand::Get { guild } => {
                print_locations(&service.autoresponse_get(guild).await?);
            }
            AutoresponseCommand::Add { guild, channels } => {
                let batch = to_locations(guild, &channels);
                print_locations(&service.autoresponse_add(&batch).await?);
            }
            AutoresponseCommand::Remove { guild, channels } => {
                let batch = to_locations(guild, &channels);
                print_locations(&service.autoresponse_remove(&batch).await?);
            }
            AutoresponseCommand::Clear { guild } => {
                service.autoresponse_clear(guild).await?;
                println!("cleared guild {guild}");
            }
        },
    }

    Ok(())
}

async fn build_service(config: &Config) -> Result<CommandService> {
    let http = build_provider_client(config.http.timeout_secs);
    let registry = SiteRegistry::builtin();

    let mut atlas = AtlasClient::new(http.clone(), config.atlas.base_url.clone());
    if let (Some(login), Some(password)) = (&config.atlas.login, &config.atlas.password) {
        atlas = atlas.with_auth(login, password);
    }
    let atlas: Arc<dyn StoryProvider> = Arc::new(atlas);
    let fichub: Arc<dyn StoryProvider> =
        Arc::new(FichubClient::new(http.clone(), config.fichub.base_url.clone()));
    let ao3: Arc<dyn StoryProvider> = Arc::new(Ao3Client::new(http, config.ao3.base_url.clone()));

    let engine = ResolutionEngine::new(Arc::clone(&registry), ao3, atlas, fichub);
    let renderer = Arc::new(Renderer::new(Arc::clone(&registry)));
    let sessions = SessionManager::new(
        Arc::clone(&renderer),
        Duration::from_secs(config.browse.timeout_secs),
    );

    let store = AutoresponseStore::connect(&config.database_url()?).await?;
    store.initialize().await?;

    Ok(CommandService::new(
        registry,
        engine,
        renderer,
        sessions,
        Arc::new(store),
    ))
}

fn to_locations(guild: i64, channels: &[i64]) -> Vec<AutoresponseLocation> {
    channels
        .iter()
        .map(|channel| AutoresponseLocation::new(guild, *channel))
        .collect()
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

fn print_card(card: &StoryCard) {
    println!("== {}", card.title);
    if let Some(url) = &card.url {
        println!("   {url}");
    }
    if let Some(author) = &card.author {
        println!("   by {}", author.name);
    }
    if !card.description.is_empty() {
        println!("{}", card.description);
    }
    for field in &card.fields {
        println!("{}: {}", field.name, field.value);
    }
    if let Some(footer) = &card.footer {
        println!("-- {footer}");
    }
    println!();
}

fn print_locations(locations: &[AutoresponseLocation]) {
    if locations.is_empty() {
        println!("no autoresponse channels");
    }
    for location in locations {
        println!("guild {} channel {}", location.guild_id, location.channel_id);
    }
}
