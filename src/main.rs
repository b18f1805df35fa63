//! Stacktris - Unified CLI
//!
//! HTTP API, headless play and local auth session management.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Command};
use stacktris::{
    AppConfig, AppState, AuthProvider, AuthStore, AuthUser, CallbackRedirect, GameConfig, GameRepository,
    HostedAuthClient, ProfileService, RankingPartition, SimpleBot, create_router, play_game,
    resolve_callback,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,stacktris=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { port, host } => run_server(config.with_bind(host, port)).await,
        Command::Play {
            seed,
            max_pieces,
            record,
            show_board,
        } => run_play(&config, seed, max_pieces, record, show_board).await,
        Command::Migrate => run_migrate(&config),
        Command::Login { code } => run_login(&config, code).await,
        Command::Logout => run_logout(&config),
        Command::Whoami => run_whoami(&config).await,
        Command::Ranking { partition } => run_ranking(&config, &partition),
    }
}

/// Opens the repository and applies migrations.
fn open_service(config: &AppConfig) -> Result<ProfileService> {
    let repository = GameRepository::new(config.database_url().clone())?;
    repository.run_migrations()?;
    Ok(ProfileService::new(repository))
}

/// Run the HTTP API
#[instrument(skip(config))]
async fn run_server(config: AppConfig) -> Result<()> {
    config.require_auth_service()?;
    let service = open_service(&config)?;
    let auth: Arc<dyn AuthProvider> = Arc::new(HostedAuthClient::new(
        config.service_url().clone(),
        config.anon_key().clone(),
    ));
    let app = create_router(AppState::new(service, auth));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Stacktris API listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Opens the auth store and checks its session with the auth service.
/// Returns the signed-in user, if the session is still valid.
async fn verified_user(config: &AppConfig) -> Result<Option<AuthUser>> {
    let mut store = AuthStore::open(config.auth_store_path())?;
    if store.session().is_none() {
        return Ok(None);
    }
    config.require_auth_service()?;
    let client = HostedAuthClient::new(config.service_url().clone(), config.anon_key().clone());
    Ok(store.verify(&client, Utc::now().timestamp()).await?)
}

/// Play a headless bot game
#[instrument(skip(config))]
async fn run_play(
    config: &AppConfig,
    seed: u64,
    max_pieces: u32,
    record: bool,
    show_board: bool,
) -> Result<()> {
    let bot = SimpleBot::new("bot");
    let game = play_game(&bot, GameConfig::default(), seed, max_pieces, 1_000)?;

    if show_board {
        for row in game.render_rows() {
            println!("{}", row);
        }
    }
    let stats = game.stats();
    println!(
        "status={} score={} level={} lines={} pieces={}",
        game.status(),
        stats.score(),
        stats.level(),
        stats.lines(),
        stats.tetrominoes()
    );

    if record {
        if !game.is_over() {
            warn!("Game did not finish; nothing recorded");
            println!("Game did not reach game over within {} pieces; not recorded", max_pieces);
            return Ok(());
        }
        let service = open_service(config)?;
        let user = verified_user(config).await?;
        let user_id = match user {
            Some(ref user) => Some(*service.get_or_create_profile(user, None)?.id()),
            None => None,
        };
        let session_id = user.as_ref().map(|_| format!("cli-{}", seed));
        let record = service.record_finished_game(&game, user_id, session_id)?;
        println!(
            "Recorded game {} ({})",
            record.id(),
            if *record.is_guest() { "guest" } else { "member" }
        );
    }
    Ok(())
}

/// Apply database migrations
fn run_migrate(config: &AppConfig) -> Result<()> {
    let repository = GameRepository::new(config.database_url().clone())?;
    let applied = repository.run_migrations()?;
    println!("Applied {} migration(s) to {}", applied, repository.db_path());
    Ok(())
}

/// Exchange a callback code and persist the session
#[instrument(skip(config, code))]
async fn run_login(config: &AppConfig, code: String) -> Result<()> {
    config.require_auth_service()?;
    let client = HostedAuthClient::new(config.service_url().clone(), config.anon_key().clone());
    let mut store = AuthStore::open(config.auth_store_path())?;

    store.set_loading(true);
    let outcome = resolve_callback(&client, Some(&code)).await;
    store.set_loading(false);

    if let Some(session) = outcome.session {
        store.set_session(Some(session))?;
    }
    match outcome.redirect {
        CallbackRedirect::SignedIn => println!("Signed in"),
        CallbackRedirect::EmailConfirmed => println!("Email confirmed; sign in to continue"),
        other => anyhow::bail!("Sign in failed: {}", other.location()),
    }
    Ok(())
}

/// Clear the stored session
fn run_logout(config: &AppConfig) -> Result<()> {
    let mut store = AuthStore::open(config.auth_store_path())?;
    store.sign_out()?;
    println!("Signed out");
    Ok(())
}

/// Show the signed-in user
async fn run_whoami(config: &AppConfig) -> Result<()> {
    match verified_user(config).await? {
        Some(user) => println!(
            "{} ({})",
            user.id(),
            user.email().as_deref().unwrap_or("no email")
        ),
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Print a leaderboard
fn run_ranking(config: &AppConfig, partition: &str) -> Result<()> {
    let partition: RankingPartition = partition
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown ranking partition: '{}'", partition))?;
    let service = open_service(config)?;

    let rows = service.get_rankings(partition)?;
    if rows.is_empty() {
        println!("No {} rankings yet", partition);
        return Ok(());
    }
    for row in rows {
        let name = service
            .get_profile(*row.user_id())
            .map(|p| p.username().clone())
            .unwrap_or_else(|_| format!("#{}", row.user_id()));
        println!(
            "{:>3}. {:<20} {:>8} ({} games)",
            row.rank(),
            name,
            row.best_score(),
            row.games_played()
        );
    }
    Ok(())
}
