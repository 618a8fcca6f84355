//! Sessionward - command-line driver for the session layer.
//!
//! Each invocation runs one command against the configured backend, then
//! carries out whatever notifications and redirects the request pipeline
//! emitted along the way.

use std::io::{self, Write};

use anyhow::{bail, Result};
use sessionward_core::api::Effect;
use sessionward_core::auth::CredentialStatus;
use sessionward_core::{Config, SessionContext, Severity};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// Constants
// ============================================================================

const USAGE: &str = "\
Usage: sessionward <command>

Commands:
  status             Show the stored session and its state
  login [username]   Log in and store the session
  register [username]
                     Create an account
  logout             Forget the stored session
  profile            Fetch the profile of the logged-in user
  navigate <path>    Navigate to a route, following redirects
  routes             List the route table";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=sessionward_core=debug).
/// The returned guard must be held until exit so buffered lines are flushed.
fn init_tracing() -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };
    if command == "--help" || command == "-h" {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    info!(base_url = %config.base_url, command = %command, "Sessionward starting");
    let (ctx, mut effects) = SessionContext::init(config)?;

    let result = run(&ctx, command, &args[1..]).await;
    drain_effects(&ctx, &mut effects);
    result
}

async fn run(ctx: &SessionContext, command: &str, args: &[String]) -> Result<()> {
    match command {
        "status" => status(ctx),
        "login" => login(ctx, args.first().cloned()).await,
        "register" => register(ctx, args.first().cloned()).await,
        "logout" => {
            ctx.api.logout();
            println!("Logged out");
            Ok(())
        }
        "profile" => profile(ctx).await,
        "navigate" => {
            let Some(path) = args.first() else {
                bail!("navigate needs a path");
            };
            let nav = ctx.navigator.navigate(path)?;
            if nav.was_redirected() {
                println!("{} -> {}", nav.requested, nav.redirects.join(" -> "));
            } else {
                println!("{}", nav.committed);
            }
            Ok(())
        }
        "routes" => {
            let table = ctx.navigator.table();
            for route in table.routes() {
                let access = if route.requires_auth { "protected" } else { "public" };
                match &route.redirect {
                    Some(target) => println!("{:<20} {:<10} -> {}", route.path, access, target),
                    None => println!("{:<20} {}", route.path, access),
                }
            }
            println!("fallback: {}", table.fallback());
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

fn status(ctx: &SessionContext) -> Result<()> {
    let record = ctx.store.read();
    let state = match record.status() {
        CredentialStatus::Absent => "not logged in",
        CredentialStatus::Valid => "valid",
        CredentialStatus::Expired => "expired",
        CredentialStatus::Malformed => "malformed",
    };

    println!("backend:  {}", ctx.config.base_url);
    println!("session:  {}", state);
    if !record.is_empty() {
        println!("user:     {} (id {})", record.display_name, record.subject_id);
    }
    Ok(())
}

async fn login(ctx: &SessionContext, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| ctx.config.last_username.clone()) {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let record = ctx.api.login(&username, &password).await?;
    println!("Logged in as {}", record.display_name);

    // Remember who logged in last so the next login can skip the prompt
    let mut config = ctx.config.clone();
    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

async fn register(ctx: &SessionContext, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    ctx.api.register(&username, &password).await?;
    println!("Registered {}, you can now log in", username);
    Ok(())
}

async fn profile(ctx: &SessionContext) -> Result<()> {
    let record = ctx.store.read();
    if !record.status().is_valid() {
        bail!("Not logged in");
    }

    let profile = ctx.api.fetch_profile(&record.subject_id).await?;
    println!("{} (id {})", profile.username, profile.id);
    println!(
        "games: {} total, {} won, {} lost, {} drawn",
        profile.game_total_counts,
        profile.game_success_counts,
        profile.game_fail_counts,
        profile.game_dead_heat_counts
    );
    println!(
        "       {} against people, {} against AI",
        profile.game_person_counts, profile.game_ai_counts
    );
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

/// Carry out every effect the command left behind
fn drain_effects(ctx: &SessionContext, effects: &mut mpsc::UnboundedReceiver<Effect>) {
    while let Ok(effect) = effects.try_recv() {
        let result = ctx.apply(effect, |message, severity| {
            let label = match severity {
                Severity::Info => "info",
                Severity::Success => "ok",
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            eprintln!("[{}] {}", label, message);
        });
        match result {
            Ok(Some(nav)) => eprintln!("Redirected to {}", nav.committed),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Redirect failed"),
        }
    }
}
