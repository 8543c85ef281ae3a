//! CoinFlip Challenge
//!
//! Serve the game API, play in the terminal, or inspect a stored player.

use clap::{Parser, Subcommand};
use coinflip_challenge::{
    config::{Config, RegistryBackend},
    ledger::Ledger,
    report::{format_currency, SessionReport},
    server::{start_server, ApiState},
    storage::{Database, JsonlRegistry, PlayerRegistry, SessionStore},
    types::{PlayerSession, Side},
};
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coinflip")]
#[command(about = "CoinFlip Challenge: bet on a 60/40 coin for up to 100 rounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP game API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Play in the terminal
    Play {
        /// Player email
        email: String,
    },
    /// Show the stored state of a player
    Status {
        /// Player email
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { port } => serve(config, port).await,
        Commands::Play { email } => play(config, &email).await,
        Commands::Status { email } => show_status(config, &email).await,
    }
}

async fn open_ledger(config: &Config) -> anyhow::Result<Ledger> {
    let db = Arc::new(Database::connect(&config.database.path).await?);

    let registry: Arc<dyn PlayerRegistry> = match config.registry.backend {
        RegistryBackend::Database => db.clone(),
        RegistryBackend::Jsonl => Arc::new(JsonlRegistry::new(&config.registry.path)),
    };

    let ledger = Ledger::new(db.clone(), registry, config.game.clone())
        .with_round_log(db.clone())
        .with_store_timeout(config.database.timeout());

    Ok(ledger)
}

async fn serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let ledger = open_ledger(&config).await?;
    let state = Arc::new(ApiState::new(Arc::new(ledger)));
    let port = port.unwrap_or(config.server.port);

    start_server(state, &config.server.host, port)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))
}

fn print_session(session: &PlayerSession) {
    println!(
        "💰 Balance: ${}   🔄 Rounds left: {}",
        format_currency(session.balance),
        session.rounds_remaining()
    );
}

async fn play(config: Config, email: &str) -> anyhow::Result<()> {
    let ledger = open_ledger(&config).await?;
    let mut session = ledger.start_session(email).await?;

    println!("\n🪙 CoinFlip Challenge\n");
    println!(
        "Start with ${}, at most {} rounds. Heads {:.0}%, Tails {:.0}%.",
        format_currency(config.game.initial_balance),
        config.game.max_rounds,
        config.game.heads_probability * 100.0,
        (1.0 - config.game.heads_probability) * 100.0
    );
    println!("Commands: `h [amount]`, `t [amount]`, `q` to quit.\n");
    print_session(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while !session.is_over {
        print!("bet (default {})> ", session.suggested_wager());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            continue;
        };
        if cmd.eq_ignore_ascii_case("q") {
            break;
        }

        let side = match Side::from_str(cmd) {
            Ok(side) => side,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let amount = match parts.next() {
            Some(raw) => match Decimal::from_str(raw) {
                Ok(amount) => amount,
                Err(_) => {
                    println!("not an amount: {}", raw);
                    continue;
                }
            },
            None => session.suggested_wager(),
        };

        match ledger.place_wager(&mut session, amount, side).await {
            Ok(outcome) => {
                let verdict = if outcome.won { "won" } else { "lost" };
                println!(
                    "Flipped {} - you {} ${}",
                    outcome.outcome,
                    verdict,
                    format_currency(outcome.wager)
                );
                if !outcome.persisted {
                    println!("⚠️  Could not save this round yet, will retry.");
                }
                print_session(&session);
            }
            Err(e) if e.is_user_correctable() => println!("{}", e),
            Err(e) => return Err(e.into()),
        }
    }

    if session.dirty {
        if let Err(e) = ledger.flush(&mut session).await {
            tracing::warn!("Leaving with unsaved rounds: {}", e);
        }
    }

    if session.is_over {
        let report = SessionReport::from_session(&session);
        println!("\n🏁 Game over! Final balance: ${}", format_currency(report.final_balance));
        println!(
            "Peak ${}, low ${}, net {} over this sitting",
            format_currency(report.peak_balance),
            format_currency(report.lowest_balance),
            format_currency(report.net_change)
        );
    }

    Ok(())
}

async fn show_status(config: Config, email: &str) -> anyhow::Result<()> {
    let db = Database::connect(&config.database.path).await?;
    let email = email.trim();

    let Some(stored) = db.load(email).await? else {
        println!("No game found for {}", email);
        return Ok(());
    };

    println!("\n🪙 {}\n", email);
    println!("Balance:       ${}", format_currency(stored.balance));
    println!("Rounds played: {}", stored.rounds_played);
    println!("Over:          {}", stored.is_over);

    let status = match config.registry.backend {
        RegistryBackend::Database => db.player_status(email).await?,
        RegistryBackend::Jsonl => JsonlRegistry::new(&config.registry.path).status_of(email).await?,
    };
    if let Some(status) = status {
        println!("Registry:      {}", status);
    }

    let rounds = db.rounds_for(email).await?;
    if !rounds.is_empty() {
        println!("\n{:>5} {:>10} {:>6} {:>6} {:>12}", "Round", "Wager", "Bet", "Flip", "Balance");
        println!("{}", "-".repeat(45));
        for r in rounds {
            println!(
                "{:>5} {:>10} {:>6} {:>6} {:>12}",
                r.round,
                format_currency(r.wager),
                r.predicted,
                r.outcome,
                format_currency(r.balance_after)
            );
        }
    }

    Ok(())
}
