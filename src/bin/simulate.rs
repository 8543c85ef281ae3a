//! Offline simulation: play many sessions with a fixed staking rule

use clap::Parser;
use coinflip_challenge::coin::RandomCoin;
use coinflip_challenge::config::GameConfig;
use coinflip_challenge::ledger::Ledger;
use coinflip_challenge::report::format_currency;
use coinflip_challenge::storage::MemoryStore;
use coinflip_challenge::types::Side;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "simulate")]
#[command(about = "Simulate CoinFlip Challenge sessions with a fixed-fraction stake")]
struct Args {
    /// Number of sessions to play
    #[arg(short, long, default_value = "1000")]
    sessions: u32,

    /// Fraction of the current balance staked each round
    #[arg(short, long, default_value = "0.1")]
    fraction: Decimal,

    /// Side to bet on every round
    #[arg(long, default_value = "heads")]
    side: Side,

    /// Base RNG seed; session i uses seed + i
    #[arg(long, default_value = "1")]
    seed: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if args.fraction <= Decimal::ZERO || args.fraction > Decimal::ONE {
        anyhow::bail!("fraction must be in (0, 1]");
    }
    if args.sessions == 0 {
        anyhow::bail!("need at least one session");
    }

    let rules = GameConfig::default();
    info!(
        "Simulating {} sessions, staking {} of balance on {}",
        args.sessions, args.fraction, args.side
    );

    let mut finals = Vec::with_capacity(args.sessions as usize);
    for i in 0..args.sessions {
        let store = MemoryStore::new();
        let ledger = Ledger::new(Arc::new(store.clone()), Arc::new(store), rules.clone())
            .with_coin(Arc::new(RandomCoin::seeded(
                rules.heads_probability,
                args.seed.wrapping_add(u64::from(i)),
            )));

        let player = format!("sim-{}@local", i);
        let mut session = ledger.start_session(&player).await?;
        while !session.is_over {
            let stake = (session.balance * args.fraction)
                .round_dp(2)
                .max(dec!(0.01))
                .min(session.balance);
            ledger.place_wager(&mut session, stake, args.side).await?;
        }
        finals.push(session.balance);
    }

    finals.sort();
    let n = Decimal::from(finals.len());
    let total: Decimal = finals.iter().sum();
    let busted = finals.iter().filter(|b| **b < rules.min_balance).count();
    let ahead = finals.iter().filter(|b| **b > rules.initial_balance).count();

    println!("\n🪙 Simulation results ({} sessions)\n", finals.len());
    println!("Mean final balance:   ${}", format_currency(total / n));
    println!("Median final balance: ${}", format_currency(finals[finals.len() / 2]));
    println!("Best final balance:   ${}", format_currency(finals[finals.len() - 1]));
    println!(
        "Busted:               {:.1}%",
        busted as f64 * 100.0 / finals.len() as f64
    );
    println!(
        "Ended ahead:          {:.1}%",
        ahead as f64 * 100.0 / finals.len() as f64
    );

    Ok(())
}
