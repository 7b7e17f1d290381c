use timebank::{output, replay, AccountId, Config, Marketplace};

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;

/// Replays a time-banking event log, and prints every account's balance as CSV.
#[derive(Parser, Debug)]
#[command(name = "timebank", version, about)]
struct Cli {
    /// CSV event log: type,at,actor,booking,provider,service,date,hours,credits,text
    input: PathBuf,

    /// Also write a summary of every booking to this file.
    #[arg(long)]
    bookings: Option<PathBuf>,

    /// Account acting with the admin (mediator) role. Repeatable.
    #[arg(long = "admin")]
    admins: Vec<AccountId>,

    /// Retries after losing a race on a booking, before giving up.
    #[arg(long, default_value_t = 3)]
    max_conflict_retries: u32,

    /// Leave disputed bookings for a mediator to pick up, instead of
    /// escalating them to mediation straight away.
    #[arg(long)]
    no_auto_escalate: bool,

    /// Refuse completion reports proposing more than this many times the
    /// service's nominal credits.
    #[arg(long)]
    credit_ceiling_factor: Option<u64>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            max_conflict_retries: self.max_conflict_retries,
            auto_escalate: !self.no_auto_escalate,
            credit_ceiling_factor: self.credit_ceiling_factor,
            admins: self.admins.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr: stdout is for the balances.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let market = replay::run(input, std::io::stdout(), Marketplace::new(cli.config()))?;

    if let Some(path) = &cli.bookings {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        output::write_bookings(file, &market.bookings())?;
    }

    Ok(())
}
