use std::{fs::File, sync::Arc};

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;

use cashbook::auth::{CurrentUser, Role, StaticAuth};
use cashbook::batch::BatchRunner;
use cashbook::clock::FixedClock;
use cashbook::engine::{LedgerConfig, LedgerEngine};
use cashbook::output;
use cashbook::parsing;

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    if let Some(log_level) = args.log_level {
        tracing_subscriber::fmt().with_max_level(log_level).init();
    }

    let file = File::open(&args.input_file)
        .with_context(|| format!("cannot open journal `{}`", args.input_file))?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let commands = parsing::deserialize_csv(&mut rdr);

    let config = LedgerConfig {
        currency: args.currency,
        max_conflict_retries: args.retries,
        ..LedgerConfig::default()
    };
    let mut engine = LedgerEngine::new(config);
    if let Some(today) = args.today {
        engine = engine.with_clock(Arc::new(FixedClock::new(today)));
    }

    let auth = StaticAuth(Some(CurrentUser {
        id: "batch".to_owned(),
        role: if args.staff { Role::Staff } else { Role::Admin },
    }));
    let summary = BatchRunner::new(&engine).run(&auth, commands)?;

    output::print_balances(&engine, std::io::stdout())?;

    if args.report {
        let today = engine.today();
        let report = engine.report(
            summary.first_date.unwrap_or(today),
            summary.last_date.unwrap_or(today),
        )?;
        output::print_report(&report, std::io::stdout())?;
    }
    Ok(())
}

#[derive(Parser)]
struct Arguments {
    /// CSV journal of ledger commands.
    input_file: String,
    log_level: Option<tracing::Level>,
    /// Also print the sale report for the journal's date range.
    #[arg(long)]
    report: bool,
    #[arg(long, default_value = "Tk")]
    currency: String,
    /// Attempts per command when a write conflicts.
    #[arg(long, default_value_t = 3)]
    retries: usize,
    /// Business day used for rows without a date.
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Run as a staff user, which may not modify the ledger.
    #[arg(long)]
    staff: bool,
}
