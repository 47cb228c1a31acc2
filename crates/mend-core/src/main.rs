use clap::{value_parser, Arg, ArgAction, Command};
use mend_core::{Coordinator, CoordinatorBuilder, MendConfig, Scheduler};
use mend_ledger::Ledger;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mend=info")),
        )
        .init();

    let cli = Command::new("mend")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Autonomous error-remediation loop")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Execute one remediation cycle")
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Classify and prioritize only, no remediation"),
                )
                .arg(
                    Arg::new("max-fixes")
                        .long("max-fixes")
                        .value_parser(value_parser!(usize))
                        .help("Override the per-cycle remediation cap"),
                ),
        )
        .subcommand(
            Command::new("monitor")
                .about("Run cycles on an interval until stopped")
                .arg(
                    Arg::new("interval-secs")
                        .long("interval-secs")
                        .value_parser(value_parser!(u64))
                        .help("Override the normal cycle interval"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Classify and prioritize only, no remediation"),
                )
                .arg(
                    Arg::new("max-fixes")
                        .long("max-fixes")
                        .value_parser(value_parser!(usize))
                        .help("Override the per-cycle remediation cap"),
                ),
        )
        .subcommand(Command::new("stats").about("Print aggregate ledger statistics"))
        .subcommand(
            Command::new("top")
                .about("Print best-performing patterns by success rate")
                .arg(count_arg()),
        )
        .subcommand(
            Command::new("worst")
                .about("Print worst-performing patterns by success rate")
                .arg(count_arg())
                .arg(
                    Arg::new("min-attempts")
                        .long("min-attempts")
                        .default_value("3")
                        .value_parser(value_parser!(u64))
                        .help("Exclude patterns with fewer attempts than this"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Print the most recent fix outcomes")
                .arg(count_arg()),
        )
        .subcommand(Command::new("clear").about("Delete all learned ledger state"));

    let matches = cli.get_matches();
    let mut config = MendConfig::from_env()?;

    match matches.subcommand() {
        Some(("run", args)) => {
            apply_run_flags(&mut config, args);
            let coordinator = build_coordinator(config)?;
            let report = coordinator.run_cycle().await?;
            println!(
                "cycle {}: detected {}, fixed {}, failed {}, skipped {} ({}ms)",
                report.cycle,
                report.errors_detected,
                report.errors_fixed,
                report.errors_failed,
                report.errors_skipped,
                report.duration_ms
            );
        }
        Some(("monitor", args)) => {
            apply_run_flags(&mut config, args);
            if let Some(secs) = args.get_one::<u64>("interval-secs") {
                config.interval = std::time::Duration::from_secs(*secs);
            }
            let interval = config.interval;
            let backoff = config.error_backoff;
            let coordinator = Arc::new(build_coordinator(config)?);
            Scheduler::new(coordinator, interval, backoff).run().await;
        }
        Some(("stats", _)) => {
            let ledger = open_ledger(&config)?;
            if ledger.is_empty() {
                println!("no data yet — run `mend run` first");
                return Ok(());
            }
            let summary = ledger.aggregate();
            println!("patterns tracked : {}", summary.patterns);
            println!("total attempts   : {}", summary.total_attempts);
            println!("total successes  : {}", summary.total_successes);
            println!("total failures   : {}", summary.total_failures);
            println!(
                "overall success  : {:.1}%",
                summary.overall_success_rate * 100.0
            );
        }
        Some(("top", args)) => {
            let ledger = open_ledger(&config)?;
            let count = *args.get_one::<usize>("count").unwrap_or(&10);
            let ranked = ledger.top_patterns(count);
            if ranked.is_empty() {
                println!("no data yet — run `mend run` first");
                return Ok(());
            }
            for (pattern, stats) in ranked {
                println!(
                    "{pattern}: {:.1}% over {} attempts (avg {:.0}ms)",
                    stats.success_rate() * 100.0,
                    stats.attempts,
                    stats.avg_duration_ms
                );
            }
        }
        Some(("worst", args)) => {
            let ledger = open_ledger(&config)?;
            let count = *args.get_one::<usize>("count").unwrap_or(&10);
            let min_attempts = *args.get_one::<u64>("min-attempts").unwrap_or(&3);
            let ranked = ledger.worst_patterns(count, min_attempts);
            if ranked.is_empty() {
                println!("no data yet (patterns need at least {min_attempts} attempts)");
                return Ok(());
            }
            for (pattern, stats) in ranked {
                println!(
                    "{pattern}: {:.1}% over {} attempts",
                    stats.success_rate() * 100.0,
                    stats.attempts
                );
            }
        }
        Some(("history", args)) => {
            let ledger = open_ledger(&config)?;
            let count = *args.get_one::<usize>("count").unwrap_or(&10);
            let recent = ledger.recent_history(count);
            if recent.is_empty() {
                println!("no data yet — run `mend run` first");
                return Ok(());
            }
            for outcome in recent {
                println!(
                    "{} {} {} ({}ms) — {}",
                    outcome.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    if outcome.success { "ok  " } else { "FAIL" },
                    outcome.pattern,
                    outcome.duration_ms,
                    outcome.fix_applied
                );
            }
        }
        Some(("clear", _)) => {
            let ledger = open_ledger(&config)?;
            ledger.clear()?;
            println!("ledger cleared");
        }
        _ => unreachable!("arg_required_else_help is set"),
    }

    Ok(())
}

fn count_arg() -> Arg {
    Arg::new("count")
        .long("count")
        .default_value("10")
        .value_parser(value_parser!(usize))
        .help("Number of entries to print")
}

fn apply_run_flags(config: &mut MendConfig, args: &clap::ArgMatches) {
    if args.get_flag("dry-run") {
        config.dry_run = true;
    }
    if let Some(max) = args.get_one::<usize>("max-fixes") {
        config.max_fixes = *max;
    }
}

fn build_coordinator(config: MendConfig) -> anyhow::Result<Coordinator> {
    Ok(CoordinatorBuilder::from_config(config)?.build())
}

fn open_ledger(config: &MendConfig) -> anyhow::Result<Ledger> {
    Ok(Ledger::open(&config.ledger_path)?)
}
