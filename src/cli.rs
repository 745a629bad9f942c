// src/cli.rs
use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{consts::*, CalendarContext, Location, RunRequest, SolarCalendar, TargetRange},
    core::HttpFetcher,
    pipeline::{self, CancelToken, RunReport, RunStatus},
    progress::Progress,
    store,
    target::{enumerate, Target, YearMonth},
};

#[derive(Parser, Debug)]
#[command(name = "drik_fetch", version, about = "Fetch drikpanchang.com calendar pages, resumably")]
pub struct Cli {
    /// -v for info, -vv for debug (RUST_LOG overrides)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download missing pages for the selection
    Fetch(FetchArgs),
    /// Show what is on disk for the selection, without touching the network
    Status(Selection),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CalendarArg {
    Lunisolar,
    Tamil,
    Bengali,
    Odia,
    Malayalam,
    /// Every solar calendar, one after another
    All,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LocationArg {
    Delhi,
    Nyc,
}

#[derive(Args, Debug)]
struct Selection {
    #[arg(long, value_enum, default_value_t = CalendarArg::Lunisolar, env = "DRIK_FETCH_CALENDAR")]
    calendar: CalendarArg,

    /// Location cookie for the lunisolar panchang
    #[arg(long, value_enum, default_value_t = LocationArg::Delhi, env = "DRIK_FETCH_LOCATION")]
    location: LocationArg,

    #[arg(long, default_value_t = DEFAULT_START_YEAR)]
    start_year: i32,

    #[arg(long, default_value_t = DEFAULT_END_YEAR)]
    end_year: i32,

    /// First month (YYYY-MM); overrides the year range
    #[arg(long, value_name = "YYYY-MM", requires = "to")]
    from: Option<String>,

    /// Last month (YYYY-MM), inclusive
    #[arg(long, value_name = "YYYY-MM", requires = "from")]
    to: Option<String>,

    /// Fetch these day pages instead of month pages
    #[arg(long, num_args = 1.., value_name = "YYYY-MM-DD", conflicts_with_all = ["from", "to"])]
    days: Vec<String>,

    /// Output root; each calendar gets its own subdirectory
    #[arg(short, long, default_value = DEFAULT_OUT_DIR, env = "DRIK_FETCH_OUT")]
    out: PathBuf,

    /// Bodies (and files on disk) below this many bytes count as blocked/truncated
    #[arg(long, default_value_t = MIN_VALID_SIZE, env = "DRIK_FETCH_MIN_SIZE")]
    min_size: usize,
}

#[derive(Args, Debug)]
struct FetchArgs {
    #[command(flatten)]
    selection: Selection,

    /// Seconds between requests
    #[arg(long, default_value_t = DEFAULT_DELAY_SECS, env = "DRIK_FETCH_DELAY")]
    delay: f64,

    /// Requests per identity before rotating (0 = only rotate on blocks)
    #[arg(long, default_value_t = ROTATE_EVERY, env = "DRIK_FETCH_ROTATE_EVERY")]
    rotate_every: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    timeout: u64,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fetch(args) => fetch(args),
        Command::Status(sel) => status(&sel),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("drik_fetch={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/* ---------------- Selection → requests ---------------- */

impl Selection {
    fn contexts(&self) -> Vec<CalendarContext> {
        let location = match self.location {
            LocationArg::Delhi => Location::Delhi,
            LocationArg::Nyc => Location::Nyc,
        };
        match self.calendar {
            CalendarArg::Lunisolar => vec![CalendarContext::Lunisolar { location }],
            CalendarArg::Tamil => vec![CalendarContext::Solar(SolarCalendar::Tamil)],
            CalendarArg::Bengali => vec![CalendarContext::Solar(SolarCalendar::Bengali)],
            CalendarArg::Odia => vec![CalendarContext::Solar(SolarCalendar::Odia)],
            CalendarArg::Malayalam => vec![CalendarContext::Solar(SolarCalendar::Malayalam)],
            CalendarArg::All => SolarCalendar::ALL.iter().copied().map(CalendarContext::Solar).collect(),
        }
    }

    fn range(&self) -> Result<TargetRange> {
        if !self.days.is_empty() {
            return Ok(TargetRange::Dates(self.days.clone()));
        }
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Ok(TargetRange::Months {
                start: from.parse::<YearMonth>()?,
                end: to.parse::<YearMonth>()?,
            }),
            _ => Ok(TargetRange::Years { start: self.start_year, end: self.end_year }),
        }
    }

    fn requests(&self) -> Result<Vec<RunRequest>> {
        let range = self.range()?;
        Ok(self
            .contexts()
            .into_iter()
            .map(|ctx| {
                let mut req = RunRequest::new(ctx, range.clone());
                req.out_root = self.out.clone();
                req.min_valid_size = self.min_size;
                req
            })
            .collect())
    }
}

/* ---------------- fetch ---------------- */

fn fetch(args: FetchArgs) -> Result<()> {
    let delay = Duration::try_from_secs_f64(args.delay)
        .map_err(|_| eyre!("--delay must be a non-negative number of seconds"))?;

    let mut requests = args.selection.requests()?;
    for req in &mut requests {
        req.delay = delay;
        req.rotate_every = args.rotate_every;
        req.timeout = Duration::from_secs(args.timeout);
    }

    let cancel = CancelToken::new();
    watch_signals(cancel.clone()).wrap_err("installing signal handlers")?;

    let mut fetcher = HttpFetcher::new();
    let multi = requests.len() > 1;

    for req in &requests {
        if multi {
            println!("\n{}", "=".repeat(50));
            println!("Calendar: {}", req.context);
            println!("URL base: {}", req.context.month_url());
            println!("{}", "=".repeat(50));
        }

        let mut progress = ConsolePrinter { delay };
        let report = pipeline::run(req, &mut fetcher, &cancel, Some(&mut progress))?;

        match report.status {
            RunStatus::Cancelled => break,
            RunStatus::Blocked { artifact } => bail!(
                "still blocked after identity rotation at {artifact}; \
                 {} {}s left, try again later with a longer --delay",
                report.total - report.already_present - report.downloaded,
                req.label,
            ),
            RunStatus::Aborted { artifact } => bail!("aborted while writing {artifact}"),
            RunStatus::UpToDate | RunStatus::Completed => {}
        }
        if cancel.is_cancelled() {
            break;
        }
    }
    Ok(())
}

/// Ctrl-C, and SIGTERM on unix.
struct ShutdownSignals {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Must be called inside a runtime with the signal driver enabled.
    fn new() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            term: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            tokio::select! {
                r = tokio::signal::ctrl_c() => r,
                _ = self.term.recv() => Ok(()),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await
        }
    }
}

/// Flip `cancel` on the first shutdown signal; exit hard on the second.
fn watch_signals(cancel: CancelToken) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let mut signals = {
        let _guard = rt.enter();
        ShutdownSignals::new()?
    };
    thread::Builder::new().name("signals".into()).spawn(move || {
        rt.block_on(async {
            if signals.recv().await.is_err() {
                return;
            }
            eprintln!("\nShutdown requested, finishing current download...");
            cancel.cancel();
            if signals.recv().await.is_ok() {
                std::process::exit(130);
            }
        });
    })?;
    Ok(())
}

struct ConsolePrinter {
    delay: Duration,
}

impl Progress for ConsolePrinter {
    fn begin(&mut self, label: &str, total: usize, present: usize, eta: Duration) {
        let remaining = total - present;
        println!("Total {label}s: {total}, already downloaded: {present}, remaining: {remaining}");
        if remaining == 0 {
            println!("All {label}s already downloaded.");
        } else {
            println!(
                "Estimated time: {:.1} hours at {}s delay\n",
                eta.as_secs_f64() / 3600.0,
                self.delay.as_secs_f64()
            );
        }
    }

    fn log(&mut self, msg: &str) {
        println!("\n{msg}");
    }

    fn fetching(&mut self, ordinal: usize, total: usize, target: &Target, remaining: usize, eta: Duration) {
        print!(
            "[{ordinal}/{total}] Fetching {} ... (remaining: {remaining}, ETA: {:.0}m)",
            target.filename,
            eta.as_secs_f64() / 60.0
        );
        let _ = io::stdout().flush();
    }

    fn item_done(&mut self, _target: &Target, bytes: u64, retried: bool) {
        let kb = bytes as f64 / 1024.0;
        if retried {
            println!("  Retry OK ({kb:.0} KB)");
        } else {
            println!("  OK ({kb:.0} KB)");
        }
    }

    fn item_failed(&mut self, _target: &Target, reason: &str) {
        println!("  ERROR: {reason}");
    }

    fn finish(&mut self, report: &RunReport) {
        match &report.status {
            RunStatus::UpToDate => return,
            RunStatus::Cancelled => {
                println!("\nShutdown: downloaded {}, failed {}", report.downloaded, report.failed)
            }
            RunStatus::Blocked { .. } => println!("\nStill blocked after identity rotation. Stopping."),
            RunStatus::Aborted { artifact } => println!("\nCould not write {artifact}. Stopping."),
            RunStatus::Completed => {}
        }
        println!(
            "\nDone: downloaded {}, failed {}, total existing {}",
            report.downloaded,
            report.failed,
            report.already_present + report.downloaded
        );
    }
}

/* ---------------- status ---------------- */

fn status(sel: &Selection) -> Result<()> {
    for req in sel.requests()? {
        let targets = enumerate(&req.range, &req.context)?;
        let ledger = store::scan(&req.artifact_dir(), targets, req.min_valid_size);
        let missing = ledger.pending.len() - ledger.truncated;
        println!(
            "{}: total {}, present {}, truncated {}, missing {}",
            req.label, ledger.total, ledger.present, ledger.truncated, missing
        );
        if let Some(first) = ledger.pending.first() {
            println!("  next: {}", first.filename);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("drik_fetch").chain(args.iter().copied())).unwrap()
    }

    fn selection(cli: Cli) -> Selection {
        match cli.command {
            Command::Fetch(a) => a.selection,
            Command::Status(s) => s,
        }
    }

    #[test]
    fn all_expands_to_solar_calendars() {
        let sel = selection(parse(&["status", "--calendar", "all"]));
        let slugs: Vec<_> = sel.contexts().iter().map(|c| c.slug()).collect();
        assert_eq!(slugs, ["tamil", "bengali", "odia", "malayalam"]);
    }

    #[test]
    fn month_span_overrides_years() {
        let sel = selection(parse(&["fetch", "--from", "2024-01", "--to", "2024-03"]));
        let req = &sel.requests().unwrap()[0];
        assert_eq!(
            req.range,
            TargetRange::Months {
                start: YearMonth::new(2024, 1).unwrap(),
                end: YearMonth::new(2024, 3).unwrap(),
            }
        );
        assert_eq!(req.context.slug(), "lunisolar");
    }

    #[test]
    fn days_with_location() {
        let sel = selection(parse(&["fetch", "--location", "nyc", "--days", "2025-01-01", "2025-01-15"]));
        let req = &sel.requests().unwrap()[0];
        assert_eq!(req.artifact_dir(), PathBuf::from(DEFAULT_OUT_DIR).join("lunisolar_nyc"));
        assert_eq!(req.range, TargetRange::Dates(vec!["2025-01-01".into(), "2025-01-15".into()]));
    }

    #[cfg(unix)]
    #[test]
    fn sigterm_is_a_shutdown_signal() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let mut signals = {
            let _guard = rt.enter();
            ShutdownSignals::new().unwrap()
        };
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
        rt.block_on(signals.recv()).unwrap();
    }

    #[test]
    fn from_requires_to() {
        let r = Cli::try_parse_from(["drik_fetch", "fetch", "--from", "2024-01"]);
        assert!(r.is_err());
    }
}
