use anyhow::Result;
use chrono::Local;
use clap::{ArgGroup, CommandFactory, Parser};
use scotcases::{
    cache::{Cache, Discard, Quarantine, RecycleBin},
    commands::{self, Mode, INTRO},
    config::Config,
    fetch,
    query::QueryEngine,
    table::{self, SheetLayout},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// ---- Scottish Covid Case Checker ----
/// Analyses Scottish Covid-19 case numbers and returns specific case numbers.
#[derive(Parser, Debug)]
#[command(name = "scotcases", version, verbatim_doc_comment)]
#[command(group(ArgGroup::new("mode").args(["new", "scotland", "area", "cases", "total", "healthboards"])))]
struct Args {
    /// Returns today's newest case numbers for each health board
    #[arg(short, long)]
    new: bool,

    /// Returns the Scottish total amount of cases
    #[arg(short, long)]
    scotland: bool,

    /// Takes a health board name, returns that health board's total cases
    #[arg(short, long, num_args = 1.., value_name = "HEALTHBOARD")]
    area: Option<Vec<String>>,

    /// Takes a number of days and a health board or `all`, returns the case numbers over that period
    #[arg(short, long, num_args = 1.., value_names = ["DAYS", "HEALTHBOARD"])]
    cases: Option<Vec<String>>,

    /// Returns all health boards' total case numbers
    #[arg(short, long)]
    total: bool,

    /// Returns all health boards available
    #[arg(short = 'b', long)]
    healthboards: bool,

    /// YAML file overriding the built-in settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the cached workbook
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Download from the URL the publisher uses for today's date instead of
    /// the link found on the page
    #[arg(long)]
    dated_url: bool,
}

impl Args {
    fn mode(&self) -> Option<Mode> {
        if self.new {
            Some(Mode::New)
        } else if self.scotland {
            Some(Mode::Scotland)
        } else if let Some(area) = &self.area {
            Some(Mode::Area(area.clone()))
        } else if let Some(cases) = &self.cases {
            let (days, target) = cases.split_first()?;
            Some(Mode::Cases {
                days: days.clone(),
                target: target.to_vec(),
            })
        } else if self.total {
            Some(Mode::Total)
        } else if self.healthboards {
            Some(Mode::HealthBoards)
        } else {
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,scotcases=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let Some(mode) = args.mode() else {
        Args::command().print_help()?;
        return Ok(());
    };
    println!("{INTRO}");

    // ─── 2) configuration ────────────────────────────────────────────
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.cache_dir {
        cfg.cache_dir = dir;
    }

    // ─── 3) resolve & cache the current workbook ─────────────────────
    let client = fetch::client(&cfg)?;
    let resolved = fetch::links::resolve_latest(&client, &cfg).await?;
    let source = if args.dated_url {
        let url = fetch::links::dated_file_url(Local::now().date_naive())?;
        info!(%url, "using dated download URL");
        url
    } else {
        resolved.remote_url.clone()
    };
    let discard: Box<dyn Discard> = match &cfg.trash_dir {
        Some(dir) => Box::new(Quarantine::new(dir).with_retention(cfg.trash_retain)),
        None => Box::new(RecycleBin),
    };
    let cache = Cache::open(&cfg.cache_dir, discard)?;
    let cached = cache.ensure(&client, &resolved, &source).await?;
    info!(
        path = %cached.path.display(),
        downloaded = cached.downloaded,
        discarded = cached.discarded,
        "workbook ready"
    );

    // ─── 4) load & answer ────────────────────────────────────────────
    let table = table::load(&cached.path, &cfg.worksheet_title, &SheetLayout::default())?;
    let engine = QueryEngine::new(&table, cfg.delta_floor);
    match engine.latest_date() {
        Some(date) => info!(%date, "newest report"),
        None => warn!("newest row has no readable date"),
    }

    print!("{}", commands::run(&mode, &engine)?);
    Ok(())
}
