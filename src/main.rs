use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

use shotlist::config;
use shotlist::host::HostConfig;
use shotlist::index;
use shotlist::itinerary::{self, ConnectMode, IndexSpec, Itinerary};
use shotlist::output::OutputDir;
use shotlist::runner::{self, RunReport, StepOutcome};
use shotlist::surface::{CdpConnector, CdpTarget, Connector, MockConnector, ViewportSize, demo_app};

/// Shotlist - itinerary-driven UI screenshot capture
#[derive(Parser, Debug)]
#[command(
    name = "shotlist",
    version,
    about = "Capture documentation screenshots of a running UI over the Chrome DevTools Protocol",
    after_help = "ENVIRONMENT VARIABLES:\n\
        SHOTLIST_OUTPUT_DIR         Default output directory\n\
        SHOTLIST_DEBUG_PORT         Remote-debugging port\n\
        SHOTLIST_WARMUP_MS          Delay after spawning the host (ms)\n\
        SHOTLIST_READY_TIMEOUT_MS   Ready-marker timeout (ms)\n\
        SHOTLIST_VIEWPORT           Default viewport (compact, laptop, fullhd or WxH)\n\
        SHOTLIST_APP_URL            Web-preview URL\n\
        SHOTLIST_CHROME             Browser executable for --launch\n\
        SHOTLIST_LOG                Log filter"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// More log output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an itinerary file
    Run {
        /// Path to the itinerary JSON
        #[arg(short, long)]
        itinerary: PathBuf,

        #[command(flatten)]
        opts: RunOptions,
    },

    /// Run a built-in itinerary
    Tour {
        /// One of the names printed by `shotlist list`
        name: String,

        #[command(flatten)]
        opts: RunOptions,
    },

    /// List built-in itineraries
    List,

    /// Validate an itinerary file without connecting
    Check {
        #[arg(short, long)]
        itinerary: PathBuf,
    },

    /// Regenerate the markdown index from the files in a directory
    Index {
        #[arg(short, long)]
        output: PathBuf,

        /// Index title
        #[arg(long, default_value = "Screenshots")]
        title: String,

        /// Built-in itinerary whose sections and descriptions to use
        #[arg(long)]
        builtin: Option<String>,
    },

    /// Run a built-in itinerary against the scripted mock UI
    Mock {
        #[arg(default_value = "userguide-complete")]
        name: String,

        /// Output directory (default: a fresh directory under the temp dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct RunOptions {
    /// Output directory (default: the itinerary's, then SHOTLIST_OUTPUT_DIR)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Attach to a running host at this debug URL
    #[arg(long, conflicts_with_all = ["launch", "spawn"])]
    attach: Option<String>,

    /// Launch a browser at this URL
    #[arg(long, conflicts_with = "spawn")]
    launch: Option<String>,

    /// Spawn the host with this command line, then attach
    #[arg(long)]
    spawn: Option<String>,

    /// Remote-debugging port
    #[arg(long, env = "SHOTLIST_DEBUG_PORT")]
    port: Option<u16>,

    /// Delay after spawning the host (ms)
    #[arg(long, env = "SHOTLIST_WARMUP_MS")]
    warmup_ms: Option<u64>,

    /// Viewport: compact (1280x720), laptop (1440x900), fullhd (1920x1080), or WxH
    #[arg(long)]
    viewport: Option<String>,

    /// Browser executable for launch mode
    #[arg(long, env = "SHOTLIST_CHROME")]
    chrome: Option<PathBuf>,

    /// Show the launched browser window
    #[arg(long)]
    headful: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    shotlist::logging::init(args.verbose);

    match args.command {
        Some(Commands::Run { itinerary, opts }) => {
            let itinerary = Itinerary::from_file(&itinerary)
                .with_context(|| format!("loading {}", itinerary.display()))?;
            execute(itinerary, opts).await?;
        }

        Some(Commands::Tour { name, opts }) => {
            execute(itinerary::builtin(&name)?, opts).await?;
        }

        Some(Commands::List) => {
            for it in itinerary::builtin::all() {
                let (w, h) = it.viewport.unwrap_or_default().dimensions();
                println!(
                    "{:<20} {:>2} captures  {}x{}  {}",
                    it.name,
                    it.capture_files().len(),
                    w,
                    h,
                    it.description
                );
            }
        }

        Some(Commands::Check { itinerary }) => {
            let it = Itinerary::from_file(&itinerary)
                .with_context(|| format!("checking {}", itinerary.display()))?;
            println!(
                "{}: {} steps, {} captures, ok",
                it.name,
                it.steps.len(),
                it.capture_files().len()
            );
        }

        Some(Commands::Index {
            output,
            title,
            builtin,
        }) => {
            let known = builtin.as_deref().map(itinerary::builtin).transpose()?;
            let spec = known
                .as_ref()
                .and_then(|it| it.index.clone())
                .unwrap_or_else(|| IndexSpec {
                    file: "README.md".into(),
                    title,
                    sections: Vec::new(),
                });
            let out = OutputDir::new(output);
            let path = index::regenerate(&out, &spec, known.as_ref())?;
            println!("Index written: {}", path.display());
        }

        Some(Commands::Mock { name, output, json }) => {
            let itinerary = itinerary::builtin(&name)?.without_delays();
            let out = match output {
                Some(dir) => OutputDir::new(dir),
                None => OutputDir::scratch(&name),
            };
            let connector = MockConnector::new(demo_app());
            let report = run_reported(&itinerary, &connector, None, &out).await?;
            print_report(&report, json)?;
        }

        None => {
            println!("Shotlist - itinerary-driven UI screenshot capture");
            println!();
            println!("Usage: shotlist <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run    Run an itinerary file");
            println!("  tour   Run a built-in itinerary");
            println!("  list   List built-in itineraries");
            println!("  check  Validate an itinerary file");
            println!("  index  Regenerate the markdown index");
            println!("  mock   Dry run against the scripted mock UI");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// Resolve connection and host from options and itinerary, then run
async fn execute(mut itinerary: Itinerary, opts: RunOptions) -> Result<()> {
    if let Some(raw) = &opts.viewport {
        let size = ViewportSize::parse(raw).with_context(|| {
            format!("invalid viewport '{}', use compact, laptop, fullhd or WxH", raw)
        })?;
        itinerary.viewport = Some(size);
    }

    let out = OutputDir::new(
        opts.output
            .clone()
            .or_else(|| itinerary.output_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(config::output_dir())),
    );
    let port = opts.port.unwrap_or_else(config::debug_port);
    let window = itinerary.viewport.unwrap_or(config::get().defaults.viewport);

    let launch = |url: String| CdpTarget::Launch {
        url,
        executable: opts.chrome.clone().or_else(|| config::get().web.chrome.clone()),
        headless: !opts.headful,
    };

    let (target, host) = if let Some(url) = &opts.launch {
        (launch(url.clone()), None)
    } else if let Some(url) = &opts.attach {
        (CdpTarget::Attach { debug_url: url.clone() }, None)
    } else if let Some(command) = &opts.spawn {
        let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        let Some(host) = HostConfig::from_command(&parts) else {
            bail!("--spawn needs a command");
        };
        (CdpTarget::local(port), Some(host))
    } else {
        match itinerary.mode {
            ConnectMode::Attach => (CdpTarget::local(port), None),
            ConnectMode::Web => (launch(config::get().web.app_url.clone()), None),
            ConnectMode::Spawn => {
                let Some(spec) = &itinerary.host else {
                    bail!(
                        "itinerary '{}' spawns a host but names none; use --spawn",
                        itinerary.name
                    );
                };
                (CdpTarget::local(port), Some(HostConfig::from_spec(spec)))
            }
        }
    };

    let host = host.map(|h| {
        let h = h.port(port);
        match opts.warmup_ms {
            Some(ms) => h.warmup(Duration::from_millis(ms)),
            None => h,
        }
    });

    let connector = CdpConnector::new(target).window(window);
    let report = run_reported(&itinerary, &connector, host.as_ref(), &out).await?;
    print_report(&report, opts.json)
}

async fn run_reported(
    itinerary: &Itinerary,
    connector: &dyn Connector,
    host: Option<&HostConfig>,
    out: &OutputDir,
) -> Result<RunReport> {
    match runner::run(itinerary, connector, host, out).await {
        Ok(report) => Ok(report),
        Err(e) => {
            error!("Run '{}' aborted: {}", itinerary.name, e);
            Err(e).with_context(|| format!("run '{}' via {}", itinerary.name, connector.describe()))
        }
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Run '{}' completed: {} captured, {} skipped, {} failed",
        report.itinerary,
        report.captured(),
        report.skipped(),
        report.failed()
    );
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Captured { path, .. } => {
                println!("  [{:>2}] {}: {}", step.index, step.label, path.display())
            }
            StepOutcome::Performed => {}
            StepOutcome::Skipped { reason } => {
                println!("  [{:>2}] {}: skipped ({})", step.index, step.label, reason)
            }
            StepOutcome::Failed { error } => {
                println!("  [{:>2}] {}: FAILED ({})", step.index, step.label, error)
            }
        }
    }
    println!("\nOutput: {}", report.output_dir.display());
    Ok(())
}
