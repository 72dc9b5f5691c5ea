use anyhow::{Result, bail};
use clap::Parser;
use credit_timeline::query::DEFAULT_PAGE_SIZE;
use credit_timeline::{
    CustomerFilter, DEFAULT_MAX_BUCKETS, Dashboard, DashboardConfig, JsonFileSource, LoadState,
    Trigger,
};
use log::{debug, info};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

mod command;
mod render;

use command::Command;
use render::RenderOptions;

/// Render per-customer credit utilization history.
#[derive(Parser, Debug)]
#[command(name = "credit-timeline", version, about)]
struct Args {
    /// JSON customer listing: an array of customers or a `{ "data": [...] }` page
    #[arg(long, env = "CREDIT_TIMELINE_DATA")]
    data: PathBuf,

    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, env = "CREDIT_TIMELINE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Upper bound on utilization strip cells per customer
    #[arg(long, env = "CREDIT_TIMELINE_MAX_BUCKETS", default_value_t = DEFAULT_MAX_BUCKETS)]
    max_buckets: usize,

    #[arg(long)]
    min_transactions: Option<u32>,

    #[arg(long)]
    min_days_window: Option<i64>,

    #[arg(long)]
    min_total_spend: Option<f64>,

    /// Width of the balance sparkline
    #[arg(long, default_value_t = 60)]
    width: usize,

    #[arg(long)]
    no_color: bool,

    /// Print the tooltip of every bucket
    #[arg(long)]
    tooltips: bool,

    /// Read navigation and filter commands from stdin
    #[arg(short, long)]
    interactive: bool,
}

impl Args {
    fn filter(&self) -> CustomerFilter {
        CustomerFilter {
            min_transactions: self.min_transactions,
            min_days_window: self.min_days_window,
            min_total_spend: self.min_total_spend,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = DashboardConfig {
        page_size: args.page_size,
        max_buckets: args.max_buckets,
    }
    .validated()?;
    let options = RenderOptions {
        width: args.width.max(1),
        color: !args.no_color,
        tooltips: args.tooltips,
    };

    let source = JsonFileSource::new(&args.data);
    info!("Reading customers from {}", source.path().display());

    let mut dashboard = Dashboard::new(source, config, args.filter());
    dashboard.dispatch(Trigger::GoToPage(args.page));

    if !args.interactive {
        dashboard.settle().await;
        print!("{}", render::render_page(dashboard.state(), &options));
        if let LoadState::Failed(message) = dashboard.state().load() {
            bail!("{message}");
        }
        return Ok(());
    }

    run_interactive(dashboard, &options).await
}

async fn run_interactive(
    mut dashboard: Dashboard<JsonFileSource>,
    options: &RenderOptions,
) -> Result<()> {
    println!("{}", command::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("Exiting...");
                break;
            }
            _ = dashboard.settle(), if dashboard.is_loading() => {
                print!("{}", render::render_page(dashboard.state(), options));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };

                match command::parse(&line, dashboard.state().filter()) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(Command::Help)) => println!("{}", command::HELP),
                    Ok(Some(Command::Trigger(trigger))) => {
                        if dashboard.dispatch(trigger) {
                            print!("{}", render::render_page(dashboard.state(), options));
                        } else {
                            println!("{}", dashboard.state().pager_label());
                        }
                    }
                    Err(err) => println!("{err:#}"),
                }
            }
        }
    }

    info!("Shutting down");
    Ok(())
}
