use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use wy_core::{AnalysisClient, ResultRenderer, StaticPage};
use wy_panel::{AssetContext, CycleOutcome, PanelConfig, PanelSession, SyncCycle};
use wy_preview::{PreviewFetcher, PreviewResolver};
use wy_worker::{WorkerCommand, WorkerEngine};

fn cli() -> Command {
    let page_arg = Arg::new("page")
        .long("page")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON description of the edit page");

    Command::new("wy-panel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Content-quality panel synchronization")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Panel config file (TOML)"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Print the preview endpoint of a page")
                .arg(page_arg.clone()),
        )
        .subcommand(
            Command::new("analyze")
                .about("Run one sync cycle and print the rendered regions")
                .arg(page_arg)
                .arg(
                    Arg::new("worker")
                        .long("worker")
                        .required(true)
                        .help("Analysis worker program"),
                )
                .arg(
                    Arg::new("worker-arg")
                        .long("worker-arg")
                        .action(ArgAction::Append)
                        .allow_hyphen_values(true)
                        .help("Argument passed to the worker (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("asset-path")
                .about("Print versioned asset paths")
                .arg(
                    Arg::new("asset-version")
                        .long("asset-version")
                        .default_value("")
                        .help("Package version; empty for unversioned assets"),
                )
                .arg(
                    Arg::new("static-url")
                        .long("static-url")
                        .default_value("/static/")
                        .help("Static files URL prefix"),
                ),
        )
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<PanelConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Ok(PanelConfig::load(path)?),
        None => Ok(PanelConfig::default().with_env_overrides()),
    }
}

fn load_page(args: &ArgMatches) -> Result<StaticPage> {
    let path = args
        .get_one::<PathBuf>("page")
        .context("--page is required")?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading page description {}", path.display()))?;
    Ok(StaticPage::from_json(&raw)?)
}

fn resolve(config: &PanelConfig, args: &ArgMatches) -> Result<()> {
    let page = load_page(args)?;
    let endpoint = PreviewResolver::new(config.form_id.clone()).resolve(&page)?;
    println!("{endpoint}");
    Ok(())
}

async fn analyze(config: &PanelConfig, args: &ArgMatches) -> Result<()> {
    let page = Arc::new(load_page(args)?);
    let program = args
        .get_one::<String>("worker")
        .context("--worker is required")?;
    let command = args
        .get_many::<String>("worker-arg")
        .into_iter()
        .flatten()
        .fold(WorkerCommand::new(program.clone()), |cmd, arg| cmd.with_arg(arg.clone()));

    let engine = WorkerEngine::spawn(&command)?;
    let client = Arc::new(AnalysisClient::new(Arc::new(engine)));
    client
        .initialize(config.engine_config())
        .await
        .context("initializing analysis worker")?;

    let session = PanelSession::locate(page.as_ref(), config)?;
    let cycle = SyncCycle::new(
        page.clone(),
        page.clone(),
        Arc::new(PreviewFetcher::new(config.fetcher_settings())?),
        client,
        ResultRenderer::new(config.regions.clone()),
        Arc::new(session),
    );

    match cycle.run().await? {
        CycleOutcome::Rendered(stats) => {
            tracing::info!(
                passing = stats.passing,
                failing = stats.failing,
                skipped = stats.skipped,
                "rendered"
            );
        }
        CycleOutcome::Superseded => bail!("cycle superseded"),
    }

    for region in [&config.regions.readability, &config.regions.discoverability] {
        let html = page.region_html(region).unwrap_or_default();
        println!("{region}: {html}");
    }
    Ok(())
}

fn asset_path(config: &PanelConfig, args: &ArgMatches) -> Result<()> {
    let version = args
        .get_one::<String>("asset-version")
        .cloned()
        .unwrap_or_default();
    let static_url = args
        .get_one::<String>("static-url")
        .cloned()
        .unwrap_or_default();
    let ctx = AssetContext::new(version, static_url).with_locale(config.locale.clone());

    println!("worker: {}", ctx.worker_path());
    println!(
        "analysis: {}",
        ctx.asset_path("wagtailyoast/dist/js/yoastanalysis.js")
    );
    println!("styles: {}", ctx.asset_path("wagtailyoast/dist/css/styles.css"));
    println!("locale: {}", ctx.locale);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("resolve", args)) => resolve(&config, args),
        Some(("analyze", args)) => analyze(&config, args).await,
        Some(("asset-path", args)) => asset_path(&config, args),
        Some((other, _)) => bail!("unknown subcommand: {other}"),
        None => bail!("no subcommand given"),
    }
}
