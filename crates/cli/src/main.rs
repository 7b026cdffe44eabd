use address_gateway::LookupGateway;
use address_resolver::{AnchorRect, PostcodeShapeClassifier, ViewportPositioner, WindowSize};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use settings::{Settings, SettingsOverrides};
use std::path::PathBuf;

mod interactive;
mod lookup;
mod output;
mod settings;

#[derive(Parser)]
#[command(name = "address-resolve")]
#[command(about = "Resolve partial UK addresses and postcodes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Emit JSON on stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args)]
struct OverrideArgs {
    /// Postcode provider base URL (overrides ADDRESS_POSTCODE_URL)
    #[arg(long, global = true)]
    postcode_url: Option<String>,

    /// Place-autocomplete provider URL (overrides ADDRESS_PLACE_URL)
    #[arg(long, global = true)]
    place_url: Option<String>,

    /// Provider API key (overrides ADDRESS_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

impl From<OverrideArgs> for SettingsOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            postcode_url: args.postcode_url,
            place_url: args.place_url,
            api_key: args.api_key,
            timeout_ms: args.timeout_ms,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether text looks like a UK postcode
    Classify(ClassifyArgs),

    /// Resolve text once and print the candidates
    Lookup(LookupArgs),

    /// Drive a resolver from stdin, one line per edit
    Interactive(InteractiveArgs),

    /// Compute where the result panel goes for an anchor field
    Geometry(GeometryArgs),
}

#[derive(Args)]
struct ClassifyArgs {
    text: String,
}

#[derive(Args)]
struct LookupArgs {
    text: String,
}

#[derive(Args)]
struct InteractiveArgs {
    /// Anchor field rectangle as LEFT,TOP,WIDTH,HEIGHT
    #[arg(long, value_parser = parse_anchor, requires = "window")]
    anchor: Option<AnchorRect>,

    /// Window width
    #[arg(long)]
    window: Option<f64>,

    /// Window height
    #[arg(long, default_value_t = 768.0)]
    window_height: f64,
}

#[derive(Args)]
struct GeometryArgs {
    /// Anchor field rectangle as LEFT,TOP,WIDTH,HEIGHT
    #[arg(long, value_parser = parse_anchor)]
    anchor: AnchorRect,

    /// Window width
    #[arg(long)]
    window: f64,

    /// Window height
    #[arg(long, default_value_t = 768.0)]
    window_height: f64,
}

fn parse_anchor(raw: &str) -> Result<AnchorRect, String> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid number in {raw:?}: {err}"))?;
    match parts.as_slice() {
        [left, top, width, height] => Ok(AnchorRect::new(*left, *top, *width, *height)),
        _ => Err(format!(
            "expected LEFT,TOP,WIDTH,HEIGHT, got {} value(s)",
            parts.len()
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = Settings::load(cli.config.as_deref(), &cli.overrides.into())?;

    match cli.command {
        Commands::Classify(args) => run_classify(&args, cli.json)?,
        Commands::Lookup(args) => run_lookup(&args, &settings, cli.json).await?,
        Commands::Interactive(args) => run_interactive(args, settings, cli.json).await?,
        Commands::Geometry(args) => run_geometry(&args, &settings, cli.json)?,
    }

    Ok(())
}

fn run_classify(args: &ClassifyArgs, json: bool) -> Result<()> {
    let is_postcode = PostcodeShapeClassifier::is_postcode(&args.text);
    let result = output::ClassifyOutput {
        text: &args.text,
        is_postcode,
        normalized: is_postcode.then(|| PostcodeShapeClassifier::normalize(&args.text)),
    };
    if json {
        return output::print_json(&result);
    }
    match &result.normalized {
        Some(normalized) => println!("postcode ({normalized})"),
        None => println!("free text"),
    }
    Ok(())
}

fn build_gateway(settings: &Settings) -> Result<LookupGateway> {
    LookupGateway::from_config(&settings.gateway).context("Failed to build lookup gateway")
}

async fn run_lookup(args: &LookupArgs, settings: &Settings, json: bool) -> Result<()> {
    let gateway = build_gateway(settings)?;
    info!("Resolving {:?}", args.text);
    let (phase, candidates) = lookup::resolve_once(&gateway, &settings.resolver, &args.text).await;
    info!("Finished in phase {phase:?}");
    if json {
        return output::print_json(&candidates);
    }
    println!("{}", output::render_candidates(&candidates));
    Ok(())
}

async fn run_interactive(args: InteractiveArgs, settings: Settings, json: bool) -> Result<()> {
    let gateway = build_gateway(&settings)?;
    let layout = args.anchor.zip(args.window).map(|(anchor, width)| {
        (
            anchor,
            WindowSize {
                width,
                height: args.window_height,
            },
        )
    });
    info!("Interactive session started; one line per edit, :quit to exit");
    interactive::run(
        gateway,
        settings.resolver,
        interactive::InteractiveOptions { layout, json },
    )
    .await?;
    info!("Interactive session finished");
    Ok(())
}

fn run_geometry(args: &GeometryArgs, settings: &Settings, json: bool) -> Result<()> {
    let positioner = ViewportPositioner::new(settings.resolver.panel.clone());
    let window = WindowSize {
        width: args.window,
        height: args.window_height,
    };
    let rect = positioner
        .place(&args.anchor, &window)
        .context("Anchor is empty or window has no width; nothing to place")?;
    if json {
        return output::print_json(&rect);
    }
    println!("{}", output::render_viewport(&rect));
    Ok(())
}
