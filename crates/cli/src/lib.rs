use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use clientlib_engine::tree::FsTree;
use clientlib_engine::{BundleRequest, Engine};
use flags::TypeFlag;
use settings::Settings;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

mod flags;
mod gate;
mod http_api;
pub mod server;
mod settings;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "clientlib")]
#[command(about = "Bundle and serve clientlib assets", long_about = None)]
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

    /// Config file (default: ./clientlibs.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resource tree root (overrides `root` in the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve bundles over HTTP
    ServeHttp(ServeArgs),

    /// Write a rendered bundle to stdout
    Render(RenderArgs),

    /// Print the HTML tags that load a bundle and its dependencies
    Links(RenderArgs),

    /// Print the render plan of a bundle
    Plan(PlanArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:8080 (overrides `bind` in the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[derive(Args)]
struct TargetArgs {
    /// Resource path, or a category name with --category
    target: String,

    /// Asset type
    #[arg(long = "type", value_enum, default_value = "js")]
    kind: TypeFlag,

    /// Treat the target as a category name
    #[arg(long)]
    category: bool,
}

impl TargetArgs {
    fn request(&self, minified: bool) -> BundleRequest {
        let kind = self.kind.as_domain();
        if self.category {
            BundleRequest::category(kind, self.target.clone(), minified)
        } else {
            BundleRequest::path(kind, self.target.clone(), minified)
        }
    }
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Request the minified variant
    #[arg(long)]
    min: bool,
}

#[derive(Args)]
struct PlanArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Plan for the minified variant
    #[arg(long)]
    min: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // keep stdout clean for JSON consumers
    if matches!(&cli.command, Commands::Plan(args) if args.json) {
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

    let settings = Settings::load(cli.config.as_deref())?;
    let root = settings.root(cli.root.clone());

    match cli.command {
        Commands::ServeHttp(args) => serve_http(args, settings, root).await?,
        Commands::Render(args) => run_render(args, build_engine(&settings, root)?).await?,
        Commands::Links(args) => run_links(args, build_engine(&settings, root)?).await?,
        Commands::Plan(args) => run_plan(args, build_engine(&settings, root)?).await?,
    }

    Ok(())
}

fn build_engine(settings: &Settings, root: PathBuf) -> Result<Arc<Engine>> {
    if !root.is_dir() {
        anyhow::bail!("Resource root is not a directory: {}", root.display());
    }
    log::debug!("Resource root: {}", root.display());
    let engine = Engine::new(settings.engine.clone(), Arc::new(FsTree::new(root)))
        .context("Failed to configure engine")?;
    Ok(Arc::new(engine))
}

/// Run synchronous engine work off the async runtime.
async fn blocking<T, F>(engine: Arc<Engine>, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Engine) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&engine))
        .await
        .context("Engine task panicked")?
}

async fn run_render(args: RenderArgs, engine: Arc<Engine>) -> Result<()> {
    let request = args.target.request(args.min);
    let target = args.target.target.clone();
    let delivery = blocking(engine, move |engine| Ok(engine.bundle(&request)?)).await?;
    let Some(delivery) = delivery else {
        anyhow::bail!("Nothing to render for {target}");
    };
    log::info!("Rendered {} (hash {})", delivery.link.url(), delivery.bundle.hash);
    print_stdout(&delivery.bundle.content)
}

async fn run_links(args: RenderArgs, engine: Arc<Engine>) -> Result<()> {
    let request = args.target.request(args.min);
    let tags = blocking(engine, move |engine| Ok(engine.render_links(&request)?)).await?;
    if tags.is_empty() {
        anyhow::bail!("No links for {}", args.target.target);
    }
    print_stdout(&tags.join("\n"))
}

async fn run_plan(args: PlanArgs, engine: Arc<Engine>) -> Result<()> {
    let request = args.target.request(args.min);
    let plan = blocking(engine, move |engine| Ok(engine.plan(&request)?)).await?;
    let Some(plan) = plan else {
        anyhow::bail!("Nothing to plan for {}", args.target.target);
    };

    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&plan)?);
    }

    let mut out = format!("{}\n", plan.root);
    for link in &plan.links {
        out.push_str(&format!("  link   {}\n", link.url()));
    }
    for file in &plan.embedded {
        let marker = if file.expanded { " (expanded)" } else { "" };
        out.push_str(&format!("  embed  {}{marker}\n", file.path));
    }
    for entry in &plan.unresolved {
        out.push_str(&format!("  miss   {} ({})\n", entry.reference, entry.reason));
    }
    print_stdout(out.trim_end())
}

async fn serve_http(args: ServeArgs, settings: Settings, root: PathBuf) -> Result<()> {
    let bind = args
        .bind
        .or_else(|| settings.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    server::guarded_bind_addrs(&bind, args.public).await?;
    let engine = build_engine(&settings, root)?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving clientlibs: {base_url}"))?;
    print_stdout(&format!(
        "Categories: {base_url}{}[.min].{{css,js}}/{{category}}.{{css,js}}",
        engine.config().category_path
    ))?;
    server::serve(listener, engine).await
}
