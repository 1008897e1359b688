use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pfpframe", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose images under a frame and write the PNG.
    Compose(ComposeArgs),
    /// Print the initial placement of each image as JSON, without rendering.
    Place(PlaceArgs),
}

#[derive(Args, Debug)]
struct SessionArgs {
    /// Editor configuration JSON. Missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Placement policy for new images.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Seed for scatter placement.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Content image (repeatable; drawn bottom to top in the given order).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Ring/frame image drawn above the content (PNG, JPEG, SVG, ...).
    #[arg(long)]
    frame: Option<PathBuf>,

    /// Output PNG path, or a directory to write the configured file name into.
    #[arg(long)]
    out: PathBuf,

    /// Fail instead of skipping images that cannot be decoded.
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Parser, Debug)]
struct PlaceArgs {
    /// Content image (repeatable).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Cover,
    Scatter,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Place(args) => cmd_place(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &SessionArgs) -> anyhow::Result<pfpframe::EditorConfig> {
    let mut cfg = match &args.config {
        Some(path) => pfpframe::EditorConfig::from_json_file(path)?,
        None => pfpframe::EditorConfig::default(),
    };
    if let Some(policy) = args.policy {
        cfg.fit = match policy {
            PolicyChoice::Cover => pfpframe::FitPolicy::default(),
            PolicyChoice::Scatter => pfpframe::FitPolicy::scatter(),
        };
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    Ok(cfg)
}

fn sources(paths: &[PathBuf]) -> Vec<pfpframe::ImageSource> {
    paths
        .iter()
        .cloned()
        .map(pfpframe::ImageSource::Path)
        .collect()
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.session)?;
    let mut session = pfpframe::EditorSession::new(cfg).context("start editor session")?;

    if let Some(frame) = &args.frame {
        session
            .on_replace_overlay(&pfpframe::ImageSource::Path(frame.clone()))
            .with_context(|| format!("load frame '{}'", frame.display()))?;
    }

    let report = session.on_add_images(&sources(&args.images));
    for (name, err) in &report.failed {
        eprintln!("skipped {name}: {err}");
    }
    if args.strict && !report.is_clean() {
        anyhow::bail!("{} image(s) failed to decode", report.failed.len());
    }

    let png = session.on_export()?;
    let out = resolve_out_path(&args.out, &png.file_name);
    png.write_to(&out)?;

    eprintln!(
        "wrote {} ({} layer(s), {}x{})",
        out.display(),
        report.added.len(),
        png.width,
        png.height
    );
    Ok(())
}

fn cmd_place(args: PlaceArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.session)?;
    let mut session = pfpframe::EditorSession::new(cfg).context("start editor session")?;
    let report = session.on_add_images(&sources(&args.images));
    for (name, err) in &report.failed {
        eprintln!("skipped {name}: {err}");
    }

    let placements: Vec<_> = session
        .scene()
        .content()
        .map(|layer| {
            serde_json::json!({
                "id": layer.id,
                "width": layer.bitmap.width,
                "height": layer.bitmap.height,
                "center": layer.transform.center(),
                "transform": layer.transform,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&placements)?);
    Ok(())
}

fn resolve_out_path(out: &Path, file_name: &str) -> PathBuf {
    if out.is_dir() {
        out.join(file_name)
    } else {
        out.to_path_buf()
    }
}
