use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "retouch", version)]
struct Cli {
    /// Log pipeline stages (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an edit to an image and export it.
    Render(RenderArgs),
    /// Render a square filter preview tile.
    Thumbnail(ThumbnailArgs),
    /// List filter presets with their channel values.
    Filters(FiltersArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Source image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file, or a directory to write `<name>-edited.<ext>` into.
    #[arg(long)]
    out: PathBuf,

    /// Options JSON (see `RetouchOpts`).
    #[arg(long)]
    opts: Option<PathBuf>,

    #[arg(long, default_value = retouch::NONE_FILTER_ID)]
    filter: String,

    /// Filter strength, 0..=150.
    #[arg(long, default_value_t = retouch::INTENSITY_NOMINAL)]
    intensity: f64,

    /// Overlay effect to enable (repeatable).
    #[arg(long = "effect")]
    effects: Vec<retouch::EffectId>,

    /// Text drawn over the image. Empty for none.
    #[arg(long, default_value = "")]
    text: String,

    /// Text colour as `#rrggbb`.
    #[arg(long, default_value = "#ffffff")]
    color: String,

    /// Text size in preview pixels.
    #[arg(long, default_value_t = retouch::DEFAULT_TEXT_SIZE_PX)]
    size: f32,

    #[arg(long, default_value = "inter")]
    font: retouch::FontId,

    /// Font file registered for `--font`.
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Overrides the format from the options.
    #[arg(long)]
    format: Option<retouch::ExportFormat>,

    /// JPEG quality in (0, 1].
    #[arg(long)]
    quality: Option<f32>,

    /// Behave like a touch-class device (lower snapshot scale).
    #[arg(long)]
    touch: bool,

    /// Also write the live preview as PNG.
    #[arg(long)]
    preview: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ThumbnailArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value = retouch::NONE_FILTER_ID)]
    filter: String,

    /// Tile edge in pixels.
    #[arg(long, default_value_t = 96)]
    edge: u32,
}

#[derive(Parser, Debug)]
struct FiltersArgs {
    #[arg(long, default_value_t = retouch::INTENSITY_NOMINAL)]
    intensity: f64,

    /// Print the records as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Thumbnail(args) => cmd_thumbnail(args),
        Command::Filters(args) => cmd_filters(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "retouch=info",
        2 => "retouch=debug",
        _ => "retouch=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_opts(path: Option<&Path>) -> anyhow::Result<retouch::RetouchOpts> {
    let Some(path) = path else {
        return Ok(retouch::RetouchOpts::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read options '{}'", path.display()))?;
    Ok(retouch::RetouchOpts::from_json(&json)?)
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut opts = read_opts(args.opts.as_deref())?;
    if let Some(format) = args.format {
        opts.export_format = format;
    }
    if let Some(quality) = args.quality {
        opts.jpeg_quality = quality;
    }

    let mut fonts = retouch::FontBook::new();
    if let Some(path) = &args.font_file {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        fonts.register(args.font, bytes)?;
    }

    let mut session = retouch::EditorSession::new(opts, fonts)?;
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let name = args
        .in_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    session.load_image(&name, bytes).await?;

    let edit = session.edit_mut();
    edit.select_filter(&args.filter)?;
    edit.set_intensity(args.intensity)?;
    for effect in &args.effects {
        edit.set_effect(*effect, true);
    }
    edit.set_text(args.text.as_str());
    edit.set_text_color_hex(&args.color)?;
    edit.set_font(args.font);
    edit.set_text_size(args.size)?;

    if let Some(path) = &args.preview {
        session.render_preview()?;
        if let Some(surface) = session.preview() {
            write_png(path, surface)?;
        }
    }

    let host = FileHost {
        out: args.out.clone(),
        touch: args.touch,
        blobs: session.blobs().clone(),
    };
    let report = session.export(&host).await?;
    eprintln!(
        "exported {} ({}x{}, {} bytes) via {} / {}",
        report.artifact.filename,
        report.size.width,
        report.size.height,
        report.artifact.bytes.len(),
        report.strategy,
        report.delivery.tier,
    );
    Ok(())
}

fn cmd_thumbnail(args: ThumbnailArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let image = retouch::ImageAsset::decode(args.in_path.to_string_lossy(), &bytes);
    let filter = retouch::find_filter(&args.filter)
        .with_context(|| format!("unknown filter '{}'", args.filter))?;
    let tile = retouch::render_thumbnail(&image, filter, args.edge)?;
    write_png(&args.out, &tile)
}

fn cmd_filters(args: FiltersArgs) -> anyhow::Result<()> {
    if !(retouch::INTENSITY_MIN..=retouch::INTENSITY_MAX).contains(&args.intensity) {
        anyhow::bail!("intensity must be within 0..=150, got {}", args.intensity);
    }
    if args.json {
        let rows: Vec<_> = retouch::filters()
            .iter()
            .map(|f| {
                serde_json::json!({
                    "id": f.id,
                    "name": f.name,
                    "values": retouch::compute_channel_values(f, args.intensity),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for f in retouch::filters() {
        println!(
            "{:<10} {:<10} {}",
            f.id,
            f.name,
            retouch::css_filter_for(f, args.intensity)
        );
    }
    Ok(())
}

fn write_png(path: &Path, surface: &retouch::Surface) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &surface.to_straight_rgba8(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

/// Delivers exports to the local file system.
struct FileHost {
    out: PathBuf,
    touch: bool,
    blobs: retouch::BlobUrlRegistry,
}

impl FileHost {
    fn write(&self, url: &retouch::BlobUrl) -> retouch::RetouchResult<PathBuf> {
        let artifact = self
            .blobs
            .resolve(url)
            .ok_or_else(|| retouch::RetouchError::delivery(format!("{url} was revoked")))?;
        let path = if self.out.is_dir() {
            self.out.join(&artifact.filename)
        } else {
            self.out.clone()
        };
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("write '{}'", path.display()))?;
        Ok(path)
    }
}

#[async_trait::async_trait]
impl retouch::DeliveryHost for FileHost {
    fn can_share_files(&self) -> bool {
        false
    }

    fn can_download(&self) -> bool {
        true
    }

    fn is_touch_device(&self) -> bool {
        self.touch
    }

    async fn share(
        &self,
        _payload: &retouch::SharePayload,
    ) -> retouch::RetouchResult<retouch::ShareResult> {
        Err(retouch::RetouchError::delivery("no share sheet on this host"))
    }

    async fn download(&self, url: &retouch::BlobUrl, _filename: &str) -> retouch::RetouchResult<()> {
        let path = self.write(url)?;
        eprintln!("wrote {}", path.display());
        Ok(())
    }

    async fn open_manual_save(
        &self,
        url: &retouch::BlobUrl,
        instructions: &str,
    ) -> retouch::RetouchResult<()> {
        let path = self.write(url)?;
        eprintln!("{instructions} ({})", path.display());
        Ok(())
    }
}
