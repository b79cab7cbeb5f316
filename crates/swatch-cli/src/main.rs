//! swatch - inspect and convert colour palette files.
//!
//! Commands:
//! - `formats`, `filters` describe the available codecs
//! - `detect`, `show` inspect a palette
//! - `convert`, `batch`, `builtin` write palettes

mod config;

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use swatch_core::{ColorCollection, NamedPalette, PaletteSerializer, Registry, SortOrder};
use swatch_formats::{AcoColorSpace, AcoSerializer, AcoVersion, default_registry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swatch")]
#[command(about = "Inspect and convert colour palette files")]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by SWATCH_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file [default: <config dir>/swatch/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the palette formats and what they support
    Formats,

    /// Print the format of a palette file
    Detect {
        file: PathBuf,
    },

    /// Print the colours of a palette file
    Show {
        file: PathBuf,

        /// Sort colours before printing (hue, brightness, value)
        #[arg(long)]
        sort: Option<SortOrder>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert a palette to another format
    Convert {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        write: WriteArgs,

        /// Sort colours before writing (hue, brightness, value)
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Convert every file matching a glob pattern
    Batch {
        /// Glob pattern, quoted so the shell leaves it alone
        pattern: String,

        /// Directory for converted files [default: next to each input]
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Write one of the built-in palettes
    Builtin {
        /// standard, office2010, paint or websafe
        name: NamedPalette,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Print the open and save file dialog filters
    Filters,

    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct WriteArgs {
    /// Output format extension (e.g. gpl, aco) [default: from the output path]
    #[arg(long, value_name = "EXT")]
    to: Option<String>,

    /// ACO file version (1 or 2)
    #[arg(long)]
    aco_version: Option<AcoVersion>,

    /// ACO colour space (rgb, hsb, grayscale)
    #[arg(long)]
    color_space: Option<AcoColorSpace>,
}

/// The codec a palette is written with. ACO is rebuilt from the options,
/// everything else comes straight from the registry.
enum Writer<'a> {
    Registered(&'a dyn PaletteSerializer),
    Aco(AcoSerializer),
}

impl Writer<'_> {
    fn codec(&self) -> &dyn PaletteSerializer {
        match self {
            Writer::Registered(codec) => *codec,
            Writer::Aco(codec) => codec,
        }
    }
}

struct App<'a> {
    registry: &'a Registry,
    config: &'a Config,
}

impl<'a> App<'a> {
    fn writer(&self, args: &WriteArgs, output: &Path) -> Result<Writer<'a>> {
        let ext = args
            .to
            .as_deref()
            .or_else(|| output.extension().and_then(|ext| ext.to_str()))
            .or(self.config.defaults.format.as_deref())
            .ok_or_else(|| anyhow!("cannot tell the output format of {}; use --to", output.display()))?;

        let codec = self
            .registry
            .writers()
            .find(|codec| codec.handles_extension(ext))
            .ok_or_else(|| anyhow!("no writable palette format for extension '{ext}'"))?;

        if codec.name() != AcoSerializer::default().name() {
            return Ok(Writer::Registered(codec));
        }

        let defaults = &self.config.defaults;
        let version = args.aco_version.or(defaults.aco_version).unwrap_or_default();
        let color_space = args
            .color_space
            .or(defaults.aco_color_space)
            .unwrap_or_default();
        Ok(Writer::Aco(AcoSerializer::new(version, color_space)))
    }

    fn sort(&self, requested: Option<SortOrder>) -> Option<SortOrder> {
        requested.or(self.config.defaults.sort)
    }

    fn load(&self, path: &Path) -> Result<ColorCollection> {
        ColorCollection::load(path, self.registry)
            .with_context(|| format!("failed to read palette {}", path.display()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "swatch", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let registry = default_registry();
    let ctx = App {
        registry: &registry,
        config: &config,
    };

    match cli.command {
        Commands::Formats => cmd_formats(&registry),
        Commands::Detect { file } => cmd_detect(&registry, &file),
        Commands::Show { file, sort, json } => cmd_show(&ctx, &file, sort, json),
        Commands::Convert {
            input,
            output,
            write,
            sort,
        } => cmd_convert(&ctx, &input, &output, &write, sort),
        Commands::Batch {
            pattern,
            out_dir,
            write,
        } => cmd_batch(&ctx, &pattern, out_dir.as_deref(), &write),
        Commands::Builtin {
            name,
            output,
            write,
        } => cmd_builtin(&ctx, name, &output, &write),
        Commands::Filters => {
            println!("Open: {}", registry.open_filter());
            println!("Save: {}", registry.save_filter());
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SWATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn cmd_formats(registry: &Registry) -> Result<()> {
    println!("Palette formats:");
    for codec in registry.iter() {
        let exts: Vec<String> = codec.extensions().iter().map(|ext| format!(".{ext}")).collect();
        let mode = match (codec.can_read(), codec.can_write()) {
            (true, true) => "read/write",
            (true, false) => "read",
            (false, true) => "write",
            (false, false) => "-",
        };
        println!("  {:<30} {:<12} {mode}", codec.name(), exts.join(" "));
    }
    Ok(())
}

fn cmd_detect(registry: &Registry, file: &Path) -> Result<()> {
    let codec = registry
        .resolve(file)
        .with_context(|| format!("failed to probe {}", file.display()))?;
    match codec {
        Some(codec) => {
            println!("{}", codec.name());
            Ok(())
        }
        None => bail!("{}: not a recognised palette", file.display()),
    }
}

fn cmd_show(ctx: &App, file: &Path, sort: Option<SortOrder>, json: bool) -> Result<()> {
    let mut palette = ctx.load(file)?;
    if let Some(order) = ctx.sort(sort) {
        palette.sort(order);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&palette)?);
        return Ok(());
    }

    println!("{}: {} colours", file.display(), palette.len());
    for (i, (color, name)) in palette.iter_named().enumerate() {
        match name {
            Some(name) => println!("{i:>4}  {color}  {name}"),
            None => println!("{i:>4}  {color}"),
        }
    }
    Ok(())
}

fn write_palette(ctx: &App, palette: &ColorCollection, output: &Path, args: &WriteArgs) -> Result<()> {
    let writer = ctx.writer(args, output)?;
    palette
        .save_with(output, writer.codec())
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(
        path = %output.display(),
        format = writer.codec().name(),
        colors = palette.len(),
        "wrote palette"
    );
    Ok(())
}

fn cmd_convert(
    ctx: &App,
    input: &Path,
    output: &Path,
    args: &WriteArgs,
    sort: Option<SortOrder>,
) -> Result<()> {
    let mut palette = ctx.load(input)?;
    if let Some(order) = ctx.sort(sort) {
        palette.sort(order);
    }
    write_palette(ctx, &palette, output, args)?;
    println!("{} -> {}", input.display(), output.display());
    Ok(())
}

fn batch_output(input: &Path, out_dir: Option<&Path>, ext: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;
    let dir = match out_dir {
        Some(dir) => dir,
        None => input.parent().unwrap_or(Path::new("")),
    };
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(ext);
    Ok(dir.join(name))
}

fn cmd_batch(ctx: &App, pattern: &str, out_dir: Option<&Path>, args: &WriteArgs) -> Result<()> {
    let ext = args
        .to
        .as_deref()
        .or(ctx.config.defaults.format.as_deref())
        .map(|ext| ext.trim_start_matches('.').to_owned())
        .ok_or_else(|| anyhow!("batch needs --to or a default format in the config"))?;

    let inputs: Vec<PathBuf> = glob::glob(pattern)
        .with_context(|| format!("invalid glob pattern '{pattern}'"))?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("skipping {}: {}", e.path().display(), e.error());
                None
            }
        })
        .collect();
    if inputs.is_empty() {
        bail!("no files match '{pattern}'");
    }

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut failed = 0usize;
    for input in &inputs {
        progress.set_message(input.display().to_string());
        let result = batch_output(input, out_dir, &ext).and_then(|output| {
            let palette = ctx.load(input)?;
            write_palette(ctx, &palette, &output, args)
        });
        if let Err(e) = result {
            failed += 1;
            progress.println(format!("error: {}: {e:#}", input.display()));
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let converted = inputs.len() - failed;
    println!("Converted {converted} of {} files", inputs.len());
    if failed > 0 {
        bail!("{failed} file(s) failed to convert");
    }
    Ok(())
}

fn cmd_builtin(ctx: &App, name: NamedPalette, output: &Path, args: &WriteArgs) -> Result<()> {
    let palette = name.to_collection();
    if palette.is_empty() {
        bail!("the '{name}' palette has no colours");
    }
    write_palette(ctx, &palette, output, args)?;
    println!("Wrote {} colours to {}", palette.len(), output.display());
    Ok(())
}
