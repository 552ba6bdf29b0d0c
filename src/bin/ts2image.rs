/// ts2image: convert a directory of cue-labelled EEG recordings into GAF or
/// ERSP images.
///
/// Layout of the output:
///   {output}/GAF/{class}/{stem}-{cue}.png              summation field, channels stacked
///   {output}/GAF-difference/{class}/{stem}-{cue}.png   with --difference-images
///   {output}/ERSP/{class}/{stem}-{class index}.png     mean percent-baseline power
///   …-Ch-{n}.png                                       with --intermediate-images
///
/// Exits non-zero when any file failed.
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use ts2image::{BatchDriver, ColorMap, ConversionConfig, FileFilter, LabelCode, Method};

#[derive(Parser, Debug)]
#[command(name = "ts2image", version, about = "EEG recordings (GDF/EDF) → GAF / ERSP training images")]
struct Args {
    /// Directory with the recordings.
    #[arg(long)]
    input: PathBuf,

    /// Output root; method and class folders are created below it.
    #[arg(long)]
    output: PathBuf,

    /// JSON configuration; absent keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Encoding method (gaf, ersp).
    #[arg(long)]
    method: Option<Method>,

    /// Accepted label codes, e.g. `769,770`.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    accepted: Option<Vec<i64>>,

    /// Also write Gramian Angular Difference Fields.
    #[arg(long)]
    difference_images: bool,

    /// Also write one image per channel.
    #[arg(long)]
    intermediate_images: bool,

    /// Do not write the merged (all channels stacked) image.
    #[arg(long)]
    no_merge: bool,

    /// Skip the band-pass filter.
    #[arg(long)]
    no_filter: bool,

    /// Colour map (viridis, magma, gray, rdbu).
    #[arg(long)]
    colormap: Option<ColorMap>,

    /// Also write every image array as safetensors.
    #[arg(long)]
    export_arrays: bool,

    /// BCI Competition IV 2b file filter (B*, no smiley-feedback sessions).
    #[arg(long)]
    bci_iv_2b: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    dump_config: bool,

    /// Increase verbosity (-v debug, -vv trace). `RUST_LOG` applies otherwise.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log lines to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.format_timestamp_millis();
    if let Some(path) = log_file {
        let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn build_config(args: &Args) -> Result<ConversionConfig> {
    let mut cfg = match &args.config {
        Some(path) => ConversionConfig::from_json_file(path)?,
        None => ConversionConfig::default(),
    };
    if let Some(method) = args.method {
        cfg.method = method;
    }
    if let Some(codes) = &args.accepted {
        cfg.accepted_codes = codes.iter().copied().map(LabelCode).collect();
    }
    if args.difference_images {
        cfg.gaf.difference_images = true;
    }
    if args.intermediate_images {
        cfg.images.intermediate_images = true;
    }
    if args.no_merge {
        cfg.images.merge_channels = false;
    }
    if args.no_filter {
        cfg.bandpass = None;
    }
    if args.colormap.is_some() {
        cfg.render.colormap = args.colormap;
    }
    if args.export_arrays {
        cfg.render.export_arrays = true;
    }
    if args.bci_iv_2b {
        cfg.file_filter = FileFilter::bci_iv_2b();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_file.as_ref())?;

    let cfg = build_config(&args)?;
    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    log::info!(
        "method {}, accepted codes {:?}, output {}",
        cfg.method,
        cfg.accepted_codes.iter().map(|c| c.0).collect::<Vec<_>>(),
        args.output.display()
    );
    let driver = BatchDriver::new(cfg, &args.output)?;
    let report = driver.run(&args.input)?;

    println!("processed {}, failed {}", report.processed.len(), report.failed.len());
    for f in &report.failed {
        println!("  {} [{}]: {}", f.path.display(), f.kind, f.message);
    }
    if !report.is_success() {
        bail!("{} of {} file(s) failed", report.failed.len(), report.total());
    }
    Ok(())
}
