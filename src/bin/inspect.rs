/// ts2image-inspect: print what the converter would see in one recording.
///
/// Header summary, channel table, annotation counts per code and the
/// accepted cue windows with their class names. Nothing is written.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use ts2image::{
    channels_for_file, edf::open_edf, extract_windows_padded, gdf::open_gdf, open_recording,
    ConversionConfig, LabelCode,
};

#[derive(Parser, Debug)]
#[command(name = "ts2image-inspect", version, about = "Inspect a GDF/EDF recording and its cue annotations")]
struct Args {
    /// Recording to inspect.
    file: PathBuf,

    /// JSON configuration (accepted codes, labels, channel rules, padding).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accepted label codes, e.g. `769,770`.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    accepted: Option<Vec<i64>>,

    /// List every accepted window, not just the first 10.
    #[arg(long)]
    all: bool,
}

fn print_format_header(path: &Path) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "gdf" => {
            let raw = open_gdf(path)?;
            let h = &raw.header;
            println!("format       GDF {:.2}", h.version);
            println!("patient      {}", h.patient_id);
            println!("recording    {}", h.recording_id);
            println!("records      {} × {} s", h.n_records, h.record_duration);
            println!(
                "event table  mode {}, {} events @ {} Hz",
                raw.events.mode,
                raw.events.len(),
                raw.events.sample_rate
            );
            println!();
            println!("  #  {:<16} {:<6} {:>8} {:>14} {:>14}", "label", "unit", "samples", "phys min", "phys max");
            for (i, ch) in h.channels.iter().enumerate() {
                println!(
                    "{i:>3}  {:<16} {:<6} {:>8} {:>14.4} {:>14.4}",
                    ch.label, ch.physical_dim, ch.samples_per_record, ch.physical_min, ch.physical_max
                );
            }
        }
        "edf" => {
            let raw = open_edf(path)?;
            let h = &raw.header;
            println!("format       EDF{}", if h.is_edf_plus() { "+" } else { "" });
            println!("patient      {}", h.patient_id);
            println!("recording    {}", h.recording_id);
            println!("start        {} {}", h.start_date, h.start_time);
            println!("records      {} × {} s", h.n_records, h.record_duration);
            println!();
            println!("  #  {:<16} {:<6} {:>8} {:>14} {:>14}", "label", "unit", "samples", "phys min", "phys max");
            for (i, s) in h.signals.iter().enumerate() {
                println!(
                    "{i:>3}  {:<16} {:<6} {:>8} {:>14.4} {:>14.4}",
                    s.label, s.physical_dim, s.samples_per_record, s.physical_min, s.physical_max
                );
            }
        }
        _ => println!("format       unknown extension {ext:?}"),
    }
    println!();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => ConversionConfig::from_json_file(path)?,
        None => ConversionConfig::default(),
    };
    if let Some(codes) = &args.accepted {
        cfg.accepted_codes = codes.iter().copied().map(LabelCode).collect();
    }

    print_format_header(&args.file).with_context(|| format!("read {}", args.file.display()))?;
    let rec = open_recording(&args.file)?;
    let file = rec.file_name();

    println!(
        "{file}: {} channels @ {} Hz, {} samples ({:.1} s)",
        rec.n_channels(),
        rec.sfreq,
        rec.n_times(),
        rec.duration_secs()
    );
    match channels_for_file(&file, &cfg.channel_rules, cfg.default_channels.as_deref()) {
        Ok(chs) if chs.is_empty() => println!("channel rule: keep all"),
        Ok(chs) => {
            let missing: Vec<&String> = chs.iter().filter(|c| !rec.ch_names.contains(c)).collect();
            println!("channel rule: {chs:?}");
            if !missing.is_empty() {
                println!("  missing from recording: {missing:?}");
            }
        }
        Err(e) => println!("channel rule: {e}"),
    }
    println!();

    let mut counts: BTreeMap<Option<LabelCode>, usize> = BTreeMap::new();
    for ann in &rec.annotations {
        *counts.entry(ann.code()).or_default() += 1;
    }
    println!("{} annotations", rec.annotations.len());
    for (code, n) in &counts {
        let accepted = code.is_some_and(|c| cfg.accepted_codes.contains(&c));
        let name = code.and_then(|c| cfg.labels.get(c)).unwrap_or("");
        let code = code.map(|c| c.to_string()).unwrap_or_else(|| "(text)".into());
        println!("  {} {code:>6} ×{n:<5} {name}", if accepted { "*" } else { " " });
    }
    println!();

    let windows = extract_windows_padded(&rec.annotations, &cfg.accepted_codes, cfg.padding);
    println!("{} accepted window(s)", windows.len());
    let shown = if args.all { windows.len() } else { windows.len().min(10) };
    for w in &windows[..shown] {
        let name = cfg.labels.get(w.code).unwrap_or("<unmapped>");
        println!(
            "  #{:<4} {:>6}  {:>9.3} – {:<9.3} s  {name}",
            w.index, w.code, w.start_time, w.end_time
        );
    }
    if shown < windows.len() {
        println!("  … {} more (use --all)", windows.len() - shown);
    }
    Ok(())
}
