mod common;
use common::{bci_trials, cue, patch_file, synthetic_uv, write_edf, write_gdf};

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use ndarray::Array2;

use ts2image::{
    io::read_tensor, BatchDriver, ConversionConfig, ErspConfig, FileFilter, LabelCode, Method, NCycles,
};

const LEFT: &str = "Cue onset left (class 1)";
const RIGHT: &str = "Cue onset right (class 2)";

fn a_labels() -> [&'static str; 4] {
    ["EEG-C3", "EEG-Cz", "EEG-C4", "EOG-left"]
}

/// 4 trials (769, 770, 769, 770) in a 40 s recording at `sfreq`.
fn write_a_file(dir: &Path, name: &str, sfreq: usize) -> PathBuf {
    let path = dir.join(name);
    let uv = synthetic_uv(4, 40 * sfreq, sfreq as f64);
    write_gdf(&path, &a_labels(), sfreq, &uv, &bci_trials(4, 5.0, 8.0));
    path
}

fn pngs_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else { return out };
    for e in entries.flatten() {
        let p = e.path();
        if p.is_dir() {
            out.extend(pngs_under(&p));
        } else if p.extension().is_some_and(|x| x == "png") {
            out.push(p);
        }
    }
    out.sort();
    out
}

// ── GAF ───────────────────────────────────────────────────────────────────────

#[test]
fn gaf_images_per_cue_in_class_folders() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_a_file(input.path(), "A01T.gdf", 250);

    let driver = BatchDriver::new(ConversionConfig::default(), output.path()).unwrap();
    let report = driver.run(input.path()).unwrap();
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.images, 4);

    let gaf = output.path().join("GAF");
    for (class, idx) in [(LEFT, 0), (RIGHT, 1), (LEFT, 2), (RIGHT, 3)] {
        let p = gaf.join(class).join(format!("A01T-{idx}.png"));
        assert!(p.is_file(), "missing {}", p.display());
    }
    // 3 channels × 32 rows < 256 → upscaled.
    let img = image::open(gaf.join(LEFT).join("A01T-0.png")).unwrap();
    assert_eq!((img.width(), img.height()), (256, 256));
    assert!(!output.path().join("GAF-difference").exists());
}

#[test]
fn gaf_difference_and_per_channel_images() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = write_a_file(input.path(), "A01T.gdf", 250);

    let mut cfg = ConversionConfig::default();
    cfg.gaf.difference_images = true;
    cfg.images.intermediate_images = true;
    cfg.render.min_size = Some(0);
    let driver = BatchDriver::new(cfg, output.path()).unwrap();
    let written = driver.process_file(&path).unwrap();

    // 4 cues × 2 kinds × (merged + 3 channels)
    assert_eq!(written.len(), 32);
    let diff = output.path().join("GAF-difference").join(RIGHT);
    for name in ["A01T-1.png", "A01T-1-Ch-0.png", "A01T-1-Ch-1.png", "A01T-1-Ch-2.png"] {
        assert!(diff.join(name).is_file(), "missing {name}");
    }
    let merged = image::open(diff.join("A01T-1.png")).unwrap();
    assert_eq!((merged.width(), merged.height()), (32, 96));
    let single = image::open(diff.join("A01T-1-Ch-0.png")).unwrap();
    assert_eq!((single.width(), single.height()), (32, 32));
}

#[test]
fn rerun_overwrites_same_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_a_file(input.path(), "A01T.gdf", 250);
    let driver = BatchDriver::new(ConversionConfig::default(), output.path()).unwrap();

    driver.run(input.path()).unwrap();
    let first = pngs_under(output.path());
    driver.run(input.path()).unwrap();
    assert_eq!(pngs_under(output.path()), first);
}

// ── Per-file isolation ────────────────────────────────────────────────────────

#[test]
fn failing_file_does_not_stop_the_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_a_file(input.path(), "A01T.gdf", 250);
    // "B" files expect EEG:C3-style names; these use EEG-C3.
    write_a_file(input.path(), "B0101T.gdf", 250);
    write_a_file(input.path(), "C03T.gdf", 250);

    let cfg = ConversionConfig {
        default_channels: Some(vec!["EEG-C3".into(), "EEG-C4".into()]),
        ..ConversionConfig::default()
    };
    let driver = BatchDriver::new(cfg, output.path()).unwrap();
    let report = driver.run(input.path()).unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    let failed = &report.failed[0];
    assert!(failed.path.ends_with("B0101T.gdf"));
    assert_eq!(failed.kind, "configuration");
    assert!(failed.message.contains("EEG:C3"), "{}", failed.message);

    let left = output.path().join("GAF").join(LEFT);
    assert!(left.join("A01T-0.png").is_file());
    assert!(left.join("C03T-0.png").is_file());
    assert!(!left.join("B0101T-0.png").exists());
}

#[test]
fn unmapped_accepted_code_fails_with_lookup() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = input.path().join("A04T.gdf");
    let cues = [cue(2.0, 1.0, 769), cue(5.0, 1.0, 1072)];
    write_gdf(&path, &a_labels(), 250, &synthetic_uv(4, 2500, 250.0), &cues);

    let cfg = ConversionConfig {
        accepted_codes: [769, 1072].into_iter().map(LabelCode).collect(),
        ..ConversionConfig::default()
    };
    let report = BatchDriver::new(cfg, output.path()).unwrap().run(input.path()).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, "lookup");
    assert!(report.failed[0].message.contains("1072"));
    assert!(pngs_under(output.path()).is_empty());
}

#[test]
fn edf_input_through_default_channels() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let uv = synthetic_uv(2, 20 * 160, 160.0);
    write_edf(
        &input.path().join("S001R04.edf"),
        &["C3", "C4"],
        160,
        &uv,
        &[(2.0, 4.1, "769"), (8.0, 4.1, "Rest"), (13.0, 4.1, "770")],
    );

    let cfg = ConversionConfig {
        default_channels: Some(Vec::new()),
        file_filter: FileFilter { extensions: vec!["edf".into()], training_only: false, ..FileFilter::default() },
        ..ConversionConfig::default()
    };
    let report = BatchDriver::new(cfg, output.path()).unwrap().run(input.path()).unwrap();
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(report.images, 2);
    assert!(output.path().join("GAF").join(RIGHT).join("S001R04-1.png").is_file());
}

#[test]
fn zero_duration_edf_fails_alone() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let anns = [(2.0, 4.1, "769"), (13.0, 4.1, "770")];
    for name in ["S001R04.edf", "S002R04.edf"] {
        write_edf(&input.path().join(name), &["C3", "C4"], 160, &synthetic_uv(2, 20 * 160, 160.0), &anns);
    }
    // Record duration field.
    patch_file(&input.path().join("S001R04.edf"), 244, b"0       ");

    let cfg = ConversionConfig {
        default_channels: Some(Vec::new()),
        file_filter: FileFilter { extensions: vec!["edf".into()], training_only: false, ..FileFilter::default() },
        ..ConversionConfig::default()
    };
    let report = BatchDriver::new(cfg, output.path()).unwrap().run(input.path()).unwrap();
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("S001R04.edf"));
    assert_eq!(report.failed[0].kind, "read");
    assert!(output.path().join("GAF").join(LEFT).join("S002R04-0.png").is_file());
}

// ── ERSP ──────────────────────────────────────────────────────────────────────

fn ersp_config() -> ConversionConfig {
    ConversionConfig {
        method: Method::Ersp,
        ersp: ErspConfig { fmin: 4.0, fmax: 20.0, fstep: 2.0, ..ErspConfig::default() },
        ..ConversionConfig::default()
    }
}

#[test]
fn ersp_one_image_per_class() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = write_a_file(input.path(), "A01T.gdf", 100);

    let mut cfg = ersp_config();
    cfg.images.intermediate_images = true;
    let driver = BatchDriver::new(cfg, output.path()).unwrap();
    let written = driver.process_file(&path).unwrap();
    assert_eq!(written.len(), 2 * 4);

    let ersp = output.path().join("ERSP");
    // Index is the code's position in the accepted set {769, 770}.
    assert!(ersp.join(LEFT).join("A01T-0.png").is_file());
    assert!(ersp.join(RIGHT).join("A01T-1.png").is_file());
    assert!(ersp.join(RIGHT).join("A01T-1-Ch-2.png").is_file());

    // 8 frequencies × 3 channels; 501 samples decimated by 2.
    let merged = image::open(ersp.join(LEFT).join("A01T-0.png")).unwrap();
    assert_eq!((merged.width(), merged.height()), (251, 24));
    let single = image::open(ersp.join(LEFT).join("A01T-0-Ch-0.png")).unwrap();
    assert_eq!((single.width(), single.height()), (251, 8));
}

#[test]
fn ersp_classes_are_averaged_separately() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = input.path().join("A01T.gdf");
    // 769 cues at 5 s and 21 s, 770 cues at 13 s and 29 s.
    let cues = bci_trials(4, 4.0, 8.0);
    let bursts: Vec<usize> = cues.iter().filter(|c| c.code == 769).map(|c| (c.onset * 100.0).round() as usize).collect();
    // 10 Hz at 20 µV, tripled for 4.5 s after every 769 cue.
    let uv = Array2::from_shape_fn((4, 4000), |(_, i)| {
        let amp = if bursts.iter().any(|&b| i >= b && i < b + 450) { 60.0 } else { 20.0 };
        amp * (2.0 * PI * 10.0 * i as f64 / 100.0).sin()
    });
    write_gdf(&path, &a_labels(), 100, &uv, &cues);

    let mut cfg = ersp_config();
    cfg.ersp.fmin = 8.0;
    cfg.ersp.fmax = 12.0;
    cfg.render.export_arrays = true;
    BatchDriver::new(cfg, output.path()).unwrap().process_file(&path).unwrap();

    let ersp = output.path().join("ERSP");
    let left = read_tensor(ersp.join(LEFT).join("A01T-0.safetensors"), "image").unwrap();
    let right = read_tensor(ersp.join(RIGHT).join("A01T-1.safetensors"), "image").unwrap();
    // 3 channels × {8, 10} Hz, 251 decimated samples.
    assert_eq!(left.shape(), &[6, 251]);
    assert_eq!(right.shape(), &[6, 251]);

    // Row 1 is channel 0 at 10 Hz; column 150 is 2 s after the cue.
    let (l, r) = (left[[1, 150]], right[[1, 150]]);
    assert!(l > 2.0, "burst class: {l}");
    assert!(r < 1.0, "steady class: {r}");
}

#[test]
fn ersp_epochs_outside_recording_are_dropped() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = input.path().join("A05T.gdf");
    // The 770 cue at 9.5 s needs data up to 13.5 s of a 10 s recording.
    let cues = [cue(3.0, 1.25, 769), cue(9.5, 1.25, 770)];
    write_gdf(&path, &a_labels(), 100, &synthetic_uv(4, 1000, 100.0), &cues);

    let driver = BatchDriver::new(ersp_config(), output.path()).unwrap();
    let written = driver.process_file(&path).unwrap();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("ERSP/Cue onset left (class 1)/A05T-0.png"));
}

#[test]
fn ersp_wavelet_longer_than_epoch_is_configuration_error() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = write_a_file(input.path(), "A01T.gdf", 100);

    let mut cfg = ersp_config();
    cfg.ersp = ErspConfig {
        tmin: -0.2,
        tmax: 0.5,
        fmin: 1.0,
        fmax: 4.0,
        n_cycles: NCycles::PerFrequency,
        baseline: Some((-0.2, 0.0)),
        ..ErspConfig::default()
    };
    let err = BatchDriver::new(cfg, output.path()).unwrap().process_file(&path).unwrap_err();
    assert_eq!(err.kind(), "configuration");
    assert!(err.to_string().contains("longer than the signal"), "{err}");
}

#[test]
fn ersp_duplicate_event_samples_are_malformed() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let path = input.path().join("A06T.gdf");
    let cues = [cue(5.0, 1.25, 769), cue(5.0, 1.25, 770)];
    write_gdf(&path, &a_labels(), 100, &synthetic_uv(4, 2000, 100.0), &cues);

    let err = BatchDriver::new(ersp_config(), output.path()).unwrap().process_file(&path).unwrap_err();
    assert_eq!(err.kind(), "malformed-recording");
    assert!(err.to_string().contains("not unique"), "{err}");
}
