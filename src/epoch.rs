//! Cue-locked epoching.
//!
//! Each accepted cue becomes an event at `round(onset · sfreq)`; an epoch
//! spans `round(tmin · sfreq) ..= round(tmax · sfreq)` samples around it.
//! Epochs reaching outside the recording are dropped with a warning, as
//! MNE does.
use std::collections::BTreeSet;

use ndarray::{s, Array2, Array3, Axis};

use crate::annotation::{CueWindow, LabelCode};
use crate::error::{ConvertError, Result};

/// A time-locking event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub sample: usize,
    pub code: LabelCode,
}

/// Events from cue onsets. Two events on the same sample are an error.
pub fn events_from_windows(windows: &[CueWindow], sfreq: f64, file: &str) -> Result<Vec<Event>> {
    let mut seen = BTreeSet::new();
    let mut events = Vec::with_capacity(windows.len());
    for w in windows {
        let sample = (w.start_time * sfreq).round().max(0.0) as usize;
        if !seen.insert(sample) {
            return Err(ConvertError::malformed(
                file,
                format!("event time samples were not unique (sample {sample}, code {})", w.code),
            ));
        }
        events.push(Event { sample, code: w.code });
    }
    Ok(events)
}

/// Equal-length epochs `[E, C, T]` with the code of each epoch.
#[derive(Debug, Clone)]
pub struct Epochs {
    pub data: Array3<f64>,
    pub codes: Vec<LabelCode>,
    pub sfreq: f64,
    /// Time of the first sample relative to the event, seconds.
    pub tmin: f64,
}

impl Epochs {
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.dim().2
    }

    /// Sample times relative to the event.
    pub fn times(&self) -> Vec<f64> {
        (0..self.n_times()).map(|i| self.tmin + i as f64 / self.sfreq).collect()
    }

    /// Epochs whose code is `code`, `[E', C, T]`.
    pub fn select(&self, code: LabelCode) -> Array3<f64> {
        let idx: Vec<usize> = (0..self.len()).filter(|&i| self.codes[i] == code).collect();
        self.data.select(Axis(0), &idx)
    }
}

/// Cut `[tmin, tmax]` around every event from `data` (`[C, T]`).
pub fn epochs_around(data: &Array2<f64>, events: &[Event], sfreq: f64, tmin: f64, tmax: f64) -> Epochs {
    let (n_ch, n_t) = data.dim();
    let first = (tmin * sfreq).round() as i64;
    let last = (tmax * sfreq).round() as i64;
    let len = (last - first + 1).max(0) as usize;

    let kept: Vec<(usize, &Event)> = events
        .iter()
        .filter_map(|ev| {
            let start = ev.sample as i64 + first;
            let stop = start + len as i64;
            if start < 0 || stop > n_t as i64 {
                log::warn!(
                    "dropping epoch at sample {} (code {}): {tmin}..{tmax} s falls outside the recording",
                    ev.sample,
                    ev.code
                );
                None
            } else {
                Some((start as usize, ev))
            }
        })
        .collect();

    let mut out = Array3::<f64>::zeros((kept.len(), n_ch, len));
    for (e, (start, _)) in kept.iter().enumerate() {
        out.slice_mut(s![e, .., ..]).assign(&data.slice(s![.., *start..*start + len]));
    }
    Epochs {
        data: out,
        codes: kept.iter().map(|(_, ev)| ev.code).collect(),
        sfreq,
        tmin: first as f64 / sfreq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(index: usize, code: i64, start: f64) -> CueWindow {
        CueWindow { index, code: LabelCode(code), start_time: start, end_time: start + 1.0 }
    }

    #[test]
    fn events_round_to_nearest_sample() {
        let ev = events_from_windows(&[window(0, 769, 1.004), window(1, 770, 2.0)], 250.0, "f").unwrap();
        assert_eq!(ev[0].sample, 251);
        assert_eq!(ev[1].sample, 500);
    }

    #[test]
    fn duplicate_event_samples_rejected() {
        let err = events_from_windows(&[window(0, 769, 1.0), window(1, 770, 1.001)], 250.0, "A01T.gdf")
            .unwrap_err();
        assert!(matches!(err, ConvertError::MalformedRecording { .. }));
        assert!(err.to_string().contains("not unique"));
    }

    #[test]
    fn epoch_shape_and_content() {
        let data = Array2::from_shape_fn((2, 100), |(c, t)| (c * 1000 + t) as f64);
        let events = [Event { sample: 20, code: LabelCode(1) }, Event { sample: 50, code: LabelCode(2) }];
        let ep = epochs_around(&data, &events, 10.0, -1.0, 2.0);
        assert_eq!(ep.data.dim(), (2, 2, 31));
        assert_eq!(ep.data[[0, 0, 0]], 10.0);
        assert_eq!(ep.data[[1, 1, 30]], 1070.0);
        approx::assert_abs_diff_eq!(ep.times()[10], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_epochs_dropped() {
        let data = Array2::<f64>::zeros((1, 100));
        let events = [
            Event { sample: 5, code: LabelCode(1) },
            Event { sample: 50, code: LabelCode(1) },
            Event { sample: 95, code: LabelCode(2) },
        ];
        let ep = epochs_around(&data, &events, 10.0, -1.0, 1.0);
        assert_eq!(ep.len(), 1);
        assert_eq!(ep.codes, vec![LabelCode(1)]);
    }

    #[test]
    fn select_by_code() {
        let data = Array2::<f64>::ones((1, 200));
        let events = [
            Event { sample: 50, code: LabelCode(1) },
            Event { sample: 100, code: LabelCode(2) },
            Event { sample: 150, code: LabelCode(1) },
        ];
        let ep = epochs_around(&data, &events, 10.0, 0.0, 1.0);
        assert_eq!(ep.select(LabelCode(1)).dim().0, 2);
        assert_eq!(ep.select(LabelCode(3)).dim().0, 0);
    }
}
