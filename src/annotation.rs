//! Annotation → cue-window extraction and labelling.
//!
//! ```text
//! annotations (chronological, any description type)
//!   │
//!   ├─ normalize_label()      text / numeric → LabelCode   (single choke point)
//!   ├─ accepted-set filter    rejected annotations vanish, no index consumed
//!   ├─ extract_windows()      CueWindow { index 0..k-1, start, end }
//!   └─ label_windows()        LabeledWindow { class name }, Lookup error if unmapped
//! ```
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

// ── Label codes ───────────────────────────────────────────────────────────

/// Canonical integer event code (e.g. `769` = cue onset left in BCI IV).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelCode(pub i64);

impl fmt::Display for LabelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LabelCode {
    fn from(v: i64) -> Self {
        LabelCode(v)
    }
}

/// Annotation description exactly as the decoder produced it.
///
/// GDF event tables carry numeric codes, EDF+ TALs carry text.
#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    Code(i64),
    Text(String),
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Description::Code(c) => write!(f, "{c}"),
            Description::Text(s) => f.write_str(s),
        }
    }
}

/// Normalise a description to a [`LabelCode`].
///
/// Numeric codes pass through. Text is trimmed, may carry a leading `+`,
/// and must be an integer or an integral float (`"769"`, `" 769 "`,
/// `"769.0"`). Returns `None` for anything else.
pub fn normalize_label(description: &Description) -> Option<LabelCode> {
    match description {
        Description::Code(c) => Some(LabelCode(*c)),
        Description::Text(text) => {
            let s = text.trim();
            let s = s.strip_prefix('+').unwrap_or(s);
            if let Ok(v) = s.parse::<i64>() {
                return Some(LabelCode(v));
            }
            match s.parse::<f64>() {
                Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                    Some(LabelCode(v as i64))
                }
                _ => None,
            }
        }
    }
}

// ── Annotations ───────────────────────────────────────────────────────────

/// A timestamped label attached to a span of a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Seconds from the start of the recording.
    pub onset: f64,
    /// Seconds; `0.0` for point events.
    pub duration: f64,
    pub description: Description,
}

impl Annotation {
    pub fn new(onset: f64, duration: f64, description: Description) -> Self {
        Self { onset, duration, description }
    }

    #[inline]
    pub fn code(&self) -> Option<LabelCode> {
        normalize_label(&self.description)
    }
}

/// Seconds added around every cue before cropping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPadding {
    pub before: f64,
    pub after: f64,
}

/// One accepted cue: where to crop and which sequential index it received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueWindow {
    pub index: usize,
    pub code: LabelCode,
    pub start_time: f64,
    pub end_time: f64,
}

impl CueWindow {
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A [`CueWindow`] with its human-readable class name resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledWindow {
    pub window: CueWindow,
    pub label_name: String,
}

/// Extract the accepted cue windows, `[onset, onset + duration]`.
pub fn extract_windows(annotations: &[Annotation], accepted: &BTreeSet<LabelCode>) -> Vec<CueWindow> {
    extract_windows_padded(annotations, accepted, WindowPadding::default())
}

/// Like [`extract_windows`] with `padding` seconds added before and after each cue.
pub fn extract_windows_padded(
    annotations: &[Annotation],
    accepted: &BTreeSet<LabelCode>,
    padding: WindowPadding,
) -> Vec<CueWindow> {
    if accepted.is_empty() {
        return Vec::new();
    }
    let mut windows = Vec::new();
    for (pos, ann) in annotations.iter().enumerate() {
        let Some(code) = ann.code() else {
            log::debug!("ignoring non-numeric annotation #{pos}: {:?}", ann.description.to_string());
            continue;
        };
        if !accepted.contains(&code) {
            log::debug!("ignoring annotation #{pos}: code {code} not accepted");
            continue;
        }
        windows.push(CueWindow {
            index: windows.len(),
            code,
            start_time: ann.onset - padding.before,
            end_time: ann.onset + ann.duration + padding.after,
        });
    }
    windows
}

// ── Label map ─────────────────────────────────────────────────────────────

/// Label code → class name (used only for output folder names).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(pub BTreeMap<LabelCode, String>);

impl LabelMap {
    /// Event descriptions of the BCI Competition IV 2a/2b datasets.
    pub fn bci_competition_iv() -> Self {
        let entries: [(i64, &str); 13] = [
            (276, "Idling EEG (eyes open)"),
            (277, "Idling EEG (eyes closed)"),
            (768, "Start of a trial"),
            (769, "Cue onset left (class 1)"),
            (770, "Cue onset right (class 2)"),
            (781, "BCI feedback (continuous)"),
            (783, "Cue unknown"),
            (1023, "Rejected trial"),
            (1077, "Horizontal eye movement"),
            (1078, "Vertical eye movement"),
            (1079, "Eye rotation"),
            (1081, "Eye blinks"),
            (32766, "Start of a new run"),
        ];
        LabelMap(entries.iter().map(|&(c, n)| (LabelCode(c), n.to_string())).collect())
    }

    pub fn get(&self, code: LabelCode) -> Option<&str> {
        self.0.get(&code).map(String::as_str)
    }

    /// Resolve `code`, failing with [`ConvertError::Lookup`] when unmapped.
    pub fn name_of(&self, code: LabelCode, file: &str) -> Result<&str> {
        self.get(code).ok_or_else(|| ConvertError::Lookup { file: file.to_string(), code })
    }

    pub fn insert(&mut self, code: LabelCode, name: impl Into<String>) {
        self.0.insert(code, name.into());
    }
}

impl<S: Into<String>> FromIterator<(LabelCode, S)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (LabelCode, S)>>(iter: I) -> Self {
        LabelMap(iter.into_iter().map(|(c, s)| (c, s.into())).collect())
    }
}

/// Attach class names to windows; the first unmapped code aborts.
pub fn label_windows(windows: &[CueWindow], labels: &LabelMap, file: &str) -> Result<Vec<LabeledWindow>> {
    windows
        .iter()
        .map(|w| {
            let name = labels.name_of(w.code, file)?;
            Ok(LabeledWindow { window: *w, label_name: name.to_string() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(onset: f64, duration: f64, s: &str) -> Annotation {
        Annotation::new(onset, duration, Description::Text(s.to_string()))
    }

    fn codes(c: &[i64]) -> BTreeSet<LabelCode> {
        c.iter().copied().map(LabelCode).collect()
    }

    #[test]
    fn normalize_accepts_numeric_and_text_forms() {
        let expected = Some(LabelCode(769));
        assert_eq!(normalize_label(&Description::Code(769)), expected);
        assert_eq!(normalize_label(&Description::Text("769".into())), expected);
        assert_eq!(normalize_label(&Description::Text(" 769 ".into())), expected);
        assert_eq!(normalize_label(&Description::Text("+769".into())), expected);
        assert_eq!(normalize_label(&Description::Text("769.0".into())), expected);
    }

    #[test]
    fn normalize_is_idempotent() {
        for c in [0_i64, 276, 769, 32766] {
            let once = normalize_label(&Description::Code(c)).unwrap();
            let twice = normalize_label(&Description::Code(once.0)).unwrap();
            let via_text = normalize_label(&Description::Text(once.to_string())).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once, via_text);
        }
    }

    #[test]
    fn normalize_rejects_non_numeric() {
        assert_eq!(normalize_label(&Description::Text("Recording starts".into())), None);
        assert_eq!(normalize_label(&Description::Text("769.5".into())), None);
        assert_eq!(normalize_label(&Description::Text("".into())), None);
    }

    #[test]
    fn cue_left_round_trip() {
        let anns = vec![text(10.0, 1.25, "769")];
        let labels: LabelMap = [(LabelCode(769), "Cue Left"), (LabelCode(770), "Cue Right")]
            .into_iter()
            .collect();
        let windows = extract_windows(&anns, &codes(&[769, 770]));
        let labeled = label_windows(&windows, &labels, "B0101T.gdf").unwrap();
        assert_eq!(labeled.len(), 1);
        let w = &labeled[0];
        assert_eq!(w.window.index, 0);
        assert_eq!(w.window.start_time, 10.0);
        assert_eq!(w.window.end_time, 11.25);
        assert_eq!(w.label_name, "Cue Left");
    }

    #[test]
    fn rejected_codes_leave_no_index_gap() {
        let anns = vec![
            Annotation::new(1.0, 0.0, Description::Code(32766)),
            Annotation::new(2.0, 1.0, Description::Code(769)),
            Annotation::new(3.0, 0.0, Description::Code(32766)),
            Annotation::new(4.0, 1.0, Description::Code(769)),
        ];
        let windows = extract_windows(&anns, &codes(&[769]));
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].index, 0);
        assert_eq!(windows[0].start_time, 2.0);
        assert_eq!(windows[1].index, 1);
        assert_eq!(windows[1].start_time, 4.0);
    }

    #[test]
    fn only_accepted_codes_in_order() {
        let anns: Vec<Annotation> = [768, 769, 1023, 770, 769, 783]
            .iter()
            .enumerate()
            .map(|(i, &c)| Annotation::new(i as f64, 0.5, Description::Code(c)))
            .collect();
        let accepted = codes(&[769, 770]);
        let windows = extract_windows(&anns, &accepted);
        let got: Vec<i64> = windows.iter().map(|w| w.code.0).collect();
        assert_eq!(got, vec![769, 770, 769]);
        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.index, i);
            assert!(accepted.contains(&w.code));
        }
        assert!(windows.windows(2).all(|p| p[0].start_time < p[1].start_time));
    }

    #[test]
    fn empty_accepted_set_yields_nothing() {
        let anns = vec![text(1.0, 1.0, "769"), text(2.0, 1.0, "770")];
        assert!(extract_windows(&anns, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn padding_widens_window() {
        let anns = vec![text(10.0, 1.25, "769")];
        let pad = WindowPadding { before: 0.5, after: 0.25 };
        let w = extract_windows_padded(&anns, &codes(&[769]), pad)[0];
        approx::assert_abs_diff_eq!(w.start_time, 9.5);
        approx::assert_abs_diff_eq!(w.end_time, 11.5);
        approx::assert_abs_diff_eq!(w.duration(), 2.0);
    }

    #[test]
    fn unmapped_accepted_code_is_lookup_error() {
        let anns = vec![Annotation::new(0.0, 1.0, Description::Code(1072))];
        let windows = extract_windows(&anns, &codes(&[1072]));
        let err = label_windows(&windows, &LabelMap::bci_competition_iv(), "A09T.gdf").unwrap_err();
        assert!(matches!(err, ConvertError::Lookup { code: LabelCode(1072), .. }));
    }

    #[test]
    fn rejected_codes_are_never_looked_up() {
        // 1072 is not in the map but is not accepted either.
        let anns = vec![
            Annotation::new(0.0, 1.0, Description::Code(1072)),
            Annotation::new(1.0, 1.0, Description::Code(769)),
        ];
        let windows = extract_windows(&anns, &codes(&[769]));
        let labeled = label_windows(&windows, &LabelMap::bci_competition_iv(), "A09T.gdf").unwrap();
        assert_eq!(labeled[0].label_name, "Cue onset left (class 1)");
    }
}
