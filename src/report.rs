//! Per-clip summary table: CSV export and the modality/condition ordering
//! used for bar charts.
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::dsp::VitalsError;
use crate::types::{RejectReason, SummaryRow};

const MODALITIES: [&str; 2] = ["face", "palm"];
const CONDITIONS: [&str; 3] = ["rest", "exercise", "breath"];

/// Recording site and protocol step named in a clip label such as
/// `S01_rest_face`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClipTag {
    pub modality: Option<&'static str>,
    pub condition: Option<&'static str>,
}

impl ClipTag {
    pub fn from_label(label: &str) -> Self {
        let mut tag = ClipTag::default();
        for token in label.split(|c: char| !c.is_ascii_alphanumeric()) {
            let pick = |names: &[&'static str]| names.iter().copied().find(|n| n.eq_ignore_ascii_case(token));
            tag.modality = tag.modality.or_else(|| pick(&MODALITIES));
            tag.condition = tag.condition.or_else(|| pick(&CONDITIONS));
        }
        tag
    }

    /// Face before palm, then rest, exercise, breath; untagged clips last.
    fn sort_key(&self) -> (usize, usize) {
        let rank = |names: &[&str], value: Option<&str>| {
            value
                .and_then(|v| names.iter().position(|n| *n == v))
                .unwrap_or(names.len())
        };
        (rank(&MODALITIES, self.modality), rank(&CONDITIONS, self.condition))
    }
}

/// Rows in chart order. The sort is stable, so clips with equal tags keep
/// their input order.
pub fn display_order(rows: &[SummaryRow]) -> Vec<&SummaryRow> {
    let mut ordered: Vec<&SummaryRow> = rows.iter().collect();
    ordered.sort_by_key(|row| ClipTag::from_label(&row.label).sort_key());
    ordered
}

/// One flat CSV line of the summary table. Missing metrics are empty cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub label: String,
    pub modality: Option<String>,
    pub condition: Option<String>,
    pub ok: bool,
    pub reason: Option<RejectReason>,
    pub fs: f64,
    pub frames: usize,
    pub hr_bpm: Option<f64>,
    pub rmssd: Option<f64>,
    pub sdnn: Option<f64>,
    pub rr_bpm: Option<f64>,
    pub spo2_index: Option<f64>,
}

impl From<&SummaryRow> for SummaryRecord {
    fn from(row: &SummaryRow) -> Self {
        let tag = ClipTag::from_label(&row.label);
        let result = &row.result;
        Self {
            label: row.label.clone(),
            modality: tag.modality.map(str::to_owned),
            condition: tag.condition.map(str::to_owned),
            ok: result.ok(),
            reason: result.reason(),
            fs: result.sampling_rate(),
            frames: result.frame_count(),
            hr_bpm: result.hr_bpm(),
            rmssd: result.rmssd_s(),
            sdnn: result.sdnn_s(),
            rr_bpm: result.rr_bpm(),
            spo2_index: result.spo2_index(),
        }
    }
}

/// Write one CSV record per clip, rejected clips included, in input order.
pub fn write_summary_csv<W: Write>(rows: &[SummaryRow], out: W) -> Result<(), VitalsError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(SummaryRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
}
