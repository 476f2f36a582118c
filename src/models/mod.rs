// src/models/mod.rs

use serde::Serialize;
use sqlx::FromRow;

// ───────────────────────────────────────
// Compounds
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CompoundSummary {
    pub molregno: i64,
    pub chembl_id: String,
    pub pref_name: Option<String>,
    pub max_phase: Option<i32>,          // 0..=4
    pub molecule_type: Option<String>,
    pub full_mwt: Option<f64>,
    pub alogp: Option<f64>,
    pub hbd: Option<i32>,
    pub hba: Option<i32>,
    pub psa: Option<f64>,
    pub rtb: Option<i32>,
    pub tpsa: Option<f64>,
    pub canonical_smiles: Option<String>,
    pub development_phase: Option<i32>,
    pub mechanism_of_action: Option<String>,
    pub target_names: Option<String>,    // "a, b, c"
}

/// The compound columns of the detail view; targets and activities are
/// fetched separately and attached in [`CompoundDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CompoundRecord {
    pub molregno: i64,
    pub chembl_id: String,
    pub pref_name: Option<String>,
    pub max_phase: Option<i32>,
    pub molecule_type: Option<String>,
    pub full_mwt: Option<f64>,
    pub alogp: Option<f64>,
    pub hbd: Option<i32>,
    pub hba: Option<i32>,
    pub psa: Option<f64>,
    pub rtb: Option<i32>,
    pub tpsa: Option<f64>,
    pub canonical_smiles: Option<String>,
    pub development_phase: Option<i32>,
    pub mechanism_of_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Target {
    pub target_name: Option<String>,
    pub target_type: Option<String>,
    pub organism: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Activity {
    pub activity_id: i64,
    pub standard_type: Option<String>,
    pub standard_value: Option<f64>,
    pub standard_units: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompoundDetail {
    #[serde(flatten)]
    pub compound: CompoundRecord,
    pub targets: Vec<Target>,
    pub activities: Vec<Activity>,
}

// ───────────────────────────────────────
// Aggregates for the charts
// ───────────────────────────────────────

/// Equal-width `width_bucket` layout over `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Histogram {
    pub low: f64,
    pub high: f64,
    pub buckets: i32,
}

pub const WEIGHT_HISTOGRAM: Histogram = Histogram { low: 0.0, high: 1000.0, buckets: 20 };
pub const LOGP_HISTOGRAM: Histogram = Histogram { low: -10.0, high: 10.0, buckets: 20 };

/// Upper bound on scatter points returned per request.
pub const SCATTER_LIMIT: i64 = 2000;

impl Histogram {
    /// Nominal `[start, end)` of a bucket index. Bucket 0 holds everything
    /// below `low` and `buckets + 1` everything at or above `high`, so those
    /// sides are open.
    pub fn bounds(&self, bucket: i32) -> (Option<f64>, Option<f64>) {
        let width = (self.high - self.low) / f64::from(self.buckets);
        let edge = |i: i32| self.low + width * f64::from(i);

        if bucket <= 0 {
            (None, Some(self.low))
        } else if bucket > self.buckets {
            (Some(self.high), None)
        } else {
            (Some(edge(bucket - 1)), Some(edge(bucket)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BucketRow {
    pub bucket: i32,
    pub count: i64,
    pub min_value: Option<f64>,   // observed
    pub max_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    #[serde(flatten)]
    pub row: BucketRow,
    pub range_start: Option<f64>,
    pub range_end: Option<f64>,
}

impl Bucket {
    pub fn new(row: BucketRow, histogram: &Histogram) -> Self {
        let (range_start, range_end) = histogram.bounds(row.bucket);
        Self { row, range_start, range_end }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MoleculeTypeCount {
    pub molecule_type: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ScatterPoint {
    pub chembl_id: String,
    pub full_mwt: f64,
    pub alogp: f64,
}

/// Five-number summary of one property; all null when nothing is known.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StatsRow {
    pub count: i64,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyStats {
    pub property: &'static str,
    #[serde(flatten)]
    pub stats: StatsRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationData {
    pub molecular_weights: Vec<Bucket>,
    pub molecule_types: Vec<MoleculeTypeCount>,
    pub log_p_distribution: Vec<Bucket>,
    pub weight_vs_log_p: Vec<ScatterPoint>,
    pub hbd_hba_distribution: Vec<PropertyStats>,
}
