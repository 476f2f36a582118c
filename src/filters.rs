// src/filters.rs
//
// Query-string parameters for the compound list and the chart data, turned
// into a validated filter that renders itself as bound SQL predicates.

use sqlx::{Postgres, QueryBuilder};

use crate::error::ApiError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw parameters as they arrive. Everything is a string so that empty
/// values can be treated as absent and malformed ones reported by name.
///
/// Each range can also come as a two-value `<prop>Range[]` list, which is
/// how the dashboard's sliders serialize.
#[derive(Debug, Default)]
pub struct CompoundQuery {
    pub search: Option<String>,
    pub mol_weight_min: Option<String>,
    pub mol_weight_max: Option<String>,
    pub log_p_min: Option<String>,
    pub log_p_max: Option<String>,
    pub hbd_min: Option<String>,
    pub hbd_max: Option<String>,
    pub hba_min: Option<String>,
    pub hba_max: Option<String>,
    pub psa_min: Option<String>,
    pub psa_max: Option<String>,
    pub rtb_min: Option<String>,
    pub rtb_max: Option<String>,
    pub tpsa_min: Option<String>,
    pub tpsa_max: Option<String>,
    pub max_phase: Option<String>,
    pub molecule_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub mol_weight_range: Vec<String>,
    pub log_p_range: Vec<String>,
    pub hbd_range: Vec<String>,
    pub hba_range: Vec<String>,
    pub psa_range: Vec<String>,
    pub rtb_range: Vec<String>,
    pub tpsa_range: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    MolWeight,
    LogP,
    Hbd,
    Hba,
    Psa,
    Rtb,
    Tpsa,
}

impl Property {
    pub fn column(self) -> &'static str {
        match self {
            Self::MolWeight => "cp.full_mwt",
            Self::LogP => "cp.alogp",
            Self::Hbd => "cp.hbd",
            Self::Hba => "cp.hba",
            Self::Psa => "cp.psa",
            Self::Rtb => "cp.rtb",
            Self::Tpsa => "cp.tpsa",
        }
    }

    pub fn param_prefix(self) -> &'static str {
        match self {
            Self::MolWeight => "molWeight",
            Self::LogP => "logP",
            Self::Hbd => "hbd",
            Self::Hba => "hba",
            Self::Psa => "psa",
            Self::Rtb => "rtb",
            Self::Tpsa => "tpsa",
        }
    }
}

/// Inclusive bounds on one property; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    pub property: Property,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundFilter {
    pub search: Option<String>,
    pub ranges: Vec<RangeFilter>,
    pub max_phase: Option<i32>,
    pub molecule_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    let Some(s) = present(raw) else { return Ok(None) };
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(ApiError::invalid(format!("{name} must be a finite number, got '{s}'"))),
    }
}

fn parse_int(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(s) = present(raw) else { return Ok(None) };
    s.parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::invalid(format!("{name} must be an integer, got '{s}'")))
}

/// `%`, `_` and `\` are LIKE metacharacters; the search is a plain substring.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl CompoundQuery {
    /// Builds the raw parameters from decoded query-string pairs. Unknown
    /// keys are ignored; a scalar key given twice is rejected.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut q = Self::default();
        for (key, value) in pairs {
            let base = key.strip_suffix("[]").unwrap_or(&key);
            if let Some(list) = q.range_list(base) {
                list.push(value);
                continue;
            }
            let slot = match base {
                "search" => &mut q.search,
                "molWeightMin" => &mut q.mol_weight_min,
                "molWeightMax" => &mut q.mol_weight_max,
                "logPMin" => &mut q.log_p_min,
                "logPMax" => &mut q.log_p_max,
                "hbdMin" => &mut q.hbd_min,
                "hbdMax" => &mut q.hbd_max,
                "hbaMin" => &mut q.hba_min,
                "hbaMax" => &mut q.hba_max,
                "psaMin" => &mut q.psa_min,
                "psaMax" => &mut q.psa_max,
                "rtbMin" => &mut q.rtb_min,
                "rtbMax" => &mut q.rtb_max,
                "tpsaMin" => &mut q.tpsa_min,
                "tpsaMax" => &mut q.tpsa_max,
                "maxPhase" => &mut q.max_phase,
                "moleculeType" => &mut q.molecule_type,
                "page" => &mut q.page,
                "limit" => &mut q.limit,
                _ => continue,
            };
            if slot.is_some() {
                return Err(ApiError::invalid(format!("{base} given more than once")));
            }
            *slot = Some(value);
        }
        Ok(q)
    }

    fn range_list(&mut self, key: &str) -> Option<&mut Vec<String>> {
        match key {
            "molWeightRange" => Some(&mut self.mol_weight_range),
            "logPRange" => Some(&mut self.log_p_range),
            "hbdRange" => Some(&mut self.hbd_range),
            "hbaRange" => Some(&mut self.hba_range),
            "psaRange" => Some(&mut self.psa_range),
            "rtbRange" => Some(&mut self.rtb_range),
            "tpsaRange" => Some(&mut self.tpsa_range),
            _ => None,
        }
    }

    pub fn filter(&self) -> Result<CompoundFilter, ApiError> {
        let props = [
            (Property::MolWeight, &self.mol_weight_min, &self.mol_weight_max, &self.mol_weight_range),
            (Property::LogP, &self.log_p_min, &self.log_p_max, &self.log_p_range),
            (Property::Hbd, &self.hbd_min, &self.hbd_max, &self.hbd_range),
            (Property::Hba, &self.hba_min, &self.hba_max, &self.hba_range),
            (Property::Psa, &self.psa_min, &self.psa_max, &self.psa_range),
            (Property::Rtb, &self.rtb_min, &self.rtb_max, &self.rtb_range),
            (Property::Tpsa, &self.tpsa_min, &self.tpsa_max, &self.tpsa_range),
        ];

        let mut ranges = Vec::new();
        for (property, raw_min, raw_max, pair) in props {
            let prefix = property.param_prefix();
            let (min, max) = if pair.is_empty() {
                (
                    parse_bound(&format!("{prefix}Min"), raw_min.as_deref())?,
                    parse_bound(&format!("{prefix}Max"), raw_max.as_deref())?,
                )
            } else {
                if raw_min.is_some() || raw_max.is_some() {
                    return Err(ApiError::invalid(format!(
                        "use either {prefix}Range[] or {prefix}Min/{prefix}Max, not both"
                    )));
                }
                let [lo, hi] = pair.as_slice() else {
                    return Err(ApiError::invalid(format!(
                        "{prefix}Range[] takes exactly 2 values, got {}",
                        pair.len()
                    )));
                };
                (
                    parse_bound(&format!("{prefix}Range[0]"), Some(lo.as_str()))?,
                    parse_bound(&format!("{prefix}Range[1]"), Some(hi.as_str()))?,
                )
            };
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    return Err(ApiError::invalid(format!(
                        "{prefix} lower bound ({lo}) must not exceed upper bound ({hi})"
                    )));
                }
            }
            if min.is_some() || max.is_some() {
                ranges.push(RangeFilter { property, min, max });
            }
        }

        let max_phase = match parse_int("maxPhase", self.max_phase.as_deref())? {
            Some(p) if (0..=4).contains(&p) => Some(p as i32),
            Some(p) => return Err(ApiError::invalid(format!("maxPhase must be between 0 and 4, got {p}"))),
            None => None,
        };

        Ok(CompoundFilter {
            search: present(self.search.as_deref()).map(str::to_owned),
            ranges,
            max_phase,
            molecule_type: present(self.molecule_type.as_deref()).map(str::to_owned),
        })
    }

    /// `page < 1` is clamped to the first page, `limit` is capped at
    /// [`MAX_LIMIT`]; a non-positive `limit` is rejected.
    pub fn pagination(&self) -> Result<Pagination, ApiError> {
        let page = parse_int("page", self.page.as_deref())?.unwrap_or(DEFAULT_PAGE).max(1);
        let limit = match parse_int("limit", self.limit.as_deref())? {
            None => DEFAULT_LIMIT,
            Some(l) if l <= 0 => {
                return Err(ApiError::invalid(format!("limit must be positive, got {l}")))
            }
            Some(l) => l.min(MAX_LIMIT),
        };
        if (page - 1).checked_mul(limit).is_none() {
            return Err(ApiError::invalid(format!("page {page} is out of range")));
        }
        Ok(Pagination { page, limit })
    }
}

impl CompoundFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.ranges.is_empty()
            && self.max_phase.is_none()
            && self.molecule_type.is_none()
    }

    /// Appends ` WHERE ...` to `qb`. Expects `md` (molecule_dictionary) and
    /// `cp` (compound_properties) to be in scope. Every predicate is ANDed,
    /// so adding a filter can only narrow the result.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (md.chembl_id ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR md.pref_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        for range in &self.ranges {
            let column = range.property.column();
            if let Some(min) = range.min {
                qb.push(format!(" AND {column} >= ")).push_bind(min);
            }
            if let Some(max) = range.max {
                qb.push(format!(" AND {column} <= ")).push_bind(max);
            }
        }

        if let Some(phase) = self.max_phase {
            qb.push(" AND md.max_phase = ").push_bind(phase);
        }

        if let Some(kind) = &self.molecule_type {
            qb.push(" AND md.molecule_type = ").push_bind(kind.clone());
        }
    }
}
