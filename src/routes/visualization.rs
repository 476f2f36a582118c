// src/routes/visualization.rs

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use sqlx::{Postgres, QueryBuilder};

use crate::{
    db,
    error::ApiError,
    filters::{CompoundFilter, CompoundQuery, Property},
    models::{
        Bucket, BucketRow, Histogram, MoleculeTypeCount, PropertyStats, ScatterPoint, StatsRow,
        VisualizationData, LOGP_HISTOGRAM, SCATTER_LIMIT, WEIGHT_HISTOGRAM,
    },
    AppState,
};

const POPULATION_FROM: &str = r#"
    FROM molecule_dictionary md
    LEFT JOIN compound_properties cp ON md.molregno = cp.molregno"#;

/// Buckets every non-null value of `property`. Values outside the layout
/// land in the open buckets 0 and `buckets + 1`, so the counts always add up
/// to the number of known values.
pub(crate) fn histogram_query(
    filter: &CompoundFilter,
    property: Property,
    layout: Histogram,
) -> QueryBuilder<'static, Postgres> {
    let column = property.column();
    let mut qb = QueryBuilder::new(format!("SELECT width_bucket({column}::float8, "));
    qb.push_bind(layout.low)
        .push(", ")
        .push_bind(layout.high)
        .push(", ")
        .push_bind(layout.buckets)
        .push(format!(
            r#") AS bucket,
    COUNT(*)              AS count,
    MIN({column})::float8 AS min_value,
    MAX({column})::float8 AS max_value"#
        ))
        .push(POPULATION_FROM);
    filter.push_where(&mut qb);
    qb.push(format!(" AND {column} IS NOT NULL GROUP BY bucket ORDER BY bucket"));
    qb
}

pub(crate) fn molecule_type_query(filter: &CompoundFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT md.molecule_type, COUNT(*) AS count");
    qb.push(POPULATION_FROM);
    filter.push_where(&mut qb);
    qb.push(" GROUP BY md.molecule_type ORDER BY count DESC, md.molecule_type");
    qb
}

pub(crate) fn scatter_query(filter: &CompoundFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT md.chembl_id, cp.full_mwt::float8 AS full_mwt, cp.alogp::float8 AS alogp",
    );
    qb.push(POPULATION_FROM);
    filter.push_where(&mut qb);
    qb.push(" AND cp.full_mwt IS NOT NULL AND cp.alogp IS NOT NULL ORDER BY md.chembl_id LIMIT ")
        .push_bind(SCATTER_LIMIT);
    qb
}

/// Always one row: an aggregate without GROUP BY.
pub(crate) fn stats_query(filter: &CompoundFilter, property: Property) -> QueryBuilder<'static, Postgres> {
    let c = property.column();
    let mut qb = QueryBuilder::new(format!(
        r#"SELECT COUNT({c}) AS "count",
    MIN({c})::float8 AS "min",
    percentile_cont(0.25) WITHIN GROUP (ORDER BY {c}) AS "q1",
    percentile_cont(0.5)  WITHIN GROUP (ORDER BY {c}) AS "median",
    percentile_cont(0.75) WITHIN GROUP (ORDER BY {c}) AS "q3",
    MAX({c})::float8 AS "max""#
    ));
    qb.push(POPULATION_FROM);
    filter.push_where(&mut qb);
    qb
}

// GET /api/visualization-data
pub async fn get_visualization_data(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<VisualizationData>, ApiError> {
    let Query(pairs) = query?;
    let q = CompoundQuery::from_pairs(pairs)?;
    let filter = q.filter()?;
    let t = state.query_timeout;
    let pool = &state.pool;

    let mut weights_qb = histogram_query(&filter, Property::MolWeight, WEIGHT_HISTOGRAM);
    let mut logp_qb = histogram_query(&filter, Property::LogP, LOGP_HISTOGRAM);
    let mut types_qb = molecule_type_query(&filter);
    let mut scatter_qb = scatter_query(&filter);
    let mut hbd_qb = stats_query(&filter, Property::Hbd);
    let mut hba_qb = stats_query(&filter, Property::Hba);

    let (weights, logp, types, scatter, hbd, hba) = tokio::try_join!(
        db::timed(t, weights_qb.build_query_as::<BucketRow>().fetch_all(pool)),
        db::timed(t, logp_qb.build_query_as::<BucketRow>().fetch_all(pool)),
        db::timed(t, types_qb.build_query_as::<MoleculeTypeCount>().fetch_all(pool)),
        db::timed(t, scatter_qb.build_query_as::<ScatterPoint>().fetch_all(pool)),
        db::timed(t, hbd_qb.build_query_as::<StatsRow>().fetch_one(pool)),
        db::timed(t, hba_qb.build_query_as::<StatsRow>().fetch_one(pool)),
    )?;

    tracing::debug!(
        filtered = !filter.is_empty(),
        weight_buckets = weights.len(),
        scatter_points = scatter.len(),
        "visualization data"
    );
    Ok(Json(VisualizationData {
        molecular_weights: weights.into_iter().map(|r| Bucket::new(r, &WEIGHT_HISTOGRAM)).collect(),
        molecule_types: types,
        log_p_distribution: logp.into_iter().map(|r| Bucket::new(r, &LOGP_HISTOGRAM)).collect(),
        weight_vs_log_p: scatter,
        hbd_hba_distribution: vec![
            PropertyStats { property: Property::Hbd.param_prefix(), stats: hbd },
            PropertyStats { property: Property::Hba.param_prefix(), stats: hba },
        ],
    }))
}
