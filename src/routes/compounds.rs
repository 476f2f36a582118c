// src/routes/compounds.rs

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use sqlx::{query_as, Postgres, QueryBuilder};

use crate::{
    db,
    error::ApiError,
    filters::{CompoundFilter, CompoundQuery, Pagination},
    models::{Activity, CompoundDetail, CompoundRecord, CompoundSummary, Target},
    AppState,
};

// Numeric columns are cast so rows decode the same whatever NUMERIC
// precision the store declares.
const COMPOUND_COLUMNS: &str = r#"
    md.molregno::int8        AS molregno,
    md.chembl_id,
    md.pref_name,
    md.max_phase::int4       AS max_phase,
    md.molecule_type,
    cp.full_mwt::float8      AS full_mwt,
    cp.alogp::float8         AS alogp,
    cp.hbd::int4             AS hbd,
    cp.hba::int4             AS hba,
    cp.psa::float8           AS psa,
    cp.rtb::int4             AS rtb,
    cp.tpsa::float8          AS tpsa,
    cs.canonical_smiles,
    (SELECT d.development_phase::int4
       FROM drug_development_phase d
      WHERE d.molregno = md.molregno
      LIMIT 1)               AS development_phase,
    (SELECT moa.mechanism_of_action
       FROM drug_mechanism dm
       JOIN mechanism_refs moa ON dm.mec_id = moa.mec_id
      WHERE dm.molregno = md.molregno
      ORDER BY dm.mec_id
      LIMIT 1)               AS mechanism_of_action"#;

const TARGET_NAMES_COLUMN: &str = r#",
    (SELECT STRING_AGG(DISTINCT t.pref_name, ', ' ORDER BY t.pref_name)
       FROM drug_indication di
       JOIN target_dictionary t ON di.target_id = t.tid
      WHERE di.molregno = md.molregno) AS target_names"#;

const COMPOUND_FROM: &str = r#"
    FROM molecule_dictionary md
    LEFT JOIN compound_properties cp ON md.molregno = cp.molregno
    LEFT JOIN compound_structures cs ON md.molregno = cs.molregno"#;

const TARGETS_SQL: &str = r#"
    SELECT DISTINCT t.pref_name AS target_name, t.target_type, t.organism
      FROM drug_indication di
      JOIN target_dictionary t ON di.target_id = t.tid
     WHERE di.molregno = $1
     ORDER BY target_name, target_type, organism"#;

const ACTIVITIES_SQL: &str = r#"
    SELECT a.activity_id::int8      AS activity_id,
           a.standard_type,
           a.standard_value::float8 AS standard_value,
           a.standard_units
      FROM activities a
     WHERE a.molregno = $1
     ORDER BY a.activity_id"#;

/// One page of compound summaries, ordered by ChEMBL id so that walking the
/// pages visits every match exactly once.
pub(crate) fn list_query(filter: &CompoundFilter, page: Pagination) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT");
    qb.push(COMPOUND_COLUMNS).push(TARGET_NAMES_COLUMN).push(COMPOUND_FROM);
    filter.push_where(&mut qb);
    qb.push(" ORDER BY md.chembl_id ASC, md.molregno ASC");
    qb.push(" LIMIT ").push_bind(page.limit);
    qb.push(" OFFSET ").push_bind(page.offset());
    qb
}

fn detail_sql() -> String {
    format!("SELECT{COMPOUND_COLUMNS}{COMPOUND_FROM}\n    WHERE md.chembl_id = $1")
}

// GET /api/compounds
pub async fn list_compounds(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<CompoundSummary>>, ApiError> {
    let Query(pairs) = query?;
    let q = CompoundQuery::from_pairs(pairs)?;
    let filter = q.filter()?;
    let page = q.pagination()?;

    let mut qb = list_query(&filter, page);
    let rows = db::timed(
        state.query_timeout,
        qb.build_query_as::<CompoundSummary>().fetch_all(&state.pool),
    )
    .await?;

    tracing::debug!(page = page.page, limit = page.limit, returned = rows.len(), "compound search");
    Ok(Json(rows))
}

// GET /api/compounds/:chembl_id
pub async fn get_compound(
    State(state): State<AppState>,
    Path(chembl_id): Path<String>,
) -> Result<Json<CompoundDetail>, ApiError> {
    let sql = detail_sql();
    let compound = db::timed(
        state.query_timeout,
        query_as::<_, CompoundRecord>(&sql)
            .bind(&chembl_id)
            .fetch_optional(&state.pool),
    )
    .await?
    .ok_or(ApiError::NotFound)?;

    let targets = db::timed(
        state.query_timeout,
        query_as::<_, Target>(TARGETS_SQL)
            .bind(compound.molregno)
            .fetch_all(&state.pool),
    );
    let activities = db::timed(
        state.query_timeout,
        query_as::<_, Activity>(ACTIVITIES_SQL)
            .bind(compound.molregno)
            .fetch_all(&state.pool),
    );
    let (targets, activities) = tokio::try_join!(targets, activities)?;

    Ok(Json(CompoundDetail { compound, targets, activities }))
}
