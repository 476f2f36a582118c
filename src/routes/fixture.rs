// src/routes/fixture.rs
//
// A throwaway ChEMBL-shaped schema for tests that need a live PostgreSQL.
// Tests using it return early when DATABASE_URL is not set.

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use tower::ServiceExt;

use crate::{routes::router, AppState};

const TABLES: &str = r#"
CREATE TABLE molecule_dictionary (
    molregno      BIGINT PRIMARY KEY,
    chembl_id     VARCHAR(20) NOT NULL UNIQUE,
    pref_name     VARCHAR(255),
    max_phase     NUMERIC(2, 1),
    molecule_type VARCHAR(30)
);
CREATE TABLE compound_properties (
    molregno BIGINT PRIMARY KEY,
    full_mwt NUMERIC(9, 2),
    alogp    NUMERIC(9, 2),
    hbd      INTEGER,
    hba      INTEGER,
    psa      NUMERIC(9, 2),
    rtb      INTEGER,
    tpsa     NUMERIC(9, 2)
);
CREATE TABLE compound_structures (molregno BIGINT PRIMARY KEY, canonical_smiles TEXT);
CREATE TABLE drug_development_phase (molregno BIGINT, development_phase INTEGER);
CREATE TABLE mechanism_refs (mec_id BIGINT PRIMARY KEY, mechanism_of_action VARCHAR(250));
CREATE TABLE drug_mechanism (mec_id BIGINT, molregno BIGINT);
CREATE TABLE target_dictionary (
    tid         BIGINT PRIMARY KEY,
    pref_name   VARCHAR(200),
    target_type VARCHAR(30),
    organism    VARCHAR(150)
);
CREATE TABLE drug_indication (molregno BIGINT, target_id BIGINT);
CREATE TABLE activities (
    activity_id    BIGINT PRIMARY KEY,
    molregno       BIGINT,
    standard_type  VARCHAR(250),
    standard_value NUMERIC,
    standard_units VARCHAR(100)
);
"#;

// Weights cover the histogram underflow (< 0), the domain [0, 1000) and the
// overflow (>= 1000), plus a null weight and a compound without properties.
const ROWS: &str = r#"
INSERT INTO molecule_dictionary VALUES
    (1,  'CHEMBL25',      'ASPIRIN',       4,    'Small molecule'),
    (2,  'CHEMBL112',     'ACETAMINOPHEN', 4,    'Small molecule'),
    (3,  'CHEMBL1201585', 'TRASTUZUMAB',   4,    'Antibody'),
    (4,  'CHEMBL192',     'SILDENAFIL',    4,    'Small molecule'),
    (5,  'CHEMBL3',       'NICOTINE',      4,    'Small molecule'),
    (6,  'CHEMBL1000',    'CETIRIZINE',    4,    'Protein'),
    (7,  'CHEMBL2',       'PRAZOSIN',      3,    'Protein'),
    (8,  'CHEMBL90',      NULL,            2,    'Small molecule'),
    (9,  'CHEMBL91',      'PEPTIDE 91',    1,    'Protein'),
    (10, 'CHEMBL92',      'PEPTIDE 92',    0,    'Protein'),
    (11, 'CHEMBL93',      'NEG_WEIGHT',    0,    'Small molecule'),
    (12, 'CHEMBL94',      'NO PROPS',      NULL, 'Unknown'),
    (13, 'CHEMBL95',      'ZERO WEIGHT',   3,    'Small molecule');

INSERT INTO compound_properties VALUES
    (1,  180.16,  1.31,  1, 3,  63.60,  2, 63.60),
    (2,  151.16,  0.68,  2, 2,  49.33,  1, 49.33),
    (3,  NULL,    NULL,  NULL, NULL, NULL, NULL, NULL),
    (4,  474.59,  1.61,  1, 8,  113.42, 7, 113.42),
    (5,  162.24,  1.85,  0, 2,  16.13,  1, 16.13),
    (6,  388.89,  2.93,  1, 4,  53.01,  8, 53.01),
    (7,  383.41,  1.78,  1, 8,  106.95, 4, 106.95),
    (8,  999.99,  -12.50, 5, 10, 180.00, 12, 180.00),
    (9,  1000.00, -3.20, 9, 14, 300.10, 20, 300.10),
    (10, 1523.70, 11.50, 12, 20, 410.00, 30, 410.00),
    (11, -5.00,   0.10,  0, 1,  12.00,  0, 12.00),
    (13, 0.00,    0.00,  0, 0,  0.00,   0, 0.00);

INSERT INTO compound_structures VALUES (1, 'CC(=O)Oc1ccccc1C(=O)O');
INSERT INTO drug_development_phase VALUES (1, 4);
INSERT INTO mechanism_refs VALUES (1, 'Cyclooxygenase inhibitor');
INSERT INTO drug_mechanism VALUES (1, 1);

INSERT INTO target_dictionary VALUES
    (1, 'Cyclooxygenase-1', 'SINGLE PROTEIN', 'Homo sapiens'),
    (2, 'Cyclooxygenase-2', 'SINGLE PROTEIN', 'Homo sapiens'),
    (3, 'Phosphodiesterase 5A', 'SINGLE PROTEIN', 'Homo sapiens');
INSERT INTO drug_indication VALUES (1, 2), (1, 1), (1, 1), (4, 3);

INSERT INTO activities VALUES
    (101, 1, 'IC50', 1.5,  'uM'),
    (100, 1, 'Ki',   30,   'nM'),
    (102, 4, 'IC50', 3.5,  'nM');
"#;

pub struct Fixture {
    pub pool: PgPool,
    schema: String,
}

impl Fixture {
    /// Creates and seeds a schema private to this test. `None` without
    /// DATABASE_URL.
    pub async fn start(tag: &str) -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty())?;
        let schema = format!("chembl_test_{}_{tag}", std::process::id());

        let search_path = format!("SET search_path TO {schema}");
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");

        let reset = format!("DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};");
        pool.execute(reset.as_str()).await.expect("create test schema");
        pool.execute(TABLES).await.expect("create tables");
        pool.execute(ROWS).await.expect("seed rows");

        Some(Self { pool, schema })
    }

    pub fn app(&self) -> Router {
        router(AppState { pool: self.pool.clone(), query_timeout: Duration::from_secs(10) })
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = self
            .app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Chembl ids of a compound list response, in response order.
    pub async fn ids(&self, uri: &str) -> Vec<String> {
        let (status, body) = self.get_json(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        body.as_array()
            .unwrap()
            .iter()
            .map(|c| c["chembl_id"].as_str().unwrap().to_owned())
            .collect()
    }

    pub async fn finish(self) {
        let drop = format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema);
        self.pool.execute(drop.as_str()).await.expect("drop test schema");
        self.pool.close().await;
    }
}
