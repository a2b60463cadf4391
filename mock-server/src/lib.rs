//! Stand-in for the schema-publishing and record-streaming endpoints.
//!
//! - `GET /schema` → the `Employee` sample schema
//! - `POST /data?count=N` → a JSON array of N fake employees, written record by record
use axum::body::{Body, Bytes};
use axum::extract::Query;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::info;

pub const DEPENDENTS_PER_EMPLOYEE: usize = 10;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elena", "Felipe", "Gabriela", "Hugo", "Isabel", "João",
    "Karen", "Lucas", "Marta", "Nuno", "Olga", "Paulo",
];
const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Costa", "Dias", "Esteves", "Ferreira", "Gomes", "Lima", "Martins",
    "Nogueira", "Oliveira", "Pereira", "Ribeiro", "Santos",
];
const JOB_TITLES: &[&str] = &[
    "Engineer", "Analyst", "Designer", "Manager", "Accountant", "Technician", "Consultant",
];

pub fn router() -> Router {
    Router::new()
        .route("/schema", get(schema))
        .route("/data", post(data))
}

pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

/// The document served at `/schema`; matches `FakeEmployee`'s wire shape.
pub fn employee_schema() -> Value {
    json!({
        "name": "Employee",
        "properties": [
            { "name": "id", "type": "Number" },
            { "name": "firstName", "type": "String" },
            { "name": "lastName", "type": "String" },
            { "name": "jobTitle", "type": "String" },
            { "name": "dateOfBirth", "type": "Date" },
            { "name": "dependents", "type": "Array", "properties": [
                { "name": "id", "type": "String" },
                { "name": "name", "type": "String" }
            ]}
        ]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FakeEmployee {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub date_of_birth: String,
    pub dependents: Vec<FakeDependent>,
}

#[derive(Debug, Serialize)]
pub struct FakeDependent {
    pub id: String,
    pub name: String,
}

fn pick<R: Rng>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or("Alex")
}

pub fn fake_dependent<R: Rng>(rng: &mut R) -> FakeDependent {
    FakeDependent {
        id: uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid().to_string(),
        name: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
    }
}

pub fn fake_employee<R: Rng>(rng: &mut R) -> FakeEmployee {
    // 1950-01-01 ..= 2004-12-31
    let born = rng.gen_range(-631_152_000i64..1_104_537_600);
    let date_of_birth = DateTime::<Utc>::from_timestamp(born, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    FakeEmployee {
        id: rng.r#gen(),
        first_name: pick(rng, FIRST_NAMES).to_owned(),
        last_name: pick(rng, LAST_NAMES).to_owned(),
        job_title: pick(rng, JOB_TITLES).to_owned(),
        date_of_birth,
        dependents: (0..DEPENDENTS_PER_EMPLOYEE).map(|_| fake_dependent(rng)).collect(),
    }
}

async fn schema() -> Json<Value> {
    info!("serving schema");
    Json(employee_schema())
}

#[derive(Debug, Deserialize)]
struct DataParams {
    count: u32,
}

async fn data(Query(params): Query<DataParams>) -> Response {
    if params.count == 0 {
        return (StatusCode::BAD_REQUEST, "count must be a positive integer").into_response();
    }
    info!(count = params.count, "streaming records");
    let body = Body::from_stream(stream::iter(record_chunks(params.count, StdRng::from_entropy())));
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// `[`, then one chunk per record (comma-prefixed after the first), then `]`.
fn record_chunks(count: u32, mut rng: StdRng) -> impl Iterator<Item = Result<Bytes, serde_json::Error>> {
    let records = (0..count).map(move |i| -> Result<Bytes, serde_json::Error> {
        let mut chunk = Vec::with_capacity(1024);
        chunk.push(if i == 0 { b'[' } else { b',' });
        serde_json::to_writer(&mut chunk, &fake_employee(&mut rng))?;
        Ok(Bytes::from(chunk))
    });
    records.chain(std::iter::once(Ok(Bytes::from_static(b"]"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_have_ten_dependents_and_wire_keys() {
        let mut rng = StdRng::seed_from_u64(7);
        let employee = fake_employee(&mut rng);
        assert_eq!(employee.dependents.len(), DEPENDENTS_PER_EMPLOYEE);
        let v = serde_json::to_value(&employee).unwrap();
        for key in ["id", "firstName", "lastName", "jobTitle", "dateOfBirth", "dependents"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert!(chrono::DateTime::parse_from_rfc3339(&employee.date_of_birth).is_ok());
    }

    #[test]
    fn same_seed_same_batch() {
        let batch = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            serde_json::to_value((0..3).map(|_| fake_employee(&mut rng)).collect::<Vec<_>>()).unwrap()
        };
        assert_eq!(batch(5), batch(5));
        assert_ne!(batch(5), batch(6));
        let id = batch(5)[0]["dependents"][0]["id"].as_str().unwrap().to_owned();
        assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn chunks_concatenate_to_a_json_array() {
        let chunks = record_chunks(3, StdRng::seed_from_u64(1))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(chunks.len(), 4);
        let body = chunks.concat();
        let parsed: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn schema_keys_match_fake_records() {
        let schema = employee_schema();
        let mut rng = StdRng::seed_from_u64(3);
        let record = serde_json::to_value(fake_employee(&mut rng)).unwrap();
        for prop in schema["properties"].as_array().unwrap() {
            let name = prop["name"].as_str().unwrap();
            assert!(record.get(name).is_some(), "record lacks {name}");
        }
    }
}
