//! Blocking HTTP access to the schema and data endpoints.
//!
//! One request per call, structural decoding, no retries. The client timeout
//! covers connecting and reading the whole body.
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::{debug, info};

use crate::error::{FetchError, RemoteTypeError, TransportError};
use crate::ir::SynthesizedType;
use crate::path_de::from_reader_with_path;
use crate::schema::Schema;
use crate::synth::synthesize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5021";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.into(), timeout: DEFAULT_TIMEOUT }
    }
}

/// Body of a data response, read incrementally.
pub type DataStream = BufReader<Response>;

pub struct SchemaClient {
    http: Client,
    base_url: String,
}

impl SchemaClient {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn schema_url(&self) -> String {
        format!("{}/schema", self.base_url)
    }

    pub fn data_url(&self) -> String {
        format!("{}/data", self.base_url)
    }

    /// `GET /schema`, decoded as one `Schema`.
    pub fn fetch_schema(&self) -> Result<Schema, FetchError> {
        let url = self.schema_url();
        info!(%url, "fetching schema");
        let response = send(self.http.get(&url), &url)?;
        let schema: Schema = from_reader_with_path(BufReader::new(response))?;
        debug!(name = %schema.name, properties = schema.properties.len(), "schema received");
        Ok(schema)
    }

    /// Fetch the published schema and synthesize its type.
    pub fn fetch_type(&self) -> Result<Arc<SynthesizedType>, RemoteTypeError> {
        let schema = self.fetch_schema()?;
        Ok(synthesize(&schema)?)
    }

    /// `POST /data?count=N`; the caller decodes the returned stream.
    pub fn open_data(&self, count: u32) -> Result<DataStream, TransportError> {
        let url = self.data_url();
        info!(%url, count, "requesting records");
        let response = send(self.http.post(&url).query(&[("count", count)]), &url)?;
        Ok(BufReader::new(response))
    }
}

fn send(request: RequestBuilder, url: &str) -> Result<Response, TransportError> {
    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status { url: url.to_owned(), status });
    }
    Ok(response)
}
