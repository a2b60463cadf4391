//! Strategy comparator: the same record stream decoded four ways.
//!
//! Per run:
//! - fetch the schema only when the strategy needs it;
//! - stream-decode one batch of `count` records;
//! - record wall time and bytes allocated.
pub mod alloc;
pub mod sample;

use std::collections::HashMap;
use std::hint::black_box;
use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, info};

use crate::de::decode_records;
use crate::path_de::{from_reader_with_path, from_slice_with_path};
use crate::synth::synthesize;
use crate::transport::SchemaClient;

use sample::Employee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Strategy {
    /// sequence of string-keyed maps
    Map,
    /// sequence of fully dynamic JSON values
    Dynamic,
    /// sequence of the hand-written `Employee` type
    Static,
    /// sequence of records of the synthesized type
    Synthesized,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Strategy::Map, Strategy::Dynamic, Strategy::Static, Strategy::Synthesized];

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Map => "map",
            Strategy::Dynamic => "dynamic",
            Strategy::Static => "static",
            Strategy::Synthesized => "synthesized",
        }
    }

    pub fn needs_schema(self) -> bool {
        matches!(self, Strategy::Synthesized)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub strategy: Strategy,
    pub records: usize,
    pub elapsed: Duration,
    pub allocated: u64,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub strategy: Strategy,
    pub runs: Vec<Outcome>,
}

impl Summary {
    pub fn mean_elapsed(&self) -> Duration {
        match self.runs.len() as u32 {
            0 => Duration::ZERO,
            n => self.runs.iter().map(|o| o.elapsed).sum::<Duration>() / n,
        }
    }

    pub fn min_elapsed(&self) -> Duration {
        self.runs.iter().map(|o| o.elapsed).min().unwrap_or_default()
    }

    pub fn mean_allocated(&self) -> u64 {
        match self.runs.len() as u64 {
            0 => 0,
            n => self.runs.iter().map(|o| o.allocated).sum::<u64>() / n,
        }
    }
}

/// Run every strategy `iterations` times, in the order given.
pub fn run(client: &SchemaClient, strategies: &[Strategy], count: u32, iterations: usize) -> Result<Vec<Summary>> {
    if count == 0 {
        bail!("record count must be positive");
    }
    strategies
        .iter()
        .map(|&strategy| {
            let runs = (0..iterations)
                .map(|i| {
                    let outcome = run_once(client, strategy, count)?;
                    debug!(strategy = strategy.label(), iteration = i, elapsed = ?outcome.elapsed, "run finished");
                    Ok(outcome)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Summary { strategy, runs })
        })
        .collect()
}

pub fn run_once(client: &SchemaClient, strategy: Strategy, count: u32) -> Result<Outcome> {
    let before = alloc::allocated();
    let start = Instant::now();
    let records = match strategy {
        Strategy::Map => {
            let rows: Vec<HashMap<String, Value>> = from_reader_with_path(client.open_data(count)?)?;
            black_box(&rows).len()
        }
        Strategy::Dynamic => {
            let rows: Vec<Value> = from_reader_with_path(client.open_data(count)?)?;
            black_box(&rows).len()
        }
        Strategy::Static => {
            let rows: Vec<Employee> = from_reader_with_path(client.open_data(count)?)?;
            black_box(&rows).len()
        }
        Strategy::Synthesized => {
            let ty = client.fetch_type()?;
            let rows = decode_records(&ty, client.open_data(count)?)?;
            black_box(&rows).len()
        }
    };
    let elapsed = start.elapsed();
    let allocated = alloc::allocated().saturating_sub(before);
    Ok(Outcome { strategy, records, elapsed, allocated })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equivalence {
    pub records: usize,
    pub first_mismatch: Option<usize>,
}

/// Decode one batch with the static and the synthesized strategy and compare
/// the results field by field. The batch is buffered once so both sides see
/// identical bytes.
pub fn verify_equivalence(client: &SchemaClient, count: u32) -> Result<Equivalence> {
    let ty = client.fetch_type()?;
    let mut body = Vec::new();
    client
        .open_data(count)?
        .read_to_end(&mut body)
        .context("failed to read data response")?;
    let records = decode_records(&ty, body.as_slice())?;
    let employees: Vec<Employee> = from_slice_with_path(&body)?;
    let first_mismatch = sample::first_mismatch(&records, &employees)?;
    info!(records = records.len(), ?first_mismatch, "equivalence check");
    Ok(Equivalence { records: records.len(), first_mismatch })
}

/// Same as `verify_equivalence` on an in-memory batch, with a locally synthesized schema.
pub fn verify_equivalence_local(body: &[u8]) -> Result<Equivalence> {
    let ty = synthesize(&Employee::schema())?;
    let records = decode_records(&ty, body)?;
    let employees: Vec<Employee> = from_slice_with_path(body)?;
    let first_mismatch = sample::first_mismatch(&records, &employees)?;
    Ok(Equivalence { records: records.len(), first_mismatch })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(ms: u64, bytes: u64) -> Outcome {
        Outcome {
            strategy: Strategy::Static,
            records: 1,
            elapsed: Duration::from_millis(ms),
            allocated: bytes,
        }
    }

    #[test]
    fn summary_statistics() {
        let summary = Summary {
            strategy: Strategy::Static,
            runs: vec![outcome(30, 100), outcome(10, 300), outcome(20, 200)],
        };
        assert_eq!(summary.mean_elapsed(), Duration::from_millis(20));
        assert_eq!(summary.min_elapsed(), Duration::from_millis(10));
        assert_eq!(summary.mean_allocated(), 200);

        let empty = Summary { strategy: Strategy::Map, runs: vec![] };
        assert_eq!(empty.mean_elapsed(), Duration::ZERO);
        assert_eq!(empty.mean_allocated(), 0);
    }

    #[test]
    fn only_the_synthesized_strategy_needs_the_schema() {
        let needing = Strategy::ALL.iter().filter(|s| s.needs_schema()).collect::<Vec<_>>();
        assert_eq!(needing, vec![&Strategy::Synthesized]);
    }

    #[test]
    fn every_strategy_decodes_the_live_stream() {
        let base_url = crate::transport::tests::spawn_mock();
        let client = SchemaClient::new(&crate::transport::ClientConfig {
            base_url,
            ..Default::default()
        })
        .unwrap();

        let summaries = run(&client, &Strategy::ALL, 50, 2).unwrap();
        assert_eq!(summaries.len(), 4);
        for (summary, strategy) in summaries.iter().zip(Strategy::ALL) {
            assert_eq!(summary.strategy, strategy);
            assert_eq!(summary.runs.len(), 2);
            assert!(summary.runs.iter().all(|o| o.records == 50 && o.strategy == strategy));
        }

        let eq = verify_equivalence(&client, 50).unwrap();
        assert_eq!(eq, Equivalence { records: 50, first_mismatch: None });
    }

    #[test]
    fn zero_count_is_refused_before_any_request() {
        let client = SchemaClient::new(&crate::transport::ClientConfig::default()).unwrap();
        assert!(run(&client, &Strategy::ALL, 0, 1).is_err());
    }

    #[test]
    fn fake_batch_decodes_equivalently() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let batch = (0..20).map(|_| mock_server::fake_employee(&mut rng)).collect::<Vec<_>>();
        let body = serde_json::to_vec(&batch).unwrap();
        let eq = verify_equivalence_local(&body).unwrap();
        assert_eq!(eq, Equivalence { records: 20, first_mismatch: None });
    }
}
