//! CLI: synth → declarations, decode → records, compare → cost table
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::compare::{self, Strategy, Summary};
use crate::de::{decode_records, for_each_record};
use crate::path_de::from_slice_with_path;
use crate::schema::Schema;
use crate::synth::synthesize;
use crate::transport::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, SchemaClient};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// synthesize record types from schemas and measure JSON decoding strategies
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// synthesize and print the type declarations for one or more schemas
    Synth(SynthOut),
    /// synthesize a schema and decode a JSON array file with it
    Decode(DecodeOut),
    /// run the decoding strategies against the data endpoint
    Compare(CompareOut),
}

#[derive(Args, Debug, Clone)]
struct EndpointSettings {
    /// base URL serving `/schema` and `/data`
    #[arg(long, env = "SCHEMA_SYNTH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// whole-request timeout, body included
    #[arg(long, env = "SCHEMA_SYNTH_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[derive(clap::Parser, Debug)]
struct SynthOut {
    /// schema documents; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required_unless_present = "fetch")]
    input: Vec<String>,

    /// fetch the schema from the endpoint instead of reading files
    #[arg(long, conflicts_with = "input")]
    fetch: bool,

    #[command(flatten)]
    endpoint: EndpointSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    /// schema document
    #[arg(long)]
    schema: PathBuf,

    /// JSON array of records
    #[arg(long)]
    data: PathBuf,

    /// print the decoded records re-encoded as JSON instead of a count
    #[arg(long)]
    emit: bool,

    /// output file for `--emit` (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CompareOut {
    #[command(flatten)]
    endpoint: EndpointSettings,

    /// records per batch
    #[arg(long, default_value_t = 10_000)]
    count: u32,

    /// runs per strategy
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// strategies to run (all when omitted)
    #[arg(long, value_enum)]
    strategy: Vec<Strategy>,

    /// first check that static and synthesized decoding agree on one batch
    #[arg(long)]
    verify: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl EndpointSettings {
    fn client(&self) -> Result<SchemaClient> {
        let config = ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        };
        SchemaClient::new(&config).context("failed to build HTTP client")
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_tracing(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Synth(target) => target.run(),
            Command::Decode(target) => target.run(),
            Command::Compare(target) => target.run(),
        }
    }
}

impl SynthOut {
    fn run(&self) -> Result<()> {
        let rendered = if self.fetch {
            let client = self.endpoint.client()?;
            let ty = client.fetch_type()?;
            vec![(client.schema_url(), ty.render())]
        } else {
            let paths = resolve_file_path_patterns(&self.input)?;
            paths
                .par_iter()
                .map(|path| Ok((path.display().to_string(), synthesize_file(path)?)))
                .collect::<Result<Vec<_>>>()?
        };

        let text = match rendered.as_slice() {
            [(_, single)] => single.clone(),
            many => many
                .iter()
                .map(|(source, decls)| format!("// {source}\n{decls}"))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        write_output(self.out.as_deref(), &text)
    }
}

impl DecodeOut {
    fn run(&self) -> Result<()> {
        let schema = read_schema(&self.schema)?;
        let ty = synthesize(&schema).with_context(|| format!("cannot synthesize {}", self.schema.display()))?;
        let file = File::open(&self.data).with_context(|| format!("failed to open {}", self.data.display()))?;
        let reader = BufReader::new(file);

        if self.emit {
            let records = decode_records(&ty, reader)?;
            let text = serde_json::to_string_pretty(&records)?;
            return write_output(self.out.as_deref(), &text);
        }

        let start = Instant::now();
        let seen = for_each_record(&ty, reader, drop)?;
        println!("{seen} records of {} decoded in {:?}", ty.name(), start.elapsed());
        Ok(())
    }
}

impl CompareOut {
    fn run(&self) -> Result<()> {
        let client = self.endpoint.client()?;

        if self.verify {
            let eq = compare::verify_equivalence(&client, self.count.min(1_000))?;
            match eq.first_mismatch {
                None => println!("{} static and synthesized decoding agree on {} records", "✔".green(), eq.records),
                Some(i) => bail!("static and synthesized decoding differ at record {i}"),
            }
        }

        let strategies = if self.strategy.is_empty() {
            Strategy::ALL.to_vec()
        } else {
            self.strategy.clone()
        };
        let summaries = compare::run(&client, &strategies, self.count, self.iterations)?;
        print_table(&summaries, self.count);
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_schema(path: &Path) -> Result<Schema> {
    let source = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    from_slice_with_path(&source).with_context(|| format!("failed to parse schema {}", path.display()))
}

fn synthesize_file(path: &Path) -> Result<String> {
    let schema = read_schema(path)?;
    let ty = synthesize(&schema).with_context(|| format!("cannot synthesize {}", path.display()))?;
    Ok(ty.render())
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
}

fn print_table(summaries: &[Summary], count: u32) {
    let fastest = summaries.iter().map(Summary::mean_elapsed).min();
    println!(
        "{}",
        format!("{:<12} {:>12} {:>12} {:>14} {:>9}", "strategy", "mean", "min", "allocated", "records").bold()
    );
    for summary in summaries {
        let mean = summary.mean_elapsed();
        let records = summary.runs.first().map_or(0, |o| o.records);
        let line = format!(
            "{:<12} {:>12} {:>12} {:>14} {:>9}",
            summary.strategy.label(),
            format!("{:.2?}", mean),
            format!("{:.2?}", summary.min_elapsed()),
            format_bytes(summary.mean_allocated()),
            records,
        );
        if Some(mean) == fastest {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
    println!("{}", format!("batch size {count}, {} run(s) each", summaries.first().map_or(0, |s| s.runs.len())).dimmed());
}

fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes == 0 {
        "n/a".into()
    } else {
        format!("{:.2} MiB", bytes as f64 / MIB)
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
