//! Command Module
//!
//! One function per CLI command. Reports go to stdout; diagnostics go through
//! `tracing`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::backend::TaggedCache;
use crate::config::{Config, InitParams};
use crate::dataset::{generate, DatasetShape, Record};
use crate::error::{BenchError, Result};
use crate::report::{format_client_table, ClientResult, TagSummary};
use crate::runner::run_clients;
use crate::script::RunScript;
use crate::store::{TestDir, RESULTS_FILE, RESULTS_JSONL_FILE, SCRIPT_FILE};
use crate::tagquery;
use crate::workload::{replay, OperationGenerator, OperationMix};

fn open_test_dir(config: &Config, name: &str) -> TestDir {
    TestDir::new(name, config.test_dir(name))
}

// == Init ==
/// Regenerates the dataset, the per-client op files and the run script of a
/// named test. Returns the seed that was used.
pub fn init(config: &Config, params: &InitParams, command_line: &str) -> Result<u64> {
    params.validate()?;
    let seed = params.seed.unwrap_or_else(rand::random);

    let dir = open_test_dir(config, &params.name);
    dir.reset()?;
    dir.write_cli(command_line, seed)?;
    info!("Initializing test '{}' with seed {}", params.name, seed);

    println!("Generating cache data...");
    let dataset = generate(&DatasetShape::from(params), seed);
    dir.write_dataset(&dataset.records)?;

    println!("Generating operations...");
    let mix = OperationMix {
        clean_factor: params.clean_factor,
        write_factor: params.write_factor,
    };
    let generator = OperationGenerator::new(&dataset, mix);
    for client in 0..params.num_clients {
        let ops = generator.generate_client_ops(client, params.num_ops, seed);
        dir.write_ops(client, &ops)?;
    }

    let results_path = dir.file(RESULTS_FILE);
    let records_path = dir.file(RESULTS_JSONL_FILE);
    let script = RunScript {
        program: &config.program,
        name: &params.name,
        results_path: &results_path,
        records_path: &records_path,
        num_clients: params.num_clients,
        num_ops: params.num_ops,
    };
    dir.write_script(&script.render())?;

    println!(
        "Completed generation of test data for test '{}'.",
        params.name
    );
    println!("Run your test like so:\n");
    println!("  $ bash {}\n", dir.file(SCRIPT_FILE).display());
    Ok(seed)
}

// == Clean ==
pub async fn clean(cache: &dyn TaggedCache) -> Result<()> {
    println!("Flushing all caches...");
    cache.flush_all().await
}

// == Load ==
/// Saves every record of a named dataset into the cache.
pub async fn load(config: &Config, cache: &dyn TaggedCache, name: &str) -> Result<usize> {
    let dir = open_test_dir(config, name);
    println!("Loading '{}' test data...", name);
    let records = dir.read_dataset()?;
    load_records(cache, &records).await?;
    Ok(records.len())
}

async fn load_records(cache: &dyn TaggedCache, records: &[Record]) -> Result<Duration> {
    println!("Cache backend: {}", cache.describe());

    let start = Instant::now();
    for record in records {
        cache
            .save(record.data.as_bytes(), &record.id, &record.tags, record.ttl())
            .await?;
    }
    let elapsed = start.elapsed();

    let bytes: usize = records.iter().map(Record::payload_size).sum();
    println!(
        "Loaded {} cache records in {:.4} seconds. Data size is {:.1}K",
        records.len(),
        elapsed.as_secs_f64(),
        bytes as f64 / 1024.0
    );
    Ok(elapsed)
}

// == Tags ==
/// Times one tag query per tag in the cache and prints the average, plus one
/// line per tag when `verbose`.
pub async fn tags(
    config: &Config,
    cache: &dyn TaggedCache,
    verbose: bool,
) -> Result<Option<TagSummary>> {
    println!("Analyzing current cache contents...");
    let survey = tagquery::survey(cache, &config.tag_prefix).await?;
    println!("{}", survey.line());

    println!("Benchmarking tag queries...");
    let timings = tagquery::run(&survey.catalog, cache).await?;
    if verbose {
        let width = survey.catalog.longest_tag_len();
        for timing in &timings {
            println!("{}", timing.line(width));
        }
    }

    let summary = TagSummary::aggregate(&timings);
    if let Some(summary) = &summary {
        println!("{}", summary.line());
    }
    Ok(summary)
}

// == Ops ==
/// Replays one client's op file, prints its result line and appends the
/// result to the test's results file.
pub async fn ops(
    config: &Config,
    cache: &dyn TaggedCache,
    name: &str,
    client: usize,
    quiet: bool,
) -> Result<ClientResult> {
    let dir = open_test_dir(config, name);

    if !quiet {
        println!("Loading operations...");
    }
    let ops = dir.read_ops(client)?;

    if !quiet {
        println!("Executing operations...");
    }
    let result = replay(client, &ops, cache).await?;

    println!("{}", result.result_line());
    dir.append_result(&result)?;
    Ok(result)
}

// == Report ==
/// Aggregates the results appended by client processes of a named test.
///
/// Results left over from an earlier run are rejected rather than summed.
pub fn report(config: &Config, name: &str) -> Result<Vec<ClientResult>> {
    let dir = open_test_dir(config, name);
    let results = dir.read_results()?;

    let expected = dir.client_count();
    if results.len() != expected {
        warn!(
            "Test '{}' has {} op files but {} results",
            name,
            expected,
            results.len()
        );
    }

    println!("{}", format_client_table(&results));
    Ok(results)
}

// == Bench ==
/// Whole pipeline in one process: flush and load (unless `keep`), the tag
/// benchmark, then every client concurrently against the same cache.
pub async fn bench(
    config: &Config,
    cache: Arc<dyn TaggedCache>,
    name: &str,
    keep: bool,
) -> Result<Vec<ClientResult>> {
    let dir = open_test_dir(config, name);
    let records = dir.read_dataset()?;
    let clients = dir.client_count();
    if clients == 0 {
        return Err(BenchError::MissingDataset {
            name: name.to_string(),
            path: dir.ops_path(0),
        });
    }
    let workloads = (0..clients)
        .map(|client| dir.read_ops(client))
        .collect::<Result<Vec<_>>>()?;

    if !keep {
        clean(cache.as_ref()).await?;
        println!("Loading '{}' test data...", name);
        load_records(cache.as_ref(), &records).await?;
    }
    tags(config, cache.as_ref(), false).await?;

    let num_ops = workloads.first().map_or(0, Vec::len);
    println!(
        "Benchmarking {} concurrent clients, each with {} operations...",
        clients, num_ops
    );
    let start = Instant::now();
    let results = run_clients(workloads, cache).await?;
    println!(
        "{} concurrent clients completed in {:.2} seconds",
        results.len(),
        start.elapsed().as_secs_f64()
    );
    println!();
    println!("{}", format_client_table(&results));
    Ok(results)
}
