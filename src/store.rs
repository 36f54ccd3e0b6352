//! Test Directory Store
//!
//! Persisted artifacts of one named test: the command line it was generated
//! with, the dataset, one op file per client, the run script and the results
//! written by client processes.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::dataset::{Record, StoredRecord};
use crate::error::{BenchError, Result};
use crate::report::ClientResult;
use crate::workload::{decode_operations, Operation};

pub const CLI_FILE: &str = "cli.txt";
pub const DATA_FILE: &str = "data.json";
pub const SCRIPT_FILE: &str = "run.sh";
pub const RESULTS_FILE: &str = "results.txt";
pub const RESULTS_JSONL_FILE: &str = "results.jsonl";

/// File name of the op sequence of client `client`.
pub fn ops_file_name(client: usize) -> String {
    format!("ops-client_{}.json", client)
}

// == Test Directory ==
#[derive(Debug, Clone)]
pub struct TestDir {
    name: String,
    dir: PathBuf,
}

impl TestDir {
    pub fn new(name: &str, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            dir: dir.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn ops_path(&self, client: usize) -> PathBuf {
        self.file(&ops_file_name(client))
    }

    /// Creates the directory and deletes every file already in it.
    pub fn reset(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| BenchError::io(&self.dir, e))?;

        let entries = fs::read_dir(&self.dir).map_err(|e| BenchError::io(&self.dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| BenchError::io(&self.dir, e))?.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| BenchError::io(&path, e))?;
            }
        }
        debug!("Reset test directory {}", self.dir.display());
        Ok(())
    }

    // == Command Line Record ==
    /// Records how the dataset was produced. Diagnostic only.
    pub fn write_cli(&self, command_line: &str, seed: u64) -> Result<()> {
        let body = format!(
            "{}\nseed: {}\ncreated: {}\n",
            command_line,
            seed,
            Utc::now().to_rfc3339()
        );
        self.write_file(CLI_FILE, body.as_bytes())
    }

    // == Dataset ==
    pub fn write_dataset(&self, records: &[Record]) -> Result<()> {
        let stored: BTreeMap<&str, StoredRecord> = records
            .iter()
            .map(|r| (r.id.as_str(), StoredRecord::from(r)))
            .collect();
        self.write_json(DATA_FILE, &stored)
    }

    /// Loads the dataset, ordered by id.
    pub fn read_dataset(&self) -> Result<Vec<Record>> {
        let stored: BTreeMap<String, StoredRecord> = self.read_json(DATA_FILE)?;
        Ok(stored
            .into_iter()
            .map(|(id, record)| record.into_record(id))
            .collect())
    }

    // == Op Files ==
    pub fn write_ops(&self, client: usize, ops: &[Operation]) -> Result<()> {
        self.write_json(&ops_file_name(client), &ops)
    }

    pub fn read_ops(&self, client: usize) -> Result<Vec<Operation>> {
        let values: Vec<Value> = self.read_json(&ops_file_name(client))?;
        decode_operations(&values, client)
    }

    /// Number of consecutive op files starting at client 0.
    pub fn client_count(&self) -> usize {
        (0..).take_while(|&i| self.ops_path(i).is_file()).count()
    }

    // == Run Script ==
    pub fn write_script(&self, body: &str) -> Result<()> {
        self.write_file(SCRIPT_FILE, body.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let path = self.file(SCRIPT_FILE);
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .map_err(|e| BenchError::io(&path, e))?;
        }
        Ok(())
    }

    // == Results ==
    /// Appends one result as a single JSON line. Several client processes
    /// append to the same file; each line goes out in one write.
    pub fn append_result(&self, result: &ClientResult) -> Result<()> {
        let path = self.file(RESULTS_JSONL_FILE);
        let mut line = serde_json::to_string(result).map_err(|e| BenchError::json(&path, e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| BenchError::io(&path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| BenchError::io(&path, e))
    }

    /// Results of one run, sorted by client id.
    ///
    /// Fails with `DuplicateClientResult` when a client appears twice, which
    /// means results of an earlier run were never cleared.
    pub fn read_results(&self) -> Result<Vec<ClientResult>> {
        let path = self.file(RESULTS_JSONL_FILE);
        let body = self.read_file(RESULTS_JSONL_FILE)?;

        let mut results = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| BenchError::json(&path, e)))
            .collect::<Result<Vec<ClientResult>>>()?;
        results.sort_by_key(|r| r.client_id);

        if let Some(pair) = results
            .windows(2)
            .find(|pair| pair[0].client_id == pair[1].client_id)
        {
            return Err(BenchError::DuplicateClientResult {
                name: self.name.clone(),
                client: pair[0].client_id,
                path,
            });
        }
        Ok(results)
    }

    // == Helpers ==
    fn write_file(&self, file_name: &str, body: &[u8]) -> Result<()> {
        let path = self.file(file_name);
        fs::write(&path, body).map_err(|e| BenchError::io(&path, e))
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<()> {
        let path = self.file(file_name);
        let body = serde_json::to_vec(value).map_err(|e| BenchError::json(&path, e))?;
        self.write_file(file_name, &body)
    }

    /// Reads a file; a missing file means the test was never initialized.
    fn read_file(&self, file_name: &str) -> Result<String> {
        let path = self.file(file_name);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BenchError::MissingDataset {
                name: self.name.clone(),
                path,
            }),
            Err(e) => Err(BenchError::io(&path, e)),
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file_name: &str) -> Result<T> {
        let body = self.read_file(file_name)?;
        serde_json::from_str(&body).map_err(|e| BenchError::json(self.file(file_name), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::OperationKind;
    use std::time::Duration;

    fn scratch() -> (tempfile::TempDir, TestDir) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = TestDir::new("unit", tmp.path().join("unit"));
        dir.reset().unwrap();
        (tmp, dir)
    }

    fn record(id: &str, expires: Option<u64>) -> Record {
        Record {
            id: id.to_string(),
            data: "abcd".to_string(),
            tags: vec!["TAG_1".to_string(), "TAG_3".to_string()],
            expires,
        }
    }

    #[test]
    fn test_dataset_round_trip() {
        let (_tmp, dir) = scratch();
        let records = vec![record("a", None), record("b", Some(60))];
        dir.write_dataset(&records).unwrap();

        assert_eq!(dir.read_dataset().unwrap(), records);
    }

    #[test]
    fn test_missing_dataset() {
        let (_tmp, dir) = scratch();
        match dir.read_dataset() {
            Err(BenchError::MissingDataset { name, path }) => {
                assert_eq!(name, "unit");
                assert!(path.ends_with(DATA_FILE));
            }
            other => panic!("expected MissingDataset, got {:?}", other),
        }
    }

    #[test]
    fn test_ops_round_trip_and_client_count() {
        let (_tmp, dir) = scratch();
        let ops = vec![
            Operation::Read { id: "a".to_string() },
            Operation::Clean {
                tag: "TAG_1".to_string(),
            },
        ];
        dir.write_ops(0, &ops).unwrap();
        dir.write_ops(1, &ops).unwrap();

        assert_eq!(dir.read_ops(1).unwrap(), ops);
        assert_eq!(dir.client_count(), 2);
        assert!(matches!(
            dir.read_ops(2),
            Err(BenchError::MissingDataset { .. })
        ));
    }

    #[test]
    fn test_corrupt_ops_file_is_json_error() {
        let (_tmp, dir) = scratch();
        fs::write(dir.ops_path(0), b"[[\"read\"").unwrap();
        assert!(matches!(dir.read_ops(0), Err(BenchError::Json { .. })));
    }

    #[test]
    fn test_append_and_read_results() {
        let (_tmp, dir) = scratch();
        let mut second = ClientResult::new(1);
        second.record(OperationKind::Read, Duration::from_millis(500));
        let mut first = ClientResult::new(0);
        first.record(OperationKind::Write, Duration::from_secs(2));

        dir.append_result(&second).unwrap();
        dir.append_result(&first).unwrap();

        let results = dir.read_results().unwrap();
        assert_eq!(results, vec![first, second]);
    }

    #[test]
    fn test_results_of_two_runs_rejected() {
        let (_tmp, dir) = scratch();
        for _run in 0..2 {
            dir.append_result(&ClientResult::new(0)).unwrap();
            dir.append_result(&ClientResult::new(1)).unwrap();
        }

        match dir.read_results() {
            Err(BenchError::DuplicateClientResult { name, client, path }) => {
                assert_eq!(name, "unit");
                assert_eq!(client, 0);
                assert!(path.ends_with(RESULTS_JSONL_FILE));
            }
            other => panic!("expected DuplicateClientResult, got {:?}", other),
        }
    }

    #[test]
    fn test_reset_removes_previous_files() {
        let (_tmp, dir) = scratch();
        dir.write_ops(5, &[]).unwrap();
        dir.write_cli("tagbench init", 7).unwrap();

        dir.reset().unwrap();

        assert!(!dir.ops_path(5).exists());
        assert!(!dir.file(CLI_FILE).exists());
    }

    #[test]
    fn test_cli_record_has_seed() {
        let (_tmp, dir) = scratch();
        dir.write_cli("tagbench init --keys 5", 99).unwrap();
        let body = fs::read_to_string(dir.file(CLI_FILE)).unwrap();
        assert!(body.starts_with("tagbench init --keys 5\nseed: 99\ncreated: "));
    }
}
