//! Run Script
//!
//! Renders the bash driver of the multi-process mode. Every client is its own
//! `ops` process started in the background; the script waits for all of them
//! before the report aggregates their results.

use std::path::Path;

/// Inputs of the generated script.
#[derive(Debug, Clone)]
pub struct RunScript<'a> {
    /// Command that invokes this harness
    pub program: &'a str,
    pub name: &'a str,
    /// File the clients' display lines are appended to
    pub results_path: &'a Path,
    /// File the clients' structured results are appended to, read by `report`
    pub records_path: &'a Path,
    pub num_clients: usize,
    pub num_ops: usize,
}

impl RunScript<'_> {
    pub fn render(&self) -> String {
        let program = self.program;
        let name = shell_quote(self.name);
        let results = shell_quote(&self.results_path.display().to_string());
        let records = shell_quote(&self.records_path.display().to_string());
        // A single client keeps its progress lines.
        let quiet = if self.num_clients == 1 { "" } else { " --quiet" };

        let mut script = format!(
            r#"#!/bin/bash
if [ "$1" != "keep" ]; then
  {program} clean
  {program} load --name {name}
fi
{program} tags
results={results}
records={records}
rm -f "$results" "$records"

clients=0
function runClient() {{
  clients=$((clients+1))
  {program} ops --name {name} --client $1{quiet} >> "$results" &
}}
echo "Benchmarking {num_clients} concurrent clients, each with {num_ops} operations..."
start=$(date '+%s')
"#,
            num_clients = self.num_clients,
            num_ops = self.num_ops,
        );

        for client in 0..self.num_clients {
            script.push_str(&format!("runClient {}\n", client));
        }

        script.push_str(&format!(
            r#"wait
finish=$(date '+%s')
elapsed=$((finish - start))
echo "$clients concurrent clients completed in $elapsed seconds"
echo ""
{program} report --name {name}
echo ""
"#
        ));
        script
    }
}

/// Single-quotes `value` for bash.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
