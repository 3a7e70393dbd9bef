use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::models::coding::{CaseResult, ExecutionReport, TestCase};

const SERVICE: &str = "code_runner";
const MAX_CAPTURED_OUTPUT: usize = 2000;

/// Runs a candidate solution against test cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn run(&self, code: &str, cases: &[TestCase]) -> Result<ExecutionReport>;
}

/// Executes JavaScript `solution(...)` in a fresh `node` process per case.
#[derive(Clone)]
pub struct NodeRunner {
    node_binary: String,
    timeout: Duration,
}

impl NodeRunner {
    pub fn new(node_binary: String, timeout: Duration) -> Self {
        Self {
            node_binary,
            timeout,
        }
    }

    async fn run_case(&self, code: &str, case: &TestCase) -> Result<CaseResult> {
        let program = harness(code, &case.input)?;

        let mut child = Command::new(&self.node_binary)
            .arg("--max-old-space-size=128")
            .arg("-")
            .env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::upstream(SERVICE, format!("failed to start node: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(program.as_bytes()).await?;
        }

        let failed = |output: String| CaseResult {
            passed: false,
            output,
            expected: case.expected_output.clone(),
            hidden: case.hidden,
        };

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Ok(failed(format!(
                    "Time limit exceeded ({} ms)",
                    self.timeout.as_millis()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .map(str::trim)
                .find(|l| l.split(':').next().is_some_and(|head| head.ends_with("Error")))
                .unwrap_or_else(|| stderr.trim());
            return Ok(failed(clip(message)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let actual = clip(stdout.trim());
        Ok(CaseResult {
            passed: outputs_match(&actual, &case.expected_output),
            output: actual,
            expected: case.expected_output.clone(),
            hidden: case.hidden,
        })
    }
}

#[async_trait]
impl CodeExecutor for NodeRunner {
    async fn run(&self, code: &str, cases: &[TestCase]) -> Result<ExecutionReport> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push(self.run_case(code, case).await?);
        }
        let report = ExecutionReport::from_results(results);
        tracing::info!(passed = report.passed, total = report.total, "solution executed");
        Ok(report)
    }
}

/// Wraps the solution so each non-empty input line becomes one JSON argument.
fn harness(code: &str, input: &str) -> Result<String> {
    let input_literal = serde_json::to_string(input)?;
    Ok(format!(
        r#"{code}
;(function () {{
  const __args = {input_literal}
    .split("\n")
    .map((line) => line.trim())
    .filter((line) => line.length > 0)
    .map((line) => JSON.parse(line));
  const fail = (err) => {{
    process.stderr.write("Error: " + String(err && err.message ? err.message : err));
    process.exitCode = 1;
  }};
  let result;
  try {{
    result = solution(...__args);
  }} catch (err) {{
    fail(err);
    return;
  }}
  Promise.resolve(result).then((value) => {{
    const encoded = JSON.stringify(value);
    process.stdout.write(encoded === undefined ? "undefined" : encoded);
  }}, fail);
}})();
"#
    ))
}

fn clip(text: &str) -> String {
    text.chars().take(MAX_CAPTURED_OUTPUT).collect()
}

/// Equal after trimming, or both sides parse to the same JSON value.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let (actual, expected) = (actual.trim(), expected.trim());
    if actual == expected {
        return true;
    }
    match (
        serde_json::from_str::<JsonValue>(actual),
        serde_json::from_str::<JsonValue>(expected),
    ) {
        (Ok(a), Ok(e)) => a == e,
        _ => false,
    }
}
