//! Test document runner and timing helpers

use anyhow::Context;
use std::time::{Duration, Instant};
use textglass_classifiers::{Document, DocumentType, Domain};
use textglass_core::{DomainIdentity, PATTERN_ID_KEY};
use tracing::{debug, info, warn};

/// Outcome of running one test document
#[derive(Debug, Clone)]
pub struct TestReport {
    pub identity: DomainIdentity,
    pub total: usize,
    pub passed: usize,
    pub elapsed: Duration,
}

impl TestReport {
    /// Whether every case passed
    pub fn is_pass(&self) -> bool {
        self.total == self.passed
    }
}

/// Run every case of a test document against `domain`
pub fn run_test_document(domain: &Domain, doc: &Document) -> anyhow::Result<TestReport> {
    if doc.doc_type != DocumentType::Test {
        anyhow::bail!("Unknown test type: {}", doc.doc_type);
    }

    domain
        .identity()
        .check_matches(&doc.identity)
        .map_err(|e| anyhow::anyhow!("test document: {}", e))?;

    info!("Loading test: {}", doc.identity);

    let start = Instant::now();
    let mut total = 0;
    let mut passed = 0;

    for (position, case) in doc.tests.iter().flatten().enumerate() {
        let input = case
            .input_text()
            .with_context(|| format!("Bad test input found, position: {}", position))?;

        let result = match domain.classify(&input) {
            Ok(result) => result,
            Err(e) => {
                warn!("FAILED, input '{}': {}", input, e);
                total += 1;
                continue;
            }
        };

        let pattern_id = result
            .as_ref()
            .and_then(|attributes| attributes.get(PATTERN_ID_KEY))
            .map(String::as_str);
        let expected_id = case.result_pattern_id.as_deref();

        total += 1;

        if pattern_id != expected_id {
            warn!(
                "FAILED, expected patternId: {}, found: {}",
                expected_id.unwrap_or("null"),
                pattern_id.unwrap_or("null")
            );
            continue;
        }

        let mut failed_attributes = 0;

        for (key, expected) in case.expected_attributes() {
            let value = result.as_ref().and_then(|attributes| attributes.get(&key));

            if value != Some(&expected) {
                debug!(
                    "FAILED, expected attribute for {}: {}, found: {}",
                    key,
                    expected,
                    value.map_or("null", String::as_str)
                );
                failed_attributes += 1;
            }
        }

        if failed_attributes == 0 {
            passed += 1;
            debug!("Passed, expected patternId: {}", expected_id.unwrap_or("null"));
        }
    }

    let report = TestReport {
        identity: doc.identity.clone(),
        total,
        passed,
        elapsed: start.elapsed(),
    };

    info!(
        "Test passed {} out of {}. {}",
        report.passed,
        report.total,
        if report.is_pass() { "PASS" } else { "FAIL" }
    );
    info!("Test time: {}", format_duration(report.elapsed));

    Ok(report)
}

/// Render a duration as `Xs Yms Z.Wus`
pub fn format_duration(elapsed: Duration) -> String {
    let ns = elapsed.as_nanos();

    format!(
        "{}s {}ms {}.{}us",
        ns / 1_000_000_000,
        ns / 1_000_000 % 1000,
        ns / 1000 % 1000,
        ns % 1000
    )
}
