//! Render metrics reports for CI.
//!
//! Tests that render scenes export a JSON report so render cost and
//! acoustic results can be tracked across commits.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Top-level metrics report of one test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Test identifier
    pub test_name: String,

    /// Timestamp when metrics were collected (RFC 3339)
    pub timestamp: String,

    /// Overall test result
    pub result: TestResult,

    /// Render cost and model counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering: Option<RenderMetrics>,

    /// Impulse response properties per output channel
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<ResponseMetrics>,

    /// Test execution metrics
    pub test_execution: TestExecutionMetrics,
}

/// Overall test result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    /// Test passed all validations
    Pass,
    /// Test failed
    Fail,
    /// Test was skipped
    Skip,
}

/// Render cost and model counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMetrics {
    /// Sample rate in Hz
    pub sample_rate: f64,

    /// Frames rendered
    pub frames: usize,

    /// Point models that were rendered
    pub active_pointsources: usize,

    /// Total point models
    pub total_pointsources: usize,

    /// Scene preparation time (milliseconds)
    pub prepare_ms: f64,

    /// Processing time (milliseconds)
    pub process_ms: f64,
}

impl RenderMetrics {
    /// Rendered signal duration divided by processing time.
    pub fn realtime_factor(&self) -> f64 {
        if self.process_ms <= 0.0 || self.sample_rate <= 0.0 {
            return f64::INFINITY;
        }
        self.frames as f64 / self.sample_rate * 1e3 / self.process_ms
    }
}

/// Peak of one impulse response channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetrics {
    /// Output port name
    pub port: String,

    /// Sample index of the peak
    pub peak_index: usize,

    /// Peak value
    pub peak_value: f32,

    /// Total energy
    pub energy: f64,
}

/// Test execution metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestExecutionMetrics {
    /// Total test duration (seconds)
    pub duration_seconds: f64,

    /// Number of assertions checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_checked: Option<usize>,
}

/// Builder for constructing metrics reports
pub struct MetricsReportBuilder {
    report: MetricsReport,
}

impl MetricsReportBuilder {
    /// Create a new builder with test name
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            report: MetricsReport {
                test_name: test_name.into(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                result: TestResult::Pass,
                rendering: None,
                responses: Vec::new(),
                test_execution: TestExecutionMetrics::default(),
            },
        }
    }

    /// Set test result
    pub fn result(mut self, result: TestResult) -> Self {
        self.report.result = result;
        self
    }

    /// Set render metrics
    pub fn rendering(mut self, metrics: RenderMetrics) -> Self {
        self.report.rendering = Some(metrics);
        self
    }

    /// Add the peak of one response channel
    pub fn response(mut self, port: impl Into<String>, x: &[f32]) -> Self {
        let (peak_index, peak_value) = crate::peak(x).unwrap_or((0, 0.0));
        self.report.responses.push(ResponseMetrics {
            port: port.into(),
            peak_index,
            peak_value,
            energy: crate::energy(x),
        });
        self
    }

    /// Set test execution metrics
    pub fn execution(mut self, metrics: TestExecutionMetrics) -> Self {
        self.report.test_execution = metrics;
        self
    }

    /// Build the metrics report
    pub fn build(self) -> MetricsReport {
        self.report
    }
}

/// Sink for writing metrics reports to JSON files
pub struct MetricsSink {
    path: std::path::PathBuf,
}

impl MetricsSink {
    /// Create a new metrics sink at the specified path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Write metrics report to file
    pub fn write(&self, report: &MetricsReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_carries_render_metrics() {
        let report = MetricsReportBuilder::new("ir_example")
            .rendering(RenderMetrics {
                sample_rate: 44100.0,
                frames: 44100,
                active_pointsources: 7,
                total_pointsources: 7,
                prepare_ms: 2.0,
                process_ms: 100.0,
            })
            .response("out.0", &[0.0, 0.5, -0.25])
            .build();
        let json = serde_json::to_string_pretty(&report).expect("serializable");
        let parsed: MetricsReport = serde_json::from_str(&json).expect("parsable");
        assert_eq!(parsed.test_name, "ir_example");
        assert_eq!(parsed.result, TestResult::Pass);
        assert_eq!(parsed.responses[0].peak_index, 1);
        let rendering = parsed.rendering.expect("render metrics");
        assert!((rendering.realtime_factor() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn metrics_sink_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reports").join("metrics.json");
        let report = MetricsReportBuilder::new("sink_test")
            .result(TestResult::Skip)
            .execution(TestExecutionMetrics {
                duration_seconds: 1.0,
                assertions_checked: Some(3),
            })
            .build();
        let sink = MetricsSink::create(&path).expect("sink create");
        sink.write(&report).expect("write succeeds");
        let contents = fs::read_to_string(&path).expect("file readable");
        assert!(contents.contains("sink_test"));
        assert!(contents.contains("\"result\": \"skip\""));
    }
}
