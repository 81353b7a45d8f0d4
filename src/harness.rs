//! Cross-validation harness
//!
//! Runs every shortest-path backend from identical inputs and compares the
//! results. Per repetition: pick a random source, run sequential relaxation
//! (the ground truth), the priority-queue algorithm, and one fresh engine
//! session per enumerated (device, variant) configuration. Backend failures
//! skip that configuration; a distance mismatch beyond tolerance aborts the
//! whole run, since it means a correctness regression in either the
//! reference or the accelerated path.
//!
//! Distance vectors are transient per repetition; only per-label elapsed
//! times survive, aggregated into a [`TimingReport`] at the end.

use crate::algorithms::{bellman_ford, dijkstra};
use crate::model::EdgeListGraph;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(feature = "gpu")]
use crate::gpu::{EngineError, GpuDevice, KernelVariant, RelaxEngine, RunOptions};

/// Absolute elementwise tolerance for cross-algorithm agreement.
pub const TOLERANCE: f32 = 1e-6;

/// Report label for the sequential relaxation reference.
pub const BELLMAN_FORD_LABEL: &str = "bellman-ford (cpu)";

/// Report label for the priority-queue algorithm, the timing baseline.
pub const DIJKSTRA_LABEL: &str = "dijkstra (cpu)";

/// Fatal harness failures
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No vertex to pick a source from
    #[error("graph has no vertices to pick a source from")]
    EmptyGraph,

    /// An algorithm disagreed with the reference beyond [`TOLERANCE`]
    #[error(
        "{label} diverged from the reference at vertex {vertex}: expected {expected}, got {actual}"
    )]
    Mismatch {
        /// Which configuration produced the bad vector
        label: String,
        /// First diverging vertex index
        vertex: usize,
        /// Reference distance at that vertex
        expected: f32,
        /// Diverging distance at that vertex
        actual: f32,
    },
}

/// Harness settings
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Number of test repetitions, each with its own random source
    pub repetitions: usize,

    /// Seed for source selection; `None` draws from entropy
    pub seed: Option<u64>,

    /// Convergence-loop bounds applied to every engine session
    #[cfg(feature = "gpu")]
    pub run: RunOptions,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            repetitions: 1,
            seed: None,
            #[cfg(feature = "gpu")]
            run: RunOptions::default(),
        }
    }
}

/// One backend's output for one repetition; discarded once compared
struct ComparisonRecord {
    label: String,
    distances: Vec<f32>,
    elapsed: Duration,
}

/// Aggregated timing for one label
#[derive(Debug, Clone)]
pub struct TimingRow {
    /// Configuration label
    pub label: String,
    /// Arithmetic mean over the repetitions that produced this label
    pub mean: Duration,
    /// Mean as a percentage of the priority-queue baseline mean, when the
    /// baseline exists and is non-zero
    pub percent_of_baseline: Option<f64>,
}

/// End-of-run timing summary, one row per label
#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    /// Rows in label order
    pub rows: Vec<TimingRow>,
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Average times")?;
        writeln!(f, "{:<40}{:<16}percent", "name", "avg.time")?;
        for row in &self.rows {
            write!(f, "{:<40}{:<16.6}", row.label, row.mean.as_secs_f64())?;
            match row.percent_of_baseline {
                Some(percent) => writeln!(f, "{percent:.0}%")?,
                None => writeln!(f, "-")?,
            }
        }
        Ok(())
    }
}

/// Drives all backends from identical inputs and cross-checks their outputs
pub struct ValidationHarness {
    config: HarnessConfig,
    #[cfg(feature = "gpu")]
    devices: Vec<GpuDevice>,
}

impl ValidationHarness {
    /// Build a harness, enumerating compute devices once
    ///
    /// Every enumerated device is paired with every kernel variant; sessions
    /// for those pairs are created and destroyed strictly sequentially
    /// during [`Self::run`].
    pub async fn new(config: HarnessConfig) -> Self {
        #[cfg(feature = "gpu")]
        let devices = GpuDevice::enumerate().await;
        #[cfg(feature = "gpu")]
        tracing::info!(devices = devices.len(), "enumerated compute devices");

        Self {
            config,
            #[cfg(feature = "gpu")]
            devices,
        }
    }

    /// Run all repetitions and produce the timing report
    ///
    /// # Errors
    ///
    /// [`HarnessError::EmptyGraph`] when there is no source to pick;
    /// [`HarnessError::Mismatch`] on the first cross-algorithm disagreement
    /// (fatal, aborts immediately). Engine failures are logged per
    /// configuration and skipped.
    pub async fn run(&self, graph: &EdgeListGraph) -> Result<TimingReport, HarnessError> {
        if graph.vertex_count() == 0 {
            return Err(HarnessError::EmptyGraph);
        }

        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut timings: BTreeMap<String, Vec<Duration>> = BTreeMap::new();

        for repetition in 0..self.config.repetitions {
            let source = rng.gen_range(0..graph.vertex_count());
            tracing::info!(repetition, source, "starting repetition");

            let mut records = Vec::new();

            let started = Instant::now();
            let reference = bellman_ford(graph, source);
            let elapsed = started.elapsed();
            tracing::info!(passes = reference.passes, ?elapsed, "sequential relaxation done");
            records.push(ComparisonRecord {
                label: BELLMAN_FORD_LABEL.to_string(),
                distances: reference.distances,
                elapsed,
            });

            let started = Instant::now();
            let queued = dijkstra(graph, source);
            records.push(ComparisonRecord {
                label: DIJKSTRA_LABEL.to_string(),
                distances: queued,
                elapsed: started.elapsed(),
            });

            #[cfg(feature = "gpu")]
            for device in &self.devices {
                for variant in KernelVariant::ALL {
                    let label = format!("{} ({})", device.label(), variant.label());
                    let started = Instant::now();
                    match self.accelerated_distances(device, variant, graph, source).await {
                        Ok(distances) => records.push(ComparisonRecord {
                            label,
                            distances,
                            elapsed: started.elapsed(),
                        }),
                        Err(error) => {
                            tracing::warn!(%label, %error, "skipping accelerated configuration");
                        }
                    }
                }
            }

            for candidate in &records[1..] {
                compare_distances(&candidate.label, &records[0].distances, &candidate.distances)?;
            }

            // Distance vectors drop here; only the timings survive
            for record in records {
                timings.entry(record.label).or_default().push(record.elapsed);
            }
        }

        Ok(build_report(&timings))
    }

    /// One full engine session: initialize, bind, run, read back
    #[cfg(feature = "gpu")]
    async fn accelerated_distances(
        &self,
        device: &GpuDevice,
        variant: KernelVariant,
        graph: &EdgeListGraph,
        source: u32,
    ) -> Result<Vec<f32>, EngineError> {
        let engine = RelaxEngine::new(device, variant).await?;
        let mut session = engine.bind(graph, source).await?;
        let stats = session.run(self.config.run).await?;
        tracing::debug!(passes = stats.passes, "accelerated run converged");
        session
            .distances()
            .map(<[f32]>::to_vec)
            .ok_or_else(|| EngineError::Transfer("distances unavailable after run".to_string()))
    }
}

/// Elementwise comparison against the reference at [`TOLERANCE`]
fn compare_distances(label: &str, expected: &[f32], actual: &[f32]) -> Result<(), HarnessError> {
    for (vertex, (e, a)) in expected.iter().zip(actual).enumerate() {
        if (e - a).abs() > TOLERANCE {
            return Err(HarnessError::Mismatch {
                label: label.to_string(),
                vertex,
                expected: *e,
                actual: *a,
            });
        }
    }
    Ok(())
}

/// Per-label means plus percentage of the priority-queue baseline
#[allow(clippy::cast_possible_truncation)]
fn build_report(timings: &BTreeMap<String, Vec<Duration>>) -> TimingReport {
    let mean = |samples: &Vec<Duration>| -> Duration {
        samples.iter().sum::<Duration>() / samples.len().max(1) as u32
    };

    let baseline = timings
        .get(DIJKSTRA_LABEL)
        .map(mean)
        .map(|m| m.as_secs_f64())
        .filter(|&secs| secs > 0.0);

    let rows = timings
        .iter()
        .map(|(label, samples)| {
            let mean = mean(samples);
            TimingRow {
                label: label.clone(),
                mean,
                percent_of_baseline: baseline.map(|b| mean.as_secs_f64() / b * 100.0),
            }
        })
        .collect();

    TimingReport { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INFINITE_DISTANCE;

    fn mirrored_chain() -> EdgeListGraph {
        EdgeListGraph::new(
            3,
            vec![[0, 1], [1, 0], [1, 2], [2, 1]],
            vec![1.5, 1.5, 2.5, 2.5],
        )
        .unwrap()
    }

    #[test]
    fn test_compare_accepts_within_tolerance() {
        let expected = [0.0, 1.5, 4.0];
        let actual = [0.0, 1.5 + 5e-7, 4.0 - 5e-7];
        assert!(compare_distances("x", &expected, &actual).is_ok());
    }

    #[test]
    fn test_compare_reports_first_divergence() {
        let expected = [0.0, 1.5, 4.0];
        let actual = [0.0, 2.5, 9.0];
        let err = compare_distances("gpu (folded)", &expected, &actual).unwrap_err();
        match err {
            HarnessError::Mismatch { label, vertex, expected, actual } => {
                assert_eq!(label, "gpu (folded)");
                assert_eq!(vertex, 1);
                assert_eq!(expected, 1.5);
                assert_eq!(actual, 2.5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compare_sentinels_agree() {
        let expected = [0.0, INFINITE_DISTANCE];
        assert!(compare_distances("x", &expected, &expected.clone()).is_ok());
    }

    #[tokio::test]
    async fn test_run_cross_validates_cpu_algorithms() {
        let graph = mirrored_chain();
        let harness = ValidationHarness::new(HarnessConfig {
            repetitions: 3,
            seed: Some(7),
            ..Default::default()
        })
        .await;

        let report = harness.run(&graph).await.unwrap();
        let labels: Vec<_> = report.rows.iter().map(|r| r.label.as_str()).collect();
        assert!(labels.contains(&BELLMAN_FORD_LABEL));
        assert!(labels.contains(&DIJKSTRA_LABEL));
    }

    #[tokio::test]
    async fn test_run_rejects_empty_graph() {
        let graph = EdgeListGraph::new(0, vec![], vec![]).unwrap();
        let harness = ValidationHarness::new(HarnessConfig::default()).await;
        assert!(matches!(
            harness.run(&graph).await,
            Err(HarnessError::EmptyGraph)
        ));
    }

    #[test]
    fn test_report_percent_of_baseline() {
        let mut timings = BTreeMap::new();
        timings.insert(
            BELLMAN_FORD_LABEL.to_string(),
            vec![Duration::from_millis(30), Duration::from_millis(10)],
        );
        timings.insert(DIJKSTRA_LABEL.to_string(), vec![Duration::from_millis(10)]);

        let report = build_report(&timings);
        let bellman = report
            .rows
            .iter()
            .find(|r| r.label == BELLMAN_FORD_LABEL)
            .unwrap();
        assert_eq!(bellman.mean, Duration::from_millis(20));
        let percent = bellman.percent_of_baseline.unwrap();
        assert!((percent - 200.0).abs() < 1e-9);

        let baseline = report
            .rows
            .iter()
            .find(|r| r.label == DIJKSTRA_LABEL)
            .unwrap();
        assert!((baseline.percent_of_baseline.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_display_lists_labels() {
        let mut timings = BTreeMap::new();
        timings.insert(DIJKSTRA_LABEL.to_string(), vec![Duration::from_millis(5)]);
        let rendered = build_report(&timings).to_string();
        assert!(rendered.contains("Average times"));
        assert!(rendered.contains(DIJKSTRA_LABEL));
        assert!(rendered.contains("100%"));
    }
}
