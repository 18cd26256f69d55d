//! Runtime: execute a graph in generation order and record a run.
//!
//! Outcomes are split three ways:
//! - `Err(ExecError::Validation)` from `preview`/`run_pipeline`: the graph's
//!   column references do not fit; nothing ran and the previous run stays.
//! - `Ok(run)` with `RunStatus::Failed`: a node legitimately produced no
//!   output, a source was unreadable, or the run was cancelled. Datasets
//!   committed before that node remain readable.
//! - Any other `Err`: an internal fault. The run is kept and marked failed.

use std::collections::BTreeMap;
use std::time::Instant;

use thiserror::Error;

use dagprep_core::cancel::CancelFlag;
use dagprep_core::config::EngineConfig;
use dagprep_core::graph::{Graph, NodeKind};
use dagprep_core::id::{DatasetId, NodeId};
use dagprep_core::kind::TransformKind;
use dagprep_core::manifest::StepRecord;
use dagprep_core::types::Dataset;

use dagprep_io::catalog::RunSink;
use dagprep_io::describe::{default_description, Described, Describer};
use dagprep_io::readers::SourceReader;

use dagprep_operators::{OpError, Output, Registry};
use dagprep_profile::{profile_with, Profile};

use crate::metrics;
use crate::replay::hash_graph;
use crate::run::{FailureReason, Run, RunStatus};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("validation failed at {node}: {source}")]
    Validation { node: NodeId, source: OpError },

    #[error("operator fault at {node}: {message}")]
    Operator { node: NodeId, message: String },

    #[error("{node} has no dataset for its input {input}")]
    MissingInput { node: NodeId, input: NodeId },

    #[error("no run has been started")]
    NoRun,

    #[error("{0} has no dataset in the current run")]
    NoDataset(NodeId),

    #[error("persistence: {0}")]
    Persist(#[from] dagprep_io::Error),

    #[error(transparent)]
    Core(#[from] dagprep_core::error::Error),
}

impl ExecError {
    /// The node a fault is attributed to, when there is one.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            ExecError::Validation { node, .. }
            | ExecError::Operator { node, .. }
            | ExecError::MissingInput { node, .. }
            | ExecError::NoDataset(node) => Some(*node),
            _ => None,
        }
    }
}

/// Engine owns the transform registry, the source reader, and the most
/// recent run. Callers own the graph and lend it for each run.
pub struct Engine {
    cfg: EngineConfig,
    registry: Registry,
    source: Box<dyn SourceReader>,
    describer: Option<Box<dyn Describer>>,
    cancel: CancelFlag,
    run: Option<Run>,
}

impl Engine {
    pub fn new(cfg: EngineConfig, source: impl SourceReader + 'static) -> Self {
        Self {
            registry: Registry::new(&cfg),
            cfg,
            source: Box::new(source),
            describer: None,
            cancel: CancelFlag::new(),
            run: None,
        }
    }

    pub fn with_describer(mut self, describer: impl Describer + 'static) -> Self {
        self.describer = Some(Box::new(describer));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Handle that aborts the current run at the next node boundary (or the
    /// next imputed row). The flag is cleared when a run starts.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Propagate column lists through the graph without loading any data.
    pub fn preview(&self, graph: &Graph) -> Result<BTreeMap<NodeId, Vec<String>>, ExecError> {
        let mut columns: BTreeMap<NodeId, Vec<String>> = BTreeMap::new();
        for generation in graph.topological_order() {
            for id in generation? {
                let out = match &graph.node(id)?.kind {
                    NodeKind::RawSource { columns: cols, .. } => cols.clone(),
                    NodeKind::Step {
                        transform,
                        inputs,
                        reference_columns,
                    } => {
                        let input_columns = inputs
                            .iter()
                            .map(|p| {
                                columns.get(p).cloned().ok_or(ExecError::MissingInput {
                                    node: id,
                                    input: *p,
                                })
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        self.registry
                            .validate_columns(*transform, &input_columns, reference_columns)
                            .map_err(|source| ExecError::Validation { node: id, source })?
                    }
                };
                columns.insert(id, out);
            }
        }
        Ok(columns)
    }

    /// Execute `graph` from scratch, replacing any previous run.
    pub fn run_pipeline(&mut self, graph: &Graph) -> Result<&Run, ExecError> {
        self.preview(graph)?;
        let graph_hash = hash_graph(graph)?;

        self.cancel.reset();
        let mut run = Run::start(graph_hash);
        tracing::info!(run = %run.id(), nodes = graph.len(), "run started");

        let outcome = self.execute(graph, &mut run);
        match &outcome {
            Ok(()) => run.complete(),
            Err(e) => {
                tracing::error!(run = %run.id(), error = %e, "run aborted by internal fault");
                run.fail(e.node(), FailureReason::Fault(e.to_string()));
            }
        }
        match run.status() {
            RunStatus::Failed { node, reason } => {
                tracing::warn!(run = %run.id(), node = ?node, %reason, "run failed")
            }
            _ => tracing::info!(
                run = %run.id(),
                datasets = run.store().len(),
                steps = run.steps().len(),
                "run completed"
            ),
        }

        let run: &Run = self.run.insert(run);
        match outcome {
            Ok(()) => Ok(run),
            Err(e) => Err(e),
        }
    }

    fn execute(&self, graph: &Graph, run: &mut Run) -> Result<(), ExecError> {
        for generation in graph.topological_order() {
            for id in generation? {
                if self.cancel.is_cancelled() {
                    run.fail(Some(id), FailureReason::Cancelled);
                    return Ok(());
                }
                let node = graph.node(id)?;
                let started = Instant::now();

                let produced = match &node.kind {
                    NodeKind::RawSource { locator, columns } => {
                        self.load_source(run, id, locator, columns)
                    }
                    NodeKind::Step {
                        transform,
                        inputs,
                        reference_columns,
                    } => self.run_step(run, id, *transform, inputs, reference_columns)?,
                };
                metrics::node_finished(id, &node.label, produced, started.elapsed());

                if produced.is_none() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn load_source(
        &self,
        run: &mut Run,
        id: NodeId,
        locator: &str,
        declared: &[String],
    ) -> Option<DatasetId> {
        let dataset = match self.source.read(locator) {
            Ok(d) => d,
            Err(e) => {
                run.fail(Some(id), FailureReason::Source(format!("{}: {}", locator, e)));
                return None;
            }
        };
        if dataset.column_names() != declared {
            run.fail(
                Some(id),
                FailureReason::Validation(format!(
                    "{} has columns {:?}, expected {:?}",
                    locator,
                    dataset.column_names(),
                    declared
                )),
            );
            return None;
        }
        let rows = dataset.num_rows();
        let out = run.commit(id, dataset);
        tracing::debug!(node = %id, dataset = %out, rows, locator, "source loaded");
        Some(out)
    }

    fn run_step(
        &self,
        run: &mut Run,
        id: NodeId,
        kind: TransformKind,
        inputs: &[NodeId],
        reference_columns: &[Vec<String>],
    ) -> Result<Option<DatasetId>, ExecError> {
        let input_ids = inputs
            .iter()
            .map(|p| {
                run.dataset_id_for(*p)
                    .ok_or(ExecError::MissingInput { node: id, input: *p })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let datasets = input_ids
            .iter()
            .map(|d| run.store().get_dataset(*d))
            .collect::<Result<Vec<&Dataset>, _>>()?;

        let output = match self
            .registry
            .execute(kind, &datasets, reference_columns, &self.cancel)
        {
            Ok(Output::Produced(d)) => d,
            Ok(Output::NoOutput { reason }) => {
                run.fail(Some(id), FailureReason::NoOutput(reason));
                return Ok(None);
            }
            Err(OpError::Cancelled) => {
                run.fail(Some(id), FailureReason::Cancelled);
                return Ok(None);
            }
            Err(OpError::Validation(m)) => {
                run.fail(Some(id), FailureReason::Validation(m));
                return Ok(None);
            }
            Err(OpError::Exec(message)) => return Err(ExecError::Operator { node: id, message }),
        };

        let rows = output.num_rows();
        let out = run.commit(id, output);
        let description = self.describe(run, kind, &input_ids, out);
        tracing::debug!(node = %id, dataset = %out, rows, %description, "step done");
        run.record_step(StepRecord {
            node: id,
            description,
            inputs: input_ids,
            output: out,
        });
        Ok(Some(out))
    }

    fn describe(&self, run: &Run, kind: TransformKind, inputs: &[DatasetId], out: DatasetId) -> String {
        let fallback = || default_description(kind, inputs, out);
        let Some(describer) = &self.describer else {
            return fallback();
        };
        let store = run.store();
        let resolved: Option<Vec<Described<'_>>> = inputs
            .iter()
            .map(|id| store.get_dataset(*id).ok().map(|d| (*id, d)))
            .collect();
        match (resolved, store.get_dataset(out)) {
            (Some(ins), Ok(o)) => describer.describe(kind, &ins, (out, o)).unwrap_or_else(fallback),
            _ => fallback(),
        }
    }

    /// Status of the most recent run (`Idle` before the first one).
    pub fn status(&self) -> RunStatus {
        self.run
            .as_ref()
            .map(|r| r.status().clone())
            .unwrap_or(RunStatus::Idle)
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    /// Dataset produced by `node` in the most recent run.
    pub fn get_dataset(&self, node: NodeId) -> Result<&Dataset, ExecError> {
        let run = self.run.as_ref().ok_or(ExecError::NoRun)?;
        let id = run.dataset_id_for(node).ok_or(ExecError::NoDataset(node))?;
        Ok(run.store().get_dataset(id)?)
    }

    pub fn profile_node(&self, node: NodeId) -> Result<Profile, ExecError> {
        Ok(profile_with(self.get_dataset(node)?, self.cfg.profile_top_values))
    }

    /// Store the finished run's metadata and one profile per dataset.
    pub fn persist(&self, sink: &dyn RunSink) -> Result<(), ExecError> {
        let run = self.run.as_ref().ok_or(ExecError::NoRun)?;
        let profiles = run.profiles(self.cfg.profile_top_values);
        sink.persist(run.manifest(), &profiles)?;
        Ok(())
    }
}
