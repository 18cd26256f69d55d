//! YAML pipeline DSL.
//!
//! ```yaml
//! config:
//!   impute_neighbors: 3
//! sources:
//!   - name: people
//!     locator: people.csv
//!   - name: scores
//!     locator: scores.csv
//!     columns: [id, score]
//! steps:
//!   - name: joined
//!     op: merge
//!     inputs: [people, scores]
//!     reference_columns: [[id], [id]]
//! ```
//!
//! Sources without `columns` get them from the reader (the CSV header).
//! A step may only name sources or steps defined above it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dagprep_core::config::PartialConfig;
use dagprep_core::graph::Graph;
use dagprep_core::id::NodeId;
use dagprep_core::kind::TransformKind;
use dagprep_io::readers::SourceReader;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("source '{name}': {source}")]
    Source {
        name: String,
        source: dagprep_io::Error,
    },

    #[error("'{name}': {source}")]
    Graph {
        name: String,
        source: dagprep_core::error::Error,
    },

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("name '{0}' is used twice")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDef {
    pub name: String,
    pub locator: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDef {
    pub name: String,
    pub op: TransformKind,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub reference_columns: Vec<Vec<String>>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineFile {
    pub config: PartialConfig,
    pub sources: Vec<SourceDef>,
    pub steps: Vec<StepDef>,
}

#[derive(Debug)]
pub struct ParsedPipeline {
    pub graph: Graph,
    pub config: PartialConfig,
    /// Pipeline names → node ids, in definition order by id.
    pub names: BTreeMap<String, NodeId>,
}

impl ParsedPipeline {
    pub fn node(&self, name: &str) -> Result<NodeId, PipelineError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnknownNode(name.to_string()))
    }

    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        self.names
            .iter()
            .find_map(|(n, &v)| (v == id).then_some(n.as_str()))
    }
}

/// Parse YAML into a graph. Locators are used as written.
pub fn parse_pipeline(
    yaml_src: &str,
    reader: &dyn SourceReader,
) -> Result<ParsedPipeline, PipelineError> {
    let doc: PipelineFile = serde_yaml::from_str(yaml_src)?;
    build(doc, reader, |l| l.to_string())
}

/// Read a pipeline file; relative file locators resolve against its
/// directory.
pub fn load_pipeline(
    path: &Path,
    reader: &dyn SourceReader,
) -> Result<ParsedPipeline, PipelineError> {
    let src = std::fs::read_to_string(path)?;
    let doc: PipelineFile = serde_yaml::from_str(&src)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    build(doc, reader, |locator| {
        if locator.contains("://") || Path::new(locator).is_absolute() {
            locator.to_string()
        } else {
            base.join(locator).display().to_string()
        }
    })
}

fn build(
    doc: PipelineFile,
    reader: &dyn SourceReader,
    resolve: impl Fn(&str) -> String,
) -> Result<ParsedPipeline, PipelineError> {
    let mut graph = Graph::new();
    let mut names: BTreeMap<String, NodeId> = BTreeMap::new();

    for src in doc.sources {
        if names.contains_key(&src.name) {
            return Err(PipelineError::DuplicateName(src.name));
        }
        let locator = resolve(&src.locator);
        let columns = match src.columns {
            Some(c) => c,
            None => reader
                .columns(&locator)
                .map_err(|source| PipelineError::Source {
                    name: src.name.clone(),
                    source,
                })?,
        };
        let graph_err = |source| PipelineError::Graph {
            name: src.name.clone(),
            source,
        };
        let id = graph.add_raw_node(locator, columns).map_err(graph_err)?;
        if let Some(label) = src.label {
            graph.set_label(id, label).map_err(graph_err)?;
        }
        names.insert(src.name, id);
    }

    for step in doc.steps {
        if names.contains_key(&step.name) {
            return Err(PipelineError::DuplicateName(step.name));
        }
        let inputs = step
            .inputs
            .iter()
            .map(|n| {
                names
                    .get(n)
                    .copied()
                    .ok_or_else(|| PipelineError::UnknownNode(n.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let graph_err = |source| PipelineError::Graph {
            name: step.name.clone(),
            source,
        };
        let id = graph
            .add_step_node(step.op, inputs, step.reference_columns)
            .map_err(graph_err)?;
        graph
            .set_label(id, step.label.unwrap_or_else(|| step.name.clone()))
            .map_err(graph_err)?;
        names.insert(step.name, id);
    }

    Ok(ParsedPipeline {
        graph,
        config: doc.config,
        names,
    })
}
