//! Pipeline definition - the top-level YAML document.

use crate::error::{RatsError, Result};
use crate::settings::SessionSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A complete pipeline definition.
///
/// # Example
///
/// ```yaml
/// name: nightly_training
/// settings:
///   failure_policy: continue
/// nodes:
///   - key: ingest
///     executable:
///       kind: command
///       config:
///         program: ./ingest.sh
///   - key: train
///     depends_on: [ingest]
///     executable:
///       kind: sleep
///       config:
///         ms: 50
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name.
    pub name: String,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Session settings.
    #[serde(default)]
    pub settings: SessionSettings,

    /// Nodes, in registration order.
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

/// One node of a pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique node key.
    pub key: String,

    /// Keys of the nodes that must complete first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// The executable bound to this node.
    #[serde(default)]
    pub executable: ExecutableSpec,
}

impl NodeDefinition {
    /// Create a node definition with a `noop` executable.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            depends_on: Vec::new(),
            executable: ExecutableSpec::default(),
        }
    }

    /// Add a dependency.
    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.depends_on.push(key.into());
        self
    }

    /// Set the executable.
    pub fn with_executable(mut self, executable: ExecutableSpec) -> Self {
        self.executable = executable;
        self
    }
}

/// Which executable to build for a node, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableSpec {
    /// Registered executable kind (e.g. `noop`, `command`).
    pub kind: String,

    /// Kind-specific configuration.
    #[serde(default, skip_serializing_if = "serde_yaml::Value::is_null")]
    pub config: serde_yaml::Value,
}

impl ExecutableSpec {
    /// Create a spec for a kind with no configuration.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            config: serde_yaml::Value::Null,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: serde_yaml::Value) -> Self {
        self.config = config;
        self
    }

    /// Get a config value as string.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }

    /// Get a config value as u64.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.config.get(key).and_then(|v| v.as_u64())
    }
}

impl Default for ExecutableSpec {
    fn default() -> Self {
        Self::new("noop")
    }
}

/// A structural problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Where the problem is (`nodes[2]`, `nodes[train].depends_on`).
    pub location: String,
    /// What is wrong.
    pub message: String,
}

impl ValidationIssue {
    fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl PipelineDefinition {
    /// Create an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            settings: SessionSettings::default(),
            nodes: Vec::new(),
        }
    }

    /// Add a node.
    pub fn with_node(mut self, node: NodeDefinition) -> Self {
        self.nodes.push(node);
        self
    }

    /// Set settings.
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse a definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RatsError::YamlParse {
            path: "<inline>".into(),
            cause: e.to_string(),
        })
    }

    /// Parse a definition from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RatsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| RatsError::YamlParse {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    }

    /// Parse and validate in one step.
    pub fn from_yaml_validated(yaml: &str) -> Result<Self> {
        let definition = Self::from_yaml(yaml)?;
        definition.ensure_valid()?;
        Ok(definition)
    }

    /// Like [`PipelineDefinition::validate`], with every issue folded into one
    /// `InvalidDefinition` error.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(issues_to_error)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| RatsError::InvalidDefinition {
            cause: e.to_string(),
        })
    }

    /// Check keys and dependency references.
    ///
    /// Cycles are not detected here; the executor rejects them when the
    /// dependency graph is built.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new("name", "pipeline name must not be empty"));
        }

        let mut keys = HashSet::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if node.key.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    format!("nodes[{index}]"),
                    "node key must not be empty",
                ));
            } else if !keys.insert(node.key.as_str()) {
                issues.push(ValidationIssue::new(
                    format!("nodes[{index}]"),
                    format!("duplicate node key '{}'", node.key),
                ));
            }
            if node.executable.kind.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    format!("nodes[{}].executable", node.key),
                    "executable kind must not be empty",
                ));
            }
        }

        for node in &self.nodes {
            let location = format!("nodes[{}].depends_on", node.key);
            let mut seen = HashSet::new();
            for dependency in &node.depends_on {
                if dependency == &node.key {
                    issues.push(ValidationIssue::new(&location, "node depends on itself"));
                } else if !keys.contains(dependency.as_str()) {
                    issues.push(ValidationIssue::new(
                        &location,
                        format!("unknown node '{dependency}'"),
                    ));
                }
                if !seen.insert(dependency.as_str()) {
                    issues.push(ValidationIssue::new(
                        &location,
                        format!("'{dependency}' listed more than once"),
                    ));
                }
            }
        }

        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }
}

fn issues_to_error(issues: Vec<ValidationIssue>) -> RatsError {
    let cause = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    RatsError::InvalidDefinition { cause }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FailurePolicy;
    use std::io::Write;

    const DIAMOND: &str = r#"
name: diamond
settings:
  failure_policy: continue
nodes:
  - key: a
  - key: b
    depends_on: [a]
    executable:
      kind: sleep
      config:
        ms: 5
  - key: c
    depends_on: [a]
  - key: d
    depends_on: [b, c]
"#;

    #[test]
    fn parse_diamond() {
        let definition = PipelineDefinition::from_yaml_validated(DIAMOND).unwrap();
        assert_eq!(definition.name, "diamond");
        assert_eq!(definition.nodes.len(), 4);
        assert_eq!(definition.settings.failure_policy, FailurePolicy::Continue);
        assert_eq!(definition.nodes[0].executable.kind, "noop");
        assert_eq!(definition.nodes[1].executable.get_u64("ms"), Some(5));
        assert_eq!(definition.nodes[3].depends_on, vec!["b", "c"]);
    }

    #[test]
    fn validation_reports_every_issue() {
        let definition = PipelineDefinition::new("broken")
            .with_node(NodeDefinition::new("a"))
            .with_node(NodeDefinition::new("a"))
            .with_node(NodeDefinition::new("b").depends_on("b"))
            .with_node(NodeDefinition::new("c").depends_on("missing"));

        let issues = definition.validate().unwrap_err();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.message.contains("duplicate node key 'a'")));
        assert!(issues.iter().any(|i| i.message.contains("depends on itself")));
        assert!(issues.iter().any(|i| i.message.contains("unknown node 'missing'")));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let err = PipelineDefinition::from_yaml("name: [unterminated").unwrap_err();
        assert_eq!(err.code(), "E403");
    }

    #[test]
    fn validated_parse_rejects_unknown_dependency() {
        let yaml = "name: p\nnodes:\n  - key: a\n    depends_on: [z]\n";
        let err = PipelineDefinition::from_yaml_validated(yaml).unwrap_err();
        assert!(matches!(err, RatsError::InvalidDefinition { ref cause } if cause.contains("'z'")));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DIAMOND.as_bytes()).unwrap();

        let definition = PipelineDefinition::from_file(file.path()).unwrap();
        assert_eq!(definition.nodes.len(), 4);

        let missing = PipelineDefinition::from_file(Path::new("/nonexistent/rats.yaml"));
        assert!(matches!(missing, Err(RatsError::Io { .. })));
    }

    #[test]
    fn yaml_roundtrip_keeps_structure() {
        let definition = PipelineDefinition::from_yaml(DIAMOND).unwrap();
        let yaml = definition.to_yaml().unwrap();
        let reparsed = PipelineDefinition::from_yaml(&yaml).unwrap();
        assert_eq!(reparsed.nodes[3].depends_on, definition.nodes[3].depends_on);
    }
}
