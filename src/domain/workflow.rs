//! The workflow document root and its cross-template invariants.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::placeholder::{self, WORKFLOW};
use super::template::{Template, TemplateKind};

pub const API_VERSION: &str = "argoproj.io/v1alpha1";
pub const KIND: &str = "Workflow";

/// Maximum length of a Kubernetes resource name label
const MAX_NAME_LEN: usize = 63;

/// A name-value pair; the value is absent on template input declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Parameter {
    /// An input declaration (no value)
    pub fn declared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// A bound argument
    pub fn bound(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Ordered argument bindings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding, keeping insertion order
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::bound(name, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(Parameter::value)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Prefix the engine completes into a unique workflow name
    pub generate_name: String,
}

/// Global arguments plus the ordered templates.
///
/// The first template is the entry point and must be a step template; every
/// other template must be reachable from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spec {
    #[serde(skip_serializing_if = "Arguments::is_empty")]
    arguments: Arguments,

    templates: Vec<Template>,
}

impl Spec {
    pub fn new(arguments: Arguments, templates: Vec<Template>) -> Result<Self, StructureError> {
        let entry = templates.first().ok_or(StructureError::NoTemplates)?;
        if entry.kind() != TemplateKind::Steps {
            return Err(StructureError::EntryNotSteps {
                name: entry.name().to_string(),
            });
        }

        let mut by_name: HashMap<&str, &Template> = HashMap::new();
        for template in &templates {
            if by_name.insert(template.name(), template).is_some() {
                return Err(StructureError::DuplicateTemplate {
                    name: template.name().to_string(),
                });
            }
        }

        for template in &templates {
            for step in template.all_steps() {
                let target = by_name.get(step.template.as_str()).ok_or_else(|| {
                    StructureError::UndefinedTemplate {
                        step: step.name.clone(),
                        template: step.template.clone(),
                    }
                })?;

                let mut bound = step.arguments.names();
                let mut declared = target.inputs().parameter_names();
                bound.sort_unstable();
                declared.sort_unstable();
                if bound != declared {
                    return Err(StructureError::ArgumentMismatch {
                        step: step.name.clone(),
                        template: step.template.clone(),
                        bound: bound.into_iter().map(String::from).collect(),
                        declared: declared.into_iter().map(String::from).collect(),
                    });
                }
            }

            for text in template.templated_text() {
                for name in placeholder::references(text, WORKFLOW) {
                    if arguments.get(name).is_none() {
                        return Err(StructureError::UndeclaredGlobal {
                            template: template.name().to_string(),
                            parameter: name.to_string(),
                        });
                    }
                }
            }
        }

        let reachable = reachable_from(entry, &by_name);
        if let Some(orphan) = templates.iter().find(|t| !reachable.contains(t.name())) {
            return Err(StructureError::Unreachable {
                name: orphan.name().to_string(),
            });
        }

        Ok(Self {
            arguments,
            templates,
        })
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// The first-defined template, which the engine runs
    pub fn entrypoint(&self) -> &Template {
        &self.templates[0]
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name() == name)
    }
}

fn reachable_from<'a>(entry: &'a Template, by_name: &HashMap<&str, &'a Template>) -> HashSet<&'a str> {
    let mut seen = HashSet::from([entry.name()]);
    let mut queue = VecDeque::from([entry]);

    while let Some(template) = queue.pop_front() {
        for step in template.all_steps() {
            if let Some(&target) = by_name.get(step.template.as_str()) {
                if seen.insert(target.name()) {
                    queue.push_back(target);
                }
            }
        }
    }

    seen
}

/// A complete workflow document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    api_version: String,
    kind: String,
    metadata: Metadata,
    spec: Spec,
}

impl Document {
    pub fn new(generate_name: impl Into<String>, spec: Spec) -> Result<Self, StructureError> {
        let generate_name = generate_name.into();
        validate_resource_name(&generate_name).map_err(|reason| StructureError::InvalidName {
            name: generate_name.clone(),
            reason,
        })?;

        Ok(Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata { generate_name },
            spec,
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn generate_name(&self) -> &str {
        &self.metadata.generate_name
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }
}

/// Check that `name` is a valid DNS-1123 label
pub fn validate_resource_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("name is longer than 63 characters");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("name may only contain lowercase letters, digits and '-'");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err("name must start and end with a letter or digit");
    }
    Ok(())
}

/// Violations of the document's structural invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("Invalid resource name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Template '{template}' has no stages")]
    EmptySteps { template: String },

    #[error("Template '{template}' stage {stage} has no steps")]
    EmptyStage { template: String, stage: usize },

    #[error("Template '{template}' references undeclared input parameter '{parameter}'")]
    UndeclaredInput { template: String, parameter: String },

    #[error("Template '{template}' references undeclared workflow parameter '{parameter}'")]
    UndeclaredGlobal { template: String, parameter: String },

    #[error("Step '{step}' in template '{template}' uses item key '{key}' that its items do not provide")]
    MissingItemKey {
        template: String,
        step: String,
        key: String,
    },

    #[error("Spec has no templates")]
    NoTemplates,

    #[error("Entry template '{name}' is not a step template")]
    EntryNotSteps { name: String },

    #[error("Duplicate template name '{name}'")]
    DuplicateTemplate { name: String },

    #[error("Step '{step}' references undefined template '{template}'")]
    UndefinedTemplate { step: String, template: String },

    #[error("Step '{step}' binds {bound:?} but template '{template}' declares {declared:?}")]
    ArgumentMismatch {
        step: String,
        template: String,
        bound: Vec<String>,
        declared: Vec<String>,
    },

    #[error("Template '{name}' is not reachable from the entry template")]
    Unreachable { name: String },
}
