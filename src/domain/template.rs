//! Templates and the building blocks of leaf templates.
//!
//! A template is either a step template (ordered stages of steps) or a leaf
//! template that runs exactly one container or submits exactly one manifest.
//! Constructors check the template's own invariants; cross-template checks
//! live in [`Spec::new`](super::workflow::Spec::new).

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, SecretRef};
use super::items::FanOutItem;
use super::placeholder::{self, INPUTS, ITEM};
use super::workflow::{Arguments, Parameter, StructureError};

/// Which of the three template shapes a template has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Steps,
    Container,
    Resource,
}

/// A reusable task definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    steps: Vec<Vec<Step>>,

    #[serde(skip_serializing_if = "Inputs::is_empty")]
    inputs: Inputs,

    #[serde(skip_serializing_if = "Option::is_none")]
    container: Option<Container>,

    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<ResourceAction>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    sidecars: Vec<Sidecar>,
}

impl Template {
    /// Create a step template from ordered stages.
    ///
    /// Stages run one after another; the steps inside one stage (and every
    /// fan-out instance of them) may run in parallel.
    pub fn steps(name: impl Into<String>, stages: Vec<Vec<Step>>) -> Result<Self, StructureError> {
        let name = name.into();

        if stages.is_empty() {
            return Err(StructureError::EmptySteps { template: name });
        }

        for (index, stage) in stages.iter().enumerate() {
            if stage.is_empty() {
                return Err(StructureError::EmptyStage {
                    template: name,
                    stage: index,
                });
            }

            for step in stage {
                step.check_item_keys(&name)?;
            }
        }

        let template = Self {
            name,
            steps: stages,
            inputs: Inputs::default(),
            container: None,
            resource: None,
            sidecars: Vec::new(),
        };
        template.check_declared_inputs()?;

        Ok(template)
    }

    /// Create a leaf template that runs a container, with optional sidecars
    pub fn container(
        name: impl Into<String>,
        inputs: Inputs,
        container: Container,
        sidecars: Vec<Sidecar>,
    ) -> Result<Self, StructureError> {
        let template = Self {
            name: name.into(),
            steps: Vec::new(),
            inputs,
            container: Some(container),
            resource: None,
            sidecars,
        };
        template.check_declared_inputs()?;

        Ok(template)
    }

    /// Create a leaf template that submits a cluster manifest
    pub fn resource(
        name: impl Into<String>,
        inputs: Inputs,
        action: ResourceAction,
    ) -> Result<Self, StructureError> {
        let template = Self {
            name: name.into(),
            steps: Vec::new(),
            inputs,
            container: None,
            resource: Some(action),
            sidecars: Vec::new(),
        };
        template.check_declared_inputs()?;

        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TemplateKind {
        if self.container.is_some() {
            TemplateKind::Container
        } else if self.resource.is_some() {
            TemplateKind::Resource
        } else {
            TemplateKind::Steps
        }
    }

    /// Ordered stages (empty for leaf templates)
    pub fn stages(&self) -> &[Vec<Step>] {
        &self.steps
    }

    /// Iterate over every step of every stage
    pub fn all_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().flatten()
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn as_container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn as_resource(&self) -> Option<&ResourceAction> {
        self.resource.as_ref()
    }

    pub fn sidecars(&self) -> &[Sidecar] {
        &self.sidecars
    }

    /// Every string the engine will run placeholder substitution over
    pub(crate) fn templated_text(&self) -> Vec<&str> {
        let mut text: Vec<&str> = Vec::new();

        for step in self.all_steps() {
            text.extend(step.arguments.parameters.iter().filter_map(Parameter::value));
            text.extend(step.with_items.iter().flat_map(FanOutItem::values));
        }

        for artifact in &self.inputs.artifacts {
            text.extend(artifact.templated_fields());
        }

        if let Some(container) = &self.container {
            text.extend(container.command.iter().map(String::as_str));
            text.extend(container.args.iter().map(String::as_str));
            text.extend(container.env.iter().filter_map(|e| e.value.as_deref()));
        }

        if let Some(resource) = &self.resource {
            text.push(&resource.manifest);
        }

        text
    }

    fn check_declared_inputs(&self) -> Result<(), StructureError> {
        for text in self.templated_text() {
            for parameter in placeholder::references(text, INPUTS) {
                if !self.inputs.declares(parameter) {
                    return Err(StructureError::UndeclaredInput {
                        template: self.name.clone(),
                        parameter: parameter.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// An invocation of a template from inside a step template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Step name (shown in the engine UI)
    pub name: String,

    /// Name of the invoked template
    pub template: String,

    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,

    /// Fan-out items; the step runs once per item when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with_items: Vec<FanOutItem>,
}

impl Step {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            arguments: Arguments::default(),
            with_items: Vec::new(),
        }
    }

    /// Bind an argument, keeping insertion order
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments = self.arguments.with(name, value);
        self
    }

    /// Fan the step out over `items`, keeping their order
    pub fn with_items<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FanOutItem>,
    {
        self.with_items.extend(items.into_iter().map(Into::into));
        self
    }

    fn check_item_keys(&self, template: &str) -> Result<(), StructureError> {
        for value in self.arguments.parameters.iter().filter_map(Parameter::value) {
            for key in placeholder::references(value, ITEM) {
                let provided = !self.with_items.is_empty()
                    && self.with_items.iter().all(|item| item.keys().contains(&key));

                if !provided {
                    return Err(StructureError::MissingItemKey {
                        template: template.to_string(),
                        step: self.name.clone(),
                        key: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Declared inputs of a leaf template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input parameter
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::declared(name));
        self
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.artifacts.is_empty()
    }

    pub fn declares(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

/// The primary container of a leaf template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

impl Container {
    pub fn new<C, A>(image: impl Into<String>, command: C, args: A) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            image: image.into(),
            command: command.into_iter().map(Into::into).collect(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            resources: None,
        }
    }

    pub fn with_env(mut self, env: impl IntoIterator<Item = EnvVar>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn with_resources(mut self, requests: ResourceRequest) -> Self {
        self.resources = Some(ResourceRequirements { requests });
        self
    }
}

/// A container environment variable, literal or secret-backed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    pub fn secret(name: impl Into<String>, secret: SecretRef) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: secret,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    pub secret_key_ref: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub requests: ResourceRequest,
}

/// Scheduling request for a container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Memory in bytes
    pub memory: u64,

    /// CPU in cores (fractions allowed)
    pub cpu: f64,
}

/// A secondary container co-scheduled with the primary one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    pub name: String,
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,

    /// Share the primary container's volume mounts
    #[serde(default)]
    pub mirror_volume_mounts: bool,
}

impl Sidecar {
    /// A privileged sidecar sharing the primary container's mounts
    pub fn privileged(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            security_context: Some(SecurityContext { privileged: true }),
            mirror_volume_mounts: true,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.security_context.as_ref().is_some_and(|c| c.privileged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    pub privileged: bool,
}

/// A manifest submitted directly to the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAction {
    /// Verb, e.g. `create`
    pub action: String,

    /// Manifest body
    pub manifest: String,
}

impl ResourceAction {
    pub fn create(manifest: impl Into<String>) -> Self {
        Self {
            action: "create".to_string(),
            manifest: manifest.into(),
        }
    }
}
