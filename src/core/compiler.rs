//! Workflow compilation.
//!
//! Three workflow shapes share the same leaf templates:
//! - build+serve: feature engineering, training, build-and-push, serving
//! - build: feature engineering and training only
//! - serve: build-and-push and serving only, one model image per model path
//!
//! Each compilation is a pure function of the configuration and one suffix
//! drawn from the injected [`SuffixSource`].

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ConfigError, Field, WorkflowConfig};
use crate::domain::artifact::{Artifact, GitLocation, S3Location, SecretRef};
use crate::domain::items::{BuildItem, ServingItem, ITEM_CMD, ITEM_GIT_BRANCH, ITEM_IMAGE, ITEM_JAR};
use crate::domain::placeholder::{input_ref, item_ref};
use crate::domain::template::{
    Container, EnvVar, Inputs, ResourceAction, ResourceRequest, Sidecar, Step, Template,
};
use crate::domain::workflow::{validate_resource_name, Arguments, Document, Spec, StructureError};

use super::branch::{self, BranchResolution};
use super::catalog::*;
use super::items::{model_build_item, model_serving_item, OptionalStages};
use super::naming::{validate_suffix, SuffixSource};
use super::runner::{self, Stage};

/// The workflow shapes the compiler produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Train, then build and serve the images
    BuildServe,
    /// Train only
    Build,
    /// Build and serve already-trained models
    Serve,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildServe => write!(f, "build-serve"),
            Self::Build => write!(f, "build"),
            Self::Serve => write!(f, "serve"),
        }
    }
}

/// Compilation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Generated workflow is structurally invalid: {0}")]
    Structure(#[from] StructureError),
}

/// Compiles configurations into workflow documents
pub struct Compiler<'a> {
    suffixes: &'a dyn SuffixSource,
}

impl<'a> Compiler<'a> {
    pub fn new(suffixes: &'a dyn SuffixSource) -> Self {
        Self { suffixes }
    }

    /// Compile the given workflow shape
    #[instrument(skip(self, conf), fields(model_type = ?conf.model_type))]
    pub fn compile(&self, variant: Variant, conf: &WorkflowConfig) -> Result<Document, CompileError> {
        info!(%variant, "Compiling workflow");

        let document = match variant {
            Variant::BuildServe => self.build_and_serve(conf),
            Variant::Build => self.build_only(conf),
            Variant::Serve => self.serve_only(conf),
        }?;

        info!(
            generate_name = document.generate_name(),
            templates = document.spec().templates().len(),
            "Workflow compiled"
        );
        Ok(document)
    }

    /// Train, then build and serve the model plus optional images
    pub fn build_and_serve(&self, conf: &WorkflowConfig) -> Result<Document, CompileError> {
        let generate_name = conf.generate_name()?;
        let model_type = conf.require(Field::ModelType)?;
        let kube_name = conf.kube_name()?;
        let optional = OptionalStages::from_config(conf)?;

        let suffix = self.draw_suffix()?;
        let docker_version = format!("{}{}", conf.require(Field::DockerVersion)?, suffix);

        let arguments = Arguments::new()
            .with(FEATURES_PARAM, conf.require(Field::FeaturesPath)?)
            .with(COLUMNS_PARAM, conf.require(Field::Columns)?)
            .with(MODEL_PATH_PARAM, conf.require(Field::ModelPath)?)
            .with(MODEL_TYPE_PARAM, model_type)
            .with(DOCKER_REPO_PARAM, conf.require(Field::DockerRepo)?)
            .with(DOCKER_VERSION_PARAM, docker_version);

        let resolution = branch::resolve(model_type);
        let mut build_items = vec![model_build_item(
            &resolution,
            conf.require(Field::ModelJar)?,
            TRAINED_MODEL_BUILD_ARGS,
        )];
        build_items.extend(optional.build_items());

        let mut serving_items = vec![model_serving_item()];
        serving_items.extend(optional.serving_items());

        debug!(
            branch = resolution.branch,
            build_items = build_items.len(),
            serving_items = serving_items.len(),
            "Fan-out items resolved"
        );

        let mut stages = training_stages(conf)?;
        stages.push(build_push_stage(build_items));
        stages.push(serving_stage(format!("{}-{}", kube_name, suffix), serving_items)?);

        let templates = vec![
            Template::steps(BUILD_SERVE_ENTRY, stages)?,
            fe_template(conf)?,
            mt_template(conf)?,
            build_push_template(conf)?,
            serving_template()?,
        ];

        let spec = Spec::new(arguments, templates)?;
        Ok(Document::new(generate_name, spec)?)
    }

    /// Feature engineering and training only
    pub fn build_only(&self, conf: &WorkflowConfig) -> Result<Document, CompileError> {
        let generate_name = conf.generate_name()?;

        let arguments = Arguments::new()
            .with(FEATURES_PARAM, conf.require(Field::FeaturesPath)?)
            .with(COLUMNS_PARAM, conf.require(Field::Columns)?)
            .with(MODEL_PATH_PARAM, conf.require(Field::ModelPath)?)
            .with(MODEL_TYPE_PARAM, conf.require(Field::ModelType)?);

        let templates = vec![
            Template::steps(BUILD_ENTRY, training_stages(conf)?)?,
            fe_template(conf)?,
            mt_template(conf)?,
        ];

        let spec = Spec::new(arguments, templates)?;
        Ok(Document::new(generate_name, spec)?)
    }

    /// Build and serve one model image per configured model path
    pub fn serve_only(&self, conf: &WorkflowConfig) -> Result<Document, CompileError> {
        let generate_name = conf.generate_name()?;
        let model_type = conf.require(Field::ModelType)?;
        let kube_name = conf.kube_name()?;
        let model_paths = conf.model_paths()?;
        let model_jar = conf.require(Field::ModelJar)?;
        let optional = OptionalStages::from_config(conf)?;

        let suffix = self.draw_suffix()?;
        let docker_version = format!("{}{}", conf.require(Field::DockerVersion)?, suffix);

        let arguments = Arguments::new()
            .with(COLUMNS_PARAM, conf.require(Field::Columns)?)
            .with(MODEL_TYPE_PARAM, model_type)
            .with(DOCKER_REPO_PARAM, conf.require(Field::DockerRepo)?)
            .with(DOCKER_VERSION_PARAM, docker_version);

        let resolution = branch::resolve(model_type);
        let mut build_items = model_path_items(&resolution, model_jar, &model_paths);
        build_items.extend(optional.build_items());

        let mut serving_items = vec![model_serving_item()];
        serving_items.extend(optional.serving_items());

        debug!(
            branch = resolution.branch,
            models = model_paths.len(),
            build_items = build_items.len(),
            serving_items = serving_items.len(),
            "Fan-out items resolved"
        );

        // No separator between name and suffix here, unlike build+serve
        let stages = vec![
            build_push_stage(build_items),
            serving_stage(format!("{}{}", kube_name, suffix), serving_items)?,
        ];

        let templates = vec![
            Template::steps(SERVE_ENTRY, stages)?,
            build_push_template(conf)?,
            serving_template()?,
        ];

        let spec = Spec::new(arguments, templates)?;
        Ok(Document::new(generate_name, spec)?)
    }

    fn draw_suffix(&self) -> Result<String, ConfigError> {
        let suffix = self.suffixes.next_suffix();
        validate_suffix(&suffix)?;
        Ok(suffix)
    }
}

/// One model build item per path, in configuration order
fn model_path_items(resolution: &BranchResolution, jar: &str, paths: &[&str]) -> Vec<BuildItem> {
    paths
        .iter()
        .map(|path| model_build_item(resolution, jar, &format!("{} {}", path, MODEL_BUILD_ARGS)))
        .collect()
}

/// Feature engineering followed by training, one stage each
fn training_stages(conf: &WorkflowConfig) -> Result<Vec<Vec<Step>>, ConfigError> {
    let feature_engineering = Step::new(FE_STEP, FE_TEMPLATE)
        .with_parameter(JAR_PARAM, conf.require(Field::FeatureJar)?)
        .with_parameter(INPUT_PARAM, conf.require(Field::DataPath)?)
        .with_parameter(FUNCTION_JAR_PARAM, conf.require(Field::FunctionJar)?)
        .with_parameter(FUNCTION_PARAM, conf.require(Field::FunctionName)?);

    let model_training = Step::new(MT_STEP, MT_TEMPLATE)
        .with_parameter(JAR_PARAM, conf.require(Field::TrainingJar)?);

    Ok(vec![vec![feature_engineering], vec![model_training]])
}

fn build_push_stage(items: Vec<BuildItem>) -> Vec<Step> {
    vec![Step::new(BUILD_PUSH_STEP, BUILD_PUSH_TEMPLATE)
        .with_parameter(JAR_PARAM, item_ref(ITEM_JAR))
        .with_parameter(BRANCH_PARAM, item_ref(ITEM_GIT_BRANCH))
        .with_parameter(CMD_PARAM, item_ref(ITEM_CMD))
        .with_items(items)]
}

/// Serving step deploying each item as `<prefix>-<image>`
fn serving_stage(prefix: String, items: Vec<ServingItem>) -> Result<Vec<Step>, ConfigError> {
    for item in &items {
        let name = format!("{}-{}", prefix, item.image);
        validate_resource_name(&name).map_err(|reason| ConfigError::InvalidField {
            field: Field::KubeName.to_string(),
            reason: format!("serving name '{}': {}", name, reason),
        })?;
    }

    Ok(vec![Step::new(SERVING_STEP, SERVING_TEMPLATE)
        .with_parameter(KUBE_NAME_PARAM, format!("{}-{}", prefix, item_ref(ITEM_IMAGE)))
        .with_parameter(DOCKER_IMAGE_PARAM, item_ref(ITEM_IMAGE))
        .with_items(items)])
}

fn s3_location(conf: &WorkflowConfig, key: String) -> Result<S3Location, ConfigError> {
    Ok(S3Location {
        endpoint: conf.require(Field::S3Endpoint)?.to_string(),
        bucket: conf.require(Field::S3Bucket)?.to_string(),
        key,
        access_key_secret: SecretRef::new(S3_SECRET, S3_ACCESS_KEY),
        secret_key_secret: SecretRef::new(S3_SECRET, S3_SECRET_KEY),
    })
}

/// Jar named by the template's `jar` input, mounted at `path`
fn jar_artifact(conf: &WorkflowConfig, name: &str, path: &str) -> Result<Artifact, ConfigError> {
    Ok(Artifact::s3(name, path, s3_location(conf, input_ref(JAR_PARAM))?))
}

fn s3_env() -> [EnvVar; 2] {
    [
        EnvVar::secret(S3_ACCESS_ENV, SecretRef::new(S3_SECRET, S3_ACCESS_KEY)),
        EnvVar::secret(S3_SECRET_ENV, SecretRef::new(S3_SECRET, S3_SECRET_KEY)),
    ]
}

fn training_resources() -> ResourceRequest {
    ResourceRequest {
        memory: TRAINING_MEMORY_BYTES,
        cpu: TRAINING_CPU,
    }
}

fn fe_template(conf: &WorkflowConfig) -> Result<Template, CompileError> {
    let inputs = Inputs::new()
        .with_parameter(JAR_PARAM)
        .with_parameter(INPUT_PARAM)
        .with_parameter(FUNCTION_JAR_PARAM)
        .with_parameter(FUNCTION_PARAM)
        .with_artifact(jar_artifact(conf, PIPELINE_JAR_ARTIFACT, PIPELINE_JAR_PATH)?)
        .with_artifact(Artifact::s3(
            FUNCTION_JAR_ARTIFACT,
            FUNCTION_JAR_PATH,
            s3_location(conf, input_ref(FUNCTION_JAR_PARAM))?,
        ));

    let container = runner::container(Stage::FeatureEngineering, conf.feature_runner())
        .with_env(s3_env())
        .with_resources(training_resources());

    Ok(Template::container(FE_TEMPLATE, inputs, container, Vec::new())?)
}

fn mt_template(conf: &WorkflowConfig) -> Result<Template, CompileError> {
    let inputs = Inputs::new()
        .with_parameter(JAR_PARAM)
        .with_artifact(jar_artifact(conf, PIPELINE_JAR_ARTIFACT, PIPELINE_JAR_PATH)?);

    let container = runner::container(Stage::Training, conf.training_runner())
        .with_env(s3_env())
        .with_resources(training_resources());

    Ok(Template::container(MT_TEMPLATE, inputs, container, Vec::new())?)
}

fn build_push_template(conf: &WorkflowConfig) -> Result<Template, CompileError> {
    let dockerfiles = Artifact::git(
        DOCKER_FILES_ARTIFACT,
        DOCKER_FILES_PATH,
        GitLocation {
            repo: conf.git_repo.clone(),
            revision: input_ref(BRANCH_PARAM),
        },
    );

    let inputs = Inputs::new()
        .with_parameter(JAR_PARAM)
        .with_parameter(BRANCH_PARAM)
        .with_parameter(CMD_PARAM)
        .with_artifact(dockerfiles)
        .with_artifact(jar_artifact(conf, APP_JAR_ARTIFACT, APP_JAR_PATH)?);

    let container = Container::new(IMAGE_DOCKER, ["sh", "-c"], [BUILD_PUSH_CMD]).with_env([
        EnvVar::literal(DOCKER_HOST_ENV, DOCKER_HOST),
        EnvVar::secret(DOCKER_USERNAME_ENV, SecretRef::new(DOCKER_SECRET, DOCKER_USERNAME_KEY)),
        EnvVar::secret(DOCKER_PASSWORD_ENV, SecretRef::new(DOCKER_SECRET, DOCKER_PASSWORD_KEY)),
    ]);

    let daemon = Sidecar::privileged(DIND_SIDECAR, IMAGE_DIND);

    Ok(Template::container(BUILD_PUSH_TEMPLATE, inputs, container, vec![daemon])?)
}

fn serving_template() -> Result<Template, StructureError> {
    let inputs = Inputs::new()
        .with_parameter(KUBE_NAME_PARAM)
        .with_parameter(DOCKER_IMAGE_PARAM);

    Template::resource(SERVING_TEMPLATE, inputs, ResourceAction::create(SERVING_MANIFEST))
}
