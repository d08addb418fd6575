//! Workflow Variant Integration Tests
//!
//! Tests for the shape of the three compiled workflows and how they relate.

use std::collections::BTreeSet;

use argoml::core::catalog::*;
use argoml::core::{Compiler, FixedSuffixes, Runner, Variant};
use argoml::domain::{Document, TemplateKind};
use argoml::{CompileError, ConfigError, WorkflowConfig};

fn config() -> WorkflowConfig {
    WorkflowConfig {
        model_type: Some("sentiment".to_string()),
        features_path: Some("s3://ml/features".to_string()),
        columns: Some("text,label".to_string()),
        model_path: Some("m1".to_string()),
        data_path: Some("s3://ml/raw".to_string()),
        docker_repo: Some("registry.local/ml".to_string()),
        docker_version: Some("1.0-".to_string()),
        feature_jar: Some("jars/fe.jar".to_string()),
        function_jar: Some("jars/func.jar".to_string()),
        function_name: Some("tokenize".to_string()),
        training_jar: Some("jars/train.jar".to_string()),
        model_jar: Some("jars/model.jar".to_string()),
        stats_jar: Some("jars/stats.jar".to_string()),
        processor_jar: Some("jars/processor.jar".to_string()),
        s3_endpoint: Some("minio:9000".to_string()),
        s3_bucket: Some("ml".to_string()),
        kube_name: Some("ml-serving".to_string()),
        enable_stats: true,
        enable_processor: false,
        ..Default::default()
    }
}

fn compile(variant: Variant, conf: &WorkflowConfig) -> Document {
    let suffixes = FixedSuffixes::single("x1y2z");
    Compiler::new(&suffixes).compile(variant, conf).unwrap()
}

fn template_names(document: &Document) -> Vec<&str> {
    document
        .spec()
        .templates()
        .iter()
        .map(|t| t.name())
        .collect()
}

/// Step names per stage of the entry template
fn stage_names(document: &Document) -> Vec<Vec<String>> {
    document
        .spec()
        .entrypoint()
        .stages()
        .iter()
        .map(|stage| stage.iter().map(|s| s.name.clone()).collect())
        .collect()
}

#[test]
fn test_build_serve_end_to_end() {
    let document = compile(Variant::BuildServe, &config());

    assert_eq!(document.api_version(), "argoproj.io/v1alpha1");
    assert_eq!(document.kind(), "Workflow");
    assert_eq!(document.generate_name(), "sentiment");
    assert_eq!(
        template_names(&document),
        vec![
            BUILD_SERVE_ENTRY,
            FE_TEMPLATE,
            MT_TEMPLATE,
            BUILD_PUSH_TEMPLATE,
            SERVING_TEMPLATE
        ]
    );

    let stages = document.spec().entrypoint().stages();
    assert_eq!(stages.len(), 4);
    assert_eq!(stages[2][0].with_items.len(), 2);
    assert_eq!(stages[3][0].with_items.len(), 2);

    let globals = document.spec().arguments().names();
    assert_eq!(
        globals,
        vec![
            FEATURES_PARAM,
            COLUMNS_PARAM,
            MODEL_PATH_PARAM,
            MODEL_TYPE_PARAM,
            DOCKER_REPO_PARAM,
            DOCKER_VERSION_PARAM
        ]
    );
    assert_eq!(
        document.spec().arguments().get(DOCKER_VERSION_PARAM),
        Some("1.0-x1y2z")
    );
}

#[test]
fn test_build_only_shape() {
    let document = compile(Variant::Build, &config());

    assert_eq!(
        template_names(&document),
        vec![BUILD_ENTRY, FE_TEMPLATE, MT_TEMPLATE]
    );
    assert_eq!(
        stage_names(&document),
        vec![vec![FE_STEP.to_string()], vec![MT_STEP.to_string()]]
    );

    let globals = document.spec().arguments().names();
    assert!(!globals.contains(&DOCKER_REPO_PARAM));
    assert!(!globals.contains(&DOCKER_VERSION_PARAM));
}

#[test]
fn test_serve_only_shape() {
    let document = compile(Variant::Serve, &config());

    assert_eq!(
        template_names(&document),
        vec![SERVE_ENTRY, BUILD_PUSH_TEMPLATE, SERVING_TEMPLATE]
    );
    assert_eq!(
        stage_names(&document),
        vec![
            vec![BUILD_PUSH_STEP.to_string()],
            vec![SERVING_STEP.to_string()]
        ]
    );
    assert_eq!(
        document.spec().arguments().names(),
        vec![
            COLUMNS_PARAM,
            MODEL_TYPE_PARAM,
            DOCKER_REPO_PARAM,
            DOCKER_VERSION_PARAM
        ]
    );
}

#[test]
fn test_build_serve_is_union_of_build_and_serve() {
    for (stats, processor) in [(false, false), (true, false), (false, true), (true, true)] {
        let conf = WorkflowConfig {
            enable_stats: stats,
            enable_processor: processor,
            ..config()
        };

        let combined = compile(Variant::BuildServe, &conf);
        let build = compile(Variant::Build, &conf);
        let serve = compile(Variant::Serve, &conf);

        // Leaf templates
        let leaves = |d: &Document| -> BTreeSet<String> {
            d.spec().templates()[1..]
                .iter()
                .map(|t| t.name().to_string())
                .collect()
        };
        let union: BTreeSet<String> = leaves(&build).union(&leaves(&serve)).cloned().collect();
        assert_eq!(leaves(&combined), union);

        // Stages, in order
        let mut stages = stage_names(&build);
        stages.extend(stage_names(&serve));
        assert_eq!(stage_names(&combined), stages);

        // Shared leaf templates are identical
        for template in &combined.spec().templates()[1..] {
            let other = build
                .spec()
                .template(template.name())
                .or_else(|| serve.spec().template(template.name()))
                .unwrap();
            assert_eq!(template, other);
        }
    }
}

#[test]
fn test_unknown_model_type_builds_recommender() {
    let conf = WorkflowConfig {
        model_type: Some("als".to_string()),
        ..config()
    };
    let document = compile(Variant::BuildServe, &conf);

    let build = &document.spec().entrypoint().stages()[2][0];
    let value = serde_json::to_value(&build.with_items[0]).unwrap();
    assert_eq!(value["git-branch"], "model/recommender-engine");
    assert_eq!(
        value["cmd"],
        "{{workflow.parameters.model-path}} model {{workflow.parameters.docker-repo}} {{workflow.parameters.docker-version}}"
    );
}

#[test]
fn test_runner_selects_training_container() {
    let cases = [
        ("FlinkRunner", IMAGE_FLINK, MT_FLINK_CMD, FE_FLINK_CMD),
        ("sparkrunner", IMAGE_JAVA, MT_SPARK_CMD, FE_DIRECT_CMD),
        ("DirectRunner", IMAGE_JAVA, MT_DIRECT_CMD, FE_DIRECT_CMD),
        ("anything", IMAGE_JAVA, MT_DIRECT_CMD, FE_DIRECT_CMD),
    ];

    for (runner, image, mt_cmd, fe_cmd) in cases {
        let conf = WorkflowConfig {
            runner: runner.to_string(),
            ..config()
        };
        let document = compile(Variant::Build, &conf);

        let mt = document.spec().template(MT_TEMPLATE).unwrap();
        let container = mt.as_container().unwrap();
        assert_eq!(container.image, image, "runner {}", runner);
        assert_eq!(container.args, vec![mt_cmd], "runner {}", runner);

        let fe = document.spec().template(FE_TEMPLATE).unwrap();
        assert_eq!(fe.as_container().unwrap().args, vec![fe_cmd], "runner {}", runner);
    }
}

#[test]
fn test_per_stage_runner_override() {
    let conf = WorkflowConfig {
        runner: "FlinkRunner".to_string(),
        training_runner: Some("SparkRunner".to_string()),
        ..config()
    };
    assert_eq!(conf.training_runner(), Runner::Spark);

    let document = compile(Variant::Build, &conf);
    let fe = document.spec().template(FE_TEMPLATE).unwrap();
    let mt = document.spec().template(MT_TEMPLATE).unwrap();
    assert_eq!(fe.as_container().unwrap().image, IMAGE_FLINK);
    assert_eq!(mt.as_container().unwrap().args, vec![MT_SPARK_CMD]);
}

#[test]
fn test_leaf_template_kinds() {
    let document = compile(Variant::BuildServe, &config());
    let spec = document.spec();

    assert_eq!(spec.entrypoint().kind(), TemplateKind::Steps);
    assert_eq!(spec.template(FE_TEMPLATE).unwrap().kind(), TemplateKind::Container);
    assert_eq!(spec.template(MT_TEMPLATE).unwrap().kind(), TemplateKind::Container);
    assert_eq!(
        spec.template(BUILD_PUSH_TEMPLATE).unwrap().kind(),
        TemplateKind::Container
    );
    assert_eq!(
        spec.template(SERVING_TEMPLATE).unwrap().kind(),
        TemplateKind::Resource
    );
}

#[test]
fn test_missing_fields_per_variant() {
    // Serve-only never reads training settings
    let conf = WorkflowConfig {
        feature_jar: None,
        training_jar: None,
        features_path: None,
        ..config()
    };
    let suffixes = FixedSuffixes::single("x1y2z");
    let compiler = Compiler::new(&suffixes);

    assert!(compiler.compile(Variant::Serve, &conf).is_ok());
    assert!(matches!(
        compiler.compile(Variant::Build, &conf),
        Err(CompileError::Config(ConfigError::MissingField { .. }))
    ));
    assert!(matches!(
        compiler.compile(Variant::BuildServe, &conf),
        Err(CompileError::Config(ConfigError::MissingField { .. }))
    ));
}

#[test]
fn test_enabled_stage_without_jar_is_rejected() {
    let conf = WorkflowConfig {
        enable_processor: true,
        processor_jar: None,
        ..config()
    };
    let suffixes = FixedSuffixes::single("x1y2z");

    let err = Compiler::new(&suffixes)
        .compile(Variant::BuildServe, &conf)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing required configuration field: processor_jar"
    );
}

#[test]
fn test_invalid_kube_name_is_rejected() {
    let conf = WorkflowConfig {
        kube_name: Some("ML_Serving".to_string()),
        ..config()
    };
    let suffixes = FixedSuffixes::single("x1y2z");

    assert!(matches!(
        Compiler::new(&suffixes).compile(Variant::Serve, &conf),
        Err(CompileError::Config(ConfigError::InvalidField { .. }))
    ));
}

#[test]
fn test_malformed_suffix_is_rejected() {
    for suffix in ["Bad_Suffix", "abcd", "ABCDE", ""] {
        let suffixes = FixedSuffixes::single(suffix);
        let compiler = Compiler::new(&suffixes);

        for variant in [Variant::BuildServe, Variant::Serve] {
            let err = compiler.compile(variant, &config()).unwrap_err();
            assert!(
                matches!(
                    err,
                    CompileError::Config(ConfigError::InvalidField { ref field, .. }) if field == "suffix"
                ),
                "suffix {:?} on {}: {}",
                suffix,
                variant,
                err
            );
        }

        // Build-only never draws a suffix
        assert!(compiler.compile(Variant::Build, &config()).is_ok());
    }
}

#[test]
fn test_overlong_serving_name_is_rejected() {
    // Valid on its own, too long once suffix and image are appended
    let conf = WorkflowConfig {
        kube_name: Some("a".repeat(60)),
        enable_processor: true,
        ..config()
    };
    let suffixes = FixedSuffixes::single("x1y2z");
    let compiler = Compiler::new(&suffixes);

    for variant in [Variant::BuildServe, Variant::Serve] {
        let err = compiler.compile(variant, &conf).unwrap_err();
        assert!(
            matches!(
                err,
                CompileError::Config(ConfigError::InvalidField { ref field, .. }) if field == "kube_name"
            ),
            "{}: {}",
            variant,
            err
        );
    }
}

#[test]
fn test_serving_names_within_limit_compile() {
    // 47 + "-" + 5 + "-" + "processor" is exactly 63 characters
    let conf = WorkflowConfig {
        kube_name: Some("k".repeat(47)),
        enable_processor: true,
        ..config()
    };
    let document = compile(Variant::BuildServe, &conf);
    assert_eq!(document.spec().entrypoint().stages()[3][0].with_items.len(), 3);
}

#[test]
fn test_generate_name_is_lowercased_model_type() {
    let conf = WorkflowConfig {
        model_type: Some("Sentiment".to_string()),
        ..config()
    };
    let document = compile(Variant::BuildServe, &conf);

    assert_eq!(document.generate_name(), "sentiment");
    assert_eq!(
        document.spec().arguments().get(MODEL_TYPE_PARAM),
        Some("Sentiment")
    );
}
