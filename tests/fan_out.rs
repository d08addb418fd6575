//! Fan-out Integration Tests
//!
//! Tests for the order and content of build-and-push and serving items.

use argoml::core::branch::{RECOMMENDER_BRANCH, SENTIMENT_BRANCH};
use argoml::core::catalog::*;
use argoml::core::{resolve_branch, Compiler, FixedSuffixes, OptionalStages, Variant};
use argoml::domain::{BuildItem, Document, FanOutItem};
use argoml::WorkflowConfig;

fn config(model_type: &str, model_path: &str) -> WorkflowConfig {
    WorkflowConfig {
        model_type: Some(model_type.to_string()),
        features_path: Some("features".to_string()),
        columns: Some("a,b".to_string()),
        model_path: Some(model_path.to_string()),
        data_path: Some("raw".to_string()),
        docker_repo: Some("repo".to_string()),
        docker_version: Some("v".to_string()),
        feature_jar: Some("fe.jar".to_string()),
        function_jar: Some("func.jar".to_string()),
        function_name: Some("f".to_string()),
        training_jar: Some("train.jar".to_string()),
        model_jar: Some("model.jar".to_string()),
        stats_jar: Some("stats.jar".to_string()),
        processor_jar: Some("processor.jar".to_string()),
        s3_endpoint: Some("minio:9000".to_string()),
        s3_bucket: Some("ml".to_string()),
        kube_name: Some("ml".to_string()),
        ..Default::default()
    }
}

fn compile(variant: Variant, conf: &WorkflowConfig) -> Document {
    let suffixes = FixedSuffixes::single("q9w8e");
    Compiler::new(&suffixes).compile(variant, conf).unwrap()
}

/// Items of the step named `step` in the entry template
fn items<'d>(document: &'d Document, step: &str) -> &'d [FanOutItem] {
    document
        .spec()
        .entrypoint()
        .all_steps()
        .find(|s| s.name == step)
        .map(|s| s.with_items.as_slice())
        .unwrap()
}

fn build_items(document: &Document) -> Vec<BuildItem> {
    items(document, BUILD_PUSH_STEP)
        .iter()
        .map(|item| match item {
            FanOutItem::Build(build) => build.clone(),
            other => panic!("Expected build item, got {:?}", other),
        })
        .collect()
}

fn serving_images(document: &Document) -> Vec<String> {
    items(document, SERVING_STEP)
        .iter()
        .map(|item| match item {
            FanOutItem::Serving(serving) => serving.image.clone(),
            other => panic!("Expected serving item, got {:?}", other),
        })
        .collect()
}

#[test]
fn test_optional_items_order() {
    let both = OptionalStages {
        stats_jar: Some("stats.jar".to_string()),
        processor_jar: Some("processor.jar".to_string()),
    };
    let cmds: Vec<String> = both.build_items().into_iter().map(|i| i.cmd).collect();
    assert_eq!(cmds, vec![STATS_BUILD_ARGS, PROCESSOR_BUILD_ARGS]);

    let neither = OptionalStages::default();
    assert!(neither.build_items().is_empty());
    assert!(neither.serving_items().is_empty());
}

#[test]
fn test_model_item_always_first() {
    for (stats, processor) in [(false, false), (true, false), (false, true), (true, true)] {
        let conf = WorkflowConfig {
            enable_stats: stats,
            enable_processor: processor,
            ..config("recommender", "m1")
        };
        let document = compile(Variant::BuildServe, &conf);

        let build = build_items(&document);
        assert_eq!(build[0].jar, "model.jar");
        assert_eq!(build.len(), 1 + stats as usize + processor as usize);

        let mut expected = vec![MODEL_IMAGE];
        if stats {
            expected.push(STATS_IMAGE);
        }
        if processor {
            expected.push(PROCESSOR_IMAGE);
        }
        assert_eq!(serving_images(&document), expected);
    }
}

#[test]
fn test_build_serve_items_with_stats() {
    let conf = WorkflowConfig {
        enable_stats: true,
        ..config("sentiment", "m1")
    };
    let document = compile(Variant::BuildServe, &conf);

    let build = build_items(&document);
    assert_eq!(build.len(), 2);
    assert_eq!(build[0].git_branch, SENTIMENT_BRANCH);
    assert_eq!(
        build[0].cmd,
        format!("{}{}", TRAINED_MODEL_BUILD_ARGS, SENTIMENT_BUILD_ARGS)
    );
    assert_eq!(build[1].git_branch, BASIC_BRANCH);
    assert_eq!(build[1].jar, "stats.jar");

    assert_eq!(serving_images(&document), vec![MODEL_IMAGE, STATS_IMAGE]);
}

#[test]
fn test_serve_only_one_item_per_model_path() {
    let conf = WorkflowConfig {
        enable_stats: true,
        enable_processor: true,
        ..config("recommender", "a,b")
    };
    let document = compile(Variant::Serve, &conf);

    let build = build_items(&document);
    assert_eq!(build.len(), 4);

    assert_eq!(build[0].cmd, format!("a {}", MODEL_BUILD_ARGS));
    assert_eq!(build[1].cmd, format!("b {}", MODEL_BUILD_ARGS));
    for model in &build[..2] {
        assert_eq!(model.jar, "model.jar");
        assert_eq!(model.git_branch, RECOMMENDER_BRANCH);
    }

    assert_eq!(build[2].cmd, STATS_BUILD_ARGS);
    assert_eq!(build[3].cmd, PROCESSOR_BUILD_ARGS);

    // Serving still deploys a single model image
    assert_eq!(
        serving_images(&document),
        vec![MODEL_IMAGE, STATS_IMAGE, PROCESSOR_IMAGE]
    );
}

#[test]
fn test_serve_only_sentiment_paths() {
    let document = compile(Variant::Serve, &config("Sentiment", " a , b ,"));

    let build = build_items(&document);
    assert_eq!(build.len(), 2);
    assert_eq!(
        build[0].cmd,
        format!("a {}{}", MODEL_BUILD_ARGS, SENTIMENT_BUILD_ARGS)
    );
    assert_eq!(
        build[1].cmd,
        format!("b {}{}", MODEL_BUILD_ARGS, SENTIMENT_BUILD_ARGS)
    );
    assert!(build.iter().all(|i| i.git_branch == SENTIMENT_BRANCH));
}

#[test]
fn test_branch_resolution_matches_compiled_items() {
    for model_type in ["sentiment", "SENTIMENT", "recommender", "als", "sentimental"] {
        let expected = resolve_branch(model_type).branch;
        let name = model_type.to_ascii_lowercase();
        let document = compile(Variant::BuildServe, &config(&name, "m1"));
        assert_eq!(build_items(&document)[0].git_branch, expected);

        let is_sentiment = model_type.eq_ignore_ascii_case("sentiment");
        assert_eq!(expected == SENTIMENT_BRANCH, is_sentiment);
    }
}

#[test]
fn test_fan_out_placeholders() {
    let document = compile(Variant::BuildServe, &config("recommender", "m1"));
    let entry = document.spec().entrypoint();

    let build = entry.all_steps().find(|s| s.name == BUILD_PUSH_STEP).unwrap();
    assert_eq!(build.arguments.get(JAR_PARAM), Some("{{item.jar}}"));
    assert_eq!(build.arguments.get(BRANCH_PARAM), Some("{{item.git-branch}}"));
    assert_eq!(build.arguments.get(CMD_PARAM), Some("{{item.cmd}}"));

    let serving = entry.all_steps().find(|s| s.name == SERVING_STEP).unwrap();
    assert_eq!(serving.arguments.get(DOCKER_IMAGE_PARAM), Some("{{item.image}}"));
    assert_eq!(
        serving.arguments.get(KUBE_NAME_PARAM),
        Some("ml-q9w8e-{{item.image}}")
    );
}
