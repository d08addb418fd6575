//! Fixed names, images and commands baked into every generated workflow.

// Template names
pub const BUILD_SERVE_ENTRY: &str = "building-serving";
pub const BUILD_ENTRY: &str = "building-pipeline";
pub const SERVE_ENTRY: &str = "serving-pipeline";
pub const FE_TEMPLATE: &str = "fe-template";
pub const MT_TEMPLATE: &str = "mt-template";
pub const BUILD_PUSH_TEMPLATE: &str = "build-push-template";
pub const SERVING_TEMPLATE: &str = "serving-template";

// Step names
pub const FE_STEP: &str = "feature-engineering";
pub const MT_STEP: &str = "model-training";
pub const BUILD_PUSH_STEP: &str = "build-and-push";
pub const SERVING_STEP: &str = "model-serving";

// Global parameters
pub const FEATURES_PARAM: &str = "features";
pub const COLUMNS_PARAM: &str = "columns";
pub const MODEL_PATH_PARAM: &str = "model-path";
pub const MODEL_TYPE_PARAM: &str = "model-type";
pub const DOCKER_REPO_PARAM: &str = "docker-repo";
pub const DOCKER_VERSION_PARAM: &str = "docker-version";

// Template input parameters
pub const JAR_PARAM: &str = "jar";
pub const INPUT_PARAM: &str = "input";
pub const FUNCTION_JAR_PARAM: &str = "feature-engineering-jar";
pub const FUNCTION_PARAM: &str = "function";
pub const BRANCH_PARAM: &str = "branch";
pub const CMD_PARAM: &str = "cmd";
pub const KUBE_NAME_PARAM: &str = "kube-name";
pub const DOCKER_IMAGE_PARAM: &str = "docker-image";

// Artifacts
pub const PIPELINE_JAR_ARTIFACT: &str = "pipeline-jar";
pub const PIPELINE_JAR_PATH: &str = "/pipeline.jar";
pub const FUNCTION_JAR_ARTIFACT: &str = "function-jar";
pub const FUNCTION_JAR_PATH: &str = "/feature-engineering.jar";
pub const APP_JAR_ARTIFACT: &str = "app-jar";
pub const APP_JAR_PATH: &str = "/app.jar";
pub const DOCKER_FILES_ARTIFACT: &str = "docker-files";
pub const DOCKER_FILES_PATH: &str = "/docker-files";

// Secrets and environment
pub const S3_SECRET: &str = "s3-credentials";
pub const S3_ACCESS_KEY: &str = "accessKey";
pub const S3_SECRET_KEY: &str = "secretKey";
pub const S3_ACCESS_ENV: &str = "S3_ACCESS_KEY";
pub const S3_SECRET_ENV: &str = "S3_SECRET_KEY";
pub const DOCKER_SECRET: &str = "docker-credentials";
pub const DOCKER_USERNAME_KEY: &str = "username";
pub const DOCKER_PASSWORD_KEY: &str = "password";
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";
pub const DOCKER_HOST: &str = "127.0.0.1";
pub const DOCKER_USERNAME_ENV: &str = "DOCKER_USERNAME";
pub const DOCKER_PASSWORD_ENV: &str = "DOCKER_PASSWORD";

// Images
pub const IMAGE_JAVA: &str = "openjdk:8-jre";
pub const IMAGE_FLINK: &str = "flink:1.4.2-hadoop28-scala_2.11";
pub const IMAGE_DOCKER: &str = "docker:17.10";
pub const IMAGE_DIND: &str = "docker:17.10-dind";
pub const DIND_SIDECAR: &str = "dind";

/// Memory requested by the feature-engineering and training containers
pub const TRAINING_MEMORY_BYTES: u64 = 4096 * 1024 * 1024;
pub const TRAINING_CPU: f64 = 0.3;

/// Branch holding the Dockerfiles of the stats and processor images
pub const BASIC_BRANCH: &str = "basic";

// Image names, shared by the build script arguments and the serving items
pub const MODEL_IMAGE: &str = "model";
pub const STATS_IMAGE: &str = "stats";
pub const PROCESSOR_IMAGE: &str = "processor";

pub const FE_DIRECT_CMD: &str = "java -cp /pipeline.jar:/feature-engineering.jar \
pipeline.FeatureEngineering --runner=DirectRunner \
--inputFile={{inputs.parameters.input}} \
--function={{inputs.parameters.function}} \
--featuresPath={{workflow.parameters.features}} \
--columns={{workflow.parameters.columns}}";

pub const FE_FLINK_CMD: &str = "flink run -c pipeline.FeatureEngineering \
-C file:///feature-engineering.jar /pipeline.jar --runner=FlinkRunner \
--inputFile={{inputs.parameters.input}} \
--function={{inputs.parameters.function}} \
--featuresPath={{workflow.parameters.features}} \
--columns={{workflow.parameters.columns}}";

pub const MT_DIRECT_CMD: &str = "java -cp /pipeline.jar pipeline.ModelTraining \
--runner=DirectRunner \
--featuresPath={{workflow.parameters.features}} \
--columns={{workflow.parameters.columns}} \
--modelPath={{workflow.parameters.model-path}} \
--modelType={{workflow.parameters.model-type}}";

pub const MT_FLINK_CMD: &str = "flink run -c pipeline.ModelTraining /pipeline.jar \
--runner=FlinkRunner \
--featuresPath={{workflow.parameters.features}} \
--columns={{workflow.parameters.columns}} \
--modelPath={{workflow.parameters.model-path}} \
--modelType={{workflow.parameters.model-type}}";

pub const MT_SPARK_CMD: &str = "java -cp /pipeline.jar pipeline.ModelTraining \
--runner=SparkRunner --sparkMaster=local[*] \
--featuresPath={{workflow.parameters.features}} \
--columns={{workflow.parameters.columns}} \
--modelPath={{workflow.parameters.model-path}} \
--modelType={{workflow.parameters.model-type}}";

/// Waits for the docker daemon sidecar, then builds and pushes one image
pub const BUILD_PUSH_CMD: &str = "until docker ps; do sleep 3; done; \
docker login -u $DOCKER_USERNAME -p $DOCKER_PASSWORD \
&& cp /app.jar /docker-files/app.jar \
&& cd /docker-files \
&& ./build-push.sh {{inputs.parameters.cmd}}";

/// Build-script arguments for the model image, minus the model location
pub const MODEL_BUILD_ARGS: &str =
    "model {{workflow.parameters.docker-repo}} {{workflow.parameters.docker-version}}";

/// Build-script arguments for the model image in a build+serve workflow
pub const TRAINED_MODEL_BUILD_ARGS: &str = "{{workflow.parameters.model-path}} \
model {{workflow.parameters.docker-repo}} {{workflow.parameters.docker-version}}";

/// Appended to the model build arguments for sentiment models
pub const SENTIMENT_BUILD_ARGS: &str = " --columns {{workflow.parameters.columns}}";

pub const STATS_BUILD_ARGS: &str =
    "stats {{workflow.parameters.docker-repo}} {{workflow.parameters.docker-version}}";

pub const PROCESSOR_BUILD_ARGS: &str =
    "processor {{workflow.parameters.docker-repo}} {{workflow.parameters.docker-version}}";

/// Deployment created once per served image
pub const SERVING_MANIFEST: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: {{inputs.parameters.kube-name}}
spec:
  replicas: 1
  selector:
    matchLabels:
      app: {{inputs.parameters.kube-name}}
  template:
    metadata:
      labels:
        app: {{inputs.parameters.kube-name}}
    spec:
      containers:
      - name: {{inputs.parameters.docker-image}}
        image: {{workflow.parameters.docker-repo}}/{{inputs.parameters.docker-image}}:{{workflow.parameters.docker-version}}
        ports:
        - containerPort: 8080
"#;
