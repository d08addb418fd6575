//! Artifacts materialized into a leaf template's filesystem.
//!
//! An artifact is fetched by the workflow engine before the container starts,
//! either from object storage or from a git repository. Credentials are always
//! secret references; the compiler never sees a credential value.

use serde::{Deserialize, Serialize};

/// A (secret name, key) pointer resolved by the engine at run time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    /// Name of the Kubernetes secret
    pub name: String,

    /// Key within the secret
    pub key: String,
}

impl SecretRef {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// Object-storage location of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    pub endpoint: String,
    pub bucket: String,

    /// Object key; may be a `{{inputs.parameters.*}}` placeholder
    pub key: String,

    pub access_key_secret: SecretRef,
    pub secret_key_secret: SecretRef,
}

/// Source-control location of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLocation {
    /// Repository URL
    pub repo: String,

    /// Branch (or other ref) to check out
    pub revision: String,
}

/// Where an artifact is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    S3(S3Location),
    Git(GitLocation),
}

/// A named file or directory mounted into a leaf template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact name (unique within one template's inputs)
    pub name: String,

    /// Mount path inside the container
    pub path: String,

    #[serde(flatten)]
    pub source: ArtifactSource,
}

impl Artifact {
    /// Create an artifact fetched from object storage
    pub fn s3(name: impl Into<String>, path: impl Into<String>, location: S3Location) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            source: ArtifactSource::S3(location),
        }
    }

    /// Create an artifact checked out from a git repository
    pub fn git(name: impl Into<String>, path: impl Into<String>, location: GitLocation) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            source: ArtifactSource::Git(location),
        }
    }

    /// Text fields that may carry input-parameter placeholders
    pub(crate) fn templated_fields(&self) -> Vec<&str> {
        match &self.source {
            ArtifactSource::S3(s3) => vec![s3.key.as_str()],
            ArtifactSource::Git(git) => vec![git.revision.as_str()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_location(key: &str) -> S3Location {
        S3Location {
            endpoint: "minio:9000".to_string(),
            bucket: "ml".to_string(),
            key: key.to_string(),
            access_key_secret: SecretRef::new("s3-credentials", "accessKey"),
            secret_key_secret: SecretRef::new("s3-credentials", "secretKey"),
        }
    }

    #[test]
    fn test_s3_artifact_shape() {
        let artifact = Artifact::s3("pipeline-jar", "/pipeline.jar", bucket_location("jars/a.jar"));

        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["name"], "pipeline-jar");
        assert_eq!(value["path"], "/pipeline.jar");
        assert_eq!(value["s3"]["key"], "jars/a.jar");
        assert_eq!(value["s3"]["accessKeySecret"]["name"], "s3-credentials");
        assert_eq!(value["s3"]["secretKeySecret"]["key"], "secretKey");
        assert!(value.get("git").is_none());
    }

    #[test]
    fn test_git_artifact_shape() {
        let artifact = Artifact::git(
            "docker-files",
            "/docker-files",
            GitLocation {
                repo: "https://example.com/repo.git".to_string(),
                revision: "model/recommender-engine".to_string(),
            },
        );

        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["git"]["repo"], "https://example.com/repo.git");
        assert_eq!(value["git"]["revision"], "model/recommender-engine");
        assert_eq!(artifact.templated_fields(), vec!["model/recommender-engine"]);
    }

    #[test]
    fn test_artifact_roundtrip() {
        let artifact = Artifact::s3("jar", "/app.jar", bucket_location("{{inputs.parameters.jar}}"));

        let yaml = serde_yaml::to_string(&artifact).unwrap();
        let parsed: Artifact = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, artifact);
    }
}
