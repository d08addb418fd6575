//! Fan-out item records.
//!
//! A step with items is instantiated once per item; each instance substitutes
//! `{{item.<key>}}` placeholders in its arguments. Items are typed records so
//! every instance is guaranteed to carry the keys its step refers to.

use serde::{Deserialize, Serialize};

pub const ITEM_GIT_BRANCH: &str = "git-branch";
pub const ITEM_JAR: &str = "jar";
pub const ITEM_CMD: &str = "cmd";
pub const ITEM_IMAGE: &str = "image";

/// One image to build and push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildItem {
    /// Branch holding the Dockerfile for this image
    #[serde(rename = "git-branch")]
    pub git_branch: String,

    /// Object key of the jar baked into the image
    pub jar: String,

    /// Arguments passed to the build script
    pub cmd: String,
}

/// One image to deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingItem {
    pub image: String,
}

impl ServingItem {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

/// Any item a step can fan out over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FanOutItem {
    Build(BuildItem),
    Serving(ServingItem),
}

impl FanOutItem {
    /// Keys this item provides to `{{item.<key>}}` placeholders
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Build(_) => &[ITEM_GIT_BRANCH, ITEM_JAR, ITEM_CMD],
            Self::Serving(_) => &[ITEM_IMAGE],
        }
    }

    pub(crate) fn values(&self) -> Vec<&str> {
        match self {
            Self::Build(item) => vec![item.git_branch.as_str(), item.jar.as_str(), item.cmd.as_str()],
            Self::Serving(item) => vec![item.image.as_str()],
        }
    }
}

impl From<BuildItem> for FanOutItem {
    fn from(item: BuildItem) -> Self {
        Self::Build(item)
    }
}

impl From<ServingItem> for FanOutItem {
    fn from(item: ServingItem) -> Self {
        Self::Serving(item)
    }
}
