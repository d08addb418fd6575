//! Model-type dependent build settings.
//!
//! The model type picks the git branch holding the model image's Dockerfile
//! and whether extra arguments go to the model build script. Unknown model
//! types build the recommender image.

use super::catalog::SENTIMENT_BUILD_ARGS;

pub const SENTIMENT_MODEL_TYPE: &str = "sentiment";
pub const SENTIMENT_BRANCH: &str = "model/sentiment-analysis";
pub const RECOMMENDER_BRANCH: &str = "model/recommender-engine";

/// Branch and extra build arguments for a model type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchResolution {
    pub branch: &'static str,
    pub extra_build_args: &'static str,
}

impl BranchResolution {
    /// Append the extra arguments to a base build command
    pub fn build_command(&self, base: &str) -> String {
        format!("{}{}", base, self.extra_build_args)
    }
}

/// Resolve the build branch and extra arguments for `model_type`
pub fn resolve(model_type: &str) -> BranchResolution {
    if model_type.eq_ignore_ascii_case(SENTIMENT_MODEL_TYPE) {
        BranchResolution {
            branch: SENTIMENT_BRANCH,
            extra_build_args: SENTIMENT_BUILD_ARGS,
        }
    } else {
        BranchResolution {
            branch: RECOMMENDER_BRANCH,
            extra_build_args: "",
        }
    }
}
