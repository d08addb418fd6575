//! Suffixes that keep generated resource names unique.
//!
//! Every compilation draws one suffix and appends it to the image tag and to
//! the serving resource names, so re-running a workflow in the same namespace
//! does not collide with the previous run's resources.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::config::ConfigError;

/// Length of a generated suffix
pub const SUFFIX_LEN: usize = 5;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Source of name suffixes
pub trait SuffixSource {
    fn next_suffix(&self) -> String;
}

/// Check that `suffix` is `SUFFIX_LEN` lowercase letters or digits
pub fn validate_suffix(suffix: &str) -> Result<(), ConfigError> {
    let valid = suffix.len() == SUFFIX_LEN && suffix.bytes().all(|b| CHARSET.contains(&b));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidField {
            field: "suffix".to_string(),
            reason: format!(
                "'{}' is not {} lowercase letters or digits",
                suffix, SUFFIX_LEN
            ),
        })
    }
}

/// Uniformly random lowercase alphanumeric suffixes
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..SUFFIX_LEN)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }
}

/// Replays a fixed sequence of suffixes, cycling when exhausted
#[derive(Debug, Default)]
pub struct FixedSuffixes {
    values: Vec<String>,
    next: AtomicUsize,
}

impl FixedSuffixes {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Always return `value`
    pub fn single(value: impl Into<String>) -> Self {
        Self::new([value.into()])
    }
}

impl SuffixSource for FixedSuffixes {
    fn next_suffix(&self) -> String {
        if self.values.is_empty() {
            return String::new();
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[index].clone()
    }
}
