//! Pipeline trigger configuration and event matching

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which repository events start the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Push triggers (branches and tag patterns)
    #[serde(default)]
    pub push: PushTriggerConfig,

    /// Pull request triggers (target branches)
    #[serde(default)]
    pub pull_request: PullRequestTriggerConfig,
}

/// Push trigger configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushTriggerConfig {
    /// Branch names that trigger on push
    #[serde(default)]
    pub branches: Vec<String>,

    /// Tag patterns (anchored regexes, e.g. a version pattern)
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Pull request trigger configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestTriggerConfig {
    /// Target branch names that trigger a PR build
    #[serde(default)]
    pub branches: Vec<String>,
}

/// A repository event evaluated against the trigger configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Push to a branch
    Push { branch: String },
    /// Push of a tag
    Tag { tag: String },
    /// Pull request targeting a branch
    PullRequest { target: String },
}

impl TriggerConfig {
    /// Check whether an event starts the pipeline
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        match event {
            TriggerEvent::Push { branch } => self.push.branches.iter().any(|b| b == branch),
            TriggerEvent::Tag { tag } => self
                .push
                .tags
                .iter()
                .filter_map(|p| compile_anchored(p).ok())
                .any(|re| re.is_match(tag)),
            TriggerEvent::PullRequest { target } => {
                self.pull_request.branches.iter().any(|b| b == target)
            }
        }
    }

    /// Validate that every tag pattern compiles
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.push.tags {
            compile_anchored(pattern)
                .map_err(|e| anyhow::anyhow!("Invalid tag pattern '{}': {}", pattern, e))?;
        }
        Ok(())
    }
}

/// Tag patterns match the whole tag name, not a substring
fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}
