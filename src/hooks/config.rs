//! Pre-commit hook definitions

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single pre-commit hook
///
/// A hook is either an external `entry` command or one of the builtin
/// fixers. Exactly one of the two must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Unique hook identifier
    pub id: String,

    /// Human-readable name shown while the hook runs
    pub name: String,

    /// Entry command for external hooks
    #[serde(default)]
    pub entry: Option<String>,

    /// Builtin fixer action
    #[serde(default)]
    pub builtin: Option<BuiltinHook>,

    /// File types this hook applies to; the hook is skipped when no
    /// candidate file matches
    pub types: Vec<FileType>,

    /// Whether matching filenames are appended to the entry command.
    /// Hooks with `pass_filenames: false` decide their own scope and
    /// operate on the whole project.
    #[serde(default = "default_pass_filenames")]
    pub pass_filenames: bool,
}

fn default_pass_filenames() -> bool {
    true
}

/// Fixers implemented by gantry itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinHook {
    /// Strip trailing whitespace from every line
    TrailingWhitespace,
    /// Ensure the file ends with exactly one newline
    EndOfFileFixer,
}

/// File-type tag used to filter hook candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Rust,
    Toml,
    Yaml,
    Json,
    Markdown,
    /// Any file with a known text extension
    Text,
}

impl FileType {
    /// Check whether a path carries this file type
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let ext = ext.as_deref();

        match self {
            FileType::Rust => ext == Some("rs"),
            FileType::Toml => ext == Some("toml"),
            FileType::Yaml => matches!(ext, Some("yaml") | Some("yml")),
            FileType::Json => ext == Some("json"),
            FileType::Markdown => ext == Some("md"),
            FileType::Text => matches!(
                ext,
                Some("rs")
                    | Some("toml")
                    | Some("yaml")
                    | Some("yml")
                    | Some("json")
                    | Some("md")
                    | Some("txt")
                    | Some("sh")
                    | Some("lock")
            ),
        }
    }
}

impl HookDefinition {
    /// Filter candidate files down to the ones this hook applies to
    pub fn matching_files<'a>(&self, files: &'a [std::path::PathBuf]) -> Vec<&'a Path> {
        files
            .iter()
            .map(|f| f.as_path())
            .filter(|f| self.types.iter().any(|t| t.matches(f)))
            .collect()
    }
}

/// Validate a hook list loaded from configuration
pub fn validate_hooks(hooks: &[HookDefinition]) -> Result<()> {
    let mut seen_ids = std::collections::HashSet::new();
    for hook in hooks {
        if !seen_ids.insert(&hook.id) {
            anyhow::bail!("Duplicate hook ID: {}", hook.id);
        }

        match (&hook.entry, &hook.builtin) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Hook '{}' sets both entry and builtin", hook.id)
            }
            (None, None) => {
                anyhow::bail!("Hook '{}' sets neither entry nor builtin", hook.id)
            }
            (Some(entry), None) if entry.trim().is_empty() => {
                anyhow::bail!("Hook '{}' has an empty entry command", hook.id)
            }
            _ => {}
        }

        if hook.types.is_empty() {
            anyhow::bail!("Hook '{}' has an empty file-type filter", hook.id);
        }
    }
    Ok(())
}
