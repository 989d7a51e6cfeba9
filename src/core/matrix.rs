//! Matrix expansion - enumerates the cells a run executes

use crate::core::config::{JobConfig, MatrixConfig, MatrixExclude};
use crate::core::platform::Platform;
use std::fmt;

/// One concrete (platform, toolchain, job) combination
#[derive(Debug, Clone)]
pub struct MatrixCell {
    pub platform: Platform,
    pub toolchain: String,
    pub job: JobConfig,
}

impl MatrixCell {
    /// Stable label used in logs and reports, e.g. `linux/stable/fmt`
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.platform, self.toolchain, self.job.id)
    }
}

impl fmt::Display for MatrixCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl MatrixConfig {
    /// Expand the listed axes into cells, dropping excluded combinations
    pub fn expand(&self) -> Vec<MatrixCell> {
        let mut cells = Vec::new();
        for platform in &self.platforms {
            for toolchain in &self.toolchains {
                for job in &self.jobs {
                    if self.is_excluded(*platform, toolchain, &job.id) {
                        continue;
                    }
                    cells.push(MatrixCell {
                        platform: *platform,
                        toolchain: toolchain.clone(),
                        job: job.clone(),
                    });
                }
            }
        }
        cells
    }

    /// Expand only the cells runnable on one platform, optionally
    /// narrowed to a single job
    pub fn expand_for(&self, platform: Platform, job_id: Option<&str>) -> Vec<MatrixCell> {
        self.expand()
            .into_iter()
            .filter(|cell| cell.platform == platform)
            .filter(|cell| job_id.map_or(true, |id| cell.job.id == id))
            .collect()
    }

    fn is_excluded(&self, platform: Platform, toolchain: &str, job_id: &str) -> bool {
        self.exclude
            .iter()
            .any(|ex| exclude_matches(ex, platform, toolchain, job_id))
    }
}

fn exclude_matches(ex: &MatrixExclude, platform: Platform, toolchain: &str, job_id: &str) -> bool {
    ex.platform.map_or(true, |p| p == platform)
        && ex.toolchain.as_deref().map_or(true, |t| t == toolchain)
        && ex.job.as_deref().map_or(true, |j| j == job_id)
}
