//! Platform identity for matrix cells and conditional steps

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A host platform a matrix cell can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// Detect the platform this process is running on
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Stable identifier used in config files and display output
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" | "ubuntu" => Ok(Platform::Linux),
            "macos" | "darwin" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_roundtrip() {
        for p in [Platform::Linux, Platform::Macos, Platform::Windows] {
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
    }

    #[test]
    fn test_platform_aliases() {
        assert_eq!("ubuntu".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("darwin".parse::<Platform>().unwrap(), Platform::Macos);
        assert!("beos".parse::<Platform>().is_err());
    }

    #[test]
    fn test_host_is_one_of_the_known_platforms() {
        let host = Platform::host();
        assert!(matches!(
            host,
            Platform::Linux | Platform::Macos | Platform::Windows
        ));
    }
}
