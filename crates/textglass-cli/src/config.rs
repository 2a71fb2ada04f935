//! Run configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Documents to load and tests to run, from a YAML file plus CLI overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base pattern document (required)
    #[serde(default)]
    pub pattern: Option<PathBuf>,

    #[serde(default)]
    pub pattern_patch: Option<PathBuf>,

    #[serde(default)]
    pub attribute: Option<PathBuf>,

    #[serde(default)]
    pub attribute_patch: Option<PathBuf>,

    /// Test documents, run in order
    #[serde(default)]
    pub tests: Vec<PathBuf>,

    /// Number of full load-and-test iterations to run before timing
    #[serde(default)]
    pub warmup: Option<u32>,
}

impl RunConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: Option<&Path>, cli: &crate::Cli) -> anyhow::Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read config {}: {}", path.display(), e)
                })?;
                serde_yaml::from_str(&content)?
            }
            None => Self::default(),
        };

        // Apply CLI overrides
        if let Some(pattern) = &cli.pattern {
            config.pattern = Some(pattern.clone());
        }

        if let Some(patch) = &cli.pattern_patch {
            config.pattern_patch = Some(patch.clone());
        }

        if let Some(attribute) = &cli.attribute {
            config.attribute = Some(attribute.clone());
        }

        if let Some(patch) = &cli.attribute_patch {
            config.attribute_patch = Some(patch.clone());
        }

        config.tests.extend(cli.test.iter().cloned());

        if let Some(warmup) = cli.warmup {
            config.warmup = Some(warmup);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.pattern.is_none() {
            anyhow::bail!("Pattern file required");
        }

        if self.warmup == Some(0) {
            anyhow::bail!("Invalid warmup value: 0");
        }

        Ok(())
    }
}
