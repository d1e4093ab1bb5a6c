//! The `publish.toml` file describing what to publish where.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use serde::Deserialize;
use url::Url;

use crate::maven::coordinates::{ArtifactDescriptor, MavenCoordinates};
use crate::publish::publisher::{Publication, PublicationArtifact, PublishOptions, ReconciliationStrategy};
use crate::publish::reader::CorruptMetadataPolicy;
use crate::transport::{Authentication, RepositoryDescriptor};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    pub repository: RepositoryConfig,
    pub module: ModuleConfig,
    #[serde(default)]
    pub artifacts: Vec<ArtifactConfig>,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
    pub file: PathBuf,
    /// defaults to the file's extension
    pub extension: Option<String>,
    pub classifier: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyConfig {
    #[default]
    Optimistic,
    ConditionalWrite,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CorruptMetadataConfig {
    #[default]
    Fail,
    TreatAsAbsent,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReconciliationConfig {
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub on_corrupt_metadata: CorruptMetadataConfig,
}
impl Default for ReconciliationConfig {
    fn default() -> Self {
        ReconciliationConfig {
            strategy: StrategyConfig::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            on_corrupt_metadata: CorruptMetadataConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl PublishConfig {
    pub fn parse(toml_text: &str) -> anyhow::Result<PublishConfig> {
        Ok(toml::from_str(toml_text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<PublishConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("parsing {}", path.display()))
    }

    /// Values given on the command line (or in the environment) take precedence over the file
    pub fn apply_overrides(&mut self, url: Option<String>, username: Option<String>, password: Option<String>) {
        if let Some(url) = url {
            self.repository.url = url;
        }
        if username.is_some() {
            self.repository.username = username;
        }
        if password.is_some() {
            self.repository.password = password;
        }
    }

    pub fn repository_descriptor(&self) -> anyhow::Result<RepositoryDescriptor> {
        let repository = &self.repository;
        let url = Url::parse(&repository.url)
            .with_context(|| format!("invalid URL for repository '{}'", repository.name))?;

        let authentication = match (&repository.username, &repository.password) {
            (None, None) => Authentication::None,
            (Some(username), Some(password)) => Authentication::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => bail!("repository '{}' needs both a username and a password", repository.name),
        };

        Ok(RepositoryDescriptor {
            name: repository.name.clone(),
            url,
            authentication,
            timeout: Duration::from_secs(repository.timeout_secs),
        })
    }

    pub fn coordinates(&self) -> anyhow::Result<MavenCoordinates> {
        Ok(MavenCoordinates::new(&self.module.group_id, &self.module.artifact_id, &self.module.version)?)
    }

    pub fn options(&self) -> PublishOptions {
        let reconciliation = &self.reconciliation;
        PublishOptions {
            strategy: match reconciliation.strategy {
                StrategyConfig::Optimistic => ReconciliationStrategy::Optimistic,
                StrategyConfig::ConditionalWrite => ReconciliationStrategy::ConditionalWrite {
                    max_attempts: reconciliation.max_attempts,
                },
            },
            on_corrupt_metadata: match reconciliation.on_corrupt_metadata {
                CorruptMetadataConfig::Fail => CorruptMetadataPolicy::Fail,
                CorruptMetadataConfig::TreatAsAbsent => CorruptMetadataPolicy::TreatAsAbsent,
            },
        }
    }

    /// Reads all artifact files; relative paths are resolved against `base_dir`
    pub async fn load_publication(&self, base_dir: &Path) -> anyhow::Result<Publication> {
        let coordinates = self.coordinates()?;

        let mut artifacts = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let path = base_dir.join(&artifact.file);
            let extension = match &artifact.extension {
                Some(extension) => extension.clone(),
                None => path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_string())
                    .ok_or_else(|| anyhow!("no extension configured or derivable for {}", path.display()))?,
            };

            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading artifact {}", path.display()))?;

            artifacts.push(PublicationArtifact {
                descriptor: ArtifactDescriptor::new(artifact.classifier.as_deref(), &extension),
                content: Bytes::from(content),
            });
        }

        Ok(Publication { coordinates, artifacts })
    }
}
