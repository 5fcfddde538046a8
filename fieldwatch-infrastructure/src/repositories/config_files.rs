use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use fieldwatch_domain::ports::ConfigRepository;
use fieldwatch_domain::{Client, ClientDirectory, TravelPolicy};

pub struct ConfigFileRepository;

impl ConfigFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// `clients.yaml` may be a bare list or a `clients:` mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClientsFile {
    Listed(Vec<Client>),
    Keyed(ClientDirectory),
}

#[async_trait]
impl ConfigRepository for ConfigFileRepository {
    async fn load_travel_policy(&self, path: &str) -> anyhow::Result<TravelPolicy> {
        if !Path::new(path).exists() {
            warn!(path = %path, "rules file not found, using built-in travel policy");
            return Ok(TravelPolicy::default());
        }
        let content = fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(TravelPolicy::default());
        }
        let policy: TravelPolicy = serde_yaml::from_str(&content)?;
        Ok(policy)
    }

    async fn load_client_directory(&self, path: &str) -> anyhow::Result<ClientDirectory> {
        if !Path::new(path).exists() {
            warn!(path = %path, "clients file not found, using empty directory");
            return Ok(ClientDirectory::default());
        }
        let content = fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(ClientDirectory::default());
        }
        let clients = match serde_yaml::from_str::<ClientsFile>(&content)? {
            ClientsFile::Listed(clients) => clients,
            ClientsFile::Keyed(directory) => directory.clients,
        };
        Ok(ClientDirectory::new(
            clients.into_iter().filter(|client| client.active).collect(),
        ))
    }
}
