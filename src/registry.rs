use crate::{Error, Result};
use serde::Deserialize;

pub const MODULE_SERVICE: &str = "Express_Mod";
pub const USER_SERVICE: &str = "Express_User";
pub const POC_SERVICE: &str = "Express_Poc";
pub const TEST_SERVICE: &str = "Express_Test";

/// Consul-style catalog client. Every resolution re-queries the catalog so
/// address changes are observed promptly.
#[derive(Clone)]
pub struct Registry {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CatalogNode {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "ServicePort")]
    service_port: u16,
}

impl Registry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Registry {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Maps a logical service name to `http://host:port` of its first live node.
    pub async fn resolve(&self, service: &str) -> Result<String> {
        let url = format!("{}/v1/catalog/service/{}", self.base_url, service);
        let nodes: Vec<CatalogNode> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let node = nodes
            .first()
            .ok_or_else(|| Error::NotFound(format!("Service {service} not found in registry")))?;
        Ok(format!("http://{}:{}", node.address, node.service_port))
    }

    /// Resolves `service` and issues a GET against `path` on it.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &str,
        path: &str,
    ) -> Result<T> {
        let base = self.resolve(service).await?;
        Ok(self
            .http
            .get(format!("{base}{path}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}
