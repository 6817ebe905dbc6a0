//! Typed lookups against the sibling services this service composes data
//! from. Callers decide whether a failure is fatal (write-path enrichment)
//! or degrades to a null detail field (read-side joins).

use crate::registry::{self, Registry};
use crate::Result;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct ModuleDetails {
    #[serde(default)]
    pub mod_name: Option<String>,
    #[serde(default)]
    pub mod_duration: Option<String>,
}

#[derive(Deserialize)]
pub struct OrgDetails {
    #[serde(default)]
    pub org_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UserDetails {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct PocDetails {
    #[serde(default)]
    pub mod_poc_name: Option<String>,
}

#[derive(Deserialize)]
pub struct TestDetails {
    #[serde(default)]
    pub test_total_score: Option<f64>,
}

#[derive(Deserialize)]
struct TestsTillToday {
    #[serde(default)]
    tests_till_today: Vec<TestRef>,
}

#[derive(Deserialize)]
struct TestRef {
    test_id: String,
}

pub async fn module_by_id(registry: &Registry, module_id: &str) -> Result<ModuleDetails> {
    registry
        .get_json(
            registry::MODULE_SERVICE,
            &format!("/modules/get_module_by_id/{module_id}"),
        )
        .await
}

pub async fn org_by_id(registry: &Registry, org_id: &str) -> Result<OrgDetails> {
    registry
        .get_json(
            registry::MODULE_SERVICE,
            &format!("/organization/get_org_by_id/{org_id}"),
        )
        .await
}

pub async fn user_by_id(registry: &Registry, user_id: &str) -> Result<UserDetails> {
    registry
        .get_json(
            registry::USER_SERVICE,
            &format!("/user/get_user_by_id/{user_id}"),
        )
        .await
}

pub async fn poc_by_id(registry: &Registry, poc_id: &str) -> Result<PocDetails> {
    registry
        .get_json(
            registry::POC_SERVICE,
            &format!("/poc/get_poc_by_poc_id/{poc_id}"),
        )
        .await
}

pub async fn test_by_id(registry: &Registry, test_id: &str) -> Result<TestDetails> {
    registry
        .get_json(
            registry::TEST_SERVICE,
            &format!("/test/get_by_test_id/{test_id}"),
        )
        .await
}

/// Ids of the tests a POC has scheduled up to today.
pub async fn tests_till_today(registry: &Registry, poc_id: &str) -> Result<Vec<String>> {
    let res: TestsTillToday = registry
        .get_json(
            registry::POC_SERVICE,
            &format!("/poc/tests_till_today/{poc_id}"),
        )
        .await?;
    Ok(res.tests_till_today.into_iter().map(|it| it.test_id).collect())
}

/// Raw passthrough for the proxy endpoints.
pub async fn proxy(registry: &Registry, service: &str, path: &str) -> Result<Value> {
    registry.get_json(service, path).await
}

/// Soft-fail join helper: an unreachable service or a missing record becomes
/// a null detail field instead of an error.
pub fn soft<T>(res: Result<T>) -> Option<T> {
    match res {
        Ok(details) => Some(details),
        Err(err) => {
            tracing::warn!(%err, "Dependent service lookup failed");
            None
        }
    }
}
