//! Source-control integration — repository lookup and branch enumeration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ApiError;

/// A branch as reported by the source-control service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_id: i64,
    pub branch_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryInfo {
    pub id: i64,
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Look up a repository; `None` when the source-control service does not
/// know it.
pub async fn get_repository(
    config: &AppConfig,
    repository: &str,
) -> Result<Option<RepositoryInfo>, ApiError> {
    crate::metrics::scm_request("repository");

    let url = format!("{}/repos/{}", config.scm_base_url, repository);
    let resp = client()
        .get(&url)
        .bearer_auth(&config.scm_token)
        .send()
        .await?;

    if !resp.status().is_success() {
        tracing::debug!(repository, status = %resp.status(), "repository lookup failed");
        return Ok(None);
    }

    Ok(Some(resp.json::<RepositoryInfo>().await?))
}

/// List the branches of a repository.
pub async fn list_branches(config: &AppConfig, repository: &str) -> Result<Vec<Branch>, ApiError> {
    crate::metrics::scm_request("branches");

    let url = format!("{}/repos/{}/branches", config.scm_base_url, repository);
    let resp = client()
        .get(&url)
        .bearer_auth(&config.scm_token)
        .send()
        .await?
        .error_for_status()?;

    Ok(resp.json::<Vec<Branch>>().await?)
}

/// Version carried in a `daily/<version>` branch name.
pub fn branch_version(branch_name: &str) -> Option<&str> {
    let mut parts = branch_name.splitn(2, '/');
    parts.next();
    parts.next().filter(|v| !v.is_empty())
}

/// Keep only branches whose version is not yet bound to an iteration.
pub fn filter_unbound(branches: Vec<Branch>, bound_versions: &HashSet<String>) -> Vec<Branch> {
    branches
        .into_iter()
        .filter(|b| match branch_version(&b.branch_name) {
            Some(version) => !bound_versions.contains(version),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_the_suffix_after_the_first_slash() {
        assert_eq!(branch_version("daily/1.0.4"), Some("1.0.4"));
        assert_eq!(branch_version("release/2.1/hotfix"), Some("2.1/hotfix"));
        assert_eq!(branch_version("main"), None);
        assert_eq!(branch_version("daily/"), None);
    }

    #[test]
    fn bound_versions_are_filtered_out() {
        let branches = vec![
            Branch {
                branch_id: 1,
                branch_name: "daily/1.0.1".into(),
            },
            Branch {
                branch_id: 2,
                branch_name: "daily/1.0.2".into(),
            },
            Branch {
                branch_id: 3,
                branch_name: "main".into(),
            },
        ];
        let bound: HashSet<String> = ["1.0.1".to_string()].into_iter().collect();

        let unbound = filter_unbound(branches, &bound);
        let names: Vec<&str> = unbound.iter().map(|b| b.branch_name.as_str()).collect();
        assert_eq!(names, vec!["daily/1.0.2", "main"]);
    }
}
