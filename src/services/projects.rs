// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project discovery.
//!
//! Projects are whatever exists under `{org}/projects/` in each
//! environment's orthos bucket. Organisation ids always contain a dash;
//! other top-level prefixes are ignored.

use super::auth::IdentityProvider;
use crate::config::Environments;
use crate::error::ServiceError;
use crate::io::storage::ObjectStore;
use crate::models::project::{Environment, ProjectRef};
use std::collections::{BTreeMap, HashSet};

/// Every known project plus a contact email per organisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectListing {
    pub projects: Vec<ProjectRef>,
    pub organizations: BTreeMap<String, String>,
}

/// Projects of one organisation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationGroup {
    pub org_id: String,
    pub email: Option<String>,
    pub projects: Vec<ProjectRef>,
}

/// Projects of one environment, by organisation.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentGroup {
    pub environment: Environment,
    pub organizations: Vec<OrganizationGroup>,
}

impl ProjectListing {
    /// Group by environment (prod first), then organisation id.
    pub fn grouped(&self) -> Vec<EnvironmentGroup> {
        Environment::ALL
            .into_iter()
            .filter_map(|environment| {
                let mut by_org: BTreeMap<&str, Vec<ProjectRef>> = BTreeMap::new();
                for project in self.projects.iter().filter(|p| p.environment == environment) {
                    by_org.entry(project.org_id.as_str()).or_default().push(project.clone());
                }
                if by_org.is_empty() {
                    return None;
                }
                let organizations = by_org
                    .into_iter()
                    .map(|(org_id, mut projects)| {
                        projects.sort_by(|a, b| a.project_id.cmp(&b.project_id));
                        OrganizationGroup {
                            org_id: org_id.to_string(),
                            email: self.organizations.get(org_id).cloned(),
                            projects,
                        }
                    })
                    .collect();
                Some(EnvironmentGroup {
                    environment,
                    organizations,
                })
            })
            .collect()
    }
}

/// Username to email, falling back to the username.
fn org_email_map(identity: &dyn IdentityProvider) -> BTreeMap<String, String> {
    match identity.list_users() {
        Ok(users) => users
            .into_iter()
            .filter(|u| !u.username.is_empty())
            .map(|u| {
                let email = if u.email.is_empty() { u.username.clone() } else { u.email };
                (u.username, email)
            })
            .collect(),
        Err(e) => {
            log::warn!("Could not list users for organisation emails: {}", e);
            BTreeMap::new()
        }
    }
}

/// List projects across every environment with an orthos bucket.
pub fn list_projects(
    store: &dyn ObjectStore,
    environments: &Environments,
    identity: &dyn IdentityProvider,
) -> Result<ProjectListing, ServiceError> {
    let mut seen = HashSet::new();
    let mut projects = Vec::new();

    for environment in Environment::ALL {
        let orthos = &environments.get(environment).orthos_bucket;
        if orthos.is_empty() {
            continue;
        }
        for org_id in store.list_prefixes(orthos, "")? {
            if !org_id.contains('-') {
                continue;
            }
            for project_id in store.list_prefixes(orthos, &format!("{}/projects/", org_id))? {
                let project = ProjectRef::new(org_id.as_str(), project_id, environment);
                if seen.insert(project.clone()) {
                    projects.push(project);
                }
            }
        }
    }

    log::info!("Found {} projects", projects.len());
    Ok(ProjectListing {
        projects,
        organizations: org_email_map(identity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::LocalObjectStore;
    use crate::services::auth::{LocalIdentityProvider, UserRecord};

    fn identity() -> LocalIdentityProvider {
        LocalIdentityProvider::new(vec![
            UserRecord {
                username: "acme-solar".to_string(),
                email: "ops@acme.example".to_string(),
                password: "x".to_string(),
                groups: vec![],
            },
            UserRecord {
                username: "sun-farm".to_string(),
                email: String::new(),
                password: "x".to_string(),
                groups: vec![],
            },
        ])
    }

    #[test]
    fn test_list_projects_across_environments() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let envs = Environments::default();
        let dev = &envs.dev.orthos_bucket;
        let prod = &envs.prod.orthos_bucket;
        store.put(dev, "acme-solar/projects/p2/odm_orthophoto.tif", b"x").unwrap();
        store.put(dev, "acme-solar/projects/p1/odm_orthophoto.tif", b"x").unwrap();
        store.put(dev, "scratch/projects/p9/odm_orthophoto.tif", b"x").unwrap();
        store.put(prod, "sun-farm/projects/north/odm_orthophoto.tif", b"x").unwrap();

        let listing = list_projects(&store, &envs, &identity()).unwrap();
        assert_eq!(listing.projects.len(), 3);
        assert!(listing.projects.iter().all(|p| p.org_id != "scratch"));
        assert_eq!(listing.organizations["acme-solar"], "ops@acme.example");
        assert_eq!(listing.organizations["sun-farm"], "sun-farm");

        let groups = listing.grouped();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].environment, Environment::Prod);
        assert_eq!(groups[1].organizations[0].org_id, "acme-solar");
        assert_eq!(groups[1].organizations[0].email.as_deref(), Some("ops@acme.example"));
        let ids: Vec<_> = groups[1].organizations[0]
            .projects
            .iter()
            .map(|p| p.project_id.as_str())
            .collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_unconfigured_environment_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let mut envs = Environments::default();
        store
            .put(&envs.prod.orthos_bucket, "sun-farm/projects/north/x.tif", b"x")
            .unwrap();
        envs.prod.orthos_bucket.clear();
        let listing = list_projects(&store, &envs, &identity()).unwrap();
        assert!(listing.projects.is_empty());
        assert!(listing.grouped().is_empty());
    }
}
