// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Operator authentication.
//!
//! Only members of the admin group may use the dashboard. Anyone else is
//! treated as signed out, even with valid credentials.

use crate::error::AuthError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Who a token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
}

/// Identity collaborator.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, email: &str, password: &str) -> Result<Tokens, AuthError>;

    fn identity(&self, access_token: &str) -> Result<UserIdentity, AuthError>;

    /// Invalidate a token. Unknown tokens are ignored.
    fn sign_out(&self, access_token: &str);

    /// Every known user; usernames double as organisation ids.
    fn list_users(&self) -> Result<Vec<UserIdentity>, AuthError>;
}

/// A signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub tokens: Tokens,
    pub user: UserIdentity,
}

/// Sign in and check admin membership.
pub fn login(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
    admin_group: &str,
) -> Result<Session, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    let tokens = provider.authenticate(email, password)?;
    if tokens.access_token.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }
    let user = provider.identity(&tokens.access_token)?;
    if !user.groups.iter().any(|g| g == admin_group) {
        log::warn!("Rejected non-admin login for {}", user.username);
        provider.sign_out(&tokens.access_token);
        return Err(AuthError::AccessDenied);
    }
    log::info!("Admin {} signed in", user.username);
    Ok(Session { tokens, user })
}

pub fn logout(provider: &dyn IdentityProvider, session: &Session) {
    provider.sign_out(&session.tokens.access_token);
    log::info!("{} signed out", session.user.username);
}

/// One entry of the local users file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// Identity provider backed by a YAML users file, for offline use.
///
/// Tokens are random and live only as long as the process.
#[derive(Debug, Default)]
pub struct LocalIdentityProvider {
    users: Vec<UserRecord>,
    sessions: Mutex<HashMap<String, String>>,
}

impl LocalIdentityProvider {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Load users from YAML. A missing file means nobody can sign in.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::warn!("Users file {} not found, no one can sign in", path.display());
            return Ok(Self::default());
        }
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read users file {}", path.display()))?;
        let file: UsersFile = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse users file {}", path.display()))?;
        log::info!("Loaded {} users from {}", file.users.len(), path.display());
        Ok(Self::new(file.users))
    }

    fn identity_of(record: &UserRecord) -> UserIdentity {
        UserIdentity {
            username: record.username.clone(),
            email: if record.email.is_empty() {
                record.username.clone()
            } else {
                record.email.clone()
            },
            groups: record.groups.clone(),
        }
    }

    fn sessions(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AuthError> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::Provider("session store poisoned".to_string()))
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn authenticate(&self, email: &str, password: &str) -> Result<Tokens, AuthError> {
        let record = self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) || u.username == email)
            .filter(|u| u.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        let tokens = Tokens {
            access_token: uuid::Uuid::new_v4().to_string(),
            id_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: uuid::Uuid::new_v4().to_string(),
        };
        self.sessions()?
            .insert(tokens.access_token.clone(), record.username.clone());
        Ok(tokens)
    }

    fn identity(&self, access_token: &str) -> Result<UserIdentity, AuthError> {
        let username = self
            .sessions()?
            .get(access_token)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(Self::identity_of)
            .ok_or(AuthError::InvalidToken)
    }

    fn sign_out(&self, access_token: &str) {
        if let Ok(mut sessions) = self.sessions() {
            sessions.remove(access_token);
        }
    }

    fn list_users(&self) -> Result<Vec<UserIdentity>, AuthError> {
        Ok(self.users.iter().map(Self::identity_of).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::new(vec![
            UserRecord {
                username: "ops".to_string(),
                email: "ops@example.com".to_string(),
                password: "hunter2".to_string(),
                groups: vec!["admin".to_string()],
            },
            UserRecord {
                username: "acme-solar".to_string(),
                email: String::new(),
                password: "client".to_string(),
                groups: vec![],
            },
        ])
    }

    #[test]
    fn test_admin_login() {
        let provider = provider();
        let session = login(&provider, " ops@example.com ", "hunter2", "admin").unwrap();
        assert_eq!(session.user.username, "ops");
        assert_eq!(
            provider.identity(&session.tokens.access_token).unwrap().email,
            "ops@example.com"
        );

        logout(&provider, &session);
        assert_eq!(
            provider.identity(&session.tokens.access_token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_login_failures() {
        let provider = provider();
        assert_eq!(login(&provider, "", "x", "admin"), Err(AuthError::MissingCredentials));
        assert_eq!(
            login(&provider, "ops@example.com", "", "admin"),
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            login(&provider, "ops@example.com", "wrong", "admin"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(login(&provider, "acme-solar", "client", "admin"), Err(AuthError::AccessDenied));
    }

    #[test]
    fn test_non_admin_token_is_revoked() {
        let provider = provider();
        let tokens = provider.authenticate("acme-solar", "client").unwrap();
        assert!(provider.identity(&tokens.access_token).is_ok());
        assert!(login(&provider, "acme-solar", "client", "admin").is_err());
        assert_eq!(provider.sessions().unwrap().len(), 1);
    }

    #[test]
    fn test_users_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.yaml");
        std::fs::write(
            &path,
            concat!(
                "users:\n",
                "  - username: ops\n",
                "    email: ops@example.com\n",
                "    password: pw\n",
                "    groups: [admin]\n",
            ),
        )
        .unwrap();
        let provider = LocalIdentityProvider::from_file(&path).unwrap();
        let users = provider.list_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].groups, vec!["admin"]);

        let empty = LocalIdentityProvider::from_file(&dir.path().join("missing.yaml")).unwrap();
        assert!(empty.list_users().unwrap().is_empty());
    }
}
