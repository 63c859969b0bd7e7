use std::fmt;

use serde::{Deserialize, Serialize};

/// Which of the two connected accounts a credential or library belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Primary,
    Secondary,
}

impl AccountRole {
    /// The account on the other side of a transfer.
    pub fn counterpart(self) -> Self {
        match self {
            AccountRole::Primary => AccountRole::Secondary,
            AccountRole::Secondary => AccountRole::Primary,
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRole::Primary => write!(f, "primary"),
            AccountRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// An opaque bearer token for one account.
///
/// `Debug` is redacted so the token can't end up in logs or span fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank tokens, which count as "not connected".
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Port trait for credential retrieval.
///
/// Acquiring and refreshing tokens happens elsewhere; the sync engine only asks for
/// the current token of a role and treats `None` as a disconnected account.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    fn credential(&self, role: AccountRole) -> Option<Credential>;
}

/// Tokens handed in directly by the caller.
#[derive(Debug, Clone, Default)]
pub struct AccountCredentials {
    primary: Option<Credential>,
    secondary: Option<Credential>,
}

impl AccountCredentials {
    pub fn new(primary: Option<String>, secondary: Option<String>) -> Self {
        Self {
            primary: primary.and_then(Credential::new),
            secondary: secondary.and_then(Credential::new),
        }
    }
}

impl CredentialSource for AccountCredentials {
    fn credential(&self, role: AccountRole) -> Option<Credential> {
        match role {
            AccountRole::Primary => self.primary.clone(),
            AccountRole::Secondary => self.secondary.clone(),
        }
    }
}
