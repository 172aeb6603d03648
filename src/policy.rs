use std::collections::HashMap;

use serde::Deserialize;

use crate::errors::AuthzError;
use crate::requirement::Requirement;

/// A named AND-combination of requirements plus an authentication
/// precondition. Immutable once built; register it in a [`PolicyCatalog`]
/// at startup and look it up by name at evaluation time.
#[derive(Debug, Clone)]
pub struct Policy {
    name: String,
    require_authenticated: bool,
    requirements: Vec<Requirement>,
}

impl Policy {
    pub fn builder(name: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder {
            name: name.into(),
            require_authenticated: false,
            requirements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requires_authenticated_principal(&self) -> bool {
        self.require_authenticated
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

#[derive(Debug)]
pub struct PolicyBuilder {
    name: String,
    require_authenticated: bool,
    requirements: Vec<Requirement>,
}

impl PolicyBuilder {
    /// Fail the policy up front for unauthenticated principals, before any
    /// handler runs.
    pub fn require_authenticated_user(mut self) -> Self {
        self.require_authenticated = true;
        self
    }

    /// Shortcut for a role requirement: the principal must hold one of the
    /// given roles.
    pub fn require_role<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.push(Requirement::Role {
            allowed: roles.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Shortcut for a claim requirement: the principal must hold a claim of
    /// `claim_type` with a value in `accepted` (empty = any value).
    pub fn require_claim<I, S>(mut self, claim_type: impl Into<String>, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.push(Requirement::Claim {
            claim_type: claim_type.into(),
            accepted: accepted.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn add_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn build(self) -> Policy {
        Policy {
            name: self.name,
            require_authenticated: self.require_authenticated,
            requirements: self.requirements,
        }
    }
}

/// Declarative policy configuration, as a host would supply it in JSON or
/// TOML. Converts into a [`Policy`] with the shortcut checks expanded into
/// ordinary requirements.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct PolicySpec {
    #[serde(default)]
    pub require_authenticated_user: bool,
    #[serde(default)]
    pub required_roles: Vec<String>,
    #[serde(default)]
    pub required_claim: Option<ClaimSpec>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct ClaimSpec {
    pub claim_type: String,
    #[serde(default)]
    pub accepted_values: Vec<String>,
}

impl PolicySpec {
    pub fn into_policy(self, name: impl Into<String>) -> Policy {
        let mut builder = Policy::builder(name);
        if self.require_authenticated_user {
            builder = builder.require_authenticated_user();
        }
        if !self.required_roles.is_empty() {
            builder = builder.require_role(self.required_roles);
        }
        if let Some(claim) = self.required_claim {
            builder = builder.require_claim(claim.claim_type, claim.accepted_values);
        }
        for requirement in self.requirements {
            builder = builder.add_requirement(requirement);
        }
        builder.build()
    }
}

/// All registered policies, keyed by name. Built once at startup and never
/// mutated afterwards, so evaluation-time lookups need no locking.
#[derive(Debug, Default)]
pub struct PolicyCatalog {
    policies: HashMap<String, Policy>,
}

impl PolicyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy. Duplicate names are a wiring bug and rejected.
    pub fn register(&mut self, policy: Policy) -> Result<(), AuthzError> {
        if self.policies.contains_key(policy.name()) {
            return Err(AuthzError::DuplicatePolicy(policy.name().to_string()));
        }
        self.policies.insert(policy.name().to_string(), policy);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::RequirementKind;

    #[test]
    fn test_builder_expands_shortcuts() {
        let policy = Policy::builder("CanEditAlbum")
            .require_authenticated_user()
            .require_role(["Administrator"])
            .add_requirement(Requirement::ResourceOwner)
            .build();

        assert_eq!(policy.name(), "CanEditAlbum");
        assert!(policy.requires_authenticated_principal());
        let kinds: Vec<_> = policy.requirements().iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![RequirementKind::Role, RequirementKind::ResourceOwner]
        );
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let mut catalog = PolicyCatalog::new();
        catalog
            .register(Policy::builder("AdministratorOnly").build())
            .unwrap();
        let err = catalog
            .register(Policy::builder("AdministratorOnly").build())
            .unwrap_err();
        assert!(matches!(err, AuthzError::DuplicatePolicy(_)));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = PolicyCatalog::new();
        catalog
            .register(Policy::builder("Over21Only").build())
            .unwrap();
        assert!(catalog.get("Over21Only").is_some());
        assert!(catalog.get("NoSuchPolicy").is_none());
    }

    #[test]
    fn test_policy_spec_from_json() {
        let spec: PolicySpec = serde_json::from_value(serde_json::json!({
            "require_authenticated_user": true,
            "required_roles": ["Administrator"],
            "required_claim": {
                "claim_type": "employee_id",
                "accepted_values": ["123", "456"],
            },
            "requirements": [
                { "kind": "minimum_age", "years": 21 },
                { "kind": "office_entry" },
            ],
        }))
        .unwrap();

        let policy = spec.into_policy("Kitchen Sink");
        assert!(policy.requires_authenticated_principal());
        let kinds: Vec<_> = policy.requirements().iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                RequirementKind::Role,
                RequirementKind::Claim,
                RequirementKind::MinimumAge,
                RequirementKind::OfficeEntry,
            ]
        );
    }

    #[test]
    fn test_policy_spec_defaults() {
        let spec: PolicySpec = serde_json::from_value(serde_json::json!({})).unwrap();
        let policy = spec.into_policy("Empty");
        assert!(!policy.requires_authenticated_principal());
        assert!(policy.requirements().is_empty());
    }
}
