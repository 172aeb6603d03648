use serde::{Deserialize, Serialize};

/// Well-known claim types used by the built-in handlers.
pub mod claim_types {
    pub const NAME: &str = "name";
    pub const ROLE: &str = "role";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const COMPANY: &str = "company";
    pub const EMPLOYEE_ID: &str = "employee_id";
    pub const BADGE_NUMBER: &str = "badge_number";
    pub const TEMPORARY_BADGE_EXPIRY: &str = "temporary_badge_expiry";
}

/// Issuer recorded on claims minted by the local application itself.
pub const LOCAL_ISSUER: &str = "local";

/// A typed, issuer-attributed fact about an identity.
/// Immutable once attached to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
    pub issuer: String,
}

impl Claim {
    /// A claim issued by the local application.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_issuer(claim_type, value, LOCAL_ISSUER)
    }

    pub fn with_issuer(
        claim_type: impl Into<String>,
        value: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            issuer: issuer.into(),
        }
    }
}

/// An ordered set of claims plus the authentication scheme that produced it.
/// Multiple claims of the same type are expected and valid (e.g. several
/// role claims).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    authentication_scheme: Option<String>,
    claims: Vec<Claim>,
}

impl Identity {
    /// An identity produced by a successful authentication.
    pub fn authenticated(scheme: impl Into<String>) -> Self {
        Self {
            authentication_scheme: Some(scheme.into()),
            claims: Vec::new(),
        }
    }

    /// An identity with no authentication scheme (an anonymous visitor).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication_scheme.is_some()
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// Builder-style variant of [`add_claim`](Self::add_claim).
    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims.push(claim);
        self
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }
}

/// The authenticated identity presented for a decision: one or more
/// identities, queried as a single flattened claim set in insertion order.
///
/// Principals are constructed at authentication time and treated as
/// immutable for the lifetime of a request; the engine never stores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    identities: Vec<Identity>,
}

impl Principal {
    pub fn new(identity: Identity) -> Self {
        Self {
            identities: vec![identity],
        }
    }

    /// Attach an additional identity (composite principals).
    pub fn add_identity(&mut self, identity: Identity) {
        self.identities.push(identity);
    }

    /// True if any constituent identity is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.identities.iter().any(Identity::is_authenticated)
    }

    /// All claims across all identities, first identity first.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.identities.iter().flat_map(|i| i.claims.iter())
    }

    /// True if any claim matches the predicate. Zero matches is a normal
    /// outcome, never an error.
    pub fn has_claim(&self, predicate: impl Fn(&Claim) -> bool) -> bool {
        self.claims().any(|c| predicate(c))
    }

    /// First claim matching the predicate, in insertion order.
    pub fn first_claim(&self, predicate: impl Fn(&Claim) -> bool) -> Option<&Claim> {
        self.claims().find(|c| predicate(c))
    }

    /// Value of the first `name` claim, if any.
    pub fn name(&self) -> Option<&str> {
        self.first_claim(|c| c.claim_type == claim_types::NAME)
            .map(|c| c.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_principal() -> Principal {
        Principal::new(
            Identity::authenticated("cookie")
                .with_claim(Claim::new(claim_types::NAME, "barry"))
                .with_claim(Claim::new(claim_types::ROLE, "Administrator"))
                .with_claim(Claim::new(claim_types::ROLE, "Editor")),
        )
    }

    #[test]
    fn test_has_claim() {
        let p = sample_principal();
        assert!(p.has_claim(|c| c.claim_type == claim_types::ROLE && c.value == "Editor"));
        assert!(!p.has_claim(|c| c.claim_type == claim_types::ROLE && c.value == "Auditor"));
    }

    #[test]
    fn test_first_claim_insertion_order() {
        let p = sample_principal();
        let first = p
            .first_claim(|c| c.claim_type == claim_types::ROLE)
            .unwrap();
        assert_eq!(first.value, "Administrator");
    }

    #[test]
    fn test_first_claim_absent() {
        let p = sample_principal();
        assert!(p
            .first_claim(|c| c.claim_type == claim_types::DATE_OF_BIRTH)
            .is_none());
    }

    #[test]
    fn test_anonymous_is_not_authenticated() {
        let p = Principal::new(Identity::anonymous());
        assert!(!p.is_authenticated());
    }

    #[test]
    fn test_composite_principal_authenticated() {
        let mut p = Principal::new(Identity::anonymous());
        assert!(!p.is_authenticated());
        p.add_identity(
            Identity::authenticated("badge").with_claim(Claim::new(claim_types::NAME, "carol")),
        );
        assert!(p.is_authenticated());
        assert_eq!(p.name(), Some("carol"));
    }

    #[test]
    fn test_duplicate_claim_types_are_valid() {
        let p = sample_principal();
        let roles: Vec<_> = p
            .claims()
            .filter(|c| c.claim_type == claim_types::ROLE)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(roles, vec!["Administrator", "Editor"]);
    }
}
