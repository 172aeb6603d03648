use serde::{Deserialize, Serialize};

/// An atomic named condition a policy demands be satisfied, together with
/// its configuration. Constructed once (usually at startup) and reused
/// across evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// Principal must hold a role claim whose value is one of `allowed`.
    Role { allowed: Vec<String> },
    /// Principal must hold a claim of `claim_type` whose value is in
    /// `accepted`. An empty `accepted` list accepts any value.
    Claim {
        claim_type: String,
        #[serde(default)]
        accepted: Vec<String>,
    },
    /// Principal must be at least `years` old according to their
    /// date-of-birth claim.
    MinimumAge { years: u32 },
    /// Principal must be able to enter the office: a permanent badge or an
    /// unexpired temporary pass both satisfy this (OR across handlers).
    OfficeEntry,
    /// Principal must own the resource under evaluation.
    ResourceOwner,
}

impl Requirement {
    pub fn kind(&self) -> RequirementKind {
        match self {
            Requirement::Role { .. } => RequirementKind::Role,
            Requirement::Claim { .. } => RequirementKind::Claim,
            Requirement::MinimumAge { .. } => RequirementKind::MinimumAge,
            Requirement::OfficeEntry => RequirementKind::OfficeEntry,
            Requirement::ResourceOwner => RequirementKind::ResourceOwner,
        }
    }
}

/// Tag-only mirror of [`Requirement`], used as the handler registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Role,
    Claim,
    MinimumAge,
    OfficeEntry,
    ResourceOwner,
}

impl std::fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RequirementKind::Role => "role",
            RequirementKind::Claim => "claim",
            RequirementKind::MinimumAge => "minimum_age",
            RequirementKind::OfficeEntry => "office_entry",
            RequirementKind::ResourceOwner => "resource_owner",
        };
        f.write_str(name)
    }
}
