use std::path::Path;

use kdl::KdlDocument;

use crate::errors::AuthzError;
use crate::policy::{Policy, PolicyCatalog};
use crate::requirement::Requirement;

/// Load all `.kdl` policy files from the given directory and register them
/// into a single immutable [`PolicyCatalog`].
pub fn load_policies(dir: &Path) -> Result<PolicyCatalog, AuthzError> {
    if !dir.is_dir() {
        return Err(AuthzError::InvalidPolicy(format!(
            "policies directory `{}` does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut catalog = PolicyCatalog::new();
    let mut file_count = 0;

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "kdl")
                .unwrap_or(false)
        })
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        let contents =
            std::fs::read_to_string(&path).map_err(|source| AuthzError::PolicyLoadError {
                path: path.display().to_string(),
                source,
            })?;
        for policy in parse_kdl_document(&contents)? {
            catalog.register(policy)?;
        }
        file_count += 1;
    }

    if catalog.is_empty() {
        tracing::warn!(
            dir = %dir.display(),
            "no policies loaded from directory"
        );
    }

    let mut names: Vec<_> = catalog.names().collect();
    names.sort_unstable();
    tracing::info!(
        files = file_count,
        policies = catalog.len(),
        ?names,
        "Loaded authorization policies"
    );

    Ok(catalog)
}

/// Parse a KDL document string into policies.
///
/// ```kdl
/// policy "CanEditAlbum" {
///     require-authenticated-user
///     require-role "Administrator"
///     resource-owner
/// }
/// ```
pub fn parse_kdl_document(source: &str) -> Result<Vec<Policy>, AuthzError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| AuthzError::KdlParse(e.to_string()))?;

    let mut policies = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "policy" => {
                let name = first_string_arg(node).ok_or_else(|| {
                    AuthzError::InvalidPolicy(
                        "policy node requires a string argument (e.g. policy \"Over21Only\")"
                            .into(),
                    )
                })?;
                policies.push(parse_policy_node(node, name)?);
            }
            other => {
                // Ignore unknown top-level nodes with a warning
                tracing::warn!("ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    Ok(policies)
}

fn parse_policy_node(node: &kdl::KdlNode, name: String) -> Result<Policy, AuthzError> {
    let mut builder = Policy::builder(&name);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "require-authenticated-user" => {
                    builder = builder.require_authenticated_user();
                }
                "require-role" => {
                    let roles = string_args(child);
                    if roles.is_empty() {
                        return Err(AuthzError::InvalidPolicy(format!(
                            "require-role in policy `{name}` needs at least one role name"
                        )));
                    }
                    builder = builder.require_role(roles);
                }
                "require-claim" => {
                    let claim_type = first_string_arg(child).ok_or_else(|| {
                        AuthzError::InvalidPolicy(format!(
                            "require-claim in policy `{name}` needs a claim type argument"
                        ))
                    })?;
                    builder = builder.require_claim(claim_type, dash_list(child));
                }
                "minimum-age" => {
                    let years = first_int_arg(child).ok_or_else(|| {
                        AuthzError::InvalidPolicy(format!(
                            "minimum-age in policy `{name}` needs an integer argument"
                        ))
                    })?;
                    let years = u32::try_from(years).ok().filter(|y| *y > 0).ok_or_else(
                        || {
                            AuthzError::InvalidPolicy(format!(
                                "minimum-age in policy `{name}` must be a positive age, got {years}"
                            ))
                        },
                    )?;
                    builder = builder.add_requirement(Requirement::MinimumAge { years });
                }
                "office-entry" => {
                    builder = builder.add_requirement(Requirement::OfficeEntry);
                }
                "resource-owner" => {
                    builder = builder.add_requirement(Requirement::ResourceOwner);
                }
                other => {
                    return Err(AuthzError::InvalidPolicy(format!(
                        "unexpected child `{other}` in policy `{name}`"
                    )));
                }
            }
        }
    }

    Ok(builder.build())
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &kdl::KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Extract all positional string arguments from a KDL node.
fn string_args(node: &kdl::KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

/// Extract the first integer argument from a KDL node.
fn first_int_arg(node: &kdl::KdlNode) -> Option<i64> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
        .and_then(|i| i64::try_from(i).ok())
}

/// Extract dash-list children: nodes named "-" whose first argument is a
/// string.
/// ```kdl
/// require-claim "employee_id" {
///     - "123"
///     - "456"
/// }
/// ```
fn dash_list(node: &kdl::KdlNode) -> Vec<String> {
    let Some(children) = node.children() else {
        return Vec::new();
    };
    children
        .nodes()
        .iter()
        .filter(|n| n.name().value() == "-")
        .filter_map(first_string_arg)
        .collect()
}
