use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("No policy named `{0}` is registered")]
    #[diagnostic(
        code(portcullis::unknown_policy),
        help("Register the policy in the catalog at startup before evaluating against it")
    )]
    UnknownPolicy(String),

    #[error("A policy named `{0}` is already registered")]
    #[diagnostic(
        code(portcullis::duplicate_policy),
        help("Policy names must be unique within one catalog")
    )]
    DuplicatePolicy(String),

    #[error("Invalid policy: {0}")]
    #[diagnostic(
        code(portcullis::invalid_policy),
        help("Each policy file must contain `policy \"<name>\" {{ ... }}` nodes with recognized requirement children")
    )]
    InvalidPolicy(String),

    #[error("Failed to load policy file `{path}`")]
    #[diagnostic(
        code(portcullis::policy_load),
        help("Check that the file exists and contains valid KDL syntax")
    )]
    PolicyLoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("KDL parse error: {0}")]
    #[diagnostic(
        code(portcullis::kdl_parse),
        help("Check your KDL file syntax — see https://kdl.dev for the specification")
    )]
    KdlParse(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(portcullis::io))]
    Io(#[from] std::io::Error),
}
