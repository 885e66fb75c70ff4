//! Memory log error types
//!
//! Uses anyhow for propagation. `MemLogError` covers the semantic failures
//! that `main.rs` reports with a dedicated hint.

/// Semantic errors raised while turning a log into sections
#[derive(Debug, Clone, PartialEq)]
pub enum MemLogError {
    /// No line in the whole input matched `<prefix>:<key>_mem_GB = <value>`
    NoSections { prefix: String },
}

impl std::fmt::Display for MemLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemLogError::NoSections { prefix } => {
                write!(f, "No {prefix} memory lines found in the log.")
            }
        }
    }
}

impl std::error::Error for MemLogError {}

/// Check if error is `NoSections`
pub fn is_no_sections(err: &anyhow::Error) -> bool {
    err.downcast_ref::<MemLogError>()
        .is_some_and(|e| matches!(e, MemLogError::NoSections { .. }))
}
