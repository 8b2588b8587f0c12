//! Environment-driven switches shared by the passes.

fn normalize(val: &str) -> Option<bool> {
    let trimmed = val.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(!matches!(trimmed, "0" | "false" | "FALSE" | "False" | "off" | "no"))
}

/// Read a boolean switch from the environment. Unset or empty variables
/// yield `None`; anything other than a falsy spelling counts as `true`.
pub fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|val| normalize(&val))
}

/// Read a trimmed, lowercased string value from the environment.
pub fn env_value(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}
