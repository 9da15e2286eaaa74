//! OS user identity used to scope the snippet vault.

/// Returns an identifier for the current OS user on this machine, of the form `user@host`.
///
/// The value is stable across process restarts for the same account. Missing
/// pieces fall back to `"unknown"` rather than failing, so a vault remains
/// usable on minimal systems.
pub fn current_user_context() -> String {
    let user = ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "unknown".to_string());

    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    format!("{}@{}", user.trim(), host.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_context_is_stable() {
        let first = current_user_context();
        let second = current_user_context();
        assert_eq!(first, second);
        assert!(first.contains('@'));
    }
}
