//! Privilege checks and operator identification.

use anyhow::{bail, Result};

/// Whether the process runs with effective uid 0.
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Mutating commands touch /etc and the root crontab; refuse early otherwise.
pub fn require_root(action: &str) -> Result<()> {
    if !is_root() {
        bail!("'{}' requires root privileges. Run with sudo.", action);
    }
    Ok(())
}

/// Operator identity for the audit trail: the sudo caller when present.
pub fn current_actor() -> String {
    if let Ok(user) = std::env::var("SUDO_USER") {
        if !user.is_empty() {
            return format!("{}(sudo)", user);
        }
    }
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_root_does_not_panic() {
        let _ = is_root();
    }

    #[test]
    fn test_current_actor_non_empty() {
        assert!(!current_actor().is_empty());
    }
}
