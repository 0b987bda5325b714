//! Holder identity and session tokens.
//!
//! The holder name is a human-readable convention, not a credential: nothing
//! stops two processes from claiming the same name. The session token is what
//! tells "this exact process" apart from a restarted one under the same name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A caller of the coordinator: display name plus per-session token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    /// Human-readable name recorded as the holder.
    pub holder: String,

    /// Opaque value unique to one session instance.
    pub session_token: String,
}

impl Requester {
    /// Create a requester with a freshly minted session token.
    pub fn new(holder: impl Into<String>) -> Self {
        Self {
            holder: holder.into(),
            session_token: new_session_token(),
        }
    }

    /// Create a requester with a known token.
    pub fn with_token(holder: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            holder: holder.into(),
            session_token: session_token.into(),
        }
    }
}

impl std::fmt::Display for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.holder)
    }
}

/// Mint a new opaque session token.
pub fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Get the OS account name of the current user.
pub fn os_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Get the machine name, if it can be determined.
pub fn host_name() -> Option<String> {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().to_string())
        .filter(|h| !h.is_empty())
}

/// Resolve the display name: a non-blank override wins, otherwise the OS
/// account name.
pub fn resolve_display_name(override_name: Option<&str>) -> String {
    override_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(os_username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&'static str, Option<&str>)]) -> Self {
            let saved = vars
                .iter()
                .map(|(k, _)| (*k, std::env::var(k).ok()))
                .collect();
            for (k, v) in vars {
                // SAFETY: tests touching the environment run under #[serial].
                unsafe {
                    match v {
                        Some(v) => std::env::set_var(k, v),
                        None => std::env::remove_var(k),
                    }
                }
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (k, v) in &self.saved {
                // SAFETY: see EnvGuard::set.
                unsafe {
                    match v {
                        Some(v) => std::env::set_var(k, v),
                        None => std::env::remove_var(k),
                    }
                }
            }
        }
    }

    #[test]
    fn requesters_with_same_name_differ_by_token() {
        let a = Requester::new("alice");
        let b = Requester::new("alice");

        assert_eq!(a.holder, b.holder);
        assert_ne!(a.session_token, b.session_token);
        assert_ne!(a, b);
    }

    #[test]
    fn with_token_keeps_given_token() {
        let r = Requester::with_token("alice", "tok-1");
        assert_eq!(r.session_token, "tok-1");
        assert_eq!(r.to_string(), "alice");
    }

    #[test]
    #[serial]
    fn os_username_prefers_user_then_username() {
        let _guard = EnvGuard::set(&[("USER", Some("posix")), ("USERNAME", Some("win"))]);
        assert_eq!(os_username(), "posix");

        let _inner = EnvGuard::set(&[("USER", None)]);
        assert_eq!(os_username(), "win");
    }

    #[test]
    #[serial]
    fn os_username_falls_back_to_unknown() {
        let _guard = EnvGuard::set(&[("USER", None), ("USERNAME", None)]);
        assert_eq!(os_username(), "unknown");
    }

    #[test]
    #[serial]
    fn display_name_override_wins_unless_blank() {
        let _guard = EnvGuard::set(&[("USER", Some("posix"))]);

        assert_eq!(resolve_display_name(Some("  Ada  ")), "Ada");
        assert_eq!(resolve_display_name(Some("   ")), "posix");
        assert_eq!(resolve_display_name(None), "posix");
    }
}
