//! Broker configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Room access policy.
///
/// `Strict` grants access only to organizers and approved attendees.
/// `Permissive` additionally admits everyone else and exists for open/public
/// deployments only; it must be opted into explicitly and is logged loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    Strict,
    Permissive,
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub bind_addr: SocketAddr,
    pub access_policy: AccessPolicy,
    /// How often the server pings each connection
    pub heartbeat_interval: Duration,
    /// How long a connection may stay silent before it is reaped
    pub heartbeat_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8787)),
            access_policy: AccessPolicy::Strict,
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
        }
    }
}

impl BrokerConfig {
    /// Load broker config from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("HUDDLE_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.bind_addr);

        let access_policy = match std::env::var("HUDDLE_ACCESS_POLICY").ok().as_deref() {
            Some("permissive") => {
                tracing::warn!(
                    "access policy is PERMISSIVE - users without organizer or \
                     approved-attendee status can join any event room"
                );
                AccessPolicy::Permissive
            }
            Some("strict") | None => AccessPolicy::Strict,
            Some(other) => {
                tracing::warn!(
                    "unknown HUDDLE_ACCESS_POLICY value {:?}, falling back to strict",
                    other
                );
                AccessPolicy::Strict
            }
        };

        let heartbeat_interval = env_secs("HUDDLE_HEARTBEAT_INTERVAL_SECS")
            .unwrap_or(defaults.heartbeat_interval);
        let heartbeat_timeout =
            env_secs("HUDDLE_HEARTBEAT_TIMEOUT_SECS").unwrap_or(defaults.heartbeat_timeout);

        Self {
            bind_addr,
            access_policy,
            heartbeat_interval,
            heartbeat_timeout,
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "HUDDLE_BIND",
            "HUDDLE_ACCESS_POLICY",
            "HUDDLE_HEARTBEAT_INTERVAL_SECS",
            "HUDDLE_HEARTBEAT_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_to_strict_policy() {
        clear_env();
        let config = BrokerConfig::from_env();
        assert_eq!(config.access_policy, AccessPolicy::Strict);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn permissive_policy_requires_explicit_opt_in() {
        clear_env();
        std::env::set_var("HUDDLE_ACCESS_POLICY", "permissive");
        let config = BrokerConfig::from_env();
        assert_eq!(config.access_policy, AccessPolicy::Permissive);

        std::env::set_var("HUDDLE_ACCESS_POLICY", "open-sesame");
        let config = BrokerConfig::from_env();
        assert_eq!(config.access_policy, AccessPolicy::Strict);
        clear_env();
    }

    #[test]
    #[serial]
    fn heartbeat_overrides_parse_from_env() {
        clear_env();
        std::env::set_var("HUDDLE_HEARTBEAT_INTERVAL_SECS", "5");
        std::env::set_var("HUDDLE_HEARTBEAT_TIMEOUT_SECS", "0");
        let config = BrokerConfig::from_env();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        // Zero would disable reaping entirely, keep the default instead
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(90));
        clear_env();
    }
}
