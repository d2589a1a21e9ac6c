use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Flat accessors over the process environment, one per knob, rather
/// than a config-file parser. [`OrchestratorEnv::load`] reads each of
/// these once at startup and freezes the result into a struct.
#[must_use]
pub fn network_spec_dir() -> PathBuf {
    env::var("ORCHESTRATOR_NETWORK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("networks"))
}

#[must_use]
pub fn store_path() -> PathBuf {
    env::var("ORCHESTRATOR_STORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("orchestrator.sqlite3"))
}

#[must_use]
pub fn artifact_dir() -> PathBuf {
    env::var("ORCHESTRATOR_ARTIFACT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("artifacts"))
}

#[must_use]
pub fn private_key() -> Option<String> {
    env::var("ORCHESTRATOR_PRIVATE_KEY").ok()
}

#[must_use]
pub fn event_bus_capacity() -> usize {
    read_env_any(&["ORCHESTRATOR_EVENT_BUS_CAPACITY"], 256)
}

#[must_use]
pub fn breaker_failure_threshold() -> u32 {
    read_env_any(&["ORCHESTRATOR_BREAKER_THRESHOLD"], 5)
}

#[must_use]
pub fn breaker_recovery_secs() -> u64 {
    read_env_any(&["ORCHESTRATOR_BREAKER_RECOVERY_SECS"], 30)
}

#[must_use]
pub fn breaker_recovery() -> Duration {
    Duration::from_secs(breaker_recovery_secs())
}

#[must_use]
pub fn pool_idle_window() -> Duration {
    Duration::from_secs(read_env_any(&["ORCHESTRATOR_POOL_IDLE_SECS"], 300))
}

/// Whether the process is running under CI or another slow, shared
/// environment; timeouts derived from [`adjust_timeout`] get a
/// multiplier here instead of staying fixed constants.
#[must_use]
pub fn is_slow_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true") || env::var("CI").is_ok()
}

/// Stretches `base` by a fixed factor under [`is_slow_env`].
#[must_use]
pub fn adjust_timeout(base: Duration) -> Duration {
    if is_slow_env() {
        base * 3
    } else {
        base
    }
}

fn read_env_any<T>(keys: &[&str], default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    keys.iter()
        .find_map(|key| env::var(key).ok().and_then(|raw| raw.parse::<T>().ok()))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_timeout_only_stretches_under_slow_env() {
        let base = Duration::from_secs(10);
        assert_eq!(adjust_timeout(base), base);
    }

    #[test]
    fn defaults_are_relative_paths() {
        assert_eq!(network_spec_dir(), PathBuf::from("networks"));
        assert_eq!(artifact_dir(), PathBuf::from("artifacts"));
    }
}
