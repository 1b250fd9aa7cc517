use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

const ENV_KEYS: [&str; 5] = [
    "PEERDROP_PORT",
    "PEERDROP_ACCEPT_TIMEOUT_SECS",
    "PEERDROP_CONNECT_TIMEOUT_SECS",
    "PEERDROP_OUTPUT_DIR",
    "PEERDROP_IP_PROBE",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvRestore {
    saved: Vec<(&'static str, Option<OsString>)>,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Run `f` with a config file holding `config_toml`, the given env vars set,
/// and every other `PEERDROP_*` variable cleared.
pub fn with_config_env<T>(
    config_toml: &str,
    env: &[(&str, &str)],
    f: impl FnOnce(PathBuf) -> T,
) -> T {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, config_toml).expect("write config");

    let _restore = EnvRestore {
        saved: ENV_KEYS
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect(),
    };

    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    for (key, value) in env {
        std::env::set_var(key, value);
    }

    f(path)
}
