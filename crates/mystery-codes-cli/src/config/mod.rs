//! Configuration and data file path resolution.

use std::path::PathBuf;

/// Environment variable naming the API config file.
pub const CONFIG_ENV: &str = "MYSTERY_CODES_CONFIG";
/// Environment variable naming the history file.
pub const HISTORY_ENV: &str = "MYSTERY_CODES_HISTORY";
/// Environment variable holding a ready-made challenge token.
pub const CHALLENGE_TOKEN_ENV: &str = "MYSTERY_CODES_CHALLENGE_TOKEN";

const LOCAL_DIR: &str = ".mystery-codes";

/// Resolve the API config path: flag, then env, then `./.mystery-codes`, then home.
pub fn resolve_config_path(explicit: Option<&str>) -> PathBuf {
    resolve_path(explicit, CONFIG_ENV, "config.json")
}

/// Resolve the history path with the same precedence as the config.
pub fn resolve_history_path(explicit: Option<&str>) -> PathBuf {
    resolve_path(explicit, HISTORY_ENV, "history.json")
}

fn resolve_path(explicit: Option<&str>, env_var: &str, file_name: &str) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var(env_var) {
        if !env_path.is_empty() {
            return PathBuf::from(env_path);
        }
    }

    let cwd_path = PathBuf::from(LOCAL_DIR).join(file_name);
    if cwd_path.exists() {
        return cwd_path;
    }

    default_dir().join(file_name)
}

fn default_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    PathBuf::from(home).join(LOCAL_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            resolve_config_path(Some("/tmp/custom.json")),
            PathBuf::from("/tmp/custom.json")
        );
        assert_eq!(
            resolve_history_path(Some("codes.json")),
            PathBuf::from("codes.json")
        );
    }

    #[test]
    fn test_default_file_names() {
        let path = resolve_path(None, "MYSTERY_CODES_TEST_UNSET_VAR", "history.json");
        assert!(path.ends_with("history.json"));
        assert!(path.to_string_lossy().contains(LOCAL_DIR));
    }
}
