use std::path::PathBuf;
use std::sync::Once;

static CREATE_DIR_WARNED: Once = Once::new();

/// Resolve the cukemirror home directory.
///
/// Priority:
/// 1) CUKEMIRROR_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.cukemirror
pub fn cukemirror_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("CUKEMIRROR_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".cukemirror");
    }
    PathBuf::from(".").join(".cukemirror")
}

fn ensure_home_dir(home: &PathBuf) {
    if let Err(err) = std::fs::create_dir_all(home) {
        CREATE_DIR_WARNED.call_once(|| {
            eprintln!(
                "Warning: failed to create cukemirror home directory {}: {}. Set CUKEMIRROR_HOME or pass --db.",
                home.display(),
                err
            );
        });
    }
}

/// Default mirror store path: ~/.cukemirror/mirror.sqlite
pub fn default_store_path() -> PathBuf {
    let home = cukemirror_home();
    ensure_home_dir(&home);
    home.join("mirror.sqlite")
}

/// Default logs directory: ~/.cukemirror/logs
pub fn default_logs_dir() -> PathBuf {
    let home = cukemirror_home();
    ensure_home_dir(&home);
    home.join("logs")
}

/// Optional configuration file: ~/.cukemirror/config.toml
pub fn config_file_path() -> PathBuf {
    cukemirror_home().join("config.toml")
}
