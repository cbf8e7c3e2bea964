use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Dosekeeper";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Overrides the data directory when set.
pub const DATA_DIR_ENV: &str = "DOSEKEEPER_DATA_DIR";

/// Month length used to turn a monthly dose cap into a daily rate.
pub const NOMINAL_DAYS_PER_MONTH: u32 = 30;

/// Upper bound on `min_hours_between_doses` (about 100 years).
pub const MAX_SPACING_HOURS: f64 = 876_000.0;

/// Get the application data directory
/// `$DOSEKEEPER_DATA_DIR`, else ~/Dosekeeper/, else the working directory
pub fn app_data_dir() -> PathBuf {
    resolve_data_dir(
        std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        dirs::home_dir(),
    )
}

fn resolve_data_dir(override_dir: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    match (override_dir, home) {
        (Some(dir), _) if !dir.as_os_str().is_empty() => dir,
        (_, Some(home)) => home.join(APP_NAME),
        _ => PathBuf::from("."),
    }
}

/// Get the SQLite database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("dosekeeper.db")
}

/// Log filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "dosekeeper=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_home() {
        let dir = resolve_data_dir(Some("/srv/doses".into()), Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/srv/doses"));
    }

    #[test]
    fn empty_override_is_ignored() {
        let dir = resolve_data_dir(Some(PathBuf::new()), Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/home/ana/Dosekeeper"));
    }

    #[test]
    fn falls_back_to_working_directory() {
        assert_eq!(resolve_data_dir(None, None), PathBuf::from("."));
    }

    #[test]
    fn database_lives_in_data_dir() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("dosekeeper.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().starts_with("dosekeeper"));
    }
}
