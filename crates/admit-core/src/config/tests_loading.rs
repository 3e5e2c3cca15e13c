//! Loading-focused tests for configuration
//!
//! Tests for file loading, parsing and environment overrides.

#[cfg(test)]
mod loading_tests {
    use std::io::Write;

    use serial_test::serial;

    use crate::config::{load_config_layers, load_toml_file, LockServiceKind, SchedulerConfig};
    use crate::{Error, Result};

    fn write_config(contents: &str) -> Result<(tempfile::TempDir, std::path::PathBuf)> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create temp dir: {e}")))?;
        let path = temp_dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path)
            .map_err(|e| Error::IoError(format!("Failed to create test file: {e}")))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| Error::IoError(format!("Failed to write test file: {e}")))?;
        Ok((temp_dir, path))
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let (_dir, path) = write_config("lock_group = \"tpch.lock\"\n[hold]\nmax_units = 3\n")?;
        let config = load_toml_file(&path)?;

        assert_eq!(config.lock_group, "tpch.lock");
        assert_eq!(config.hold.max_units, 3);
        assert_eq!(config.hold.min_units, 1);
        assert_eq!(config.exempt_isolation_levels, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn test_malformed_toml_returns_parse_error() -> Result<()> {
        let (_dir, path) = write_config("lock_group = \n invalid toml [[[")?;
        assert!(matches!(load_toml_file(&path), Err(Error::ParseError(_))));
        Ok(())
    }

    #[test]
    fn test_directory_path_rejected() -> Result<()> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create temp dir: {e}")))?;
        assert!(matches!(
            load_toml_file(temp_dir.path()),
            Err(Error::IoError(_))
        ));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_explicit_file_is_loaded_and_validated() -> Result<()> {
        let (_dir, path) = write_config("[hold]\nmin_units = 9\nmax_units = 2\n")?;
        assert!(matches!(
            load_config_layers(None, Some(&path)),
            Err(Error::InvalidConfig(_))
        ));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() -> Result<()> {
        let (_dir, path) = write_config("lock_group = \"file.lock\"\nseed = 1\n")?;

        std::env::set_var("ADMIT_LOCK_GROUP", "env.lock");
        std::env::set_var("ADMIT_LOCK_SERVICE", "command");
        let result = load_config_layers(None, Some(&path));
        std::env::remove_var("ADMIT_LOCK_GROUP");
        std::env::remove_var("ADMIT_LOCK_SERVICE");

        let config = result?;
        assert_eq!(config.lock_group, "env.lock");
        assert_eq!(config.lock_service, LockServiceKind::Command);
        assert_eq!(config.seed, Some(1));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_global_file_is_overridden_by_explicit_file() -> Result<()> {
        let (_global_dir, global) =
            write_config("lock_group = \"global.lock\"\ntick_ms = 7\n")?;
        let (_dir, path) = write_config("lock_group = \"project.lock\"\n")?;

        let config = load_config_layers(Some(&global), Some(&path))?;
        assert_eq!(config.lock_group, "project.lock");
        assert_eq!(config.tick_ms, 7);
        Ok(())
    }

    #[test]
    #[serial]
    fn test_missing_global_file_is_skipped() -> Result<()> {
        let (dir, path) = write_config("seed = 3\n")?;
        let global = dir.path().join("absent.toml");

        let config = load_config_layers(Some(&global), Some(&path))?;
        assert_eq!(config.seed, Some(3));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_rejected() {
        std::env::set_var("ADMIT_SEED", "not-a-number");
        let result = SchedulerConfig::default().apply_env_vars();
        std::env::remove_var("ADMIT_SEED");

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
