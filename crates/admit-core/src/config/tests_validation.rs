//! Validation-focused tests for configuration

#[cfg(test)]
mod validation_tests {
    use crate::config::{LockServiceKind, SchedulerConfig};
    use crate::request::IsolationLevel;
    use crate::Error;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_lock_group_rejected() {
        let config = SchedulerConfig {
            lock_group: "  ".to_string(),
            ..SchedulerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_out_of_range_exempt_level_rejected() {
        let config = SchedulerConfig {
            exempt_isolation_levels: vec![0, 4],
            ..SchedulerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_hold_range_rejected() {
        let mut config = SchedulerConfig::default();
        config.hold.min_units = 6;
        config.hold.max_units = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_hold_rejected() {
        let mut config = SchedulerConfig::default();
        config.hold.min_units = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_release_attempt_rejected() {
        let mut config = SchedulerConfig::default();
        config.retry.release_attempts = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_acquire_attempts_rejected() {
        let mut config = SchedulerConfig::default();
        config.retry.acquire_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_transport_needs_program() {
        let mut config = SchedulerConfig {
            lock_service: LockServiceKind::Command,
            ..SchedulerConfig::default()
        };
        config.command.program = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exempt_levels_typed() -> crate::Result<()> {
        let levels = SchedulerConfig::default().exempt_levels()?;
        assert!(levels.contains(&IsolationLevel::ReadUncommitted));
        assert!(levels.contains(&IsolationLevel::ReadCommitted));
        assert!(!levels.contains(&IsolationLevel::RepeatableRead));
        Ok(())
    }
}
