//! Logging service

use crate::models::LogLevel;

/// Initialize logging with the specified level
pub fn init_logging(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_directive(level))
        .with_writer(std::io::stderr)
        .try_init()
}

fn filter_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "smsrelay=error,smsrelay_core=error",
        LogLevel::Warn => "smsrelay=warn,smsrelay_core=warn",
        LogLevel::Info => "smsrelay=info,smsrelay_core=info",
        LogLevel::Debug => "smsrelay=debug,smsrelay_core=debug",
        LogLevel::Trace => "smsrelay=trace,smsrelay_core=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_targets_both_crates() {
        assert_eq!(
            filter_directive(LogLevel::Debug),
            "smsrelay=debug,smsrelay_core=debug"
        );
        assert!(filter_directive(LogLevel::Error).contains("smsrelay_core=error"));
    }

    #[test]
    fn test_logging_initialization() {
        // A second initialization reports an error instead of panicking
        let _ = init_logging(LogLevel::Info);
        assert!(init_logging(LogLevel::Info).is_err());
    }
}
