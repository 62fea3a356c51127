//! Explicit logging configuration.
//!
//! Libraries only emit `tracing` events. Front ends build a subscriber from a
//! [`LogConfig`] they own; nothing in this workspace mutates process-wide
//! logging state on its own.

/// How much a single solve reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet,
    /// One summary line per solve.
    #[default]
    Summary,
    /// A line per solver iteration as well.
    Iterations,
}

impl Verbosity {
    pub fn summary(self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    pub fn iterations(self) -> bool {
        matches!(self, Verbosity::Iterations)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Logging configuration owned by an entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LogConfig {
    pub level: LogLevel,
    pub verbosity: Verbosity,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            verbosity: Verbosity::Summary,
        }
    }
}

impl LogConfig {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`.
    ///
    /// Iteration-level verbosity needs debug events from the solver crate even
    /// when the global level is lower.
    pub fn filter_directive(&self) -> String {
        let mut directive = self.level.as_str().to_string();
        if self.verbosity.iterations() && self.level < LogLevel::Debug {
            directive.push_str(",wo_solver=debug");
        } else if self.verbosity.summary() && self.level < LogLevel::Info {
            directive.push_str(",wo_solver=info");
        }
        directive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_enables_solver_summaries() {
        let cfg = LogConfig::default();
        assert_eq!(cfg.filter_directive(), "warn,wo_solver=info");
    }

    #[test]
    fn iterations_enable_solver_debug() {
        let cfg = LogConfig {
            level: LogLevel::Info,
            verbosity: Verbosity::Iterations,
        };
        assert_eq!(cfg.filter_directive(), "info,wo_solver=debug");
    }

    #[test]
    fn quiet_keeps_global_level() {
        let cfg = LogConfig {
            level: LogLevel::Error,
            verbosity: Verbosity::Quiet,
        };
        assert_eq!(cfg.filter_directive(), "error");
        assert!(!Verbosity::Quiet.summary());
    }
}
