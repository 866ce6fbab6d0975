/// Severity of a run log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Level used when mirroring a run line to the `log` facade.
    pub fn as_log_level(&self) -> log::Level {
        match self {
            LogLevel::Info | LogLevel::Success => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error | LogLevel::Critical => log::Level::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single document ended up in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentOutcome {
    Processed,
    Skipped,
    Failed,
}

/// Events emitted by the traversal while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Log { level: LogLevel, message: String },
    Document(DocumentOutcome),
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);

    fn log(&self, level: LogLevel, message: &str) {
        self.report(ProgressEvent::Log {
            level,
            message: message.to_string(),
        });
    }

    fn outcome(&self, outcome: DocumentOutcome) {
        self.report(ProgressEvent::Document(outcome));
    }
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}
