use std::sync::Mutex;

/// Where user-facing outcomes of an action end up. Exactly one call per
/// completed action.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints successes to stdout and errors to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        println!("✔ {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("✘ {message}");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Keeps every notice in order. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.lock().push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lock().push(Notice::Error(message.to_string()));
    }
}
