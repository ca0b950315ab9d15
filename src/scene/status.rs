/// Status/message surface consumed by the engines
///
/// Short transient messages go to the status bar; warnings, errors and
/// yes/no questions are blocking prompts.

use crate::error::ViewerError;

pub trait StatusSink {
    fn show_message(&mut self, text: &str, timeout_ms: u64);
    fn warn(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn confirm(&mut self, question: &str) -> bool;

    /// Report a recoverable failure at an operation boundary
    fn report(&mut self, err: &ViewerError) {
        let text = err.to_string();
        if err.is_warning() {
            log::warn!("{}", text);
            self.warn(&text);
        } else {
            log::error!("{}", text);
            self.error(&text);
        }
        self.show_message(&text, 5000);
    }
}

/// Test double that records everything and answers confirmations
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub questions: Vec<String>,
    pub answer: bool,
}

#[cfg(test)]
impl RecordingStatus {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|s| s.as_str())
    }
}

#[cfg(test)]
impl StatusSink for RecordingStatus {
    fn show_message(&mut self, text: &str, _timeout_ms: u64) {
        self.messages.push(text.to_string());
    }

    fn warn(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.errors.push(text.to_string());
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answer
    }
}
