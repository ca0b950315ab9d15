/// Status bar: transient messages plus blocking prompts via native dialogs

use std::time::{Duration, Instant};

use crate::scene::status::StatusSink;

#[derive(Debug, Default)]
pub struct StatusBar {
    message: Option<(String, Instant)>,
    /// Suppress native dialogs (confirmations answer no)
    pub headless: bool,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current message, or None once it expired
    pub fn current(&mut self) -> Option<&str> {
        if let Some((_, until)) = &self.message {
            if Instant::now() >= *until {
                self.message = None;
            }
        }
        self.message.as_ref().map(|(text, _)| text.as_str())
    }

    fn dialog(&self, level: rfd::MessageLevel, title: &str, text: &str) {
        if self.headless {
            return;
        }
        rfd::MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(text)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

impl StatusSink for StatusBar {
    fn show_message(&mut self, text: &str, timeout_ms: u64) {
        self.message = Some((
            text.to_string(),
            Instant::now() + Duration::from_millis(timeout_ms),
        ));
    }

    fn warn(&mut self, text: &str) {
        self.dialog(rfd::MessageLevel::Warning, "Warning", text);
    }

    fn error(&mut self, text: &str) {
        self.dialog(rfd::MessageLevel::Error, "Error", text);
    }

    fn confirm(&mut self, question: &str) -> bool {
        if self.headless {
            return false;
        }
        let answer = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title("TIF Viewer")
            .set_description(question)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        answer == rfd::MessageDialogResult::Yes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_expires() {
        let mut bar = StatusBar::new();
        bar.show_message("Opened scan.tif", 60_000);
        assert_eq!(bar.current(), Some("Opened scan.tif"));
        bar.show_message("gone", 0);
        assert_eq!(bar.current(), None);
    }

    #[test]
    fn test_headless_confirm_declines() {
        let mut bar = StatusBar {
            headless: true,
            ..Default::default()
        };
        assert!(!bar.confirm("Create log-transfer layer?"));
        bar.warn("nothing shown");
    }
}
