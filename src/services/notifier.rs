//! Notification sink: the seam to whatever surfaces transient messages to
//! the user (toasts, status bar, terminal).

use serde::Serialize;

use crate::models::transfer::BatchKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Aggregate counts attached to the end-of-batch notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub kind: BatchKind,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub canceled_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::plain(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::plain(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::plain(NotificationLevel::Error, message)
    }

    fn plain(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            summary: None,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Useful for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => log::error!("{}", notification.message),
            NotificationLevel::Info | NotificationLevel::Success => {
                log::info!("{}", notification.message)
            }
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub seen: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<BatchSummary> {
        self.all().into_iter().filter_map(|n| n.summary).collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_level() {
        assert_eq!(Notification::info("x").level, NotificationLevel::Info);
        assert_eq!(Notification::success("x").level, NotificationLevel::Success);
        assert_eq!(Notification::error("x").level, NotificationLevel::Error);
        assert!(Notification::error("x").summary.is_none());
    }

    #[test]
    fn test_notification_serde_skips_empty_summary() {
        let json = serde_json::to_string(&Notification::info("hello")).unwrap();
        assert!(json.contains("\"level\":\"info\""));
        assert!(!json.contains("summary"));
    }

    #[test]
    fn test_summary_serde_camel_case() {
        let n = Notification {
            level: NotificationLevel::Success,
            message: "Deleted 2 of 3 files".into(),
            summary: Some(BatchSummary {
                kind: BatchKind::Delete,
                succeeded_count: 2,
                failed_count: 1,
                canceled_count: 0,
                total_count: 3,
            }),
        };
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"succeededCount\":2"));
        assert!(json.contains("\"totalCount\":3"));
        assert!(json.contains("\"kind\":\"delete\""));
    }

    #[test]
    fn test_recording_notifier_collects_in_order() {
        let rec = RecordingNotifier::default();
        rec.notify(Notification::info("a"));
        rec.notify(Notification::error("b"));
        let msgs: Vec<String> = rec.all().into_iter().map(|n| n.message).collect();
        assert_eq!(msgs, vec!["a", "b"]);
    }
}
