mod types;

pub use types::*;

use tracing::debug;

/// Append-only conversation log for one session. Entries are never removed
/// or edited; order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TranscriptEntry) {
        debug!(
            "Appending {} entry #{} ({} chars)",
            entry.role,
            self.entries.len() + 1,
            entry.content.len()
        );
        self.entries.push(entry);
    }

    pub fn list(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.append(TranscriptEntry::user("First message".to_string()));
        transcript.append(TranscriptEntry::assistant("Second message".to_string()));
        transcript.append(TranscriptEntry::user("Third message".to_string()));

        let contents: Vec<&str> = transcript.list().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["First message", "Second message", "Third message"]);
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.list().last().unwrap().role, Role::User);
    }

    #[test]
    fn test_entry_helpers() {
        let user = TranscriptEntry::user("User input".to_string());
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "User input");

        let assistant = TranscriptEntry::assistant("Assistant response".to_string());
        assert_eq!(assistant.role, Role::Assistant);
    }

    #[test]
    fn test_entry_timestamps() {
        let before = Utc::now();
        let entry = TranscriptEntry::user("content".to_string());
        let after = Utc::now();

        assert!(entry.created_at >= before && entry.created_at <= after);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let entry = TranscriptEntry::assistant("Hi".to_string());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Hi");
    }

    #[test]
    fn test_large_content() {
        let mut transcript = Transcript::new();
        let large_content = "x".repeat(10000);
        transcript.append(TranscriptEntry::assistant(large_content.clone()));
        assert_eq!(transcript.list()[0].content, large_content);
    }
}
