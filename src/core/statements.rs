//! # Statement pane
//!
//! Side list of documents retrieved for the latest message. The list is never
//! edited: whenever the newest message brings a fresh `retrieved_documents`
//! field, the whole list is replaced.

use log::debug;
use serde_json::Value;

use crate::task::Message;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Numbers and strings are both accepted; numbers are kept in their
    /// JSON text form.
    pub id: String,
    pub title: String,
    pub text: String,
    /// Relevance in `[0, 1]`.
    pub score: f64,
    pub source: Option<String>,
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_document(index: usize, value: &Value) -> Option<Document> {
    let Some(entry) = value.as_object() else {
        debug!("Skipping document {}: not an object", index);
        return None;
    };
    let id = entry.get("id").and_then(id_of);
    let title = entry.get("title").and_then(Value::as_str);
    let text = entry.get("text").and_then(Value::as_str);
    let score = entry.get("score").and_then(Value::as_f64);

    match (id, title, text, score) {
        (Some(id), Some(title), Some(text), Some(score)) => Some(Document {
            id,
            title: title.to_string(),
            text: text.to_string(),
            score: if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) },
            source: entry
                .get("source")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        _ => {
            debug!("Skipping document {}: missing id/title/text/score", index);
            None
        }
    }
}

/// Parse a `retrieved_documents` value. Bad entries are skipped one by one;
/// anything other than an array yields an empty list.
pub fn parse_documents(value: &Value) -> Vec<Document> {
    match value.as_array() {
        Some(entries) => entries
            .iter()
            .enumerate()
            .filter_map(|(i, v)| parse_document(i, v))
            .collect(),
        None => {
            debug!("retrieved_documents is not an array; showing nothing");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementPane {
    documents: Vec<Document>,
    /// Render key of the message the current list came from.
    source_key: Option<String>,
}

impl StatementPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Forget which message the list came from, so the next `sync` re-reads
    /// the latest message even if its render key is unchanged. Used when a
    /// message is replaced in place.
    pub fn invalidate(&mut self) {
        self.source_key = None;
    }

    /// Refresh from the latest message. Returns true if the list was replaced.
    pub fn sync(&mut self, messages: &[Message]) -> bool {
        let Some((index, latest)) = messages.iter().enumerate().last() else {
            return false;
        };
        let Some(raw) = latest.retrieved_documents() else {
            return false;
        };
        let key = latest.render_key(index);
        if self.source_key.as_deref() == Some(key.as_str()) {
            return false;
        }
        self.documents = parse_documents(raw);
        debug!(
            "Statement pane refreshed from {} ({} documents)",
            key,
            self.documents.len()
        );
        self.source_key = Some(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::RETRIEVED_DOCUMENTS_KEY;
    use serde_json::json;

    #[test]
    fn skips_entry_with_null_id() {
        let docs = parse_documents(&json!([
            {"id": 1, "title": "A", "text": "foo", "score": 0.5, "source": "http://x"},
            {"id": null, "title": "B", "text": "bar", "score": 0.9}
        ]));
        assert_eq!(docs.len(), 1);
        assert_eq!(
            docs[0],
            Document {
                id: "1".into(),
                title: "A".into(),
                text: "foo".into(),
                score: 0.5,
                source: Some("http://x".into()),
            }
        );
    }

    #[test]
    fn skips_each_missing_required_field() {
        let docs = parse_documents(&json!([
            {"title": "no id", "text": "t", "score": 0.1},
            {"id": "a", "text": "t", "score": 0.1},
            {"id": "b", "title": "no text", "score": 0.1},
            {"id": "c", "title": "no score", "text": "t"},
            "not an object",
            {"id": "d", "title": "ok", "text": "t", "score": 0.3}
        ]));
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d"]);
        assert_eq!(docs[0].source, None);
    }

    #[test]
    fn score_is_clamped() {
        let docs = parse_documents(&json!([
            {"id": 1, "title": "hi", "text": "t", "score": 4.2},
            {"id": 2, "title": "lo", "text": "t", "score": -1}
        ]));
        assert_eq!(docs[0].score, 1.0);
        assert_eq!(docs[1].score, 0.0);
    }

    #[test]
    fn non_array_is_empty() {
        assert!(parse_documents(&json!({"id": 1})).is_empty());
    }

    fn with_docs(update_id: u64, docs: Value) -> Message {
        Message::new("model", update_id, "answer").with_task_data(RETRIEVED_DOCUMENTS_KEY, docs)
    }

    #[test]
    fn sync_replaces_wholesale_from_latest_message() {
        let mut pane = StatementPane::new();
        let mut messages = vec![with_docs(
            1,
            json!([{"id": 1, "title": "A", "text": "a", "score": 0.2}]),
        )];
        assert!(pane.sync(&messages));
        assert_eq!(pane.documents().len(), 1);

        // Same latest message: no refresh.
        assert!(!pane.sync(&messages));

        // Latest message without the field keeps the old list.
        messages.push(Message::new("worker", 2, "thanks"));
        assert!(!pane.sync(&messages));
        assert_eq!(pane.documents()[0].title, "A");

        messages.push(with_docs(
            3,
            json!([
                {"id": 7, "title": "B", "text": "b", "score": 0.4},
                {"id": 8, "title": "C", "text": "c", "score": 0.6}
            ]),
        ));
        assert!(pane.sync(&messages));
        let titles: Vec<&str> = pane.documents().iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "C"]);
    }

    #[test]
    fn invalidate_rereads_message_with_same_key() {
        let docs = |title: &str| json!([{"id": 1, "title": title, "text": "t", "score": 0.5}]);
        let mut pane = StatementPane::new();
        let first = vec![Message::new("model", 4, "a").with_task_data(RETRIEVED_DOCUMENTS_KEY, docs("old"))];
        assert!(pane.sync(&first));

        let replaced = vec![Message::new("model", 4, "b").with_task_data(RETRIEVED_DOCUMENTS_KEY, docs("new"))];
        assert!(!pane.sync(&replaced));
        pane.invalidate();
        assert!(pane.sync(&replaced));
        assert_eq!(pane.documents()[0].title, "new");
    }

    #[test]
    fn sync_on_empty_stream_is_noop() {
        let mut pane = StatementPane::new();
        assert!(!pane.sync(&[]));
        assert!(pane.documents().is_empty());
    }
}
