#![forbid(unsafe_code)]

//! End-to-end history scenarios over tracked documents, including the
//! diagnostics the engine emits through `tracing`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::Instant;

use pagecraft_history::{Historian, HistoryConfig, ObjectRef, RecordingMode, TrackedObject, Value};

// ============================================================================
// Tracing capture
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_tracing(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn warnings(events: &[CapturedEvent]) -> Vec<&CapturedEvent> {
    events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN && e.target == "pagecraft.history")
        .collect()
}

fn page(historian: &Historian) -> TrackedObject {
    let root = ObjectRef::from_json(json!({
        "title": "Landing",
        "settings": {"theme": "light"},
        "sections": [{"kind": "hero"}, {"kind": "footer"}]
    }))
    .unwrap();
    TrackedObject::new(historian, root)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn editing_session_undo_redo() {
    let historian = Historian::default();
    let doc = page(&historian);
    let sections = doc.array("sections").unwrap();

    doc.set("title", "Pricing");
    doc.object("settings").unwrap().set("theme", "dark");
    sections.push(json!({"kind": "cta"}));
    sections.object(0).unwrap().set("kind", "banner");

    let edited = doc.to_json();
    for _ in 0..4 {
        assert!(historian.undo());
    }
    assert!(!historian.undo());
    assert_eq!(doc.get("title"), Some(Value::from("Landing")));
    assert_eq!(sections.len(), 2);

    for _ in 0..4 {
        assert!(historian.redo());
    }
    assert_eq!(doc.to_json(), edited);
}

#[test]
fn transaction_reorders_sections_atomically() {
    let historian = Historian::default();
    let doc = page(&historian);
    let sections = doc.array("sections").unwrap();

    historian.batch(|| {
        let footer = sections.pop().unwrap();
        sections.unshift(footer);
        doc.set("reordered", true);
    });
    assert_eq!(sections.get(0).unwrap().to_json(), json!({"kind": "footer"}));

    assert!(historian.undo());
    assert_eq!(
        doc.to_json(),
        json!({
            "title": "Landing",
            "settings": {"theme": "light"},
            "sections": [{"kind": "hero"}, {"kind": "footer"}]
        })
    );
    assert!(!historian.undo());
}

#[test]
fn moved_node_keeps_identity_through_undo() {
    let historian = Historian::default();
    let doc = page(&historian);
    let sections = doc.array("sections").unwrap();
    let hero = sections.get(0).unwrap();

    sections.shift();
    historian.undo();
    assert!(sections.get(0).unwrap().same_node(&hero));
}

#[test]
fn failed_publish_leaves_no_trace() {
    #[derive(Debug, PartialEq)]
    struct PublishError;

    let historian = Historian::default();
    let doc = page(&historian);

    let result = historian.transaction(|| {
        doc.set("published", true);
        doc.delete("settings");
        Err::<(), _>(PublishError)
    });

    assert_eq!(result, Err(PublishError));
    assert!(!doc.contains_key("published"));
    assert!(doc.contains_key("settings"));
    assert_eq!(historian.mode(), RecordingMode::Idle);
    assert!(!historian.can_undo());
}

#[test]
fn setup_off_the_record_then_edit() {
    let historian = Historian::default();
    let doc = page(&historian);

    historian.off_the_record(|| {
        doc.set("id", "page-1");
    });
    doc.set("title", "Edited");

    assert!(historian.undo());
    assert!(!historian.undo());
    assert_eq!(doc.get("id"), Some(Value::from("page-1")));
    assert_eq!(doc.get("title"), Some(Value::from("Landing")));
}

#[test]
fn epoch_groups_typing_burst() {
    let window = Duration::from_millis(300);
    let historian = Historian::new(HistoryConfig::new(50).with_epoch(window));
    let doc = page(&historian);

    for title in ["L", "La", "Lan", "Lang"] {
        doc.set("title", title);
    }
    assert!(historian.is_epoch_open());
    assert!(historian.poll_epoch_at(Instant::now() + window));

    doc.set("title", "Langing");
    assert!(historian.end_epoch());

    assert!(historian.undo());
    assert_eq!(doc.get("title"), Some(Value::from("Lang")));
    assert!(historian.undo());
    assert_eq!(doc.get("title"), Some(Value::from("Landing")));
}

#[test]
fn async_transaction_commits_as_one_step() {
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    let historian = Historian::default();
    let doc = page(&historian);

    let fut = historian.async_transaction(|| async {
        doc.set("title", "Async");
        doc.set("loaded", true);
        Ok::<_, ()>(doc.len())
    });
    let mut fut = pin!(fut);
    let mut cx = Context::from_waker(Waker::noop());
    let Poll::Ready(result) = fut.as_mut().poll(&mut cx) else {
        panic!("body never suspends");
    };
    assert_eq!(result, Ok(4));

    assert!(historian.undo());
    assert!(!doc.contains_key("loaded"));
    assert!(!historian.undo());
}

#[test]
fn refused_operations_warn() {
    let historian = Historian::default();
    let doc = page(&historian);

    let events = with_captured_tracing(|| {
        assert!(!doc.define_property("title", Value::Null));
        historian.begin_transaction();
        assert!(!historian.undo());
        historian.end_transaction().unwrap();
    });

    let warned = warnings(&events);
    assert_eq!(warned.len(), 2, "events: {events:?}");
    assert!(warned[0].fields.get("key").is_some_and(|k| k == "title"));
    assert!(
        warned[1]
            .fields
            .get("message")
            .is_some_and(|m| m.contains("undo refused"))
    );
}

#[test]
fn commits_are_logged_at_debug() {
    let historian = Historian::default();
    let doc = page(&historian);

    let events = with_captured_tracing(|| {
        historian.batch(|| {
            doc.set("a", 1);
            doc.set("b", 2);
        });
    });

    let commit = events
        .iter()
        .find(|e| e.fields.get("message").is_some_and(|m| m == "commit"))
        .expect("commit event");
    assert_eq!(commit.level, tracing::Level::DEBUG);
    assert_eq!(commit.fields.get("kind").map(String::as_str), Some("transaction"));
    assert_eq!(commit.fields.get("leaves").map(String::as_str), Some("2"));
}
