//! End-to-end replay tests: events in, result lines out, state checked
//! through the service.

use std::sync::Arc;

use activity_feed::{Dependencies, FeedConfig, LogFormat, ReplaySummary, Replayer};
use activity_repository::{
    ActivityReader, ActivityService, ActivityServiceConfig, InMemoryChainStore,
};
use serde_json::Value;

fn config() -> FeedConfig {
    FeedConfig {
        events_path: None,
        log_format: LogFormat::Pretty,
        service: ActivityServiceConfig::default(),
    }
}

async fn run(replayer: &Replayer, input: &str) -> (ReplaySummary, Vec<Value>) {
    let mut output = Vec::new();
    let summary = replayer
        .run(input.as_bytes(), &mut output)
        .await
        .expect("replay should succeed");
    let lines = String::from_utf8(output)
        .expect("output should be utf-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each output line is JSON"))
        .collect();
    (summary, lines)
}

const SCENARIO: &str = r#"
# three publishers
{"op":"publish","entity_id":"A","timestamp":"2024-01-01T00:00:01Z"}
{"op":"publish","entity_id":"B","timestamp":"2024-01-01T00:00:02Z"}
{"op":"publish","entity_id":"C","timestamp":"2024-01-01T00:00:03Z"}
{"op":"follow","user_id":"U","entity_id":"A"}
{"op":"follow","user_id":"U","entity_id":"C"}
{"op":"follow","user_id":"U","entity_id":"B"}
{"op":"publish","entity_id":"A","timestamp":"2024-01-01T00:00:04Z"}
{"op":"read_feed","user_id":"U","count":10}
{"op":"read_stream","entity_id":"A","start_index":1,"count":5}
"#;

#[tokio::test]
async fn test_scenario_produces_recency_ordered_feed() {
    let deps = Dependencies::new(&config());

    let (summary, lines) = run(&deps.replayer, SCENARIO).await;

    assert_eq!(
        summary,
        ReplaySummary {
            applied: 7,
            rejected: 0,
            reads: 2,
        }
    );
    assert_eq!(lines.len(), 9);

    // C then B were inserted ahead of A
    let positions: Vec<&Value> = lines[3..6].iter().map(|l| &l["position"]).collect();
    assert_eq!(positions, vec![&Value::from(0), &Value::from(0), &Value::from(1)]);

    let republish = &lines[6];
    assert_eq!(republish["status"], "published");
    assert_eq!(republish["followers"], 1);
    assert_eq!(republish["moved"], 1);

    let feed = &lines[7];
    assert_eq!(feed["status"], "feed");
    let entities: Vec<&str> = feed["items"]
        .as_array()
        .expect("feed items")
        .iter()
        .map(|item| item["entity_id"].as_str().expect("entity id"))
        .collect();
    assert_eq!(entities, vec!["A", "C", "B", "A"]);

    let stream = &lines[8];
    assert_eq!(stream["status"], "stream");
    let items = stream["items"].as_array().expect("stream items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["timestamp"], "2024-01-01T00:00:01Z");

    let order = deps
        .service
        .read_feed_entities("U")
        .await
        .expect("feed entities");
    assert_eq!(order, vec!["A", "C", "B"]);

    let stats = deps.store.stats().await;
    assert_eq!(stats.entity_count, 4);
    assert_eq!(stats.stream_item_count, 4);
    assert_eq!(stats.follow_count, 3);
}

#[tokio::test]
async fn test_rejected_event_does_not_stop_replay() {
    let store = Arc::new(InMemoryChainStore::new());
    let service = Arc::new(ActivityService::with_config(
        store,
        ActivityServiceConfig::unlimited(),
    ));
    let replayer = Replayer::new(service.clone(), service);

    let input = concat!(
        "{\"op\":\"publish\",\"entity_id\":\"\",\"timestamp\":\"2024-01-01T00:00:00Z\"}\n",
        "{\"op\":\"publish\",\"entity_id\":\"A\",\"timestamp\":\"2024-01-01T00:00:00Z\"}\n",
        "{\"op\":\"read_stream\",\"entity_id\":\"A\",\"count\":100000}\n",
    );

    let (summary, lines) = run(&replayer, input).await;

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.reads, 1);
    assert_eq!(lines[0]["status"], "rejected");
    assert_eq!(lines[2]["items"].as_array().map(Vec::len), Some(1));
}
