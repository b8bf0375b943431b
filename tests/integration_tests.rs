//! End-to-end tests: discovery, sync, and resumption across runs

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use tapflow::catalog::Catalog;
use tapflow::context::RunContext;
use tapflow::messages::{Message, VecSink};
use tapflow::state::State;
use tapflow::sync::{Stream, Tap};
use tapflow::{Result, TapConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(base_url: &str) -> TapConfig {
    TapConfig::from_json(&format!(
        r#"{{
            "start_date": "2021-01-01",
            "base_url": "{base_url}",
            "streams": [
                {{
                    "stream_id": "contacts",
                    "path": "/v1/contacts",
                    "key_properties": ["id"],
                    "replication_key": "updated_at",
                    "page_size": 2
                }}
            ]
        }}"#
    ))
    .unwrap()
}

fn selected_catalog(tap: &Tap) -> Catalog {
    let mut catalog = tap.discover();
    for entry in &mut catalog.streams {
        entry.selected = true;
    }
    catalog
}

/// Pull the state document out of the last STATE message a run emitted
fn final_state(sink: &VecSink) -> State {
    match sink.states().last() {
        Some(Message::State { value }) => value.clone(),
        _ => panic!("run emitted no STATE message"),
    }
}

#[tokio::test]
async fn test_full_run_then_resume() {
    let server = MockServer::start().await;

    // First run: two pages of records.
    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "updated_at": "2021-01-05T00:00:00Z" },
            { "id": 2, "updated_at": "2021-02-03T10:00:00Z" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "updated_at": "2021-01-20T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let tap = Tap::from_config(&config);
    let catalog = selected_catalog(&tap);

    let sink = VecSink::new();
    let mut ctx =
        RunContext::with_sink(config.clone(), State::new(), Box::new(sink.clone())).unwrap();
    ctx.set_catalog(catalog.clone());

    let stats = tap.sync(&mut ctx).await.unwrap();
    assert_eq!(stats.records_synced, 3);
    assert_eq!(sink.records().len(), 3);

    let carried = final_state(&sink);
    assert_eq!(
        carried.get_bookmark("contacts", "updated_at"),
        Some(&json!("2021-02-03T10:00:00+00:00"))
    );
    assert!(carried.get_offset("contacts", "page").is_none());

    // Second run, re-ingesting the emitted state: nothing new upstream.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .and(query_param("updated_since", "2021-02-03T10:00:00+00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let sink2 = VecSink::new();
    let mut ctx2 = RunContext::with_sink(config, carried, Box::new(sink2.clone())).unwrap();
    ctx2.set_catalog(catalog);

    let stats2 = tap.sync(&mut ctx2).await.unwrap();
    assert_eq!(stats2.records_synced, 0);

    // The high-water mark held steady: no records, no regression.
    let after = final_state(&sink2);
    assert_eq!(
        after.get_bookmark("contacts", "updated_at"),
        Some(&json!("2021-02-03T10:00:00+00:00"))
    );
}

#[tokio::test]
async fn test_interrupted_page_walk_resumes() {
    let server = MockServer::start().await;

    // The state says page 1 was already flushed before the crash;
    // serving only page 2 proves the walk resumes rather than restarts.
    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "updated_at": "2021-01-20T00:00:00Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = State::new();
    state.set_bookmark("contacts", "updated_at", "2021-01-01");
    state.set_offset("contacts", "page", 2);

    let config = config_for(&server.uri());
    let tap = Tap::from_config(&config);
    let sink = VecSink::new();
    let mut ctx = RunContext::with_sink(config, state, Box::new(sink.clone())).unwrap();
    ctx.set_catalog(selected_catalog(&tap));

    let stats = tap.sync(&mut ctx).await.unwrap();
    assert_eq!(stats.records_synced, 1);

    let after = final_state(&sink);
    assert!(after.get_offset("contacts", "page").is_none());
    assert_eq!(
        after.get_bookmark("contacts", "updated_at"),
        Some(&json!("2021-01-20T00:00:00+00:00"))
    );
}

// ============================================================================
// Custom streams sharing data through the cache
// ============================================================================

struct SeedStream;

#[async_trait]
impl Stream for SeedStream {
    fn stream_id(&self) -> &str {
        "accounts"
    }

    fn schema(&self) -> serde_json::Value {
        json!({ "type": "object" })
    }

    fn key_properties(&self) -> Vec<String> {
        vec!["id".to_string()]
    }

    fn automatic(&self) -> bool {
        true
    }

    async fn sync(&self, ctx: &mut RunContext) -> Result<usize> {
        ctx.cache
            .insert("account_ids".to_string(), json!(["a-1", "a-2"]));
        ctx.write_record("accounts", json!({ "id": "a-1" }))?;
        ctx.write_record("accounts", json!({ "id": "a-2" }))?;
        Ok(2)
    }
}

struct DependentStream;

#[async_trait]
impl Stream for DependentStream {
    fn stream_id(&self) -> &str {
        "account_notes"
    }

    fn schema(&self) -> serde_json::Value {
        json!({ "type": "object" })
    }

    fn key_properties(&self) -> Vec<String> {
        vec!["account_id".to_string()]
    }

    async fn sync(&self, ctx: &mut RunContext) -> Result<usize> {
        let ids: Vec<String> = ctx
            .cache
            .get("account_ids")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let mut emitted = 0;
        for id in ids {
            ctx.write_record("account_notes", json!({ "account_id": id }))?;
            emitted += 1;
        }
        Ok(emitted)
    }
}

#[tokio::test]
async fn test_streams_share_fetched_data_through_cache() {
    let tap = Tap::new(vec![Box::new(SeedStream), Box::new(DependentStream)]);
    let mut catalog = tap.discover();
    for entry in &mut catalog.streams {
        entry.selected = true;
    }

    let config = TapConfig::from_json(r#"{ "start_date": "2021-01-01" }"#).unwrap();
    let sink = VecSink::new();
    let mut ctx = RunContext::with_sink(config, State::new(), Box::new(sink.clone())).unwrap();
    ctx.set_catalog(catalog);

    let stats = tap.sync(&mut ctx).await.unwrap();
    assert_eq!(stats.streams_synced, 2);
    assert_eq!(stats.records_synced, 4);

    // The dependent stream saw exactly what the seed stream cached.
    let notes: Vec<_> = sink
        .records()
        .into_iter()
        .filter(|m| matches!(m, Message::Record { stream, .. } if stream == "account_notes"))
        .collect();
    assert_eq!(notes.len(), 2);
}

#[tokio::test]
async fn test_catalog_file_roundtrip_drives_selection() {
    let config = TapConfig::from_json(
        r#"{
            "start_date": "2021-01-01",
            "streams": [
                { "stream_id": "contacts", "path": "/v1/contacts" },
                { "stream_id": "events", "path": "/v1/events" }
            ]
        }"#,
    )
    .unwrap();
    let tap = Tap::from_config(&config);

    // Discover, select one stream, write the catalog out, read it back.
    let mut catalog = tap.discover();
    catalog
        .streams
        .iter_mut()
        .find(|e| e.stream_id == "contacts")
        .unwrap()
        .selected = true;

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_string_pretty(&catalog).unwrap()).unwrap();
    let reloaded = Catalog::from_file(file.path()).unwrap();

    let sink = VecSink::new();
    let mut ctx = RunContext::with_sink(config, State::new(), Box::new(sink)).unwrap();
    ctx.set_catalog(reloaded);

    assert!(ctx.is_selected("contacts"));
    assert!(!ctx.is_selected("events"));
}
