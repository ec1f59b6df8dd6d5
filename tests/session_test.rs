mod helpers;

use detour::session::{Reply, SuggestParams};
use helpers::{test_session, FakeChat, FakeMemory};
use std::sync::Arc;
use std::time::Duration;

const GAP_MESSAGE: &str = "今のミュージアムが1時間半早く終わった。どこ行こう";
const ENOUGH_CAFES: &str = "カフェはもう十分かも。別のを提案して";

fn categories(reply: &Reply) -> Vec<String> {
    reply
        .suggestions()
        .map(|b| b.outcome.suggestions.iter().map(|s| s.category.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn gap_message_suggests_with_session_context() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));

    let reply = session.handle_message(GAP_MESSAGE).await.unwrap();
    let block = reply.suggestions().expect("suggestions");
    assert_eq!(block.params.anchor_id, "anchor_covent_garden");
    assert_eq!(block.params.free_time_min, 90);
    assert_eq!(block.outcome.suggestions.len(), 3);
    assert_eq!(session.last_request(), Some(block.params.clone()));
}

#[tokio::test]
async fn enough_cafes_forgets_and_resuggests_with_last_params() {
    let memory = Arc::new(FakeMemory::default());
    let session = test_session(memory.clone(), Arc::new(FakeChat::default()));

    let first = session.handle_message(GAP_MESSAGE).await.unwrap();
    assert!(categories(&first).contains(&"cafe".to_string()));

    let reply = session.handle_message(ENOUGH_CAFES).await.unwrap();
    let Reply::Forgot { forget, resuggest } = &reply else {
        panic!("expected Forgot, got {reply:?}");
    };
    assert!(forget.changed);
    assert_eq!(forget.affected_sources.len(), 5);
    assert_eq!(forget.catalog_size, 8);

    let block = resuggest.as_ref().expect("resuggestion");
    assert_eq!(Some(&block.params), first.suggestions().map(|b| &b.params));
    assert!(!block.outcome.suggestions.is_empty());
    assert!(categories(&reply).iter().all(|c| c != "cafe"));

    // Sources are hidden, not deleted.
    assert_eq!(session.list_sources(Some("cafe")).unwrap().len(), 5);

    session.mirror().drain(Duration::from_secs(1)).await;
    let writes = memory.writes();
    assert_eq!(writes.len(), 1);
    assert!(writes[0][1].content.contains("\"Cafe\" (cafe)"));
}

#[tokio::test]
async fn forgetting_again_reports_already_excluded() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));

    session.handle_message(ENOUGH_CAFES).await.unwrap();
    let reply = session.handle_message(ENOUGH_CAFES).await.unwrap();

    assert_eq!(
        reply,
        Reply::AlreadyExcluded {
            category: "cafe".into(),
            label: "Cafe".into()
        }
    );
    assert_eq!(session.exclusions().unwrap(), vec!["cafe"]);
}

#[tokio::test]
async fn resuggest_without_history_falls_back_to_gap_context() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));

    let reply = session.handle_message(ENOUGH_CAFES).await.unwrap();
    let block = reply.suggestions().expect("resuggestion");
    assert_eq!(block.params.free_time_min, 90);
    assert_eq!(block.params.anchor_id, "anchor_covent_garden");
}

#[tokio::test]
async fn generic_forget_does_not_resuggest() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));

    let reply = session.handle_message("please exclude the market").await.unwrap();
    let Reply::Forgot { forget, resuggest } = reply else {
        panic!("expected Forgot");
    };
    assert_eq!(forget.category, "market");
    assert!(forget.affected_sources.is_empty());
    assert!(resuggest.is_none());
}

#[tokio::test]
async fn explicit_time_and_anchor_are_used() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));

    let reply = session
        .handle_message("I have 45 min, suggest something near anchor_soho")
        .await
        .unwrap();
    let block = reply.suggestions().expect("suggestions");
    assert_eq!(block.params.anchor_id, "anchor_soho");
    assert_eq!(block.params.free_time_min, 45);
    for s in &block.outcome.suggestions {
        assert!(s.duration_min <= 45);
    }
}

#[tokio::test]
async fn chat_gets_filtered_catalog_exclusions_and_preferences() {
    let memory = Arc::new(FakeMemory::remembering(&["Prefers quiet places", "Vegetarian"]));
    let chat = Arc::new(FakeChat::default());
    let session = test_session(memory.clone(), chat.clone());

    session.forget_category("cafe").unwrap();
    let reply = session.handle_message("what should I pack?").await.unwrap();

    assert_eq!(
        reply,
        Reply::Chat {
            text: "Try the flower market.".into(),
            delivered: true
        }
    );

    let request = chat.last_request().expect("chat was called");
    assert_eq!(request.excluded_categories, vec!["cafe"]);
    assert_eq!(request.sources.len(), 3);
    assert!(request.sources.iter().all(|s| s.category != "cafe"));
    let prefs = request.preferences.expect("preferences");
    assert!(prefs.contains("Vegetarian"));
    assert_eq!(request.messages.last().unwrap().content, "what should I pack?");

    session.mirror().drain(Duration::from_secs(1)).await;
    let writes = memory.writes();
    assert!(writes
        .iter()
        .any(|w| w.iter().any(|r| r.content == "Try the flower market.")));
}

#[tokio::test]
async fn chat_failure_becomes_an_apology() {
    let memory = Arc::new(FakeMemory::default());
    let session = test_session(memory.clone(), Arc::new(FakeChat::failing()));

    let reply = session.handle_message("tell me about london").await.unwrap();
    let Reply::Chat { delivered, text } = reply else {
        panic!("expected Chat");
    };
    assert!(!delivered);
    assert!(!text.is_empty());

    session.mirror().drain(Duration::from_secs(1)).await;
    assert!(memory.writes().is_empty());
}

#[tokio::test]
async fn mirror_failure_never_reaches_the_caller() {
    let session = test_session(Arc::new(FakeMemory::failing()), Arc::new(FakeChat::default()));

    let outcome = session.forget_category("museum").unwrap();
    assert!(outcome.changed);
    session.mirror().drain(Duration::from_secs(1)).await;

    assert_eq!(session.exclusions().unwrap(), vec!["museum"]);
    let report = session.verify().await.unwrap();
    assert!(!report.reachable);
    assert_eq!(report.local, vec!["museum"]);
}

#[tokio::test]
async fn verify_confirms_a_remote_that_agrees() {
    let memory = Arc::new(FakeMemory::remembering(&["The user forgot the cafe category"]));
    let session = test_session(memory, Arc::new(FakeChat::default()));

    session.forget_category("cafe").unwrap();
    let report = session.verify().await.unwrap();
    assert!(report.in_sync());
    assert_eq!(report.confirmed, vec!["cafe"]);
}

#[tokio::test]
async fn verify_reports_a_stale_remote_without_touching_the_ledger() {
    let memory = Arc::new(FakeMemory::remembering(&["The user forgot the cafe category"]));
    let session = test_session(memory, Arc::new(FakeChat::default()));

    session.forget_category("cafe").unwrap();
    session.restore_category("cafe").unwrap();

    let report = session.verify().await.unwrap();
    assert!(report.reachable);
    assert!(!report.in_sync());
    assert_eq!(report.stale_remote, vec!["cafe"]);
    assert!(report.confirmed.is_empty());
    assert!(session.exclusions().unwrap().is_empty());

    let suggested = session
        .suggest(SuggestParams {
            anchor_id: "anchor_covent_garden".into(),
            free_time_min: 90,
            message: None,
        })
        .unwrap();
    assert!(suggested.suggestions.iter().any(|s| s.category == "cafe"));
}

#[tokio::test]
async fn restore_makes_the_category_suggestible_again() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));
    let params = SuggestParams {
        anchor_id: "anchor_covent_garden".into(),
        free_time_min: 90,
        message: None,
    };

    session.forget_category("cafe").unwrap();
    let hidden = session.suggest(params.clone()).unwrap();
    assert!(hidden.suggestions.iter().all(|s| s.category != "cafe"));

    let restored = session.restore_category("cafe").unwrap();
    assert!(restored.changed);
    let shown = session.suggest(params).unwrap();
    assert_eq!(shown.suggestions[0].category, "cafe");

    assert!(!session.restore_category("cafe").unwrap().changed);
}

#[tokio::test]
async fn reset_clears_session_state() {
    let session = test_session(Arc::new(FakeMemory::default()), Arc::new(FakeChat::default()));
    session.handle_message(ENOUGH_CAFES).await.unwrap();
    assert!(!session.transcript().is_empty());

    let outcome = session.reset(false).unwrap();
    assert_eq!(outcome.cleared_exclusions, 1);
    assert!(session.exclusions().unwrap().is_empty());
    assert!(session.last_request().is_none());
    assert!(session.transcript().is_empty());
    assert_eq!(session.list_sources(None).unwrap().len(), 8);

    let outcome = session.reset(true).unwrap();
    assert_eq!(outcome.cleared_sources, 8);
    assert!(session.list_sources(None).unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_forgets_and_suggests_are_consistent() {
    let session = Arc::new(test_session(
        Arc::new(FakeMemory::default()),
        Arc::new(FakeChat::default()),
    ));

    let mut tasks = Vec::new();
    for (i, category) in ["cafe", "museum", "park", "market"].into_iter().enumerate() {
        let s = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            s.forget_category(category).unwrap();
            let out = s
                .suggest(SuggestParams {
                    anchor_id: "anchor_covent_garden".into(),
                    free_time_min: 60 + i as u32,
                    message: None,
                })
                .unwrap();
            // This task's own forget is always visible to its next suggest.
            assert!(out.suggestions.iter().all(|x| x.category != category));
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    let mut excluded = session.exclusions().unwrap();
    excluded.sort();
    assert_eq!(excluded, vec!["cafe", "market", "museum", "park"]);
    assert_eq!(session.list_sources(None).unwrap().len(), 8);
}
