mod common;

use std::time::Duration;

use common::{Call, ScriptedGateway, deal};
use products_dealflow::{
    DealStage,
    search::{DebouncedSearch, SearchOutcome},
};

fn gateway() -> std::sync::Arc<ScriptedGateway> {
    ScriptedGateway::new(
        vec![
            deal(1, "TechFlow AI", DealStage::Incoming),
            deal(2, "FinanceBot", DealStage::Screening),
            deal(3, "FinTrack", DealStage::DueDiligence),
        ],
        vec![],
    )
}

async fn after(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn only_the_settled_keystroke_reaches_the_api() {
    let gateway = gateway();
    let search = DebouncedSearch::new(gateway.clone());

    let (first, second, third) = tokio::join!(
        search.query("t"),
        async {
            after(50).await;
            search.query("te").await
        },
        async {
            after(100).await;
            search.query("tech").await
        },
    );

    assert_eq!(first.unwrap(), SearchOutcome::Superseded);
    assert_eq!(second.unwrap(), SearchOutcome::Superseded);
    let SearchOutcome::Applied(hits) = third.unwrap() else {
        panic!("latest query should apply");
    };
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "TechFlow AI");
    assert_eq!(gateway.calls(), vec![Call::Search("tech".into())]);
}

#[tokio::test(start_paused = true)]
async fn slow_response_cannot_overwrite_newer_results() {
    let gateway = gateway();
    gateway.delay_search("fin", Duration::from_millis(500));
    let search = DebouncedSearch::new(gateway.clone());

    let (slow, fresh) = tokio::join!(search.query("fin"), async {
        after(300).await;
        search.query("finance").await
    });

    assert_eq!(slow.unwrap(), SearchOutcome::Stale);
    assert!(matches!(fresh.unwrap(), SearchOutcome::Applied(_)));
    let current = search.results().unwrap();
    assert_eq!(current.query, "finance");
    assert_eq!(current.hits.len(), 1);
    assert_eq!(current.hits[0].name, "FinanceBot");
    assert_eq!(gateway.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failures_leave_previous_results() {
    let gateway = gateway();
    let search = DebouncedSearch::new(gateway.clone());
    search.query("fin").await.unwrap();

    gateway.fail_on("search");
    assert!(search.query("tech").await.is_err());
    assert_eq!(search.results().unwrap().query, "fin");
}
