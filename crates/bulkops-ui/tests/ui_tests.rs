use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bulkops_engine::{BulkConfig, BulkOperation};
use bulkops_ui::{
    ActionBarError, ActionRequest, BulkAction, BulkActionBar, Confirmation, HandlerOutput,
    ProgressView,
};

#[derive(Debug, Clone)]
struct Member {
    id: u32,
    email: String,
}

fn members() -> Vec<Member> {
    (1..=4)
        .map(|id| Member {
            id,
            email: format!("member{id}@example.com"),
        })
        .collect()
}

fn engine(flaky: Arc<AtomicBool>) -> Arc<BulkOperation<Member>> {
    let engine = BulkOperation::new(
        members(),
        |m: &Member| m.id.to_string(),
        |m: &Member| m.email.clone(),
        move |m: Member| {
            let fail = m.id == 2 && flaky.load(Ordering::SeqCst);
            async move {
                if fail {
                    Err("mailbox unavailable".to_string())
                } else {
                    Ok(())
                }
            }
        },
        BulkConfig::builder()
            .batch_size(2usize)
            .delay_between_batches_ms(0u64)
            .build()
            .unwrap(),
    )
    .unwrap();
    Arc::new(engine)
}

#[tokio::test]
async fn test_action_bar_drives_engine_and_view() {
    let flaky = Arc::new(AtomicBool::new(true));
    let engine = engine(flaky.clone());

    let mut bar = BulkActionBar::new(vec![
        BulkAction::new("invite", "Send invite").with_confirmation(Confirmation::new(
            "Send invites?",
            "Every selected member gets an email.",
        )),
    ]);
    bar.set_selected_count(4);

    assert!(matches!(bar.request("invite"), Ok(ActionRequest::Confirm(_))));
    let id = bar.confirm().unwrap();

    let runner = engine.clone();
    let outcome = bar
        .run(&id, move || {
            HandlerOutput::pending(async move {
                let result = runner.execute().await.map_err(|e| e.to_string())?;
                if result.failed > 0 {
                    return Err(result.summary());
                }
                Ok(())
            })
        })
        .await;

    assert_eq!(
        outcome,
        Err(ActionBarError::Failed {
            id: "invite".into(),
            message: "3 succeeded, 1 failed".into(),
        })
    );
    assert!(bar.loading().is_none());

    let snapshot = engine.snapshot();
    let view = ProgressView::new(&snapshot.items, snapshot.is_running)
        .with_cancelled(snapshot.is_cancelled);
    assert!(!view.can_cancel());
    assert_eq!(view.counts().error, 1);
    assert_eq!(view.retry_request(), Some(vec!["2".to_string()]));

    flaky.store(false, Ordering::SeqCst);
    let retried = engine.retry_failed().await.unwrap();
    assert!(retried.is_success());

    let snapshot = engine.snapshot();
    let view = ProgressView::new(&snapshot.items, snapshot.is_running);
    assert_eq!(view.percentage(), 100.0);
    assert!(view.retry_request().is_none());
}

#[tokio::test]
async fn test_sync_handler_clears_loading() {
    let mut bar = BulkActionBar::new(vec![BulkAction::new("archive", "Archive")]);
    bar.set_selected_count(1);

    assert_eq!(bar.request("archive"), Ok(ActionRequest::Run));
    bar.run("archive", || HandlerOutput::from(())).await.unwrap();
    assert!(bar.is_enabled());

    let err = bar
        .run("archive", || HandlerOutput::from(Err("offline".to_string())))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("offline"));
    assert!(bar.loading().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handler_clears_loading() {
    let mut bar = BulkActionBar::new(vec![BulkAction::new("export", "Export")]);
    bar.set_selected_count(2);

    let run = bar.run("export", || {
        HandlerOutput::pending(futures::future::pending::<Result<(), String>>())
    });
    let dropped = tokio::time::timeout(Duration::from_millis(10), run).await;

    assert!(dropped.is_err());
    assert!(bar.loading().is_none());
    assert!(bar.is_enabled());
}
