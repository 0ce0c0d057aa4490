/// Resource behaviour against the in-memory store

use std::sync::Arc;
use std::time::Duration;

use plannr_shared::models::competitor::UpdateCompetitor;
use plannr_shared::models::credits::{CreditPeriod, MAX_MONTHLY_CREDITS};
use plannr_shared::models::profile::UpdateProfile;
use plannr_shared::models::task::TaskStatus;
use plannr_shared::resources::competitors::{CompetitorsResource, NewCompetitor};
use plannr_shared::resources::credits::{CreditsPoller, CreditsResource};
use plannr_shared::resources::profile::{LinkOp, ProfileResource};
use plannr_shared::resources::tasks::{NewTask, TasksResource};
use plannr_shared::resources::NotificationLevel;
use plannr_shared::store::{FailPoint, MemoryStore};
use plannr_shared::tier::{AccessTier, PlannerView};
use uuid::Uuid;

fn setup() -> (Arc<MemoryStore>, Uuid) {
    (Arc::new(MemoryStore::new()), Uuid::new_v4())
}

#[tokio::test]
async fn resources_without_user_never_touch_the_store() {
    let (store, _) = setup();

    let tasks = TasksResource::load(store.clone(), None).await;
    let profile = ProfileResource::load(store.clone(), None).await;
    let competitors = CompetitorsResource::load(store.clone(), None).await;
    let credits = CreditsResource::load(store.clone(), None).await;

    assert!(!tasks.state().loading);
    assert!(tasks.state().data.is_empty());
    assert!(!profile.state().loading);
    assert!(profile.state().data.is_none());
    assert!(!competitors.state().loading);
    assert!(competitors.state().data.is_empty());
    assert!(!credits.state().loading);
    assert_eq!(credits.state().error, None);

    // Mutators refuse without a user as well
    assert!(tasks.create(NewTask::default()).await.error.is_some());
    assert!(credits.consume(1).await.error.is_some());

    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn resource_with_user_starts_loading_and_settles() {
    let (store, user_id) = setup();

    let tasks = TasksResource::new(store.clone(), Some(user_id));
    assert!(tasks.state().loading);

    let state = tasks.refresh().await;
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(store.call_count(), 1);
}

#[tokio::test]
async fn missing_credits_row_reads_as_zero_usage() {
    let (store, user_id) = setup();

    let credits = CreditsResource::load(store, Some(user_id)).await;
    let state = credits.state();

    assert_eq!(state.error, None);
    assert_eq!(state.data.credits_used, 0);
    assert_eq!(state.data.credits_remaining, 500);
    assert_eq!(state.data.max_credits, MAX_MONTHLY_CREDITS);
    assert_eq!(state.data.reset_at, CreditPeriod::current().reset_at());
}

#[tokio::test]
async fn failed_credits_read_falls_back_to_zero_and_reports() {
    let (store, user_id) = setup();
    store.seed_credits(user_id, CreditPeriod::current(), 320);
    store.fail(FailPoint::CreditsRead);

    let credits = CreditsResource::load(store.clone(), Some(user_id)).await;
    let state = credits.state();

    assert!(state.error.is_some());
    assert!(!state.loading);
    assert_eq!(state.data.credits_used, 0);
    assert_eq!(state.data.credits_remaining, 500);

    store.clear_faults();
    let state = credits.refresh().await;
    assert_eq!(state.error, None);
    assert_eq!(state.data.credits_used, 320);
    assert_eq!(state.data.credits_remaining, 180);
}

#[tokio::test]
async fn credits_remaining_plus_used_is_always_max() {
    let (store, user_id) = setup();
    let credits = CreditsResource::load(store, Some(user_id)).await;

    for amount in [1, 49, 200, 250] {
        let outcome = credits.consume(amount).await;
        let snapshot = outcome.data.expect("spend within allowance");
        assert_eq!(snapshot.credits_used + snapshot.credits_remaining, 500);
    }

    let refused = credits.consume(1).await;
    assert!(refused.data.is_none());
    assert!(refused.error.is_some());

    let state = credits.refresh().await;
    assert_eq!(state.data.credits_used, 500);
    assert_eq!(state.data.credits_remaining, 0);
}

#[tokio::test]
async fn social_link_save_is_non_atomic_with_one_notification_per_failure() {
    let (store, user_id) = setup();
    store.seed_profile(user_id, None);
    let first = store.seed_social_link(user_id, "https://first.example/");
    let second = store.seed_social_link(user_id, "https://second.example/");
    let kept = store.seed_social_link(user_id, "https://kept.example/");

    // The second removal fails
    store.fail(FailPoint::RemoveSocialLink(second.id));

    let profile = ProfileResource::load(store.clone(), Some(user_id)).await;
    let report = profile
        .save_social_links(&[
            "https://kept.example/".to_string(),
            "https://added.example/".to_string(),
        ])
        .await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(&report.results[0].op, LinkOp::Remove { id, .. } if *id == first.id));
    assert!(matches!(&report.results[1].op, LinkOp::Remove { id, .. } if *id == second.id));
    assert!(report.results[1].error.is_some());
    assert!(matches!(&report.results[2].op, LinkOp::Add { url } if url == "https://added.example/"));

    assert_eq!(report.notifications.len(), 1);
    assert_eq!(report.notifications[0].level, NotificationLevel::Error);

    let urls: Vec<String> = store
        .social_links(user_id)
        .into_iter()
        .map(|link| link.url)
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://second.example/".to_string(),
            kept.url,
            "https://added.example/".to_string()
        ]
    );

    // Local state mirrors what actually happened
    let links = profile.state().data.unwrap().social_links;
    assert_eq!(links.len(), 3);
}

#[tokio::test]
async fn social_link_save_reports_invalid_urls() {
    let (store, user_id) = setup();
    let profile = ProfileResource::load(store, Some(user_id)).await;

    let report = profile
        .save_social_links(&["javascript:alert(1)".to_string(), "https://ok.example".to_string()])
        .await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 1);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn profile_is_created_on_first_fetch_and_updates() {
    let (store, user_id) = setup();

    let profile = ProfileResource::load(store.clone(), Some(user_id)).await;
    let data = profile.state().data.expect("profile created");
    assert_eq!(data.profile.id, user_id);
    assert_eq!(profile.access_tier().unwrap(), AccessTier::None);

    let outcome = profile
        .update_settings(UpdateProfile {
            display_name: Some("Grace".to_string()),
            default_view: Some(PlannerView::Calendar),
            ..Default::default()
        })
        .await;
    assert!(outcome.is_ok());

    let data = profile.state().data.unwrap();
    assert_eq!(data.profile.display_name.as_deref(), Some("Grace"));
    assert_eq!(data.profile.default_view, PlannerView::Calendar);
}

#[tokio::test]
async fn task_mutators_update_local_state() {
    let (store, user_id) = setup();
    let tasks = TasksResource::load(store.clone(), Some(user_id)).await;

    let created = tasks
        .create(NewTask {
            title: "  Webinar promo  ".to_string(),
            ..Default::default()
        })
        .await
        .into_result()
        .unwrap();
    assert_eq!(created.title, "Webinar promo");
    assert_eq!(created.stage, NewTask::DEFAULT_STAGE);
    assert_eq!(created.status, TaskStatus::Idea);
    assert_eq!(tasks.planner_tasks().len(), 1);

    let toggled = tasks.toggle_case_study(created.id).await.into_result().unwrap();
    assert!(toggled.is_case_study);
    assert!(tasks.planner_tasks().is_empty());
    assert_eq!(tasks.case_studies().len(), 1);

    assert!(tasks.delete(created.id).await.is_ok());
    assert!(tasks.state().data.is_empty());
    assert!(tasks.delete(created.id).await.error.is_some());
}

#[tokio::test]
async fn task_write_failure_is_an_outcome_not_a_panic() {
    let (store, user_id) = setup();
    store.fail(FailPoint::TasksWrite);
    let tasks = TasksResource::load(store, Some(user_id)).await;

    let outcome = tasks
        .create(NewTask {
            title: "Draft".to_string(),
            ..Default::default()
        })
        .await;
    assert!(outcome.data.is_none());
    assert!(outcome.error.unwrap().contains("Failed to create task"));
}

#[tokio::test]
async fn competitors_add_update_remove() {
    let (store, user_id) = setup();
    let competitors = CompetitorsResource::load(store, Some(user_id)).await;

    assert!(competitors
        .add(NewCompetitor {
            name: "Acme".to_string(),
            feed_url: "not a url".to_string(),
            platform: None,
        })
        .await
        .error
        .is_some());

    let acme = competitors
        .add(NewCompetitor {
            name: "Acme".to_string(),
            feed_url: "https://acme.example/feed".to_string(),
            platform: Some("blog".to_string()),
        })
        .await
        .into_result()
        .unwrap();

    let renamed = competitors
        .update(
            acme.id,
            UpdateCompetitor {
                name: Some("Acme Corp".to_string()),
                ..Default::default()
            },
        )
        .await
        .into_result()
        .unwrap();
    assert_eq!(renamed.name, "Acme Corp");
    assert_eq!(competitors.state().data[0].name, "Acme Corp");

    assert!(competitors.remove(acme.id).await.is_ok());
    assert!(competitors.state().data.is_empty());
}

#[tokio::test(start_paused = true)]
async fn poller_refetches_on_interval_and_stops() {
    let (store, user_id) = setup();
    let credits = Arc::new(CreditsResource::new(store.clone(), Some(user_id)));

    let poller = CreditsPoller::spawn(credits, Duration::from_secs(30));
    let mut updates = poller.subscribe();

    updates.changed().await.unwrap();
    assert_eq!(store.call_count(), 1);
    assert_eq!(updates.borrow().data.credits_used, 0);

    store.seed_credits(user_id, CreditPeriod::current(), 42);
    updates.changed().await.unwrap();
    assert_eq!(store.call_count(), 2);
    assert_eq!(updates.borrow().data.credits_used, 42);

    poller.stop();
    assert!(!poller.is_running());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(store.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_poller_cancels_it() {
    let (store, user_id) = setup();
    let credits = Arc::new(CreditsResource::new(store.clone(), Some(user_id)));

    let poller = CreditsPoller::spawn(credits, Duration::from_secs(30));
    let mut updates = poller.subscribe();
    updates.changed().await.unwrap();

    drop(poller);
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(store.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn poller_shutdown_waits_for_exit() {
    let (store, user_id) = setup();
    let credits = Arc::new(CreditsResource::new(store, Some(user_id)));

    let poller = CreditsPoller::spawn(credits, Duration::from_secs(30));
    poller.shutdown().await;
}
