// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound gateway: normalization, commands, delivery, and failure replies.

use std::sync::Arc;
use std::time::Duration;

use courier_agent::inbound::BUSY_MESSAGE;
use courier_core::{ConversationId, CourierError, ModelReply, Role};
use courier_test_utils::{MockChannel, MockModel, TestHarness};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn event_is_normalized_stored_and_answered() {
    let harness = TestHarness::builder().build().await.unwrap();
    let gateway = harness.gateway();

    gateway
        .handle_event(MockChannel::event("42", "alice", "what's up?"))
        .await;

    let stored = harness.messages("42").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].role, Role::User);
    assert!(stored[0].content.starts_with('['));
    assert!(stored[0].content.ends_with("] alice: what's up?"));
    assert_eq!(harness.channel.sent_to("42").await, vec!["mock response"]);
}

#[tokio::test]
async fn commands_never_reach_the_model() {
    let harness = TestHarness::builder().build().await.unwrap();
    let gateway = harness.gateway();

    gateway.handle_event(MockChannel::event("1", "bob", "/version")).await;
    gateway.handle_event(MockChannel::event("1", "bob", "/time")).await;
    gateway.handle_event(MockChannel::event("1", "bob", "/help")).await;
    gateway.handle_event(MockChannel::event("1", "bob", "/unknown")).await;

    assert_eq!(harness.model.call_count(), 0);
    let sent = harness.channel.sent_to("1").await;
    assert_eq!(sent.len(), 4);
    assert!(sent[0].starts_with("courier "));
    assert!(sent[2].contains("/forget"));
    assert!(sent[3].contains("/help"));
    assert!(harness.messages("1").await.unwrap().is_empty());
}

#[tokio::test]
async fn system_and_forget_commands() {
    let harness = TestHarness::builder().build().await.unwrap();
    let gateway = harness.gateway();
    let id = ConversationId::new("5");

    gateway
        .handle_event(MockChannel::event("5", "carol", "/system Reply in French."))
        .await;
    let view = harness.admin.conversation(&id).await.unwrap();
    assert_eq!(view.system_message.as_deref(), Some("Reply in French."));

    gateway.handle_event(MockChannel::event("5", "carol", "bonjour")).await;
    gateway.handle_event(MockChannel::event("5", "carol", "/forget")).await;
    assert!(harness.messages("5").await.unwrap().is_empty());

    gateway.handle_event(MockChannel::event("5", "carol", "/forget")).await;
    let sent = harness.channel.sent_to("5").await;
    assert_eq!(sent.last().map(String::as_str), Some("Nothing to forget."));
}

#[tokio::test]
async fn failure_sends_something_went_wrong() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .model
        .push_error(CourierError::Protocol("unparseable tool call".into()))
        .await;

    harness
        .gateway()
        .handle_event(MockChannel::event("9", "dave", "hi"))
        .await;

    let sent = harness.channel.sent_to("9").await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Something went wrong: "));
    assert!(sent[0].contains("unparseable tool call"));
}

#[tokio::test]
async fn empty_model_reply_is_reported_not_stored() {
    let harness = TestHarness::builder()
        .with_replies(vec![ModelReply::Text(String::new())])
        .build()
        .await
        .unwrap();

    harness
        .gateway()
        .handle_event(MockChannel::event("9", "dave", "hi"))
        .await;

    let sent = harness.channel.sent_to("9").await;
    assert_eq!(
        sent,
        vec!["Something went wrong: protocol error: model returned an empty reply"]
    );
    let stored = harness.messages("9").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].role, Role::User);
}

#[tokio::test]
async fn task_and_profile_commands() {
    let harness = TestHarness::builder().build().await.unwrap();
    let gateway = harness.gateway();
    let id = ConversationId::new("6");
    harness
        .admin
        .schedule_task(&id, "Water the plants", "2099-04-01 08:00", Some("plants"))
        .await
        .unwrap();

    for text in [
        "/tasks",
        "/cancel plants",
        "/cancel plants",
        "/cancel",
        "/tasks",
        "/profile",
        "/profile Likes short answers.",
        "/profile",
    ] {
        gateway.handle_event(MockChannel::event("6", "erin", text)).await;
    }

    let sent = harness.channel.sent_to("6").await;
    assert_eq!(
        sent,
        vec![
            "'plants' scheduled for 2099-04-01 08:00 UTC: Water the plants",
            "Cancelled task 'plants' scheduled for 2099-04-01 08:00 UTC.",
            "No pending task 'plants'.",
            "Usage: /cancel <task key>",
            "No pending tasks.",
            "No profile set.",
            "Profile updated.",
            "Likes short answers.",
        ]
    );
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn busy_conversation_gets_busy_message() {
    let harness = TestHarness::builder()
        .with_lock_timeout(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    let id = ConversationId::new("3");
    let _held = harness
        .registry
        .acquire(&id, Duration::from_secs(1))
        .await
        .unwrap();

    harness
        .gateway()
        .handle_event(MockChannel::event("3", "erin", "hello?"))
        .await;

    assert_eq!(harness.channel.sent_to("3").await, vec![BUSY_MESSAGE]);
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn delivery_failure_leaves_state_intact() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.channel.fail_sends(true);

    harness
        .gateway()
        .handle_event(MockChannel::event("4", "frank", "anyone there?"))
        .await;

    let stored = harness.messages("4").await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].role, Role::Assistant);
}

#[tokio::test]
async fn typing_indicator_repeats_during_run() {
    let (model, gate) = MockModel::new().gated();
    let harness = Arc::new(TestHarness::builder().with_model(model).build().await.unwrap());
    let gateway = harness.gateway();

    let handled = {
        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            gateway
                .handle_event(MockChannel::event("8", "gina", "think hard"))
                .await
        })
    };
    gate.entered().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.channel.typing_count() >= 2);

    gate.open(1);
    handled.await.unwrap();
    let after = harness.channel.typing_count();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.channel.typing_count(), after, "typing must stop with the run");
}

#[tokio::test]
async fn run_loop_processes_events_until_channel_closes() {
    let harness = TestHarness::builder()
        .with_model(MockModel::new().with_delay(Duration::from_millis(10)))
        .build()
        .await
        .unwrap();

    for (conversation, text) in [("1", "a"), ("2", "b"), ("1", "c"), ("3", "d")] {
        harness
            .channel
            .inject(MockChannel::event(conversation, "user", text))
            .await;
    }
    harness.channel.close();

    tokio::time::timeout(
        Duration::from_secs(10),
        harness.gateway().run(CancellationToken::new()),
    )
    .await
    .expect("gateway did not stop")
    .unwrap();

    assert_eq!(harness.channel.sent_count().await, 4);
    assert_eq!(harness.messages("1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn run_loop_stops_on_cancel() {
    let harness = TestHarness::builder().build().await.unwrap();
    let cancel = CancellationToken::new();
    let run = tokio::spawn(harness.gateway().run(cancel.clone()));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("gateway ignored cancellation")
        .unwrap()
        .unwrap();
}
