mod common;

use std::sync::Arc;

use forward_bot::domains::message::{InboundMessage, UserId};
use forward_bot::interfaces::plugins::Plugin;
use forward_bot::plugins::manager::PluginHost;
use forward_bot::relay::commands::{DISABLED_REPLY, INACTIVE_REPLY, UNAUTHORIZED_REPLY};

use common::{forward_plugin, memory_state, next_delivery, plain_text, RecordingSender};

fn host_with_plugin(plugin: Arc<dyn Plugin>) -> PluginHost {
    let mut host = PluginHost::default();
    assert!(host.register_plugin(plugin));
    host
}

#[tokio::test]
async fn enable_disable_status_through_commands() {
    let (store, state) = memory_state();
    let (sender, _rx) = RecordingSender::new();
    let host = host_with_plugin(forward_plugin(state.clone(), sender));

    let replies = host
        .dispatch(&InboundMessage::private("alice", "Alice", "/status_forward"))
        .await
        .unwrap();
    assert_eq!(replies, vec![INACTIVE_REPLY.to_string()]);

    for _ in 0..2 {
        let replies = host
            .dispatch(&InboundMessage::private("alice", "Alice", "/enable_forward"))
            .await
            .unwrap();
        assert_eq!(
            replies,
            vec!["Forwarding enabled, all messages will be forwarded to you, Alice.".to_string()]
        );
    }
    assert_eq!(state.get().await, Some(UserId::new("alice")));
    assert_eq!(
        store.persisted("forward_target"),
        Some(serde_json::json!("alice"))
    );

    let replies = host
        .dispatch(&InboundMessage::private("bob", "Bob", "/status_forward"))
        .await
        .unwrap();
    assert_eq!(
        replies,
        vec!["Forwarding is enabled, target user ID: alice".to_string()]
    );

    let replies = host
        .dispatch(&InboundMessage::in_group("9", "bob", "Bob", "/disable_forward"))
        .await
        .unwrap();
    assert_eq!(replies, vec![UNAUTHORIZED_REPLY.to_string()]);
    assert_eq!(state.get().await, Some(UserId::new("alice")));

    let replies = host
        .dispatch(&InboundMessage::private("alice", "Alice", "/disable_forward"))
        .await
        .unwrap();
    assert_eq!(replies, vec![DISABLED_REPLY.to_string()]);
    assert_eq!(state.get().await, None);
}

#[tokio::test]
async fn reassigned_target_loses_disable() {
    let (_, state) = memory_state();
    let (sender, _rx) = RecordingSender::new();
    let host = host_with_plugin(forward_plugin(state.clone(), sender));

    host.dispatch(&InboundMessage::private("alice", "Alice", "/enable_forward"))
        .await
        .unwrap();
    host.dispatch(&InboundMessage::private("bob", "Bob", "/enable_forward"))
        .await
        .unwrap();
    assert_eq!(state.get().await, Some(UserId::new("bob")));

    let replies = host
        .dispatch(&InboundMessage::private("alice", "Alice", "/disable_forward"))
        .await
        .unwrap();
    assert_eq!(replies, vec![UNAUTHORIZED_REPLY.to_string()]);
    assert_eq!(state.get().await, Some(UserId::new("bob")));
}

#[tokio::test]
async fn listener_sees_commands_and_plain_messages() {
    let (_, state) = memory_state();
    let (sender, mut rx) = RecordingSender::new();
    let host = host_with_plugin(forward_plugin(state.clone(), sender.clone()));

    host.dispatch(&InboundMessage::private("alice", "Alice", "/enable_forward"))
        .await
        .unwrap();

    let replies = host
        .dispatch(&InboundMessage::in_group("42", "bob", "Bob", "/status_forward"))
        .await
        .unwrap();
    assert_eq!(replies.len(), 1);
    let (target, parts) = next_delivery(&mut rx).await;
    assert_eq!(target, UserId::new("alice"));
    assert_eq!(
        plain_text(&parts),
        vec![
            "[2024-01-02 03:04:05] Group ID: 42, Sender: Bob\nMessage content: /status_forward"
                .to_string()
        ]
    );

    let replies = host
        .dispatch(&InboundMessage::private("carol", "Carol", "just chatting"))
        .await
        .unwrap();
    assert!(replies.is_empty());
    let (_, parts) = next_delivery(&mut rx).await;
    assert_eq!(
        plain_text(&parts),
        vec!["[2024-01-02 03:04:05] Private, Sender: Carol\nMessage content: just chatting".to_string()]
    );

    assert_eq!(sender.sent.lock().await.len(), 2);
}

#[tokio::test]
async fn unknown_commands_and_prefixes() {
    let (_, state) = memory_state();
    let (sender, _rx) = RecordingSender::new();
    let mut host = PluginHost::new("!");
    assert!(host.register_plugin(forward_plugin(state.clone(), sender)));

    assert_eq!(host.parse_command("!enable_forward now"), Some("enable_forward"));
    assert_eq!(host.parse_command("  !status_forward"), Some("status_forward"));
    assert_eq!(host.parse_command("/enable_forward"), None);
    assert_eq!(host.parse_command("!"), None);

    let replies = host
        .dispatch(&InboundMessage::private("alice", "Alice", "/enable_forward"))
        .await
        .unwrap();
    assert!(replies.is_empty());
    let replies = host
        .dispatch(&InboundMessage::private("alice", "Alice", "!unknown"))
        .await
        .unwrap();
    assert!(replies.is_empty());
    assert_eq!(state.get().await, None);
}

#[tokio::test]
async fn registration_rejects_duplicates() {
    let (_, state) = memory_state();
    let (sender, _rx) = RecordingSender::new();
    let mut host = PluginHost::default();
    assert!(host.register_plugin(forward_plugin(state.clone(), sender.clone())));
    assert!(!host.register_plugin(forward_plugin(state, sender)));

    assert!(host.get_plugin("forward_plugin").is_some());
    assert!(host.get_plugin("missing").is_none());

    let plugins = host.list_plugins();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0]["name"], "forward_plugin");
    assert_eq!(plugins[0]["version"], "1.0.0");
    let commands: Vec<&str> = plugins[0]["commands"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["keyword"].as_str().unwrap())
        .collect();
    assert_eq!(
        commands,
        vec!["enable_forward", "disable_forward", "status_forward"]
    );
}

#[tokio::test]
async fn persistence_failure_propagates() {
    let (store, state) = memory_state();
    let (sender, _rx) = RecordingSender::new();
    let host = host_with_plugin(forward_plugin(state.clone(), sender));

    store.fail_next_persist();
    let err = host
        .dispatch(&InboundMessage::private("alice", "Alice", "/enable_forward"))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(state.get().await, None);
}
