#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::macros::datetime;
use tokio::sync::{mpsc, Mutex};

use forward_bot::config_store::MemoryConfigStore;
use forward_bot::domains::message::{MessageComponent, UserId};
use forward_bot::error::{ForwardBotError, Result};
use forward_bot::interfaces::clock::FixedClock;
use forward_bot::interfaces::delivery::MessageSender;
use forward_bot::plugins::forward::ForwardPlugin;
use forward_bot::relay::RelayState;

pub type Delivered = (UserId, Vec<MessageComponent>);

pub struct RecordingSender {
    tx: mpsc::UnboundedSender<Delivered>,
    pub sent: Mutex<Vec<Delivered>>,
}

impl RecordingSender {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Delivered>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                tx,
                sent: Mutex::new(Vec::new()),
            }),
            rx,
        )
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, target: &UserId, parts: Vec<MessageComponent>) -> Result<()> {
        self.sent.lock().await.push((target.clone(), parts.clone()));
        let _ = self.tx.send((target.clone(), parts));
        Ok(())
    }
}

pub struct FailingSender;

#[async_trait]
impl MessageSender for FailingSender {
    async fn send_message(&self, _target: &UserId, _parts: Vec<MessageComponent>) -> Result<()> {
        Err(ForwardBotError::Delivery("bot blocked by target".to_string()))
    }
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(datetime!(2024-01-02 03:04:05 UTC)))
}

pub fn memory_state() -> (Arc<MemoryConfigStore>, Arc<RelayState>) {
    let store = Arc::new(MemoryConfigStore::new());
    let state = Arc::new(RelayState::load(store.clone()).unwrap());
    (store, state)
}

pub fn forward_plugin(
    state: Arc<RelayState>,
    sender: Arc<dyn MessageSender>,
) -> Arc<ForwardPlugin> {
    Arc::new(ForwardPlugin::with_clock(state, sender, fixed_clock()))
}

pub async fn next_delivery(rx: &mut mpsc::UnboundedReceiver<Delivered>) -> Delivered {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("delivery timed out")
        .expect("sender dropped")
}

pub fn plain_text(parts: &[MessageComponent]) -> Vec<String> {
    parts
        .iter()
        .map(|part| match part {
            MessageComponent::Plain { text } => text.clone(),
        })
        .collect()
}
