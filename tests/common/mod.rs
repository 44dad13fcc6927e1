#![allow(dead_code)]

use async_trait::async_trait;
use shelltour::{AdapterError, EventKind, HostAdapter, KeyPress, TourEvent};
use tokio::sync::{mpsc, watch};

/// A host fed from a channel that records every emitted text.
pub struct ChannelHost {
    events: mpsc::UnboundedReceiver<Result<TourEvent, AdapterError>>,
    transcript: watch::Sender<Vec<Emitted>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub text: String,
    pub color: Option<String>,
}

/// The test's side of a [`ChannelHost`].
pub struct Driver {
    events: mpsc::UnboundedSender<Result<TourEvent, AdapterError>>,
    transcript: watch::Receiver<Vec<Emitted>>,
}

pub fn channel_host() -> (ChannelHost, Driver) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (transcript_tx, transcript_rx) = watch::channel(Vec::new());
    (
        ChannelHost {
            events: events_rx,
            transcript: transcript_tx,
        },
        Driver {
            events: events_tx,
            transcript: transcript_rx,
        },
    )
}

#[async_trait(?Send)]
impl HostAdapter for ChannelHost {
    fn emit(&mut self, text: &str, color: Option<&str>) -> Result<(), AdapterError> {
        self.transcript.send_modify(|lines| {
            lines.push(Emitted {
                text: text.to_string(),
                color: color.map(str::to_string),
            })
        });
        Ok(())
    }

    async fn next_event(&mut self, _kind: EventKind) -> Result<TourEvent, AdapterError> {
        self.events.recv().await.unwrap_or(Err(AdapterError::InputClosed))
    }
}

impl Driver {
    pub fn command(&self, line: &str) {
        self.events
            .send(Ok(TourEvent::command(line)))
            .expect("host dropped");
    }

    pub fn key(&self, name: &str) {
        let key = KeyPress::parse(name).expect("valid key name");
        self.events
            .send(Ok(TourEvent::Keypress(key)))
            .expect("host dropped");
    }

    pub fn fail(&self, error: AdapterError) {
        self.events.send(Err(error)).expect("host dropped");
    }

    /// Texts emitted so far, in order.
    pub fn texts(&self) -> Vec<String> {
        self.transcript
            .borrow()
            .iter()
            .map(|emitted| emitted.text.clone())
            .collect()
    }

    pub fn emitted(&self) -> Vec<Emitted> {
        self.transcript.borrow().clone()
    }

    /// Wait until `text` has been emitted `count` times in total.
    pub async fn wait_for_count(&mut self, text: &str, count: usize) {
        self.transcript
            .wait_for(|lines| lines.iter().filter(|e| e.text == text).count() >= count)
            .await
            .expect("host dropped");
    }

    pub async fn wait_for(&mut self, text: &str) {
        self.wait_for_count(text, 1).await;
    }
}
