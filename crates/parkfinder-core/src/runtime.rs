// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

//! Executes session [`Command`]s on tokio and feeds completions back as
//! [`Message`]s.
//!
//! The runtime owns the one debounce timer: arming a new one aborts the old
//! task outright. Backend requests are never cancelled once spawned; the
//! session drops their results when they are stale.

use crate::api::ParkingBackend;
use crate::geo::Geolocator;
use crate::session::{Command, Controller, Message, UiEffect};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Counts spawned work that may still produce a message.
#[derive(Clone, Default)]
struct InFlight {
    count: Arc<AtomicUsize>,
    changed: Arc<Notify>,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }

    fn is_idle(&self) -> bool {
        self.count.load(Ordering::SeqCst) == 0
    }
}

/// Released when the task finishes or is aborted.
struct InFlightGuard(InFlight);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.count.fetch_sub(1, Ordering::SeqCst);
        self.0.changed.notify_one();
    }
}

pub struct Runtime<B, G> {
    backend: Arc<B>,
    geolocator: Arc<G>,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    debounce: Option<JoinHandle<()>>,
    in_flight: InFlight,
}

impl<B: ParkingBackend, G: Geolocator> Runtime<B, G> {
    pub fn new(backend: Arc<B>, geolocator: Arc<G>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            geolocator,
            tx,
            rx,
            debounce: None,
            in_flight: InFlight::default(),
        }
    }

    /// Starts the I/O commands and hands back the ones meant for the UI.
    pub fn execute(&mut self, commands: Vec<Command>) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        for command in commands {
            match command {
                Command::ArmDebounce { ticket, delay } => {
                    self.cancel_debounce();
                    let tx = self.tx.clone();
                    let guard = self.in_flight.enter();
                    self.debounce = Some(tokio::spawn(async move {
                        let _guard = guard;
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Message::DebounceElapsed(ticket));
                    }));
                }
                Command::CancelDebounce => self.cancel_debounce(),
                Command::Search(request) => {
                    debug!("Dispatching search — seq={:?} q={}", request.seq, request.query);
                    let backend = Arc::clone(&self.backend);
                    self.spawn(async move {
                        let result = backend.search(&request.query).await;
                        Message::SearchCompleted(request.seq, result)
                    });
                }
                Command::Locate => {
                    let geolocator = Arc::clone(&self.geolocator);
                    self.spawn(async move { Message::Located(geolocator.locate().await) });
                }
                Command::FetchRealtime { seq, lat, lon } => {
                    debug!("Dispatching realtime fetch — seq={:?} lat={lat} lon={lon}", seq);
                    let backend = Arc::clone(&self.backend);
                    self.spawn(async move {
                        Message::RealtimeLoaded(seq, backend.realtime(lat, lon).await)
                    });
                }
                Command::Predict { seq, request } => {
                    debug!("Dispatching prediction — seq={:?}", seq);
                    let backend = Arc::clone(&self.backend);
                    self.spawn(async move {
                        Message::PredictionLoaded(seq, backend.predict(&request).await)
                    });
                }
                Command::Ui(effect) => effects.push(effect),
            }
        }
        effects
    }

    /// Feeds `message` to `controller` and executes what it asks for.
    pub fn dispatch<C: Controller>(&mut self, controller: &mut C, message: Message) -> Vec<UiEffect> {
        let commands = controller.update(message);
        self.execute(commands)
    }

    /// Waits for the next completion. Pending forever while nothing is in flight.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Next completion, or `None` once no spawned work could produce one.
    pub async fn next_pending(&mut self) -> Option<Message> {
        loop {
            // Tasks send before releasing their guard, so an idle count read
            // ahead of the channel check cannot hide a queued message
            let idle = self.in_flight.is_idle();
            if let Ok(message) = self.rx.try_recv() {
                return Some(message);
            }
            if idle {
                return None;
            }
            tokio::select! {
                message = self.rx.recv() => return message,
                _ = self.in_flight.changed.notified() => continue,
            }
        }
    }

    /// Drives `controller` until every timer and request has resolved.
    pub async fn settle<C: Controller>(&mut self, controller: &mut C) -> Vec<UiEffect> {
        let mut effects = Vec::new();
        while let Some(message) = self.next_pending().await {
            effects.extend(self.dispatch(controller, message));
        }
        effects
    }

    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }

    fn spawn<F>(&self, work: F)
    where
        F: std::future::Future<Output = Message> + Send + 'static,
    {
        let tx = self.tx.clone();
        let guard = self.in_flight.enter();
        tokio::spawn(async move {
            let _guard = guard;
            let message = work.await;
            let _ = tx.send(message);
        });
    }
}
