//! Call card service: runs a [`CallCardCoordinator`] as a single task
//!
//! Commands from the lifecycle owner, in-call events, lookup completions and
//! timer ticks all funnel into one loop, so the coordinator never sees two
//! handlers at once.

use crate::application::call_timer::TimerTick;
use crate::application::coordinator::{CallCardCoordinator, CoordinatorDeps, CoordinatorSnapshot};
use crate::application::in_call::{InCallEvent, InCallNotifier};
use crate::config::CoordinatorConfig;
use crate::domain::call::{Call, CallDetails, CallList, InCallState};
use crate::domain::contact::LookupCompletion;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::telecom::{self, TelecomAdapter, TelecomRequest};
use crate::interface::call_card::CallCardUi;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Input to the service loop
pub enum CallCardCommand {
    Init(Option<Call>),
    UiReady(Arc<dyn CallCardUi>),
    UiUnready,
    StateChanged { state: InCallState, calls: CallList },
    IncomingCall { state: InCallState, call: Call },
    DetailsChanged(CallDetails),
    EndCallClicked,
    SecondaryInfoClicked,
    PhoneAccountClicked,
    Snapshot(oneshot::Sender<CoordinatorSnapshot>),
}

impl From<InCallEvent> for CallCardCommand {
    fn from(event: InCallEvent) -> Self {
        match event {
            InCallEvent::StateChanged { state, calls } => CallCardCommand::StateChanged { state, calls },
            InCallEvent::IncomingCall { state, call } => CallCardCommand::IncomingCall { state, call },
            InCallEvent::DetailsChanged(details) => CallCardCommand::DetailsChanged(details),
        }
    }
}

/// Cloneable handle for talking to a running service.
///
/// The service stops once every handle is dropped.
#[derive(Clone)]
pub struct CallCardHandle {
    tx: mpsc::Sender<CallCardCommand>,
}

impl CallCardHandle {
    async fn send(&self, command: CallCardCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| DomainError::Internal("call card service stopped".to_string()))
    }

    pub async fn init(&self, call: Option<Call>) -> Result<()> {
        self.send(CallCardCommand::Init(call)).await
    }

    /// Attach the UI and start listening for in-call events.
    pub async fn ui_ready(&self, ui: Arc<dyn CallCardUi>) -> Result<()> {
        self.send(CallCardCommand::UiReady(ui)).await
    }

    /// Detach the UI and stop listening for in-call events.
    pub async fn ui_unready(&self) -> Result<()> {
        self.send(CallCardCommand::UiUnready).await
    }

    pub async fn state_changed(&self, state: InCallState, calls: CallList) -> Result<()> {
        self.send(CallCardCommand::StateChanged { state, calls }).await
    }

    pub async fn details_changed(&self, details: CallDetails) -> Result<()> {
        self.send(CallCardCommand::DetailsChanged(details)).await
    }

    pub async fn end_call_clicked(&self) -> Result<()> {
        self.send(CallCardCommand::EndCallClicked).await
    }

    pub async fn secondary_info_clicked(&self) -> Result<()> {
        self.send(CallCardCommand::SecondaryInfoClicked).await
    }

    pub async fn phone_account_clicked(&self) -> Result<()> {
        self.send(CallCardCommand::PhoneAccountClicked).await
    }

    /// Current coordinator state, after every command sent before it was handled
    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CallCardCommand::Snapshot(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| DomainError::Internal("call card service stopped".to_string()))
    }
}

pub struct CallCardService {
    coordinator: CallCardCoordinator,
    telecom: Arc<dyn TelecomAdapter>,
    notifier: InCallNotifier,
    commands_tx: mpsc::WeakSender<CallCardCommand>,
    subscription: Option<JoinHandle<()>>,
}

impl CallCardService {
    /// Spawn the service loop. Must be called from within a tokio runtime.
    pub fn spawn(
        deps: CoordinatorDeps,
        telecom: Arc<dyn TelecomAdapter>,
        notifier: InCallNotifier,
        config: &CoordinatorConfig,
    ) -> (CallCardHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(config.event_buffer);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

        let service = Self {
            coordinator: CallCardCoordinator::new(deps, config, completions_tx, ticks_tx),
            telecom,
            notifier,
            commands_tx: commands_tx.downgrade(),
            subscription: None,
        };

        let task = tokio::spawn(service.run(commands_rx, completions_rx, ticks_rx));
        (CallCardHandle { tx: commands_tx }, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<CallCardCommand>,
        mut completions: mpsc::UnboundedReceiver<LookupCompletion>,
        mut ticks: mpsc::UnboundedReceiver<TimerTick>,
    ) {
        info!("Call card service started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some(completion) = completions.recv() => self.coordinator.on_lookup_complete(completion),
                Some(tick) = ticks.recv() => self.coordinator.on_timer_tick(tick),
            }
        }

        self.unsubscribe();
        self.coordinator.on_ui_unready();
        info!("Call card service stopped");
    }

    async fn handle(&mut self, command: CallCardCommand) {
        match command {
            CallCardCommand::Init(call) => self.coordinator.init(call),
            CallCardCommand::UiReady(ui) => {
                self.coordinator.on_ui_ready(ui);
                // Register for call state changes last
                self.subscribe();
            }
            CallCardCommand::UiUnready => {
                self.unsubscribe();
                self.coordinator.on_ui_unready();
            }
            CallCardCommand::StateChanged { state, calls } => {
                self.coordinator.on_state_change(state, &calls)
            }
            CallCardCommand::IncomingCall { state, call } => {
                self.coordinator.on_incoming_call(state, &call)
            }
            CallCardCommand::DetailsChanged(details) => self.coordinator.on_details_changed(&details),
            CallCardCommand::EndCallClicked => {
                let request = self.coordinator.end_call_clicked();
                self.forward(request).await;
            }
            CallCardCommand::SecondaryInfoClicked => {
                let request = self.coordinator.secondary_info_clicked();
                self.forward(request).await;
            }
            CallCardCommand::PhoneAccountClicked => {
                let request = self.coordinator.phone_account_clicked();
                self.forward(request).await;
            }
            CallCardCommand::Snapshot(reply) => {
                let _ = reply.send(self.coordinator.snapshot());
            }
        }
    }

    async fn forward(&self, request: Option<TelecomRequest>) {
        let Some(request) = request else {
            return;
        };
        if let Err(e) = telecom::dispatch(self.telecom.as_ref(), &request).await {
            warn!("Telecom request for call {} failed: {}", request.call_id(), e);
        }
    }

    fn subscribe(&mut self) {
        if self.subscription.is_some() {
            return;
        }

        let mut events = self.notifier.subscribe();
        let commands = self.commands_tx.clone();
        self.subscription = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(tx) = commands.upgrade() else {
                            break;
                        };
                        if tx.send(event.into()).await.is_err() {
                            break;
                        }
                    }
                    // The next state change carries the full call list, so
                    // skipped events need no replay
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Call card skipped {} in-call events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
        debug!("Subscribed to in-call events");
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.abort();
            debug!("Unsubscribed from in-call events");
        }
    }
}
