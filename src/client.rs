use crate::config::ClientConfig;
use crate::dispatch::{Dispatcher, Routed};
use crate::error::ClientError;
use crate::events::{EventBus, PushLaneState};
use crate::http::{RequestLane, TransportError, UreqHttpClient};
use crate::monitor::SessionMonitor;
use crate::push::{PushChannel, PushEvent};
use crate::store::memory::MemoryStore;
use crate::store::traits::IdentityStore;
use crate::sync::MessageStore;
use log::{debug, info, warn};
use prattle_core::net::HttpClient;
use prattle_core::operation::Operation;
use prattle_core::response::OperationResponse;
use prattle_core::session::SessionContext;
use prattle_core::types::{AuthUser, ChatState, Message};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

/// The client facade: owns the session context, both transport lanes, the
/// message store, and the session monitor, and exposes the typed operation
/// surface the UI layer drives.
pub struct Client {
    config: ClientConfig,
    session: Arc<SessionContext>,
    identity: Arc<dyn IdentityStore>,
    dispatcher: Dispatcher,
    messages: Arc<MessageStore>,
    // Replaced wholesale on each sign-in: a fresh identity is a fresh session
    // instance with its own monitor.
    monitor: Mutex<Arc<SessionMonitor>>,
    bus: Arc<EventBus>,
}

#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    http: Option<Arc<dyn HttpClient>>,
    identity: Option<Arc<dyn IdentityStore>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_http_client(mut self, http: impl HttpClient + 'static) -> Self {
        self.http = Some(Arc::new(http));
        self
    }

    pub fn with_identity_store(mut self, store: impl IdentityStore + 'static) -> Self {
        self.identity = Some(Arc::new(store));
        self
    }

    pub fn build(self) -> Arc<Client> {
        let http = self.http.unwrap_or_else(|| Arc::new(UreqHttpClient::new()));
        let identity: Arc<dyn IdentityStore> = self
            .identity
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let session = Arc::new(SessionContext::new());
        let bus = Arc::new(EventBus::new());
        let endpoint = self.config.endpoint.clone();

        let dispatcher = Dispatcher::new(
            RequestLane::new(http.clone(), session.clone(), endpoint.clone()),
            PushChannel::new(http, session.clone(), endpoint),
        );
        let monitor = SessionMonitor::new(
            session.clone(),
            identity.clone(),
            bus.clone(),
            self.config.sign_out_delay,
        );

        Arc::new(Client {
            config: self.config,
            session,
            identity,
            dispatcher,
            messages: Arc::new(MessageStore::new()),
            monitor: Mutex::new(monitor),
            bus,
        })
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    /// Reactive read of the cached conversation plus loading/error flags.
    pub fn chat_state(&self) -> watch::Receiver<ChatState> {
        self.messages.state()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.current()
    }

    fn monitor(&self) -> Arc<SessionMonitor> {
        self.monitor.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Installs a fresh monitor for a fresh session instance, tearing the
    /// previous one down so a stale pending sign-out can never fire into the
    /// new session.
    fn replace_monitor(&self) {
        let fresh = SessionMonitor::new(
            self.session.clone(),
            self.identity.clone(),
            self.bus.clone(),
            self.config.sign_out_delay,
        );
        let mut slot = self.monitor.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *slot, fresh).shutdown();
    }

    /// Sends one read/write operation and applies the uniform error policy:
    /// transport errors pass through unchanged, a non-empty server error list
    /// fails with its first message, and every failure text is also shown to
    /// the session monitor.
    async fn run_request(&self, operation: &Operation) -> Result<OperationResponse, ClientError> {
        let routed = match self.dispatcher.dispatch(operation).await {
            Ok(routed) => routed,
            Err(e) => {
                self.monitor().observe_error(&e.to_string());
                return Err(e.into());
            }
        };
        match routed {
            Routed::Response(response) => {
                if let Some(message) = response.first_error() {
                    let message = message.to_string();
                    self.monitor().observe_error(&message);
                    return Err(ClientError::Server(message));
                }
                Ok(response)
            }
            Routed::Subscription(_) => Err(ClientError::WrongLane),
        }
    }

    /// Loads the persisted identity, if any, and installs it as the current
    /// session. Called once at startup.
    pub async fn restore_session(&self) -> Result<Option<AuthUser>, ClientError> {
        let Some(user) = self.identity.load().await? else {
            return Ok(None);
        };
        self.session.set(user.clone());
        self.replace_monitor();
        info!(target: "Client", "Restored session for '{}'", user.nickname);
        Ok(Some(user))
    }

    pub async fn login(&self, nickname: &str) -> Result<AuthUser, ClientError> {
        let operation = Operation::write("login").with_variable("nickname", nickname);
        let response = self.run_request(&operation).await?;
        let value = response
            .take_field("login")
            .ok_or(ClientError::MissingData("login returned no user"))?;
        let user: AuthUser =
            serde_json::from_value(value).map_err(TransportError::Malformed)?;

        self.session.set(user.clone());
        self.identity.save(&user).await?;
        self.replace_monitor();
        info!(target: "Client", "Signed in as '{}' ({})", user.nickname, user.id);
        Ok(user)
    }

    /// Explicit user sign-out: cancels any pending invalidation timer, clears
    /// the session context and the persisted identity, and emits the
    /// signed-out event.
    pub async fn sign_out(&self) {
        self.monitor().sign_out().await;
    }

    /// Reads the conversation and establishes (or refreshes) the cached list.
    pub async fn fetch_messages(&self) -> Result<Vec<Message>, ClientError> {
        self.messages.set_loading(true);
        match self.fetch_messages_inner().await {
            Ok(list) => Ok(list),
            Err(e) => {
                self.messages.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    async fn fetch_messages_inner(&self) -> Result<Vec<Message>, ClientError> {
        let operation = Operation::read("messages");
        let response = self.run_request(&operation).await?;
        let value = response
            .take_field("messages")
            .ok_or(ClientError::MissingData("message list missing from read result"))?;
        let list: Vec<Message> =
            serde_json::from_value(value).map_err(TransportError::Malformed)?;
        self.messages.establish(list.clone());
        debug!(target: "Client", "Established message list ({} entries)", list.len());
        Ok(list)
    }

    /// Sends one message and merges the created record into the cache. The
    /// push-channel echo of the same message is deduplicated by the merge.
    pub async fn send_message(&self, content: &str) -> Result<Message, ClientError> {
        let operation = Operation::write("sendMessage").with_variable("content", content);
        let response = self.run_request(&operation).await?;
        let value = response
            .take_field("sendMessage")
            .ok_or(ClientError::MissingData("message send returned no message"))?;
        let message: Message =
            serde_json::from_value(value).map_err(TransportError::Malformed)?;

        if self.messages.append(message.clone()) {
            let _ = self.bus.message_added.send(Arc::new(message.clone()));
        }
        Ok(message)
    }

    /// Subscribes to server-pushed message events and spawns the background
    /// task that merges each one into the cache. The task stops on the first
    /// push failure or completion; the core never reconnects on its own.
    pub async fn start_push_sync(self: &Arc<Self>) -> Result<PushSyncHandle, ClientError> {
        let operation = Operation::subscribe("messageAdded");
        let Routed::Subscription(mut subscription) =
            self.dispatcher.dispatch(&operation).await?
        else {
            return Err(ClientError::WrongLane);
        };

        let stop = Arc::new(Notify::new());
        let client = self.clone();
        let task_stop = stop.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.next() => match event {
                        Some(PushEvent::Next(response)) => client.merge_push_response(response),
                        Some(PushEvent::Failed(e)) => {
                            let text = e.to_string();
                            warn!(target: "Client/Push", "Push lane failed: {text}");
                            client.monitor().observe_error(&text);
                            let _ = client.bus.push_state.send(Arc::new(PushLaneState::Failed(text)));
                            break;
                        }
                        Some(PushEvent::Complete) => {
                            info!(target: "Client/Push", "Push lane completed");
                            let _ = client.bus.push_state.send(Arc::new(PushLaneState::Completed));
                            break;
                        }
                        None => break,
                    },
                    _ = task_stop.notified() => {
                        subscription.unsubscribe();
                        break;
                    }
                }
            }
        });

        Ok(PushSyncHandle { stop, task })
    }

    fn merge_push_response(&self, response: OperationResponse) {
        if let Some(message) = response.first_error() {
            // Protocol errors on the push lane feed the monitor like any
            // other; they carry no payload to merge.
            warn!(target: "Client/Push", "Push event carried error: {message}");
            self.monitor().observe_error(message);
            return;
        }
        let Some(value) = response.take_field("messageAdded") else {
            return;
        };
        match serde_json::from_value::<Message>(value) {
            Ok(message) => {
                if self.messages.append(message.clone()) {
                    let _ = self.bus.message_added.send(Arc::new(message));
                }
            }
            Err(e) => {
                warn!(target: "Client/Push", "Discarding malformed pushed message: {e}");
            }
        }
    }
}

/// Handle on the background push-sync task.
pub struct PushSyncHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PushSyncHandle {
    /// Asks the task to unsubscribe and stop. Safe to call more than once.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Stops the task and waits for it to unwind.
    pub async fn shutdown(self) {
        self.stop.notify_one();
        let _ = self.task.await;
    }
}
