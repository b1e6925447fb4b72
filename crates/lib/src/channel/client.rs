//! Socket.IO client for the realtime channel.

use super::protocol::{ClientEvent, ServerEvent, SERVER_EVENTS};
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("socket.io error: {0}")]
    SocketIo(#[from] rust_socketio::Error),
    #[error("realtime channel closed")]
    Closed,
}

/// What the channel reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Server(ServerEvent),
}

/// Cloneable handle for outbound events. Events queue until the socket is open;
/// once the connection task has ended every send fails with [`ChannelError::Closed`].
#[derive(Clone, Debug)]
pub struct RealtimeSender {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl RealtimeSender {
    /// A sender plus the receiving end a transport drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, event: ClientEvent) -> Result<(), ChannelError> {
        self.tx.send(event).map_err(|_| ChannelError::Closed)
    }
}

/// Connect to the Socket.IO server at `url` on `handle` and forward channel events to `events`.
///
/// Connect and close notifications of the transport become `Connected` and
/// `Disconnected`; reconnecting after a dropped transport is left to the
/// Socket.IO client. The task ends with a `Disconnected` event once the first
/// connect fails or every [`RealtimeSender`] was dropped.
pub fn spawn<E>(handle: &Handle, url: String, events: mpsc::UnboundedSender<E>) -> RealtimeSender
where
    E: From<ChannelEvent> + Send + 'static,
{
    let (sender, outbound) = RealtimeSender::channel();
    handle.spawn(async move {
        if let Err(e) = run_connection(&url, outbound, &events).await {
            log::warn!("realtime channel {} failed: {}", url, e);
        }
        log::info!("realtime channel {} disconnected", url);
        let _ = events.send(ChannelEvent::Disconnected.into());
    });
    sender
}

/// First argument of a server event, `Null` when the event carried none.
fn first_argument(payload: Payload) -> Option<Value> {
    match payload {
        Payload::Text(values) => Some(values.into_iter().next().unwrap_or(Value::Null)),
        _ => None,
    }
}

fn forward_server_event<E>(
    name: &'static str,
    events: mpsc::UnboundedSender<E>,
) -> impl FnMut(Payload, Client) -> BoxFuture<'static, ()> + Send + Sync + 'static
where
    E: From<ChannelEvent> + Send + 'static,
{
    move |payload, _| {
        match first_argument(payload).map(|data| ServerEvent::decode(name, data)) {
            Some(Ok(Some(event))) => {
                let _ = events.send(ChannelEvent::Server(event).into());
            }
            Some(Ok(None)) => log::debug!("ignoring realtime event {}", name),
            Some(Err(e)) => log::warn!("bad {} payload: {}", name, e),
            None => log::warn!("ignoring binary {} payload", name),
        }
        future::ready(()).boxed()
    }
}

fn forward_transport_event<E>(
    event: ChannelEvent,
    events: mpsc::UnboundedSender<E>,
) -> impl FnMut(Payload, Client) -> BoxFuture<'static, ()> + Send + Sync + 'static
where
    E: From<ChannelEvent> + Send + 'static,
{
    move |_, _| {
        log::info!("realtime channel {:?}", event);
        let _ = events.send(event.clone().into());
        future::ready(()).boxed()
    }
}

async fn run_connection<E>(
    url: &str,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    events: &mpsc::UnboundedSender<E>,
) -> Result<(), ChannelError>
where
    E: From<ChannelEvent> + Send + 'static,
{
    let mut builder = ClientBuilder::new(url)
        .on(Event::Connect, forward_transport_event(ChannelEvent::Connected, events.clone()))
        .on(Event::Close, forward_transport_event(ChannelEvent::Disconnected, events.clone()));
    for name in SERVER_EVENTS {
        builder = builder.on(name, forward_server_event(name, events.clone()));
    }
    let client = builder.connect().await?;
    log::info!("realtime channel connected to {}", url);

    while let Some(event) = outbound.recv().await {
        log::debug!("realtime send: {}", event.name());
        client.emit(event.name(), Payload::Text(vec![event.payload()])).await?;
    }
    client.disconnect().await?;
    Ok(())
}
