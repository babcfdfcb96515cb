// Channel-backed command gateway: commands flow to the native side over mpsc,
// session ids come back over oneshot replies, events return on a second channel.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::descriptor::ResourceDescriptor;
use super::events::PipelineEvent;
use super::traits::{CommandGateway, SessionId};
use crate::config::PreloaderConfig;

/// A command addressed to the native image pipeline.
#[derive(Debug)]
pub enum GatewayCommand {
    /// Dropping `reply` without sending fails the pending `create_session`.
    CreateSession { reply: oneshot::Sender<SessionId> },
    SubmitBatch {
        session_id: SessionId,
        descriptors: Vec<ResourceDescriptor>,
    },
    ClearMemoryCache,
    ClearDiskCache,
}

/// Connect a gateway to a native endpoint. The returned receiver carries the
/// native events and is meant to be handed to an
/// [`EventPump`](super::pump::EventPump).
/// Capacities of zero, which tokio rejects, are raised to one.
pub fn connect(
    config: &PreloaderConfig,
) -> (BridgeGateway, NativeEndpoint, mpsc::Receiver<PipelineEvent>) {
    let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
    let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
    (
        BridgeGateway { commands: command_tx },
        NativeEndpoint {
            commands: command_rx,
            events: event_tx,
        },
        event_rx,
    )
}

#[derive(Clone)]
pub struct BridgeGateway {
    commands: mpsc::Sender<GatewayCommand>,
}

impl BridgeGateway {
    async fn send(&self, command: GatewayCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("native pipeline endpoint closed"))
    }
}

#[async_trait]
impl CommandGateway for BridgeGateway {
    async fn create_session(&self) -> Result<SessionId> {
        let (reply, rx) = oneshot::channel();
        self.send(GatewayCommand::CreateSession { reply }).await?;
        let id = rx
            .await
            .map_err(|_| anyhow!("native pipeline dropped create_session reply"))?;
        debug!("native pipeline created session {}", id);
        Ok(id)
    }

    async fn submit_batch(&self, id: SessionId, descriptors: Vec<ResourceDescriptor>) -> Result<()> {
        self.send(GatewayCommand::SubmitBatch {
            session_id: id,
            descriptors,
        })
        .await
    }

    async fn clear_memory_cache(&self) -> Result<()> {
        self.send(GatewayCommand::ClearMemoryCache).await
    }

    async fn clear_disk_cache(&self) -> Result<()> {
        self.send(GatewayCommand::ClearDiskCache).await
    }
}

/// The native pipeline's side of the bridge.
pub struct NativeEndpoint {
    commands: mpsc::Receiver<GatewayCommand>,
    events: mpsc::Sender<PipelineEvent>,
}

impl NativeEndpoint {
    /// Next command from the preloader, or `None` once every gateway is dropped.
    pub async fn recv_command(&mut self) -> Option<GatewayCommand> {
        self.commands.recv().await
    }

    pub async fn publish(&self, event: PipelineEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow!("event pump closed"))
    }

    /// Publish an event given in the native wire format.
    pub async fn publish_raw(&self, name: &str, payload: &str) -> Result<()> {
        let event = PipelineEvent::decode(name, payload)?;
        self.publish(event).await
    }

    /// Cloneable sender for native threads that publish events on their own.
    pub fn event_sender(&self) -> mpsc::Sender<PipelineEvent> {
        self.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_session_round_trip() {
        let (gateway, mut endpoint, _events) = connect(&PreloaderConfig::default());
        let native = tokio::spawn(async move {
            match endpoint.recv_command().await {
                Some(GatewayCommand::CreateSession { reply }) => {
                    let _ = reply.send(SessionId(42));
                }
                other => panic!("unexpected command: {:?}", other),
            }
        });
        assert_eq!(gateway.create_session().await.unwrap(), SessionId(42));
        native.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_session_fails_when_reply_dropped() {
        let (gateway, mut endpoint, _events) = connect(&PreloaderConfig::default());
        tokio::spawn(async move {
            // Receive and drop the reply sender.
            let _ = endpoint.recv_command().await;
        });
        assert!(gateway.create_session().await.is_err());
    }

    #[tokio::test]
    async fn test_zero_capacity_config_still_connects() {
        let config = PreloaderConfig::from_json(r#"{"command_capacity": 0, "event_capacity": 0}"#)
            .unwrap();
        assert_eq!(config.command_capacity, 0);

        let (gateway, mut endpoint, mut events) = connect(&config);
        gateway.clear_memory_cache().await.unwrap();
        assert!(matches!(
            endpoint.recv_command().await,
            Some(GatewayCommand::ClearMemoryCache)
        ));
        endpoint
            .publish(PipelineEvent::complete(SessionId(1), 1, 0))
            .await
            .unwrap();
        assert_eq!(events.recv().await, Some(PipelineEvent::complete(SessionId(1), 1, 0)));
    }

    #[tokio::test]
    async fn test_commands_fail_when_endpoint_dropped() {
        let (gateway, endpoint, _events) = connect(&PreloaderConfig::default());
        drop(endpoint);
        assert!(gateway.clear_disk_cache().await.is_err());
    }

    #[tokio::test]
    async fn test_publish_raw_decodes_before_sending() {
        let (_gateway, endpoint, mut events) = connect(&PreloaderConfig::default());
        endpoint
            .publish_raw("fffastimage-progress", r#"{"id":5,"finished":1,"total":4}"#)
            .await
            .unwrap();
        assert!(endpoint.publish_raw("bogus", "{}").await.is_err());
        assert_eq!(
            events.recv().await,
            Some(PipelineEvent::progress(SessionId(5), 1, 4))
        );
    }
}
