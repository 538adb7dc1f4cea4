//! Message receiver with polling.

use crate::client::WhatsAppClient;
use crate::error::WhatsAppError;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error, warn};

/// Message receiver that polls the gateway for new messages.
pub struct MessageReceiver {
    client: WhatsAppClient,
    poll_interval: Duration,
}

impl MessageReceiver {
    /// Create a new message receiver.
    pub fn new(client: WhatsAppClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Start receiving messages as an async stream.
    pub fn stream(self) -> impl Stream<Item = IncomingMessage> {
        async_stream::stream! {
            loop {
                match self.client.receive().await {
                    Ok(messages) => {
                        for msg in messages {
                            debug!("Received: {} from {}",
                                msg.body.chars().take(50).collect::<String>(),
                                msg.from.as_deref().unwrap_or("?")
                            );
                            yield msg;
                        }
                    }
                    Err(WhatsAppError::NotConnected) => {
                        warn!("Gateway session not connected, waiting for pairing");
                        sleep(Duration::from_secs(10)).await;
                        continue;
                    }
                    Err(e) => {
                        error!("Receive error: {}", e);
                        // Back off on error
                        sleep(Duration::from_secs(5)).await;
                        continue;
                    }
                }

                sleep(self.poll_interval).await;
            }
        }
    }
}
