//! Outbound notification channels.
//!
//! Email goes through an [`EmailTransport`]; SMS and WhatsApp are mock
//! channels that only log. Every attempt yields a [`ChannelResult`] so a
//! failed delivery never aborts the caller.

mod outbox;
pub mod templates;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::intelligence::date::format_timestamp;

pub use outbox::OutboxTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelResult {
    pub channel: Channel,
    pub status: DeliveryStatus,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelResult {
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("could not write to mail outbox `{path}`: {source}")]
    Outbox {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Hands an email to the delivery system and returns its delivery id.
pub trait EmailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError>;
}

/// Fan-out point for all channels. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn EmailTransport>,
    from_address: String,
}

impl Notifier {
    pub fn new(transport: Arc<dyn EmailTransport>, from_address: &str) -> Self {
        Self {
            transport,
            from_address: from_address.to_string(),
        }
    }

    pub fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<String>,
        now: NaiveDateTime,
    ) -> ChannelResult {
        let message = EmailMessage {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text_body: text_body.to_string(),
            html_body,
        };
        match self.transport.send(&message) {
            Ok(delivery_id) => {
                info!(to, subject, %delivery_id, "email queued");
                ChannelResult {
                    channel: Channel::Email,
                    status: DeliveryStatus::Sent,
                    to: to.to_string(),
                    sent_at: Some(format_timestamp(&now)),
                    delivery_id: Some(delivery_id),
                    error: None,
                }
            }
            Err(error) => {
                warn!(to, subject, %error, "email delivery failed");
                ChannelResult {
                    channel: Channel::Email,
                    status: DeliveryStatus::Failed,
                    to: to.to_string(),
                    sent_at: None,
                    delivery_id: None,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    pub fn send_sms(&self, phone: &str, message: &str, now: NaiveDateTime) -> ChannelResult {
        info!(to = phone, body = message, "sms sent (mock)");
        mock_sent(Channel::Sms, phone, now)
    }

    pub fn send_whatsapp(&self, phone: &str, message: &str, now: NaiveDateTime) -> ChannelResult {
        info!(to = phone, body = message, "whatsapp sent (mock)");
        mock_sent(Channel::Whatsapp, phone, now)
    }
}

fn mock_sent(channel: Channel, to: &str, now: NaiveDateTime) -> ChannelResult {
    ChannelResult {
        channel,
        status: DeliveryStatus::Sent,
        to: to.to_string(),
        sent_at: Some(format_timestamp(&now)),
        delivery_id: None,
        error: None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use super::{DeliveryError, EmailMessage, EmailTransport};

    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<EmailMessage>>,
    }

    impl EmailTransport for RecordingTransport {
        fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
            let mut sent = self
                .sent
                .lock()
                .map_err(|_| DeliveryError::Rejected("poisoned".to_string()))?;
            sent.push(message.clone());
            Ok(format!("msg-{}", sent.len()))
        }
    }

    pub struct RejectingTransport;

    impl EmailTransport for RejectingTransport {
        fn send(&self, _message: &EmailMessage) -> Result<String, DeliveryError> {
            Err(DeliveryError::Rejected("relay unavailable".to_string()))
        }
    }

    pub fn recording() -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport::default())
    }
}
