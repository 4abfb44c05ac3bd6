//! Mail relay client
//!
//! Delivers messages through a transactional mail HTTP API. The relay
//! receives one JSON document per message and answers with any 2xx.

use reqwest::Client;
use serde::Serialize;

use crate::domain::messages::{MailBody, MailMessage};
use crate::domain::ports::{Mailer, UpstreamError};
use crate::infra::connection_error;

const SERVICE: &str = "mail relay";

/// Sender identity shown to recipients
#[derive(Debug, Clone)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: Address<'a>,
    to: [Address<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Address<'a>>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

impl<'a> RelayPayload<'a> {
    fn new(sender: &'a Sender, message: &'a MailMessage) -> Self {
        let (text, html) = match &message.body {
            MailBody::Text(text) => (Some(text.as_str()), None),
            MailBody::Html(html) => (None, Some(html.as_str())),
        };

        Self {
            from: Address {
                email: &sender.email,
                name: Some(sender.name.as_str()).filter(|name| !name.is_empty()),
            },
            to: [Address {
                email: &message.to,
                name: None,
            }],
            reply_to: message.reply_to.as_deref().map(|email| Address { email, name: None }),
            subject: &message.subject,
            text,
            html,
        }
    }
}

/// HTTP mail relay
#[derive(Clone)]
pub struct HttpMailRelay {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    sender: Sender,
}

impl HttpMailRelay {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>, sender: Sender) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            sender,
        }
    }
}

impl std::fmt::Debug for HttpMailRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailRelay")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("sender", &self.sender)
            .finish()
    }
}

impl Mailer for HttpMailRelay {
    async fn send(&self, message: &MailMessage) -> Result<(), UpstreamError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&RelayPayload::new(&self.sender, message));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| connection_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), subject = %message.subject, "Mail relay rejected message");
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        tracing::debug!(subject = %message.subject, "Mail handed to relay");
        Ok(())
    }
}
