//! Submit Contact Form Use Case

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Local;
use platform::rate_limit::RateLimitStore;

use crate::application::config::FormsConfig;
use crate::application::guard::RequestGuard;
use crate::domain::messages::contact_notification;
use crate::domain::ports::Mailer;
use crate::domain::submissions::{ContactSubmission, FormFields};
use crate::error::{FormError, FormResult};

/// Input DTO for the contact form
#[derive(Debug, Clone)]
pub struct ContactInput {
    pub client_key: String,
    pub client_ip: IpAddr,
    pub csrf_token: Option<String>,
    pub fields: FormFields,
}

/// Submit Contact Form Use Case
pub struct SubmitContactUseCase<S, M> {
    guard: Arc<RequestGuard<S>>,
    mailer: Arc<M>,
    config: Arc<FormsConfig>,
}

impl<S, M> SubmitContactUseCase<S, M>
where
    S: RateLimitStore + Send + Sync,
    M: Mailer + Send + Sync,
{
    pub fn new(guard: Arc<RequestGuard<S>>, mailer: Arc<M>, config: Arc<FormsConfig>) -> Self {
        Self {
            guard,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: ContactInput) -> FormResult<()> {
        if !self.config.contact_missing.is_empty() {
            return Err(FormError::Configuration(self.config.contact_missing.clone()));
        }

        self.guard
            .admit(&input.client_key, &self.config.limits.contact)
            .await?;
        self.guard.verify_csrf(input.csrf_token.as_deref())?;

        let contact = ContactSubmission::parse(&input.fields)?;

        let mail = contact_notification(
            &self.config.admin_email,
            &contact,
            input.client_ip,
            Local::now().naive_local(),
        );
        self.mailer
            .send(&mail)
            .await
            .map_err(FormError::MailDelivery)?;

        tracing::info!(client_key = %input.client_key, "Contact message delivered");

        Ok(())
    }
}
