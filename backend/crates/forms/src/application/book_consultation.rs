//! Book Consultation Use Case
//!
//! Validates the anamnesis form, schedules the video meeting and notifies
//! both the client and the practice. Once the meeting exists the booking
//! counts as successful; notification failures are logged only.

use std::sync::Arc;

use chrono::Local;
use platform::rate_limit::RateLimitStore;

use crate::application::config::FormsConfig;
use crate::application::guard::RequestGuard;
use crate::domain::messages::{booking_confirmation, booking_summary};
use crate::domain::ports::{Mailer, Meeting, MeetingProvider};
use crate::domain::submissions::{BookingSubmission, FormFields};
use crate::error::{FormError, FormResult};

/// Input DTO for the booking form
#[derive(Debug, Clone)]
pub struct BookingInput {
    pub client_key: String,
    pub csrf_token: Option<String>,
    pub fields: FormFields,
}

/// Output DTO for a completed booking
#[derive(Debug, Clone)]
pub struct BookingOutput {
    pub booking: BookingSubmission,
    pub meeting: Meeting,
}

/// Book Consultation Use Case
pub struct BookConsultationUseCase<S, M, P> {
    guard: Arc<RequestGuard<S>>,
    mailer: Arc<M>,
    meetings: Arc<P>,
    config: Arc<FormsConfig>,
}

impl<S, M, P> BookConsultationUseCase<S, M, P>
where
    S: RateLimitStore + Send + Sync,
    M: Mailer + Send + Sync,
    P: MeetingProvider + Send + Sync,
{
    pub fn new(
        guard: Arc<RequestGuard<S>>,
        mailer: Arc<M>,
        meetings: Arc<P>,
        config: Arc<FormsConfig>,
    ) -> Self {
        Self {
            guard,
            mailer,
            meetings,
            config,
        }
    }

    pub async fn execute(&self, input: BookingInput) -> FormResult<BookingOutput> {
        if !self.config.booking_missing.is_empty() {
            return Err(FormError::Configuration(self.config.booking_missing.clone()));
        }

        self.guard
            .admit(&input.client_key, &self.config.limits.booking)
            .await?;
        self.guard.verify_csrf(input.csrf_token.as_deref())?;

        let booking = BookingSubmission::parse(&input.fields, Local::now().date_naive())?;

        let meeting = self
            .meetings
            .create_meeting(&booking.meeting_request())
            .await
            .map_err(FormError::Meeting)?;

        tracing::info!(
            meeting_id = %meeting.id,
            starts_at = %booking.starts_at(),
            duration = booking.duration.minutes(),
            "Consultation booked"
        );

        let confirmation = booking_confirmation(&self.config.admin_email, &booking, &meeting);
        if let Err(e) = self.mailer.send(&confirmation).await {
            tracing::error!(meeting_id = %meeting.id, error = %e, "Failed to send booking confirmation");
        }

        let summary = booking_summary(&self.config.admin_email, &booking, &meeting);
        if let Err(e) = self.mailer.send(&summary).await {
            tracing::error!(meeting_id = %meeting.id, error = %e, "Failed to send booking summary");
        }

        Ok(BookingOutput { booking, meeting })
    }
}
