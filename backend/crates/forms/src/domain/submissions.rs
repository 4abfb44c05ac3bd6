//! Form Submissions
//!
//! Typed records built from the raw url-encoded form fields. Parsing runs
//! every field rule and collects all rejected fields into one
//! [`InvalidSubmission`] instead of stopping at the first problem.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use kernel::error::app_error::FieldIssue;
use platform::validation::{
    FieldError, FieldResult, optional, required, validate_age, validate_date_on, validate_email,
    validate_height, validate_phone, validate_text, validate_time, validate_weight,
};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::ports::MeetingRequest;

pub const NAME_MAX_LENGTH: usize = 100;
pub const SUBJECT_MAX_LENGTH: usize = 200;
pub const MESSAGE_MAX_LENGTH: usize = 5000;
pub const PHONE_MIN_LENGTH: usize = 6;
pub const PHONE_MAX_LENGTH: usize = 20;
pub const ADDRESS_MAX_LENGTH: usize = 200;
pub const ZIP_MAX_LENGTH: usize = 10;
pub const CITY_MAX_LENGTH: usize = 100;
pub const JOB_MAX_LENGTH: usize = 200;
pub const SHORT_TEXT_MAX_LENGTH: usize = 50;
pub const HEALTH_TEXT_MAX_LENGTH: usize = 2000;
pub const LIFESTYLE_TEXT_MAX_LENGTH: usize = 1000;
pub const READINESS_TEXT_MAX_LENGTH: usize = 500;
pub const NOTES_MAX_LENGTH: usize = 3000;

pub const DEFAULT_CONTACT_SUBJECT: &str = "Neue Nachricht von der Website";

pub const MEETING_TIMEZONE: &str = "Europe/Berlin";
pub const MEETING_AGENDA: &str = "Anamnesegespräch - Holistische Darmtherapie";

const CONTACT_MISSING_FIELDS: &str = "Bitte fülle alle Pflichtfelder aus.";
const CONTACT_INVALID_FIELDS: &str = "Ungültige Eingabedaten. Bitte überprüfe deine Angaben.";

// ============================================================================
// Raw input
// ============================================================================

/// Raw url-encoded form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Rejected submission with every offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{summary}")]
pub struct InvalidSubmission {
    /// One-line message for clients that show a single notice
    pub summary: Cow<'static, str>,
    pub issues: Vec<FieldIssue>,
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: &'static str, message: impl Into<Cow<'static, str>>) {
        self.0.push(FieldIssue::new(field, message));
    }

    fn check<T>(&mut self, field: &'static str, result: FieldResult<T>) -> Option<T> {
        self.check_with(field, result, |e| e.to_string())
    }

    fn check_with<T, M>(
        &mut self,
        field: &'static str,
        result: FieldResult<T>,
        message: impl FnOnce(&FieldError) -> M,
    ) -> Option<T>
    where
        M: Into<Cow<'static, str>>,
    {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(field, message(&e));
                None
            }
        }
    }

    /// Present, non-blank raw value or a "Pflichtfeld fehlt" issue
    fn require<'a>(&mut self, fields: &'a FormFields, field: &'static str, label: &str) -> Option<&'a str> {
        self.check_with(field, required(fields.get(field)), |_| {
            format!("Pflichtfeld fehlt: {label}")
        })
    }

    /// Optional text, empty when absent
    fn text(&mut self, fields: &FormFields, field: &'static str, max: usize) -> String {
        self.check(field, optional(fields.get(field), |raw| validate_text(raw, max)))
            .flatten()
            .unwrap_or_default()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_error(self, summary: impl Into<Cow<'static, str>>) -> InvalidSubmission {
        InvalidSubmission {
            summary: summary.into(),
            issues: self.0,
        }
    }

    /// Error summarized by the first issue
    fn into_first_error(self) -> InvalidSubmission {
        let summary = self
            .0
            .first()
            .map(|issue| issue.message.clone())
            .unwrap_or(Cow::Borrowed(CONTACT_INVALID_FIELDS));
        self.into_error(summary)
    }
}

// ============================================================================
// Contact
// ============================================================================

/// Validated contact form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactSubmission {
    pub fn parse(fields: &FormFields) -> Result<Self, InvalidSubmission> {
        let mut missing = Issues::default();
        for field in ["name", "email", "message"] {
            missing.check(field, required(fields.get(field)));
        }
        if !missing.is_empty() {
            return Err(missing.into_error(CONTACT_MISSING_FIELDS));
        }

        let raw = |field| fields.get(field).unwrap_or_default();
        let mut issues = Issues::default();

        let name = issues.check("name", validate_text(raw("name"), NAME_MAX_LENGTH));
        let email = issues.check("email", validate_email(raw("email")));
        let subject = issues.check(
            "subject",
            optional(fields.get("subject"), |s| validate_text(s, SUBJECT_MAX_LENGTH)),
        );
        let message = issues.check("message", validate_text(raw("message"), MESSAGE_MAX_LENGTH));

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) => Ok(Self {
                name,
                email,
                subject: subject.unwrap_or_else(|| DEFAULT_CONTACT_SUBJECT.to_string()),
                message,
            }),
            _ => Err(issues.into_error(CONTACT_INVALID_FIELDS)),
        }
    }
}

// ============================================================================
// Booking
// ============================================================================

/// Length of the initial consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetingDuration {
    Short,
    #[default]
    Standard,
}

impl MeetingDuration {
    /// `30` selects the short slot; anything else is the standard hour
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("30") => Self::Short,
            _ => Self::Standard,
        }
    }

    pub fn minutes(self) -> u16 {
        match self {
            Self::Short => 30,
            Self::Standard => 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalDetails {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub age: Option<u8>,
    pub height_cm: Option<u16>,
    pub weight_kg: Option<u16>,
    pub marital_status: String,
    pub children: String,
    pub occupation: String,
    pub referral_source: String,
    pub expectations: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthDetails {
    pub other_conditions: String,
    pub allergies: String,
    pub food_intolerances: String,
    pub pre_existing_conditions: String,
    pub medication: String,
    pub supplements: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NutritionDetails {
    pub diet: String,
    pub diet_details: String,
    pub meals_per_day: String,
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
    pub snacks: String,
    pub fluid_intake: String,
    pub beverages: String,
    pub alcohol: String,
    pub smoking: String,
    pub exercise: String,
    pub sleep: String,
    pub stress: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestionDetails {
    pub general: String,
    pub stool_frequency: String,
    pub stool_pain: String,
    pub stool_abnormalities: String,
    pub stool_consistency: String,
    pub stool_sour_odor: String,
    pub flatulence_odor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    pub supplements: String,
    pub investment: String,
    pub lifestyle: String,
}

/// Validated anamnesis and booking form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub main_complaint: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: MeetingDuration,
    pub personal: PersonalDetails,
    pub health: HealthDetails,
    pub nutrition: NutritionDetails,
    pub digestion: DigestionDetails,
    pub readiness: Readiness,
    pub notes: String,
}

impl BookingSubmission {
    /// Parse against `today`; the appointment date must lie after it
    pub fn parse(fields: &FormFields, today: NaiveDate) -> Result<Self, InvalidSubmission> {
        let mut issues = Issues::default();

        // Required fields
        let name_too_long = |_: &FieldError| "Vor- und Nachname dürfen maximal 100 Zeichen lang sein.";

        let first_name = issues.require(fields, "vorname", "Vorname").and_then(|raw| {
            issues.check_with("vorname", validate_text(raw, NAME_MAX_LENGTH), name_too_long)
        });
        let last_name = issues.require(fields, "nachname", "Nachname").and_then(|raw| {
            issues.check_with("nachname", validate_text(raw, NAME_MAX_LENGTH), name_too_long)
        });
        let email = issues
            .require(fields, "email", "E-Mail-Adresse")
            .and_then(|raw| issues.check("email", validate_email(raw)));
        let phone = issues
            .require(fields, "telefon", "Telefonnummer")
            .and_then(|raw| {
                issues.check("telefon", validate_phone(raw, PHONE_MIN_LENGTH, PHONE_MAX_LENGTH))
            });
        let main_complaint = issues
            .require(fields, "hauptbeschwerde", "Hauptbeschwerde")
            .and_then(|raw| {
                issues.check_with(
                    "hauptbeschwerde",
                    validate_text(raw, HEALTH_TEXT_MAX_LENGTH),
                    |_| "Hauptbeschwerde darf maximal 2000 Zeichen lang sein.",
                )
            });
        let date = issues.require(fields, "datum", "Datum").and_then(|raw| {
            issues.check_with("datum", validate_date_on(raw, true, today), |_| {
                "Ungültiges Datum. Das Datum muss in der Zukunft liegen."
            })
        });
        let time = issues
            .require(fields, "uhrzeit", "Uhrzeit")
            .and_then(|raw| issues.check("uhrzeit", validate_time(raw)));

        // Personal data
        let personal = PersonalDetails {
            address: issues.text(fields, "adresse", ADDRESS_MAX_LENGTH),
            postal_code: issues.text(fields, "plz", ZIP_MAX_LENGTH),
            city: issues.text(fields, "ort", CITY_MAX_LENGTH),
            age: issues
                .check_with("alter", optional(fields.get("alter"), validate_age), |_| {
                    "Ungültiges Alter (0-150 Jahre)."
                })
                .flatten(),
            height_cm: issues
                .check_with("groesse", optional(fields.get("groesse"), validate_height), |_| {
                    "Ungültige Größe (50-250 cm)."
                })
                .flatten(),
            weight_kg: issues
                .check_with("gewicht", optional(fields.get("gewicht"), validate_weight), |_| {
                    "Ungültiges Gewicht (20-300 kg)."
                })
                .flatten(),
            marital_status: issues.text(fields, "familienstand", SHORT_TEXT_MAX_LENGTH),
            children: issues.text(fields, "kinder", SHORT_TEXT_MAX_LENGTH),
            occupation: issues.text(fields, "beruf", JOB_MAX_LENGTH),
            referral_source: issues.text(fields, "aufmerksam_durch", JOB_MAX_LENGTH),
            expectations: issues.text(fields, "erwartungen", HEALTH_TEXT_MAX_LENGTH),
        };

        let health = HealthDetails {
            other_conditions: issues.text(fields, "gesundheitsprobleme", HEALTH_TEXT_MAX_LENGTH),
            allergies: issues.text(fields, "allergien", HEALTH_TEXT_MAX_LENGTH),
            food_intolerances: issues.text(
                fields,
                "nahrungsmittelunvertraeglichkeiten",
                HEALTH_TEXT_MAX_LENGTH,
            ),
            pre_existing_conditions: issues.text(fields, "vorerkrankungen", HEALTH_TEXT_MAX_LENGTH),
            medication: issues.text(fields, "medikamente", HEALTH_TEXT_MAX_LENGTH),
            supplements: issues.text(fields, "nahrungsergaenzungsmittel", HEALTH_TEXT_MAX_LENGTH),
        };

        let lifestyle = LIFESTYLE_TEXT_MAX_LENGTH;
        let nutrition = NutritionDetails {
            diet: issues.text(fields, "ernaehrung", lifestyle),
            diet_details: issues.text(fields, "ernaehrung_details", lifestyle),
            meals_per_day: issues.text(fields, "mahlzeiten_pro_tag", lifestyle),
            breakfast: issues.text(fields, "fruehstueck", lifestyle),
            lunch: issues.text(fields, "mittag", lifestyle),
            dinner: issues.text(fields, "abend", lifestyle),
            snacks: issues.text(fields, "zwischenmahlzeiten", lifestyle),
            fluid_intake: issues.text(fields, "trinkmenge", lifestyle),
            beverages: issues.text(fields, "getraenke", lifestyle),
            alcohol: issues.text(fields, "alkohol", lifestyle),
            smoking: issues.text(fields, "rauchen", lifestyle),
            exercise: issues.text(fields, "sport", lifestyle),
            sleep: issues.text(fields, "schlaf", lifestyle),
            stress: issues.text(fields, "stress", lifestyle),
        };

        let digestion = DigestionDetails {
            general: issues.text(fields, "verdauung", lifestyle),
            stool_frequency: issues.text(fields, "stuhlgang_haeufigkeit", lifestyle),
            stool_pain: issues.text(fields, "stuhlgang_schmerzen", lifestyle),
            stool_abnormalities: issues.text(fields, "stuhlgang_auffaelligkeiten", lifestyle),
            stool_consistency: issues.text(fields, "stuhlgang_konsistenz", lifestyle),
            stool_sour_odor: issues.text(fields, "stuhlgang_geruch_saeuerlich", lifestyle),
            flatulence_odor: issues.text(fields, "winde_geruch", lifestyle),
        };

        let readiness = Readiness {
            supplements: issues.text(
                fields,
                "bereitschaft_nahrungsergaenzung",
                READINESS_TEXT_MAX_LENGTH,
            ),
            investment: issues.text(fields, "bereitschaft_investieren", READINESS_TEXT_MAX_LENGTH),
            lifestyle: issues.text(fields, "bereitschaft_lebensstil", READINESS_TEXT_MAX_LENGTH),
        };

        let notes = issues.text(fields, "anmerkungen", NOTES_MAX_LENGTH);
        let duration = MeetingDuration::from_raw(fields.get("dauer"));

        // Consent
        if required(fields.get("datenschutz")).is_err() {
            issues.push("datenschutz", "Bitte akzeptiere die Datenschutzerklärung.");
        }

        match (first_name, last_name, email, phone, main_complaint, date, time) {
            (
                Some(first_name),
                Some(last_name),
                Some(email),
                Some(phone),
                Some(main_complaint),
                Some(date),
                Some(time),
            ) if issues.is_empty() => Ok(Self {
                first_name,
                last_name,
                email,
                phone,
                main_complaint,
                date,
                time,
                duration,
                personal,
                health,
                nutrition,
                digestion,
                readiness,
                notes,
            }),
            _ => Err(issues.into_first_error()),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Meeting to schedule for this booking
    pub fn meeting_request(&self) -> MeetingRequest {
        MeetingRequest {
            topic: format!("Erstgespräch: {}", self.full_name()),
            start_time: self.starts_at(),
            duration_minutes: self.duration.minutes(),
            timezone: MEETING_TIMEZONE.to_string(),
            agenda: MEETING_AGENDA.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn booking_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("vorname", "Anna"),
            ("nachname", "Muster"),
            ("email", "anna@example.de"),
            ("telefon", "+49 30 1234567"),
            ("hauptbeschwerde", "Blähungen"),
            ("datum", "2025-06-20"),
            ("uhrzeit", "10:30"),
            ("datenschutz", "on"),
        ]
    }

    fn with(extra: &[(&'static str, &str)]) -> FormFields {
        let mut fields: Vec<(&str, &str)> = booking_fields();
        for &(key, value) in extra {
            fields.retain(|&(k, _)| k != key);
            fields.push((key, value));
        }
        fields.into_iter().collect()
    }

    fn issue_fields(err: &InvalidSubmission) -> Vec<&str> {
        err.issues.iter().map(|i| i.field.as_ref()).collect()
    }

    #[test]
    fn test_contact_valid() {
        let fields: FormFields = [
            ("name", " Max <Muster> "),
            ("email", "max@example.de"),
            ("message", "Hallo"),
        ]
        .into_iter()
        .collect();

        let contact = ContactSubmission::parse(&fields).unwrap();
        assert_eq!(contact.name, "Max &lt;Muster&gt;");
        assert_eq!(contact.subject, DEFAULT_CONTACT_SUBJECT);
    }

    #[test]
    fn test_contact_missing_fields() {
        let fields: FormFields = [("name", "Max"), ("message", "  ")].into_iter().collect();
        let err = ContactSubmission::parse(&fields).unwrap_err();
        assert_eq!(err.summary, "Bitte fülle alle Pflichtfelder aus.");
        assert_eq!(issue_fields(&err), vec!["email", "message"]);
    }

    #[test]
    fn test_contact_invalid_fields() {
        let long_subject = "s".repeat(SUBJECT_MAX_LENGTH + 1);
        let fields: FormFields = [
            ("name", "Max"),
            ("email", "kein-mail"),
            ("subject", long_subject.as_str()),
            ("message", "Hallo"),
        ]
        .into_iter()
        .collect();

        let err = ContactSubmission::parse(&fields).unwrap_err();
        assert_eq!(err.summary, "Ungültige Eingabedaten. Bitte überprüfe deine Angaben.");
        assert_eq!(issue_fields(&err), vec!["email", "subject"]);
    }

    #[test]
    fn test_booking_minimal() {
        let booking = BookingSubmission::parse(&with(&[]), today()).unwrap();
        assert_eq!(booking.full_name(), "Anna Muster");
        assert_eq!(booking.date, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
        assert_eq!(booking.duration, MeetingDuration::Standard);
        assert_eq!(booking.personal, PersonalDetails::default());
        assert_eq!(booking.notes, "");
    }

    #[test]
    fn test_booking_optional_fields() {
        let booking = BookingSubmission::parse(
            &with(&[
                ("alter", "42"),
                ("groesse", "172"),
                ("gewicht", ""),
                ("allergien", "Pollen & Nüsse"),
                ("dauer", "30"),
            ]),
            today(),
        )
        .unwrap();

        assert_eq!(booking.personal.age, Some(42));
        assert_eq!(booking.personal.height_cm, Some(172));
        assert_eq!(booking.personal.weight_kg, None);
        assert_eq!(booking.health.allergies, "Pollen &amp; Nüsse");
        assert_eq!(booking.duration.minutes(), 30);
    }

    #[test]
    fn test_booking_collects_all_errors() {
        let err = BookingSubmission::parse(
            &with(&[
                ("email", "nope"),
                ("datum", "2025-06-15"),
                ("alter", "200"),
                ("datenschutz", ""),
            ]),
            today(),
        )
        .unwrap_err();

        assert_eq!(issue_fields(&err), vec!["email", "datum", "alter", "datenschutz"]);
        assert_eq!(err.summary, "Ungültige E-Mail-Adresse.");
    }

    #[test]
    fn test_booking_missing_required_labels() {
        let fields: FormFields = [("datenschutz", "on")].into_iter().collect();
        let err = BookingSubmission::parse(&fields, today()).unwrap_err();

        assert_eq!(err.issues.len(), 7);
        assert_eq!(err.summary, "Pflichtfeld fehlt: Vorname");
        assert_eq!(err.issues[2].message, "Pflichtfeld fehlt: E-Mail-Adresse");
    }

    #[test]
    fn test_booking_field_specific_messages() {
        let long_name = "a".repeat(NAME_MAX_LENGTH + 1);
        let err = BookingSubmission::parse(
            &with(&[("vorname", long_name.as_str()), ("uhrzeit", "25:00")]),
            today(),
        )
        .unwrap_err();

        assert_eq!(
            err.issues[0].message,
            "Vor- und Nachname dürfen maximal 100 Zeichen lang sein."
        );
        assert_eq!(
            err.issues[1].message,
            "Ungültiges Uhrzeitformat. Bitte verwende HH:MM Format."
        );
    }

    #[test]
    fn test_duration_fallback() {
        assert_eq!(MeetingDuration::from_raw(Some("30")), MeetingDuration::Short);
        assert_eq!(MeetingDuration::from_raw(Some("60")), MeetingDuration::Standard);
        assert_eq!(MeetingDuration::from_raw(Some("45")), MeetingDuration::Standard);
        assert_eq!(MeetingDuration::from_raw(None), MeetingDuration::Standard);
    }

    #[test]
    fn test_meeting_request() {
        let booking = BookingSubmission::parse(&with(&[]), today()).unwrap();
        let request = booking.meeting_request();

        assert_eq!(request.topic, "Erstgespräch: Anna Muster");
        assert_eq!(
            request.start_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2025-06-20T10:30:00"
        );
        assert_eq!(request.duration_minutes, 60);
        assert_eq!(request.timezone, "Europe/Berlin");
        assert_eq!(request.agenda, MEETING_AGENDA);
    }
}
