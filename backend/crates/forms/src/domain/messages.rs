//! Notification Mails
//!
//! Builders for every mail the endpoints send. Submission text is already
//! HTML-escaped by validation, so it is embedded as-is.

use std::fmt::Write;
use std::net::IpAddr;

use chrono::NaiveDateTime;

use crate::domain::ports::Meeting;
use crate::domain::submissions::{BookingSubmission, ContactSubmission};

/// Mail body flavour
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailBody {
    Text(String),
    Html(String),
}

impl MailBody {
    pub fn content(&self) -> &str {
        match self {
            Self::Text(body) | Self::Html(body) => body,
        }
    }
}

/// Outgoing mail; the sender address is configured on the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: MailBody,
}

/// Contact form notification for the practice
pub fn contact_notification(
    admin_email: &str,
    contact: &ContactSubmission,
    client_ip: IpAddr,
    sent_at: NaiveDateTime,
) -> MailMessage {
    let body = format!(
        "\nNeue Nachricht vom Kontaktformular\n\
         ===================================\n\n\
         Von: {name}\n\
         E-Mail: {email}\n\
         Betreff: {subject}\n\n\
         Nachricht:\n{message}\n\n\
         ---\n\
         Gesendet: {sent}\n\
         IP: {client_ip}\n",
        name = contact.name,
        email = contact.email,
        subject = contact.subject,
        message = contact.message,
        sent = sent_at.format("%d.%m.%Y %H:%M:%S"),
    );

    MailMessage {
        to: admin_email.to_string(),
        reply_to: Some(contact.email.clone()),
        subject: format!("Kontaktformular: {}", contact.subject),
        body: MailBody::Text(body),
    }
}

/// HTML booking confirmation for the client, replies go to the practice
pub fn booking_confirmation(
    admin_email: &str,
    booking: &BookingSubmission,
    meeting: &Meeting,
) -> MailMessage {
    let body = format!(
        r#"<!DOCTYPE html>
<html lang="de">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #2a700d; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }}
        .content {{ background-color: #f9fafb; padding: 30px; border-radius: 0 0 8px 8px; }}
        .meeting-details {{ background-color: white; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid #2a700d; }}
        .button {{ display: inline-block; background-color: #2a700d; color: white; padding: 12px 30px; text-decoration: none; border-radius: 6px; margin: 10px 0; }}
        .footer {{ text-align: center; margin-top: 30px; font-size: 12px; color: #666; }}
        strong {{ color: #2a700d; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Terminbestätigung</h1>
        </div>
        <div class="content">
            <p>Hallo {first_name},</p>
            <p>vielen Dank für dein Vertrauen! Dein Zoom-Erstgespräch wurde erfolgreich gebucht.</p>
            <div class="meeting-details">
                <h2 style="margin-top: 0; color: #2a700d;">Deine Termin-Details</h2>
                <p><strong>Datum:</strong> {date}</p>
                <p><strong>Uhrzeit:</strong> {time} Uhr</p>
                <p><strong>Dauer:</strong> {minutes} Minuten</p>
                <p><strong>Meeting-ID:</strong> {meeting_id}</p>
                <p><strong>Passcode:</strong> {password}</p>
            </div>
            <p><strong>So nimmst du am Meeting teil:</strong></p>
            <p>Klick zum gewählten Zeitpunkt einfach auf folgenden Link:</p>
            <p style="text-align: center;">
                <a href="{join_url}" class="button">Zum Zoom-Meeting</a>
            </p>
            <p style="font-size: 14px; color: #666;">
                Alternativ kannst du auch die Zoom-App öffnen und die Meeting-ID manuell eingeben.
            </p>
            <p><strong>Wichtige Hinweise:</strong></p>
            <ul>
                <li>Bitte stell sicher, dass du Zoom installiert hast oder nutze die Browser-Version</li>
                <li>Teste vorab deine Kamera und dein Mikrofon</li>
                <li>Such dir einen ruhigen Ort für das Gespräch</li>
            </ul>
            <p>Ich freue mich auf das Gespräch mit dir!</p>
            <p>Herzliche Grüße,<br>
            Stefanie von Wohlfühlgesundheit</p>
            <div class="footer">
                <p>Bei Fragen oder Änderungswünschen kontaktiere mich bitte unter:<br>
                <a href="mailto:{admin_email}">{admin_email}</a></p>
            </div>
        </div>
    </div>
</body>
</html>
"#,
        first_name = booking.first_name,
        date = booking.date.format("%d.%m.%Y"),
        time = booking.time.format("%H:%M"),
        minutes = booking.duration.minutes(),
        meeting_id = meeting.id,
        password = meeting.password,
        join_url = meeting.join_url,
    );

    MailMessage {
        to: booking.email.clone(),
        reply_to: Some(admin_email.to_string()),
        subject: "Terminbestätigung - Dein Zoom-Erstgespräch".to_string(),
        body: MailBody::Html(body),
    }
}

/// Plain-text anamnesis summary for the practice, replies go to the client
pub fn booking_summary(
    admin_email: &str,
    booking: &BookingSubmission,
    meeting: &Meeting,
) -> MailMessage {
    let p = &booking.personal;
    let h = &booking.health;
    let n = &booking.nutrition;
    let d = &booking.digestion;
    let r = &booking.readiness;
    let opt = |value: Option<u16>| value.map(|v| v.to_string()).unwrap_or_default();

    let mut body = String::new();
    let _ = write!(
        body,
        "Neue Anamnese und Terminbuchung\n\
         ================================\n\n\
         PERSÖNLICHE DATEN:\n\
         ------------------\n\
         Name: {name}\n\
         E-Mail: {email}\n\
         Telefon: {phone}\n\
         Adresse: {address}, {zip} {city}\n\n\
         Alter: {age}\n\
         Größe: {height} cm\n\
         Gewicht: {weight} kg\n\
         Familienstand: {marital}\n\
         Kinder im Haushalt: {children}\n\
         Beruf: {job}\n\n\
         Aufmerksam geworden durch: {referral}\n\
         Erwartungen: {expectations}\n\n",
        name = booking.full_name(),
        email = booking.email,
        phone = booking.phone,
        address = p.address,
        zip = p.postal_code,
        city = p.city,
        age = opt(p.age.map(u16::from)),
        height = opt(p.height_cm),
        weight = opt(p.weight_kg),
        marital = p.marital_status,
        children = p.children,
        job = p.occupation,
        referral = p.referral_source,
        expectations = p.expectations,
    );

    let _ = write!(
        body,
        "GESUNDHEITSINFORMATIONEN:\n\
         -------------------------\n\
         Hauptbeschwerde:\n{}\n\n\
         Weitere gesundheitliche Probleme:\n{}\n\n\
         Allergien:\n{}\n\n\
         Nahrungsmittelunverträglichkeiten:\n{}\n\n\
         Vorerkrankungen:\n{}\n\n\
         Aktuelle Medikamente:\n{}\n\n\
         Nahrungsergänzungsmittel:\n{}\n\n",
        booking.main_complaint,
        h.other_conditions,
        h.allergies,
        h.food_intolerances,
        h.pre_existing_conditions,
        h.medication,
        h.supplements,
    );

    let _ = write!(
        body,
        "ERNÄHRUNG & LEBENSSTIL:\n\
         -----------------------\n\
         Ernährungsform: {}\n\
         Details: {}\n\n\
         Mahlzeiten pro Tag: {}\n\
         Frühstück: {}\n\
         Mittagessen: {}\n\
         Abendessen: {}\n\
         Zwischenmahlzeiten: {}\n\n\
         Trinkmenge: {}\n\
         Getränke: {}\n\
         Alkoholkonsum: {}\n\
         Rauchen: {}\n\n\
         Sport/Bewegung: {}\n\
         Schlaf: {}\n\
         Stress: {}\n\n",
        n.diet,
        n.diet_details,
        n.meals_per_day,
        n.breakfast,
        n.lunch,
        n.dinner,
        n.snacks,
        n.fluid_intake,
        n.beverages,
        n.alcohol,
        n.smoking,
        n.exercise,
        n.sleep,
        n.stress,
    );

    let _ = write!(
        body,
        "VERDAUUNG & STUHLGANG:\n\
         ----------------------\n\
         Verdauung allgemein: {}\n\
         Stuhlgang-Häufigkeit: {}\n\
         Schmerzen beim Stuhlgang: {}\n\
         Auffälligkeiten: {}\n\
         Konsistenz: {}\n\
         Säuerlicher Geruch: {}\n\
         Winde riechen nach faulen Eiern: {}\n\n\
         BEREITSCHAFT:\n\
         -------------\n\
         Nahrungsergänzungsmittel einnehmen: {}\n\
         In sich investieren: {}\n\
         Lebensstil anpassen: {}\n\n\
         WEITERE ANMERKUNGEN:\n\
         --------------------\n\
         {}\n\n",
        d.general,
        d.stool_frequency,
        d.stool_pain,
        d.stool_abnormalities,
        d.stool_consistency,
        d.stool_sour_odor,
        d.flatulence_odor,
        r.supplements,
        r.investment,
        r.lifestyle,
        booking.notes,
    );

    let _ = write!(
        body,
        "TERMIN-DETAILS:\n\
         ---------------\n\
         Datum: {date}\n\
         Uhrzeit: {time} Uhr\n\
         Dauer: {minutes} Minuten\n\n\
         ZOOM-MEETING:\n\
         -------------\n\
         Meeting-ID: {id}\n\
         Passcode: {password}\n\n\
         Als Host teilnehmen:\n{start_url}\n\n\
         Meeting-Link für Teilnehmer:\n{join_url}\n\n\
         ================================\n\
         Automatische Benachrichtigung vom Anamnese-System\n",
        date = booking.date.format("%d.%m.%Y"),
        time = booking.time.format("%H:%M"),
        minutes = booking.duration.minutes(),
        id = meeting.id,
        password = meeting.password,
        start_url = meeting.start_url,
        join_url = meeting.join_url,
    );

    MailMessage {
        to: admin_email.to_string(),
        reply_to: Some(booking.email.clone()),
        subject: format!("Neue Anamnese & Terminbuchung: {}", booking.full_name()),
        body: MailBody::Text(body),
    }
}
