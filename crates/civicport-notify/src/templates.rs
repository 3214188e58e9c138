//! Message templates — one builder per lifecycle event

use crate::channel::{Notification, NotificationKind};
use chrono::{DateTime, Utc};
use civicport_core::{Appointment, DocumentRecord, Issue, Profile};

fn slot(ts: &DateTime<Utc>) -> String {
    ts.format("%A %B %-d, %Y at %H:%M UTC").to_string()
}

fn service_label(code: &str) -> &str {
    match code {
        "permits" => "Permits & Zoning",
        "licensing" => "Licensing",
        "records" => "Vital Records",
        "inspections" => "Inspections",
        "general" => "General Services",
        other => other,
    }
}

pub fn appointment_confirmed(
    appointment: &Appointment,
    profile: &Profile,
    qr_data_url: &str,
) -> Notification {
    let when = slot(&appointment.scheduled_at);
    let service = service_label(&appointment.service);
    Notification {
        kind: NotificationKind::AppointmentConfirmed,
        to_phone: profile.phone.clone(),
        to_email: Some(profile.email.clone()),
        subject: format!("Appointment confirmed: {service}"),
        sms_body: format!(
            "Your {service} appointment is booked for {when} at {}. Ref {}.",
            appointment.location, appointment.id
        ),
        html_body: format!(
            "<p>Hello {},</p>\
             <p>Your <strong>{service}</strong> appointment is booked for \
             <strong>{when}</strong> at {}.</p>\
             <p>Present this code at the front desk:</p>\
             <p><img src=\"{qr_data_url}\" alt=\"appointment QR code\" width=\"240\"/></p>\
             <p>Reference: {}</p>",
            profile.full_name, appointment.location, appointment.id
        ),
    }
}

pub fn appointment_cancelled(appointment: &Appointment, profile: &Profile) -> Notification {
    let when = slot(&appointment.scheduled_at);
    let service = service_label(&appointment.service);
    Notification {
        kind: NotificationKind::AppointmentCancelled,
        to_phone: profile.phone.clone(),
        to_email: Some(profile.email.clone()),
        subject: format!("Appointment cancelled: {service}"),
        sms_body: format!(
            "Your {service} appointment for {when} has been cancelled. Ref {}.",
            appointment.id
        ),
        html_body: format!(
            "<p>Hello {},</p>\
             <p>Your <strong>{service}</strong> appointment for {when} at {} has been \
             cancelled. You can book a new slot at any time.</p>",
            profile.full_name, appointment.location
        ),
    }
}

pub fn appointment_reminder(appointment: &Appointment, profile: &Profile) -> Notification {
    let when = slot(&appointment.scheduled_at);
    let service = service_label(&appointment.service);
    Notification {
        kind: NotificationKind::AppointmentReminder,
        to_phone: profile.phone.clone(),
        to_email: Some(profile.email.clone()),
        subject: format!("Reminder: {service} appointment"),
        sms_body: format!(
            "Reminder: {service} appointment {when} at {}. Ref {}.",
            appointment.location, appointment.id
        ),
        html_body: format!(
            "<p>Hello {},</p>\
             <p>A reminder that your <strong>{service}</strong> appointment is \
             <strong>{when}</strong> at {}.</p>",
            profile.full_name, appointment.location
        ),
    }
}

pub fn issue_update(issue: &Issue, profile: &Profile, note: Option<&str>) -> Notification {
    let status = issue.status.as_str().replace('_', " ");
    let sms_note = note.map(|n| format!(" {n}")).unwrap_or_default();
    let html_note = note
        .map(|n| format!("<p>Note from the reviewing officer: {n}</p>"))
        .unwrap_or_default();
    Notification {
        kind: NotificationKind::IssueUpdate,
        to_phone: profile.phone.clone(),
        to_email: Some(profile.email.clone()),
        subject: format!("Issue update: {}", issue.title),
        sms_body: format!("Your report \"{}\" is now {status}.{sms_note}", issue.title),
        html_body: format!(
            "<p>Hello {},</p>\
             <p>Your report <strong>{}</strong> is now <strong>{status}</strong>.</p>{html_note}",
            profile.full_name, issue.title
        ),
    }
}

pub fn document_reviewed(document: &DocumentRecord, profile: &Profile) -> Notification {
    let decision = document.status.as_str();
    let note = document
        .review_note
        .as_deref()
        .map(|n| format!("<p>Reviewer note: {n}</p>"))
        .unwrap_or_default();
    Notification {
        kind: NotificationKind::DocumentReviewed,
        to_phone: profile.phone.clone(),
        to_email: Some(profile.email.clone()),
        subject: format!("Document {decision}: {}", document.kind),
        sms_body: format!("Your {} document was {decision}.", document.kind),
        html_body: format!(
            "<p>Hello {},</p>\
             <p>Your <strong>{}</strong> document was <strong>{decision}</strong>.</p>{note}",
            profile.full_name, document.kind
        ),
    }
}
