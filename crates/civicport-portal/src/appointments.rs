//! Appointment booking and lifecycle

use crate::access::{require, Permission};
use crate::sessions::{load_profile, Identity};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use civicport_backend::BackendClient;
use civicport_core::{
    new_entity_id, Appointment, AppointmentStatus, Error, Result, Role,
};
use civicport_notify::{qr, templates, DispatchReport, Dispatcher, QrPayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const APPOINTMENT_TABLE: &str = "appointments";

/// A bookable service line.
pub struct ServiceDef {
    pub code: &'static str,
    pub name: &'static str,
    pub slot_minutes: u32,
}

pub const SERVICES: &[ServiceDef] = &[
    ServiceDef { code: "permits", name: "Permits & Zoning", slot_minutes: 30 },
    ServiceDef { code: "licensing", name: "Licensing", slot_minutes: 30 },
    ServiceDef { code: "records", name: "Vital Records", slot_minutes: 30 },
    ServiceDef { code: "inspections", name: "Inspections", slot_minutes: 30 },
    ServiceDef { code: "general", name: "General Services", slot_minutes: 30 },
];

pub fn service_by_code(code: &str) -> Option<&'static ServiceDef> {
    SERVICES.iter().find(|s| s.code == code)
}

/// Slots align to the half hour, inside office hours, in the future.
pub fn validate_slot(slot: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if slot <= now {
        return Err(Error::invalid_input("slot must be in the future"));
    }
    if slot.second() != 0 || slot.nanosecond() != 0 || slot.minute() % 30 != 0 {
        return Err(Error::invalid_input("slot must start on the half hour"));
    }
    if matches!(slot.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(Error::invalid_input("offices are closed on weekends"));
    }
    // last bookable slot starts 16:30, ends at close
    if slot.hour() < 8 || slot.hour() >= 17 {
        return Err(Error::invalid_input("office hours are 08:00-17:00 UTC"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub service: String,
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
}

#[derive(Serialize)]
struct NewAppointmentRow<'a> {
    id: &'a str,
    citizen_id: &'a str,
    service: &'a str,
    scheduled_at: DateTime<Utc>,
    location: &'a str,
    status: AppointmentStatus,
    created_at: DateTime<Utc>,
}

pub struct AppointmentService {
    backend: Arc<BackendClient>,
    dispatcher: Arc<Dispatcher>,
    qr_secret: Vec<u8>,
    qr_module_size: u32,
}

impl AppointmentService {
    pub fn new(
        backend: Arc<BackendClient>,
        dispatcher: Arc<Dispatcher>,
        qr_secret: impl Into<Vec<u8>>,
        qr_module_size: u32,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            qr_secret: qr_secret.into(),
            qr_module_size,
        }
    }

    /// Book a slot for the calling citizen. The booking stands even when
    /// every notification channel fails; the report says what went out.
    pub async fn book(
        &self,
        actor: &Identity,
        request: BookingRequest,
    ) -> Result<(Appointment, DispatchReport)> {
        require(actor.role(), Permission::BookAppointment)?;

        let service = service_by_code(&request.service)
            .ok_or_else(|| Error::invalid_input(format!("unknown service: {}", request.service)))?;
        validate_slot(request.scheduled_at, Utc::now())?;
        if request.location.trim().is_empty() {
            return Err(Error::invalid_input("location is required"));
        }

        // one party per slot per location
        let clashes = self
            .backend
            .from(APPOINTMENT_TABLE)
            .eq("scheduled_at", request.scheduled_at.to_rfc3339())
            .eq("location", &request.location)
            .neq("status", AppointmentStatus::Cancelled.as_str())
            .fetch::<Appointment>()
            .await?;
        if !clashes.is_empty() {
            return Err(Error::invalid_input("slot is already booked"));
        }

        let id = new_entity_id();
        let row = NewAppointmentRow {
            id: &id,
            citizen_id: actor.user_id().as_str(),
            service: service.code,
            scheduled_at: request.scheduled_at,
            location: &request.location,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        };
        let mut inserted: Vec<Appointment> =
            self.backend.insert(APPOINTMENT_TABLE, &[row]).await?;
        if inserted.is_empty() {
            return Err(Error::Internal("insert returned no row".to_string()));
        }
        let appointment = inserted.swap_remove(0);
        info!(
            "Appointment {} booked: {} at {} ({})",
            appointment.id, appointment.service, appointment.scheduled_at, appointment.location
        );

        let report = self.send_confirmation(actor, &appointment).await;
        Ok((appointment, report))
    }

    async fn send_confirmation(&self, actor: &Identity, appointment: &Appointment) -> DispatchReport {
        let payload = QrPayload::sign(appointment, &self.qr_secret);
        let data_url = match qr::render_data_url(&payload, self.qr_module_size) {
            Ok(url) => url,
            Err(e) => {
                warn!("QR render failed for {}: {e}", appointment.id);
                String::new()
            }
        };
        let notification =
            templates::appointment_confirmed(appointment, &actor.profile, &data_url);
        self.dispatcher.dispatch(&notification).await
    }

    pub async fn get(&self, actor: &Identity, id: &str) -> Result<Appointment> {
        let appointment = self
            .backend
            .from(APPOINTMENT_TABLE)
            .eq("id", id)
            .fetch_one::<Appointment>()
            .await?
            .ok_or_else(|| Error::not_found("appointment", id))?;
        self.check_visibility(actor, &appointment)?;
        Ok(appointment)
    }

    fn check_visibility(&self, actor: &Identity, appointment: &Appointment) -> Result<()> {
        if actor.role().is_staff() || appointment.citizen_id == *actor.user_id() {
            Ok(())
        } else {
            Err(Error::not_found("appointment", &appointment.id))
        }
    }

    /// Citizens see their own; staff see everything, newest first. The day
    /// filter narrows to one day's schedule for the front-desk view.
    pub async fn list_for(
        &self,
        actor: &Identity,
        status: Option<AppointmentStatus>,
        day: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>> {
        let mut query = self
            .backend
            .from(APPOINTMENT_TABLE)
            .order("scheduled_at", false);
        if actor.role() == Role::Citizen {
            require(actor.role(), Permission::ViewOwnAppointments)?;
            query = query.eq("citizen_id", actor.user_id());
        }
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        if let Some(day) = day {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            let end = day
                .succ_opt()
                .ok_or_else(|| Error::invalid_input("day is out of range"))?
                .and_time(NaiveTime::MIN)
                .and_utc();
            query = query
                .gte("scheduled_at", start.to_rfc3339())
                .lt("scheduled_at", end.to_rfc3339());
        }
        query.fetch::<Appointment>().await
    }

    /// Owner or staff; only bookings that have not run yet.
    pub async fn cancel(
        &self,
        actor: &Identity,
        id: &str,
    ) -> Result<(Appointment, DispatchReport)> {
        let appointment = self.get(actor, id).await?;
        let owns = appointment.citizen_id == *actor.user_id();
        if !owns {
            require(actor.role(), Permission::ManageAppointments)?;
        }
        if !appointment.status.cancellable() {
            return Err(Error::invalid_input(format!(
                "cannot cancel a {} appointment",
                appointment.status.as_str()
            )));
        }

        let appointment = self
            .set_status(id, AppointmentStatus::Cancelled, None)
            .await?;

        let report = match load_profile(&self.backend, &appointment.citizen_id).await {
            Some(profile) => {
                let n = templates::appointment_cancelled(&appointment, &profile);
                self.dispatcher.dispatch(&n).await
            }
            None => DispatchReport::default(),
        };
        Ok((appointment, report))
    }

    pub async fn confirm(&self, actor: &Identity, id: &str) -> Result<Appointment> {
        require(actor.role(), Permission::ManageAppointments)?;
        let appointment = self.get(actor, id).await?;
        if appointment.status != AppointmentStatus::Pending {
            return Err(Error::invalid_input(format!(
                "only pending appointments can be confirmed, this one is {}",
                appointment.status.as_str()
            )));
        }
        self.set_status(id, AppointmentStatus::Confirmed, Some(actor))
            .await
    }

    pub async fn complete(&self, actor: &Identity, id: &str) -> Result<Appointment> {
        self.close_out(actor, id, AppointmentStatus::Completed).await
    }

    pub async fn mark_no_show(&self, actor: &Identity, id: &str) -> Result<Appointment> {
        self.close_out(actor, id, AppointmentStatus::NoShow).await
    }

    async fn close_out(
        &self,
        actor: &Identity,
        id: &str,
        to: AppointmentStatus,
    ) -> Result<Appointment> {
        require(actor.role(), Permission::ManageAppointments)?;
        let appointment = self.get(actor, id).await?;
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(Error::invalid_input(format!(
                "only confirmed appointments can become {}, this one is {}",
                to.as_str(),
                appointment.status.as_str()
            )));
        }
        self.set_status(id, to, Some(actor)).await
    }

    /// Push a reminder for an upcoming appointment. Scheduling lives with
    /// the caller (the portal owns no durable state); this is the dispatch.
    pub async fn remind(&self, actor: &Identity, id: &str) -> Result<DispatchReport> {
        require(actor.role(), Permission::ManageAppointments)?;
        let appointment = self.get(actor, id).await?;
        if !appointment.status.cancellable() {
            return Err(Error::invalid_input(format!(
                "no reminder for a {} appointment",
                appointment.status.as_str()
            )));
        }
        match load_profile(&self.backend, &appointment.citizen_id).await {
            Some(profile) => {
                let n = templates::appointment_reminder(&appointment, &profile);
                Ok(self.dispatcher.dispatch(&n).await)
            }
            None => Ok(DispatchReport::default()),
        }
    }

    /// Verify a scanned confirmation code at the desk. The signature is the
    /// trust anchor; the rest is schedule sanity.
    pub async fn check_in(&self, actor: &Identity, qr_json: &str) -> Result<Appointment> {
        require(actor.role(), Permission::CheckInAppointment)?;

        let payload = QrPayload::from_json(qr_json)?;
        if !payload.verify(&self.qr_secret) {
            return Err(Error::invalid_input("QR signature is invalid"));
        }

        let appointment = self.get(actor, &payload.appointment_id).await?;
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(Error::invalid_input(format!(
                "appointment is {}, not confirmed",
                appointment.status.as_str()
            )));
        }
        let now = Utc::now();
        if appointment.scheduled_at.date_naive() != now.date_naive() {
            return Err(Error::invalid_input("appointment is not scheduled for today"));
        }
        Ok(appointment)
    }

    /// Fresh QR data URL for an appointment the actor may see.
    pub async fn qr_for(&self, actor: &Identity, id: &str) -> Result<String> {
        let appointment = self.get(actor, id).await?;
        let payload = QrPayload::sign(&appointment, &self.qr_secret);
        qr::render_data_url(&payload, self.qr_module_size)
    }

    async fn set_status(
        &self,
        id: &str,
        to: AppointmentStatus,
        officer: Option<&Identity>,
    ) -> Result<Appointment> {
        let mut patch = serde_json::json!({ "status": to.as_str() });
        if let Some(officer) = officer {
            patch["officer_id"] = serde_json::json!(officer.user_id().as_str());
        }
        let mut rows: Vec<Appointment> = self
            .backend
            .update(APPOINTMENT_TABLE)
            .set(patch)?
            .eq("id", id)
            .execute()
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found("appointment", id));
        }
        let appointment = rows.swap_remove(0);
        info!("Appointment {} -> {}", appointment.id, to.as_str());
        Ok(appointment)
    }
}
