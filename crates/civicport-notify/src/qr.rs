//! QR confirmations — signed appointment payloads rendered to PNG
//!
//! The payload is plain JSON so any scanner app can read it; the HMAC
//! signature is what the check-in desk actually trusts.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use civicport_core::{Appointment, Error, Result};
use ring::hmac;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QrPayload {
    pub appointment_id: String,
    pub citizen_id: String,
    pub service: String,
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    pub signature: String,
}

impl QrPayload {
    /// Build and sign the payload for a booked appointment.
    pub fn sign(appointment: &Appointment, secret: &[u8]) -> Self {
        let mut payload = Self {
            appointment_id: appointment.id.clone(),
            citizen_id: appointment.citizen_id.as_str().to_string(),
            service: appointment.service.clone(),
            scheduled_at: appointment.scheduled_at,
            location: appointment.location.clone(),
            signature: String::new(),
        };
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        let tag = hmac::sign(&key, payload.canonical().as_bytes());
        payload.signature = BASE64.encode(tag.as_ref());
        payload
    }

    /// True only if the signature matches every field.
    pub fn verify(&self, secret: &[u8]) -> bool {
        let Ok(tag) = BASE64.decode(&self.signature) else {
            return false;
        };
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        hmac::verify(&key, self.canonical().as_bytes(), &tag).is_ok()
    }

    /// Signed field order is fixed; timestamps collapse to whole seconds so
    /// the database round-trip cannot invalidate a code.
    fn canonical(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}",
            self.appointment_id,
            self.citizen_id,
            self.service,
            self.scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.location,
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid_input(format!("bad QR payload: {e}")))
    }
}

/// Encode the payload into a PNG QR image.
pub fn render_png(payload: &QrPayload, module_size: u32) -> Result<Vec<u8>> {
    let json = payload.to_json()?;
    let code = qrcode::QrCode::new(json.as_bytes())
        .map_err(|e| Error::notify("qr", format!("encode: {e}")))?;
    let module_size = module_size.max(1);
    let img = code
        .render::<image::Luma<u8>>()
        .module_dimensions(module_size, module_size)
        .build();

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| Error::notify("qr", format!("png: {e}")))?;
    Ok(buf)
}

/// PNG wrapped as a data URL for direct embedding in confirmation emails.
pub fn render_data_url(payload: &QrPayload, module_size: u32) -> Result<String> {
    let png = render_png(payload, module_size)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}
