//! Document submission and review

use crate::access::{require, Permission};
use crate::sessions::{load_profile, Identity};
use chrono::{DateTime, Utc};
use civicport_backend::BackendClient;
use civicport_core::{
    new_entity_id, DocumentRecord, DocumentStatus, Error, Result, Role,
};
use civicport_notify::{templates, DispatchReport, Dispatcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const DOCUMENT_TABLE: &str = "documents";

pub const DOCUMENT_KINDS: &[&str] = &[
    "identity",
    "proof_of_address",
    "application_form",
    "supporting",
];

#[derive(Debug, Deserialize)]
pub struct DocumentSubmission {
    pub kind: String,
    /// Path in the backend's storage bucket; contents never pass through the
    /// portal.
    pub storage_path: String,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

#[derive(Serialize)]
struct NewDocumentRow<'a> {
    id: &'a str,
    owner_id: &'a str,
    kind: &'a str,
    storage_path: &'a str,
    status: DocumentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct DocumentService {
    backend: Arc<BackendClient>,
    dispatcher: Arc<Dispatcher>,
}

impl DocumentService {
    pub fn new(backend: Arc<BackendClient>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            backend,
            dispatcher,
        }
    }

    pub async fn submit(
        &self,
        actor: &Identity,
        submission: DocumentSubmission,
    ) -> Result<DocumentRecord> {
        require(actor.role(), Permission::SubmitDocument)?;

        if !DOCUMENT_KINDS.contains(&submission.kind.as_str()) {
            return Err(Error::invalid_input(format!(
                "unknown document kind: {}",
                submission.kind
            )));
        }
        if submission.storage_path.trim().is_empty() {
            return Err(Error::invalid_input("storage_path is required"));
        }

        let id = new_entity_id();
        let now = Utc::now();
        let row = NewDocumentRow {
            id: &id,
            owner_id: actor.user_id().as_str(),
            kind: &submission.kind,
            storage_path: submission.storage_path.trim(),
            status: DocumentStatus::Submitted,
            created_at: now,
            updated_at: now,
        };
        let mut inserted: Vec<DocumentRecord> =
            self.backend.insert(DOCUMENT_TABLE, &[row]).await?;
        if inserted.is_empty() {
            return Err(Error::Internal("insert returned no row".to_string()));
        }
        let document = inserted.swap_remove(0);
        info!("Document {} submitted ({})", document.id, document.kind);
        Ok(document)
    }

    pub async fn get(&self, actor: &Identity, id: &str) -> Result<DocumentRecord> {
        let document = self
            .backend
            .from(DOCUMENT_TABLE)
            .eq("id", id)
            .fetch_one::<DocumentRecord>()
            .await?
            .ok_or_else(|| Error::not_found("document", id))?;
        if actor.role().is_staff() || document.owner_id == *actor.user_id() {
            Ok(document)
        } else {
            Err(Error::not_found("document", id))
        }
    }

    /// Citizens see their own; reviewers see the whole queue.
    pub async fn list_for(
        &self,
        actor: &Identity,
        status: Option<DocumentStatus>,
    ) -> Result<Vec<DocumentRecord>> {
        let mut query = self.backend.from(DOCUMENT_TABLE).order("created_at", true);
        if actor.role() == Role::Citizen {
            require(actor.role(), Permission::ViewOwnDocuments)?;
            query = query.eq("owner_id", actor.user_id());
        }
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        query.fetch::<DocumentRecord>().await
    }

    /// Submitted -> Approved | Rejected. Rejections must say why. The owner
    /// is notified; delivery failure never reverses a decision.
    pub async fn review(
        &self,
        actor: &Identity,
        id: &str,
        decision: ReviewDecision,
        note: Option<String>,
    ) -> Result<(DocumentRecord, DispatchReport)> {
        require(actor.role(), Permission::ReviewDocuments)?;

        let document = self.get(actor, id).await?;
        if document.status != DocumentStatus::Submitted {
            return Err(Error::invalid_input(format!(
                "document already reviewed ({})",
                document.status.as_str()
            )));
        }

        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if decision == ReviewDecision::Rejected && note.is_none() {
            return Err(Error::invalid_input("a rejection requires a note"));
        }

        let status = match decision {
            ReviewDecision::Approved => DocumentStatus::Approved,
            ReviewDecision::Rejected => DocumentStatus::Rejected,
        };
        let mut patch = serde_json::json!({
            "status": status.as_str(),
            "reviewed_by": actor.user_id().as_str(),
            "updated_at": Utc::now(),
        });
        if let Some(ref note) = note {
            patch["review_note"] = serde_json::json!(note);
        }

        let mut rows: Vec<DocumentRecord> = self
            .backend
            .update(DOCUMENT_TABLE)
            .set(patch)?
            .eq("id", id)
            .execute()
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found("document", id));
        }
        let document = rows.swap_remove(0);
        info!("Document {} {}", document.id, document.status.as_str());

        let report = match load_profile(&self.backend, &document.owner_id).await {
            Some(profile) => {
                let n = templates::document_reviewed(&document, &profile);
                self.dispatcher.dispatch(&n).await
            }
            None => DispatchReport::default(),
        };
        Ok((document, report))
    }
}
