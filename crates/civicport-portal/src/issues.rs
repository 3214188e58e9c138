//! Issue reporting and triage

use crate::access::{require, Permission};
use crate::sessions::{load_profile, Identity};
use chrono::{DateTime, Utc};
use civicport_backend::BackendClient;
use civicport_core::{new_entity_id, Error, Issue, IssueStatus, Result, Role, UserId};
use civicport_notify::{templates, DispatchReport, Dispatcher};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const ISSUE_TABLE: &str = "issues";

pub const CATEGORIES: &[&str] = &[
    "roads",
    "sanitation",
    "utilities",
    "safety",
    "parks",
    "other",
];

#[derive(Debug, Deserialize)]
pub struct IssueReport {
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Serialize)]
struct NewIssueRow<'a> {
    id: &'a str,
    reporter_id: &'a str,
    category: &'a str,
    title: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    status: IssueStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct IssueService {
    backend: Arc<BackendClient>,
    dispatcher: Arc<Dispatcher>,
}

impl IssueService {
    pub fn new(backend: Arc<BackendClient>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            backend,
            dispatcher,
        }
    }

    pub async fn report(&self, actor: &Identity, report: IssueReport) -> Result<Issue> {
        require(actor.role(), Permission::ReportIssue)?;

        if !CATEGORIES.contains(&report.category.as_str()) {
            return Err(Error::invalid_input(format!(
                "unknown category: {}",
                report.category
            )));
        }
        if report.title.trim().is_empty() {
            return Err(Error::invalid_input("title is required"));
        }
        if report.description.trim().is_empty() {
            return Err(Error::invalid_input("description is required"));
        }

        let id = new_entity_id();
        let now = Utc::now();
        let row = NewIssueRow {
            id: &id,
            reporter_id: actor.user_id().as_str(),
            category: &report.category,
            title: report.title.trim(),
            description: report.description.trim(),
            location: report.location.as_deref(),
            status: IssueStatus::Open,
            created_at: now,
            updated_at: now,
        };
        let mut inserted: Vec<Issue> = self.backend.insert(ISSUE_TABLE, &[row]).await?;
        if inserted.is_empty() {
            return Err(Error::Internal("insert returned no row".to_string()));
        }
        let issue = inserted.swap_remove(0);
        info!("Issue {} reported in {}", issue.id, issue.category);
        Ok(issue)
    }

    pub async fn get(&self, actor: &Identity, id: &str) -> Result<Issue> {
        let issue = self
            .backend
            .from(ISSUE_TABLE)
            .eq("id", id)
            .fetch_one::<Issue>()
            .await?
            .ok_or_else(|| Error::not_found("issue", id))?;
        if actor.role().is_staff() || issue.reporter_id == *actor.user_id() {
            Ok(issue)
        } else {
            Err(Error::not_found("issue", id))
        }
    }

    pub async fn list_for(
        &self,
        actor: &Identity,
        status: Option<IssueStatus>,
    ) -> Result<Vec<Issue>> {
        let mut query = self.backend.from(ISSUE_TABLE).order("created_at", true);
        if actor.role() == Role::Citizen {
            require(actor.role(), Permission::ViewOwnIssues)?;
            query = query.eq("reporter_id", actor.user_id());
        }
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        query.fetch::<Issue>().await
    }

    /// Open -> InReview, with an owning officer.
    pub async fn assign(
        &self,
        actor: &Identity,
        id: &str,
        assignee: &UserId,
    ) -> Result<Issue> {
        require(actor.role(), Permission::ManageIssues)?;
        let issue = self.get(actor, id).await?;
        if issue.status != IssueStatus::Open {
            return Err(Error::invalid_input(format!(
                "only open issues can be assigned, this one is {}",
                issue.status.as_str()
            )));
        }
        self.apply(
            id,
            serde_json::json!({
                "status": IssueStatus::InReview.as_str(),
                "assigned_to": assignee.as_str(),
                "updated_at": Utc::now(),
            }),
        )
        .await
    }

    /// InReview -> Resolved | Closed, Resolved -> Closed. The reporter hears
    /// about it, with the officer's note when one is given; a dead letter
    /// does not undo the transition.
    pub async fn update_status(
        &self,
        actor: &Identity,
        id: &str,
        to: IssueStatus,
        note: Option<String>,
    ) -> Result<(Issue, DispatchReport)> {
        require(actor.role(), Permission::ManageIssues)?;
        let issue = self.get(actor, id).await?;

        let legal = matches!(
            (issue.status, to),
            (IssueStatus::InReview, IssueStatus::Resolved)
                | (IssueStatus::InReview, IssueStatus::Closed)
                | (IssueStatus::Resolved, IssueStatus::Closed)
        );
        if !legal {
            return Err(Error::invalid_input(format!(
                "cannot move an issue from {} to {}",
                issue.status.as_str(),
                to.as_str()
            )));
        }

        let issue = self
            .apply(
                id,
                serde_json::json!({
                    "status": to.as_str(),
                    "updated_at": Utc::now(),
                }),
            )
            .await?;

        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let report = match load_profile(&self.backend, &issue.reporter_id).await {
            Some(profile) => {
                let n = templates::issue_update(&issue, &profile, note.as_deref());
                self.dispatcher.dispatch(&n).await
            }
            None => DispatchReport::default(),
        };
        Ok((issue, report))
    }

    async fn apply(&self, id: &str, patch: serde_json::Value) -> Result<Issue> {
        let mut rows: Vec<Issue> = self
            .backend
            .update(ISSUE_TABLE)
            .set(patch)?
            .eq("id", id)
            .execute()
            .await?;
        if rows.is_empty() {
            return Err(Error::not_found("issue", id));
        }
        let issue = rows.swap_remove(0);
        info!("Issue {} -> {}", issue.id, issue.status.as_str());
        Ok(issue)
    }
}
