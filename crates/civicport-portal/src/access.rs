//! Role policy — the single place access decisions are made
//!
//! Handlers never compare role strings; they ask for a permission.

use civicport_core::{Error, Result, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    ViewOwnAppointments,
    BookAppointment,
    ManageAppointments,
    CheckInAppointment,
    ReportIssue,
    ViewOwnIssues,
    ManageIssues,
    SubmitDocument,
    ViewOwnDocuments,
    ReviewDocuments,
    ManageUsers,
}

impl Permission {
    pub fn describe(&self) -> &'static str {
        match self {
            Permission::ViewOwnAppointments => "view own appointments",
            Permission::BookAppointment => "book an appointment",
            Permission::ManageAppointments => "manage appointments",
            Permission::CheckInAppointment => "check in an appointment",
            Permission::ReportIssue => "report an issue",
            Permission::ViewOwnIssues => "view own issues",
            Permission::ManageIssues => "manage issues",
            Permission::SubmitDocument => "submit a document",
            Permission::ViewOwnDocuments => "view own documents",
            Permission::ReviewDocuments => "review documents",
            Permission::ManageUsers => "manage users",
        }
    }
}

pub fn allows(role: Role, permission: Permission) -> bool {
    use Permission::*;
    match role {
        Role::Admin => true,
        Role::Officer => !matches!(permission, ManageUsers),
        Role::Citizen => matches!(
            permission,
            ViewOwnAppointments
                | BookAppointment
                | ReportIssue
                | ViewOwnIssues
                | SubmitDocument
                | ViewOwnDocuments
        ),
    }
}

pub fn require(role: Role, permission: Permission) -> Result<()> {
    if allows(role, permission) {
        Ok(())
    } else {
        Err(Error::forbidden(role.as_str(), permission.describe()))
    }
}
