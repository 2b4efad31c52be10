//! Namespaces used by the admin application

pub const PATIENTS: &str = "patients";
pub const PREFERENCES: &str = "preferences";
pub const FORM_DRAFTS: &str = "form-drafts";
pub const CERTIFICATION: &str = "certification";
pub const NOTIFICATIONS: &str = "notifications";
