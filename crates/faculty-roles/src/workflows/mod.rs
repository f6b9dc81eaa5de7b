pub mod forms;
pub mod google_workspace;
pub mod listings;
pub mod notifications;
pub mod profiles;
pub mod sheets;
