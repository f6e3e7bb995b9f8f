pub mod scan_record;
pub mod volunteer_session;

pub use scan_record::Entity as ScanRecord;
pub use volunteer_session::Entity as VolunteerSession;
