pub mod m202510180001_create_volunteer_sessions;
pub mod m202510180002_create_scan_records;
