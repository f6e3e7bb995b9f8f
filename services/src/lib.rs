pub mod access_code;
pub mod attendance;
pub mod backend;
pub mod error;
pub mod qr_payload;
pub mod scan_recorder;
pub mod station;
pub mod volunteer_session;
