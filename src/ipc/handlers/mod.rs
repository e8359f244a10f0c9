pub mod admin;
pub mod attendance;
pub mod backup;
pub mod core;
pub mod photos;
pub mod students;
