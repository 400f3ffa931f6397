pub mod config;
pub mod dash;
pub mod doctor;
pub mod launch;
pub mod list;
pub mod quality;
