pub mod attendance;
pub mod dashboard;
pub mod fun;
pub mod leave;
pub mod notification;
pub mod report;
pub mod scanner;
pub mod settings;
pub mod user;
