//! Account service: registration, login and account reads over HTTP.

pub mod app;
pub mod service;

pub use service::AccountService;
