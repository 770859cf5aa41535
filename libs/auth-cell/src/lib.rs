pub mod handlers;
pub mod models;
pub mod router;

pub use models::{AuthError, CommonFields, FormErrors, LoginRequest, RegistrationForm};
