use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, Session, User};

use crate::session::InMemorySessionStore;
use crate::state::AppState;

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            name: None,
            role: self.role,
        }
    }

    pub fn session(&self) -> Session {
        Session::new(format!("test-token-{}", self.id), self.to_user())
    }
}

/// Router state backed by an in-memory session store, pointing at `backend_url`.
pub fn test_state(backend_url: &str) -> (Arc<AppState>, Arc<InMemorySessionStore>) {
    let mut config = AppConfig::for_backend(backend_url);
    config.booking.success_display_delay = std::time::Duration::from_millis(10);
    let store = Arc::new(InMemorySessionStore::new());
    let state = Arc::new(AppState::with_sessions(config, store.clone()));
    (state, store)
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn availability_response(day: &str, slots: &[&str]) -> Value {
        json!([{ "day": day, "slots": slots }])
    }

    pub fn appointment_response(doctor_id: &str, date: &str, time: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "doctor": doctor_id,
            "patient": Uuid::new_v4().to_string(),
            "appointmentDate": date,
            "appointmentTime": time,
            "status": status,
            "type": "consultation",
            "mode": "in_person",
            "notes": null
        })
    }

    pub fn booking_success(appointment_id: &str) -> Value {
        json!({
            "success": true,
            "message": "Appointment booked successfully",
            "appointmentId": appointment_id
        })
    }

    pub fn booking_failure(message: &str) -> Value {
        json!({
            "success": false,
            "message": message
        })
    }

    pub fn login_response(user: &TestUser, token: &str) -> Value {
        json!({
            "token": token,
            "user": user.to_user()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, Role::Doctor);

        let session = user.session();
        assert_eq!(session.user.id, user.id);
        assert!(session.has_role(Role::Doctor));
    }

    #[test]
    fn test_state_uses_short_display_delay() {
        let (state, _) = test_state("http://localhost:4000");
        assert_eq!(state.config.backend_url, "http://localhost:4000");
        assert!(state.config.booking.success_display_delay.as_millis() < 100);
    }
}
