use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use shared_models::auth::Role;

pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9\s\-\.\(\)]{6,19}$").expect("phone pattern compiles")
});

// ==============================================================================
// REGISTRATION FORMS
// ==============================================================================

/// Fields every portal asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// One registration form per portal, discriminated by `role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RegistrationForm {
    Patient {
        #[serde(flatten)]
        common: CommonFields,
        date_of_birth: NaiveDate,
        gender: String,
    },
    Doctor {
        #[serde(flatten)]
        common: CommonFields,
        specialty: String,
        license_number: String,
    },
    #[serde(alias = "frontline")]
    FrontlineWorker {
        #[serde(flatten)]
        common: CommonFields,
        organization: String,
        region: String,
    },
    Admin {
        #[serde(flatten)]
        common: CommonFields,
        access_code: String,
    },
}

impl RegistrationForm {
    pub fn role(&self) -> Role {
        match self {
            RegistrationForm::Patient { .. } => Role::Patient,
            RegistrationForm::Doctor { .. } => Role::Doctor,
            RegistrationForm::FrontlineWorker { .. } => Role::FrontlineWorker,
            RegistrationForm::Admin { .. } => Role::Admin,
        }
    }

    pub fn common(&self) -> &CommonFields {
        match self {
            RegistrationForm::Patient { common, .. }
            | RegistrationForm::Doctor { common, .. }
            | RegistrationForm::FrontlineWorker { common, .. }
            | RegistrationForm::Admin { common, .. } => common,
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        self.validate_on(Local::now().date_naive())
    }

    /// Field checks against `today`; all failures are collected.
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        let common = self.common();

        require(&mut errors, "fullName", &common.full_name, "Full name is required");
        if !EMAIL_PATTERN.is_match(common.email.trim()) {
            errors.insert("email", "Please enter a valid email address");
        }
        if !PHONE_PATTERN.is_match(common.phone.trim()) {
            errors.insert("phone", "Please enter a valid phone number");
        }
        if common.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.insert(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }

        match self {
            RegistrationForm::Patient { date_of_birth, gender, .. } => {
                if *date_of_birth > today {
                    errors.insert("dateOfBirth", "Date of birth cannot be in the future");
                }
                require(&mut errors, "gender", gender, "Gender is required");
            }
            RegistrationForm::Doctor { specialty, license_number, .. } => {
                require(&mut errors, "specialty", specialty, "Specialty is required");
                require(&mut errors, "licenseNumber", license_number, "License number is required");
            }
            RegistrationForm::FrontlineWorker { organization, region, .. } => {
                require(&mut errors, "organization", organization, "Organization is required");
                require(&mut errors, "region", region, "Region is required");
            }
            RegistrationForm::Admin { access_code, .. } => {
                require(&mut errors, "accessCode", access_code, "Access code is required");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn require(errors: &mut FormErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field, message);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

// ==============================================================================
// SESSION REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is registered for a different portal")]
    WrongPortal,

    #[error("Auth service error: {0}")]
    Backend(String),

    #[error("Session store error: {0}")]
    SessionStore(String),
}
