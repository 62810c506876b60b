//! Per-step validation.
//!
//! Only the sub-record owned by the step under validation is inspected, so
//! incomplete data on other steps never blocks navigation.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::form::draft::{
    CandidateDraft, EducationalDetails, PersonalDetails, ProfessionalDetails, Source,
};
use crate::form::steps::{ErrorFieldMapper, FieldKey, FieldPath, Step};

pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email address";
pub const PHONE_INVALID: &str = "Phone number must be exactly 10 digits";
pub const ADDRESS_TOO_SHORT: &str = "Address must be at least 5 characters";
pub const DEGREE_TOO_SHORT: &str = "Degree must be at least 2 characters";
pub const DEGREE_UNKNOWN: &str = "Please select a valid degree";
pub const GRADUATION_YEAR_INVALID: &str = "Graduation year must be exactly 4 digits";
pub const UNIVERSITY_TOO_SHORT: &str = "University must be at least 2 characters";
pub const EXPERIENCE_REQUIRED: &str = "Experience is required";
pub const JOB_TITLE_REQUIRED: &str = "Job title is required";
pub const JOB_TITLE_UNKNOWN: &str = "Please select a valid job position";

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"))
}

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"^[0-9]{4}$").expect("valid year regex"))
}

// ────────────────────────────────────────────────────────────────────────────
// Result type
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of validating one step. `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    #[serde(skip)]
    step: Step,
    valid: bool,
    errors: BTreeMap<FieldKey, String>,
}

impl ValidationResult {
    pub fn from_errors(step: Step, errors: BTreeMap<FieldKey, String>) -> Self {
        Self {
            step,
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &BTreeMap<FieldKey, String> {
        &self.errors
    }

    /// Errors keyed by the nested path the UI binds to.
    pub fn field_errors(&self) -> BTreeMap<FieldPath, String> {
        self.errors
            .iter()
            .filter_map(|(key, message)| {
                ErrorFieldMapper::map(key.as_str(), self.step.index())
                    .ok()
                    .map(|path| (path, message.clone()))
            })
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validator
// ────────────────────────────────────────────────────────────────────────────

/// Step schemas for one form session.
///
/// The personal and educational rules are shared by every flow; the
/// professional rules depend on the source discriminant. Lookup lists are
/// loaded once at mount and read-only afterwards. An empty list means the
/// lookup failed and membership is not enforced.
#[derive(Debug, Clone)]
pub struct StepValidator {
    source: Source,
    degrees: Vec<String>,
    job_positions: Vec<String>,
}

impl StepValidator {
    pub fn new(source: Source, degrees: Vec<String>, job_positions: Vec<String>) -> Self {
        Self {
            source,
            degrees,
            job_positions,
        }
    }

    pub fn degrees(&self) -> &[String] {
        &self.degrees
    }

    pub fn job_positions(&self) -> &[String] {
        &self.job_positions
    }

    pub fn validate(&self, draft: &CandidateDraft, step: Step) -> ValidationResult {
        let mut errors = BTreeMap::new();
        match step {
            Step::Personal => validate_personal(&draft.personal_details, &mut errors),
            Step::Educational => {
                self.validate_educational(&draft.educational_details, &mut errors)
            }
            Step::Professional => {
                self.validate_professional(&draft.professional_details, &mut errors)
            }
        }
        ValidationResult::from_errors(step, errors)
    }

    fn validate_educational(
        &self,
        details: &EducationalDetails,
        errors: &mut BTreeMap<FieldKey, String>,
    ) {
        if char_len(&details.degree) < 2 {
            errors.insert(FieldKey::Degree, DEGREE_TOO_SHORT.to_string());
        } else if !is_listed(&self.degrees, &details.degree) {
            errors.insert(FieldKey::Degree, DEGREE_UNKNOWN.to_string());
        }

        if !year_pattern().is_match(&details.graduation_year) {
            errors.insert(FieldKey::GraduationYear, GRADUATION_YEAR_INVALID.to_string());
        }

        if char_len(&details.university) < 2 {
            errors.insert(FieldKey::University, UNIVERSITY_TOO_SHORT.to_string());
        }
    }

    fn validate_professional(
        &self,
        details: &ProfessionalDetails,
        errors: &mut BTreeMap<FieldKey, String>,
    ) {
        if char_len(&details.experience) < 1 {
            errors.insert(FieldKey::Experience, EXPERIENCE_REQUIRED.to_string());
        }

        // Vacancy applications carry the advertised title from the flow itself.
        if self.source == Source::Admin {
            let job_title = details.job_title.as_deref().unwrap_or_default();
            if job_title.is_empty() {
                errors.insert(FieldKey::JobTitle, JOB_TITLE_REQUIRED.to_string());
            } else if !is_listed(&self.job_positions, job_title) {
                errors.insert(FieldKey::JobTitle, JOB_TITLE_UNKNOWN.to_string());
            }
        }
    }
}

fn validate_personal(details: &PersonalDetails, errors: &mut BTreeMap<FieldKey, String>) {
    if char_len(&details.name) < 2 {
        errors.insert(FieldKey::Name, NAME_TOO_SHORT.to_string());
    }

    if details.email.is_empty() {
        errors.insert(FieldKey::Email, EMAIL_REQUIRED.to_string());
    } else if !email_pattern().is_match(&details.email) {
        errors.insert(FieldKey::Email, EMAIL_INVALID.to_string());
    }

    if !phone_pattern().is_match(&details.phone) {
        errors.insert(FieldKey::Phone, PHONE_INVALID.to_string());
    }

    if char_len(&details.address) < 5 {
        errors.insert(FieldKey::Address, ADDRESS_TOO_SHORT.to_string());
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn is_listed(options: &[String], value: &str) -> bool {
    options.is_empty() || options.iter().any(|option| option == value)
}
