use serde::{Deserialize, Serialize};

use crate::form::steps::FieldKey;

/// Which flow produced an application. Same record shape, different provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    General,
    Vacancy,
    Admin,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::General => "general",
            Source::Vacancy => "vacancy",
            Source::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationalDetails {
    pub degree: String,
    pub graduation_year: String,
    pub university: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalDetails {
    pub experience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

/// In-progress candidate record. Sub-records are only guaranteed valid once
/// their owning step has passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDraft {
    pub personal_details: PersonalDetails,
    pub educational_details: EducationalDetails,
    pub professional_details: ProfessionalDetails,
}

impl CandidateDraft {
    /// Sets a text field. Returns `false` for keys that are not text inputs.
    pub fn set_field(&mut self, key: FieldKey, value: String) -> bool {
        match key {
            FieldKey::Name => self.personal_details.name = value,
            FieldKey::Email => self.personal_details.email = value,
            FieldKey::Phone => self.personal_details.phone = value,
            FieldKey::Address => self.personal_details.address = value,
            FieldKey::Degree => self.educational_details.degree = value,
            FieldKey::GraduationYear => self.educational_details.graduation_year = value,
            FieldKey::University => self.educational_details.university = value,
            FieldKey::Experience => self.professional_details.experience = value,
            FieldKey::JobTitle => self.professional_details.job_title = Some(value),
            FieldKey::PdfData => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_read_fields() {
        let mut draft = CandidateDraft::default();
        assert!(draft.set_field(FieldKey::GraduationYear, "2024".to_string()));
        assert!(draft.set_field(FieldKey::JobTitle, "Welder".to_string()));
        assert_eq!(draft.educational_details.graduation_year, "2024");
        assert_eq!(draft.professional_details.job_title.as_deref(), Some("Welder"));
    }

    #[test]
    fn test_attachment_is_not_a_text_field() {
        let mut draft = CandidateDraft::default();
        assert!(!draft.set_field(FieldKey::PdfData, "abc".to_string()));
        assert_eq!(draft, CandidateDraft::default());
    }

    #[test]
    fn test_serializes_with_nested_camel_case_sections() {
        let mut draft = CandidateDraft::default();
        draft.set_field(FieldKey::Email, "jane@x.com".to_string());
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["personalDetails"]["email"], json!("jane@x.com"));
        assert_eq!(value["educationalDetails"]["graduationYear"], json!(""));
        assert!(value["professionalDetails"].get("jobTitle").is_none());
    }
}
