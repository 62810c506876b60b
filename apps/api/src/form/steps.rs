//! Step registry and typed field paths.
//!
//! Every draft field is owned by exactly one step. The UI binds inputs by a
//! nested path (`personalDetails.email`), which is derived from the owning
//! step rather than assembled from strings at the call site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Steps
// ────────────────────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Personal,
    Educational,
    Professional,
}

impl Step {
    pub const LAST: Step = Step::Professional;

    /// 1-based position of the step.
    pub fn index(self) -> usize {
        match self {
            Step::Personal => 1,
            Step::Educational => 2,
            Step::Professional => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Step> {
        match index {
            1 => Some(Step::Personal),
            2 => Some(Step::Educational),
            3 => Some(Step::Professional),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Step> {
        Step::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Step> {
        self.index().checked_sub(1).and_then(Step::from_index)
    }

    pub fn is_last(self) -> bool {
        self == Step::LAST
    }

    /// Name of the nested sub-record this step owns in the draft.
    pub fn section(self) -> &'static str {
        match self {
            Step::Personal => "personalDetails",
            Step::Educational => "educationalDetails",
            Step::Professional => "professionalDetails",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Personal => "Personal Details",
            Step::Educational => "Educational Details",
            Step::Professional => "Professional Details",
        }
    }

    pub fn definition(self) -> &'static StepDefinition {
        &STEPS[self.index() - 1]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field keys
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Name,
    Email,
    Phone,
    Address,
    Degree,
    GraduationYear,
    University,
    Experience,
    JobTitle,
    PdfData,
}

impl FieldKey {
    pub const ALL: [FieldKey; 10] = [
        FieldKey::Name,
        FieldKey::Email,
        FieldKey::Phone,
        FieldKey::Address,
        FieldKey::Degree,
        FieldKey::GraduationYear,
        FieldKey::University,
        FieldKey::Experience,
        FieldKey::JobTitle,
        FieldKey::PdfData,
    ];

    /// Bare key as used by validation errors and the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Name => "name",
            FieldKey::Email => "email",
            FieldKey::Phone => "phone",
            FieldKey::Address => "address",
            FieldKey::Degree => "degree",
            FieldKey::GraduationYear => "graduationYear",
            FieldKey::University => "university",
            FieldKey::Experience => "experience",
            FieldKey::JobTitle => "jobTitle",
            FieldKey::PdfData => "pdfData",
        }
    }

    pub fn step(self) -> Step {
        match self {
            FieldKey::Name | FieldKey::Email | FieldKey::Phone | FieldKey::Address => {
                Step::Personal
            }
            FieldKey::Degree | FieldKey::GraduationYear | FieldKey::University => {
                Step::Educational
            }
            FieldKey::Experience | FieldKey::JobTitle | FieldKey::PdfData => Step::Professional,
        }
    }

    pub fn path(self) -> FieldPath {
        FieldPath(self)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| FieldPathError::UnknownField(s.to_string()))
    }
}

/// Fully-qualified UI binding path for a field, e.g. `educationalDetails.degree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(FieldKey);

impl FieldPath {
    pub fn step(self) -> Step {
        self.0.step()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.step().section(), self.0.as_str())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StepDefinition {
    pub index: usize,
    pub title: &'static str,
    pub section: &'static str,
    pub fields: &'static [FieldKey],
}

/// Ordered step registry. Field keys are disjoint across steps and together
/// cover every draft field.
pub static STEPS: [StepDefinition; 3] = [
    StepDefinition {
        index: 1,
        title: "Personal Details",
        section: "personalDetails",
        fields: &[
            FieldKey::Name,
            FieldKey::Email,
            FieldKey::Phone,
            FieldKey::Address,
        ],
    },
    StepDefinition {
        index: 2,
        title: "Educational Details",
        section: "educationalDetails",
        fields: &[
            FieldKey::Degree,
            FieldKey::GraduationYear,
            FieldKey::University,
        ],
    },
    StepDefinition {
        index: 3,
        title: "Professional Details",
        section: "professionalDetails",
        fields: &[FieldKey::Experience, FieldKey::JobTitle, FieldKey::PdfData],
    },
];

// ────────────────────────────────────────────────────────────────────────────
// Error field mapping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldPathError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Step {0} is out of range")]
    StepOutOfRange(usize),

    #[error("Field '{field}' does not belong to step {step}")]
    NotOwnedByStep { field: String, step: usize },
}

/// Maps a bare validation key to the nested path the UI binds errors to.
///
/// Unlike a string-concatenating mapper, an invalid step index or a key that
/// the step does not own is an error instead of a silent fall back to the
/// bare key.
pub struct ErrorFieldMapper;

impl ErrorFieldMapper {
    pub fn map(bare_key: &str, step_index: usize) -> Result<FieldPath, FieldPathError> {
        let step =
            Step::from_index(step_index).ok_or(FieldPathError::StepOutOfRange(step_index))?;
        let path = Self::resolve(bare_key)?;
        if path.step() != step {
            return Err(FieldPathError::NotOwnedByStep {
                field: bare_key.to_string(),
                step: step_index,
            });
        }
        Ok(path)
    }

    /// Resolves a key whose step is not known, such as a field named in a
    /// backend rejection. The owning step comes from the registry.
    pub fn resolve(bare_key: &str) -> Result<FieldPath, FieldPathError> {
        bare_key.parse::<FieldKey>().map(FieldKey::path)
    }
}
