use serde::{Deserialize, Serialize};

use super::domain::StudentId;

pub const DEFAULT_MINIMUM_PERCENT: u8 = 80;

/// Profile fields counted by the eligibility gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FirstName,
    LastName,
    FirstNameEn,
    LastNameEn,
    Email,
    Phone,
    StudentCode,
    Faculty,
    Department,
    Curriculum,
}

impl ProfileField {
    pub const fn required() -> [Self; 10] {
        [
            Self::FirstName,
            Self::LastName,
            Self::FirstNameEn,
            Self::LastNameEn,
            Self::Email,
            Self::Phone,
            Self::StudentCode,
            Self::Faculty,
            Self::Department,
            Self::Curriculum,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::FirstNameEn => "first_name_en",
            Self::LastNameEn => "last_name_en",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::StudentCode => "student_code",
            Self::Faculty => "faculty",
            Self::Department => "department",
            Self::Curriculum => "curriculum",
        }
    }
}

/// Snapshot of a student's profile as supplied by the profile store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: StudentId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_name_en: Option<String>,
    #[serde(default)]
    pub last_name_en: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub student_code: Option<String>,
    #[serde(default)]
    pub faculty_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub curriculum_id: Option<String>,
}

impl StudentProfile {
    pub fn value(&self, field: ProfileField) -> Option<&str> {
        let value = match field {
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::FirstNameEn => &self.first_name_en,
            ProfileField::LastNameEn => &self.last_name_en,
            ProfileField::Email => &self.email,
            ProfileField::Phone => &self.phone,
            ProfileField::StudentCode => &self.student_code,
            ProfileField::Faculty => &self.faculty_id,
            ProfileField::Department => &self.department_id,
            ProfileField::Curriculum => &self.curriculum_id,
        };
        value.as_deref()
    }

    pub fn is_populated(&self, field: ProfileField) -> bool {
        self.value(field)
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Threshold and field list used by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityPolicy {
    minimum_percent: u8,
    required: Vec<ProfileField>,
}

impl EligibilityPolicy {
    /// Out-of-range thresholds fall back to the default.
    pub fn new(minimum_percent: u8) -> Self {
        let sanitized = if (1..=100).contains(&minimum_percent) {
            minimum_percent
        } else {
            DEFAULT_MINIMUM_PERCENT
        };

        Self {
            minimum_percent: sanitized,
            required: ProfileField::required().to_vec(),
        }
    }

    pub fn with_required(mut self, required: Vec<ProfileField>) -> Self {
        self.required = required;
        self
    }

    pub fn minimum_percent(&self) -> u8 {
        self.minimum_percent
    }

    pub fn required(&self) -> &[ProfileField] {
        &self.required
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_PERCENT)
    }
}

/// Result of an eligibility check. Incomplete profiles are an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityReport {
    pub student_id: StudentId,
    pub eligible: bool,
    pub filled: usize,
    pub required: usize,
    pub completion_percent: u8,
    pub minimum_percent: u8,
    pub missing: Vec<ProfileField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EligibilityReport {
    pub(crate) fn missing_profile(student_id: StudentId, policy: &EligibilityPolicy) -> Self {
        Self {
            student_id,
            eligible: false,
            filled: 0,
            required: policy.required.len(),
            completion_percent: 0,
            minimum_percent: policy.minimum_percent,
            missing: policy.required.clone(),
            reason: Some("no student profile on file".to_string()),
        }
    }
}

/// Pre-submission guard scoring profile completeness.
#[derive(Debug, Clone, Default)]
pub struct EligibilityGate {
    policy: EligibilityPolicy,
}

impl EligibilityGate {
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn check_eligibility(&self, profile: &StudentProfile) -> EligibilityReport {
        let required = self.policy.required.len();
        let missing: Vec<ProfileField> = self
            .policy
            .required
            .iter()
            .copied()
            .filter(|field| !profile.is_populated(*field))
            .collect();
        let filled = required - missing.len();

        // Integer comparison keeps 8/10 at exactly 80%.
        let eligible = required == 0
            || filled * 100 >= required * usize::from(self.policy.minimum_percent);
        let completion_percent = if required == 0 {
            100
        } else {
            (filled * 100 / required) as u8
        };

        let reason = if eligible {
            None
        } else {
            let names: Vec<&str> = missing.iter().map(|field| field.label()).collect();
            Some(format!(
                "profile {completion_percent}% complete, {}% required (missing: {})",
                self.policy.minimum_percent,
                names.join(", ")
            ))
        };

        EligibilityReport {
            student_id: profile.student_id.clone(),
            eligible,
            filled,
            required,
            completion_percent,
            minimum_percent: self.policy.minimum_percent,
            missing,
            reason,
        }
    }
}
