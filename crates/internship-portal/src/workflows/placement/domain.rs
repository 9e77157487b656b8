use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for internship applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Opaque reference to the student owning an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Opaque reference to the internship posting applied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InternshipId(pub String);

/// Identity of a person acting on an application (staff member, instructor, supervisor...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InternshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authoritative lifecycle stage of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Submitted,
    StaffReceived,
    StaffReviewed,
    CourseInstructorPending,
    CourseInstructorApproved,
    CourseInstructorRejected,
    SupervisorAssignmentPending,
    SupervisorReceived,
    SupervisorConfirmed,
    AppointmentScheduled,
    CommitteeReceived,
    CommitteeReviewed,
    Approved,
    Rejected,
}

impl LifecycleStage {
    pub const fn ordered() -> [Self; 14] {
        [
            Self::Submitted,
            Self::StaffReceived,
            Self::StaffReviewed,
            Self::CourseInstructorPending,
            Self::CourseInstructorApproved,
            Self::SupervisorAssignmentPending,
            Self::SupervisorReceived,
            Self::SupervisorConfirmed,
            Self::AppointmentScheduled,
            Self::CommitteeReceived,
            Self::CommitteeReviewed,
            Self::Approved,
            Self::CourseInstructorRejected,
            Self::Rejected,
        ]
    }

    /// Position in the forward ordering graph. Rejected terminals rank after everything.
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::StaffReceived => 1,
            Self::StaffReviewed => 2,
            Self::CourseInstructorPending => 3,
            Self::CourseInstructorApproved => 4,
            Self::SupervisorAssignmentPending => 5,
            Self::SupervisorReceived => 6,
            Self::SupervisorConfirmed => 7,
            Self::AppointmentScheduled => 8,
            Self::CommitteeReceived => 9,
            Self::CommitteeReviewed => 10,
            Self::Approved => 11,
            Self::CourseInstructorRejected | Self::Rejected => 12,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Rejected | Self::CourseInstructorRejected
        )
    }

    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected | Self::CourseInstructorRejected)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::StaffReceived => "staff_received",
            Self::StaffReviewed => "staff_reviewed",
            Self::CourseInstructorPending => "course_instructor_pending",
            Self::CourseInstructorApproved => "course_instructor_approved",
            Self::CourseInstructorRejected => "course_instructor_rejected",
            Self::SupervisorAssignmentPending => "supervisor_assignment_pending",
            Self::SupervisorReceived => "supervisor_received",
            Self::SupervisorConfirmed => "supervisor_confirmed",
            Self::AppointmentScheduled => "appointment_scheduled",
            Self::CommitteeReceived => "committee_received",
            Self::CommitteeReviewed => "committee_reviewed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Participant types permitted to act on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Student,
    Staff,
    CourseInstructor,
    Supervisor,
    Committee,
}

impl ActorRole {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Student,
            Self::Staff,
            Self::CourseInstructor,
            Self::Supervisor,
            Self::Committee,
        ]
    }

    /// Roles that carry an audit record, in pipeline order.
    pub const fn reviewers() -> [Self; 4] {
        [
            Self::Staff,
            Self::CourseInstructor,
            Self::Supervisor,
            Self::Committee,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Staff => "staff",
            Self::CourseInstructor => "course_instructor",
            Self::Supervisor => "supervisor",
            Self::Committee => "committee",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Staff => "Staff",
            Self::CourseInstructor => "Course Instructor",
            Self::Supervisor => "Supervisor",
            Self::Committee => "Committee",
        }
    }

    /// Parses snake_case, camelCase, and kebab-case spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "student" => Some(Self::Student),
            "staff" => Some(Self::Staff),
            "courseinstructor" | "instructor" => Some(Self::CourseInstructor),
            "supervisor" => Some(Self::Supervisor),
            "committee" => Some(Self::Committee),
            _ => None,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ruling recorded by a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

/// Per-actor audit record: custody receipt plus the ruling and when it was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageAudit {
    pub received: bool,
    pub received_at: Option<DateTime<Utc>>,
    pub decision: Option<Decision>,
    pub feedback: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl StageAudit {
    pub fn is_approved(&self) -> bool {
        self.decision == Some(Decision::Approved)
    }

    pub fn is_rejected(&self) -> bool {
        self.decision == Some(Decision::Rejected)
    }
}

/// Meeting arranged by the supervisor once the assignment is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub date_time: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Persistent record of one internship application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub internship_id: InternshipId,
    pub lifecycle_stage: LifecycleStage,
    pub staff: StageAudit,
    pub course_instructor: StageAudit,
    pub supervisor: StageAudit,
    pub committee: StageAudit,
    pub supervisor_id: Option<ActorId>,
    pub appointment: Option<Appointment>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every persisted transition; used for optimistic concurrency.
    pub version: u64,
}

/// Where an application stands, derived once from the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Active(LifecycleStage),
    Approved,
    Rejected { by: Option<ActorRole> },
}

impl Application {
    pub fn audit(&self, role: ActorRole) -> Option<&StageAudit> {
        match role {
            ActorRole::Student => None,
            ActorRole::Staff => Some(&self.staff),
            ActorRole::CourseInstructor => Some(&self.course_instructor),
            ActorRole::Supervisor => Some(&self.supervisor),
            ActorRole::Committee => Some(&self.committee),
        }
    }

    pub(crate) fn audit_mut(&mut self, role: ActorRole) -> Option<&mut StageAudit> {
        match role {
            ActorRole::Student => None,
            ActorRole::Staff => Some(&mut self.staff),
            ActorRole::CourseInstructor => Some(&mut self.course_instructor),
            ActorRole::Supervisor => Some(&mut self.supervisor),
            ActorRole::Committee => Some(&mut self.committee),
        }
    }

    /// The reviewer whose decision rejected the application, if any.
    pub fn rejected_by(&self) -> Option<ActorRole> {
        ActorRole::reviewers().into_iter().find(|role| {
            self.audit(*role)
                .map(StageAudit::is_rejected)
                .unwrap_or(false)
        })
    }

    pub fn progress(&self) -> Progress {
        match self.lifecycle_stage {
            LifecycleStage::Approved => Progress::Approved,
            LifecycleStage::CourseInstructorRejected => Progress::Rejected {
                by: Some(ActorRole::CourseInstructor),
            },
            LifecycleStage::Rejected => Progress::Rejected {
                by: self.rejected_by(),
            },
            stage => Progress::Active(stage),
        }
    }

    /// Reports every violated data-model invariant. An empty list means the record is consistent.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        for role in ActorRole::reviewers() {
            let Some(audit) = self.audit(role) else {
                continue;
            };
            if audit.decision.is_some() && !audit.received {
                violations.push(InvariantViolation::DecisionWithoutReceipt(role));
            }
            if audit.is_rejected() && is_blank(audit.feedback.as_deref()) {
                violations.push(InvariantViolation::RejectionWithoutFeedback(role));
            }
        }

        let supervisor_expected = match self.progress() {
            Progress::Active(stage) => {
                stage.ordinal() > LifecycleStage::CourseInstructorApproved.ordinal()
            }
            Progress::Approved => true,
            Progress::Rejected { .. } => self.course_instructor.is_approved(),
        };
        if self.supervisor_id.is_some() != supervisor_expected {
            violations.push(InvariantViolation::SupervisorMismatch {
                stage: self.lifecycle_stage,
            });
        }

        if self.appointment.is_some() {
            let allowed = match self.progress() {
                Progress::Active(stage) => {
                    stage.ordinal() >= LifecycleStage::AppointmentScheduled.ordinal()
                }
                Progress::Approved => true,
                Progress::Rejected { .. } => self.supervisor.is_approved(),
            };
            if !allowed {
                violations.push(InvariantViolation::PrematureAppointment {
                    stage: self.lifecycle_stage,
                });
            }
        }

        let rejections = ActorRole::reviewers()
            .into_iter()
            .filter(|role| {
                self.audit(*role)
                    .map(StageAudit::is_rejected)
                    .unwrap_or(false)
            })
            .count();
        let conflicting = match self.progress() {
            Progress::Approved => rejections > 0,
            Progress::Rejected { .. } => rejections != 1,
            Progress::Active(_) => rejections > 0,
        };
        if conflicting {
            violations.push(InvariantViolation::ConflictingOutcome {
                stage: self.lifecycle_stage,
            });
        }

        let reviewers = ActorRole::reviewers();
        for (index, role) in reviewers.iter().enumerate() {
            let received = self.audit(*role).map(|a| a.received).unwrap_or(false);
            if !received {
                continue;
            }
            let predecessors_approved = reviewers[..index]
                .iter()
                .all(|earlier| self.audit(*earlier).map(StageAudit::is_approved).unwrap_or(false));
            let staged = match role {
                ActorRole::Supervisor => self.supervisor_id.is_some(),
                ActorRole::Committee => self.appointment.is_some(),
                _ => true,
            };
            if !predecessors_approved || !staged {
                violations.push(InvariantViolation::SkippedStage(*role));
            }
        }

        violations
    }
}

/// Data-model invariant violations detected on a stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("{0} recorded a decision without receiving the application")]
    DecisionWithoutReceipt(ActorRole),
    #[error("{0} rejected the application without feedback")]
    RejectionWithoutFeedback(ActorRole),
    #[error("supervisor assignment inconsistent with stage {stage}")]
    SupervisorMismatch { stage: LifecycleStage },
    #[error("appointment present before scheduling at stage {stage}")]
    PrematureAppointment { stage: LifecycleStage },
    #[error("approval and rejection outcomes conflict at stage {stage}")]
    ConflictingOutcome { stage: LifecycleStage },
    #[error("{0} acted before every earlier stage completed")]
    SkippedStage(ActorRole),
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map(|text| text.trim().is_empty()).unwrap_or(true)
}

pub(crate) fn normalized_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
