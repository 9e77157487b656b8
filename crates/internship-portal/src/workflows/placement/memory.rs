//! In-process adapters for every consumed port. Used by the demo binary and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{ActorId, ActorRole, Application, ApplicationId, LifecycleStage, StudentId};
use super::eligibility::StudentProfile;
use super::engine::MutationSet;
use super::repository::{
    ApplicationRepository, DirectoryError, NotifyError, ProfileSource, RepositoryError,
    RoleDirectory, StageAdvanced, StageEventPublisher,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
}

/// Mutex-guarded map; every write happens under one lock so mutation sets land atomically.
#[derive(Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationRepository {
    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(lock(&self.records)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }

    pub fn all(&self) -> Result<Vec<Application>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut records: Vec<Application> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        let open_duplicate = guard.values().any(|existing| {
            existing.student_id == application.student_id
                && existing.internship_id == application.internship_id
                && !existing.lifecycle_stage.is_terminal()
        });
        if open_duplicate {
            return Err(RepositoryError::OpenApplicationExists);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn save_mutations(&self, mutations: &MutationSet) -> Result<Application, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let current = guard
            .get(&mutations.application_id)
            .ok_or(RepositoryError::NotFound)?;
        if current.version != mutations.expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: mutations.expected_version,
                found: current.version,
            });
        }
        let next = mutations.apply(current);
        guard.insert(next.id.clone(), next.clone());
        Ok(next)
    }

    fn for_student(&self, student_id: &StudentId) -> Result<Vec<Application>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .values()
            .filter(|application| &application.student_id == student_id)
            .cloned()
            .collect())
    }

    fn in_stages(
        &self,
        stages: &[LifecycleStage],
        limit: usize,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut matching: Vec<Application> = guard
            .values()
            .filter(|application| stages.contains(&application.lifecycle_stage))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        matching.truncate(limit);
        Ok(matching)
    }
}

/// Fixed membership table for staff, course instructors, and committee members.
#[derive(Default, Clone)]
pub struct StaticRoleDirectory {
    members: Arc<Mutex<HashSet<(ActorId, ActorRole)>>>,
}

impl StaticRoleDirectory {
    pub fn grant(&self, actor_id: ActorId, role: ActorRole) {
        if let Ok(mut guard) = self.members.lock() {
            guard.insert((actor_id, role));
        }
    }

    pub fn with_member(self, actor_id: &str, role: ActorRole) -> Self {
        self.grant(ActorId(actor_id.to_string()), role);
        self
    }
}

impl RoleDirectory for StaticRoleDirectory {
    fn holds_role(
        &self,
        actor_id: &ActorId,
        role: ActorRole,
        _application: &Application,
    ) -> Result<bool, DirectoryError> {
        let guard = self
            .members
            .lock()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        Ok(guard.contains(&(actor_id.clone(), role)))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryProfileSource {
    profiles: Arc<Mutex<HashMap<StudentId, StudentProfile>>>,
}

impl InMemoryProfileSource {
    pub fn upsert(&self, profile: StudentProfile) {
        if let Ok(mut guard) = self.profiles.lock() {
            guard.insert(profile.student_id.clone(), profile);
        }
    }
}

impl ProfileSource for InMemoryProfileSource {
    fn profile(&self, student_id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        let guard = lock(&self.profiles)?;
        Ok(guard.get(student_id).cloned())
    }
}

/// Keeps every published event so callers can inspect the hand-off trail.
#[derive(Default, Clone)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<StageAdvanced>>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<StageAdvanced> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl StageEventPublisher for RecordingPublisher {
    fn publish(&self, event: StageAdvanced) -> Result<(), NotifyError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotifyError::Transport("event log poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }
}
