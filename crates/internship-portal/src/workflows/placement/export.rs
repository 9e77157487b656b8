use std::io::Write;

use serde::Serialize;

use super::projector::WorkflowStatusView;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error during export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    application_id: &'a str,
    student_id: &'a str,
    internship_id: &'a str,
    lifecycle_stage: &'static str,
    current_step: &'static str,
    next_actor: &'static str,
    staff: &'static str,
    course_instructor: &'static str,
    supervisor: &'static str,
    committee: &'static str,
    supervisor_id: &'a str,
    appointment: String,
    completed: bool,
    rejected: bool,
    updated_at: String,
}

/// Write one CSV row per status view. The header is emitted with the first row.
pub fn write_status_csv<W: Write>(
    views: &[WorkflowStatusView],
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for view in views {
        let actor_status = |index: usize| {
            view.actors
                .get(index)
                .map(|actor| actor.status_label)
                .unwrap_or("")
        };

        csv_writer.serialize(StatusRow {
            application_id: &view.application_id.0,
            student_id: &view.student_id.0,
            internship_id: &view.internship_id.0,
            lifecycle_stage: view.lifecycle_stage.label(),
            current_step: view.current_step_label,
            next_actor: view.next_actor.map(|role| role.label()).unwrap_or(""),
            staff: actor_status(0),
            course_instructor: actor_status(1),
            supervisor: actor_status(2),
            committee: actor_status(3),
            supervisor_id: view
                .supervisor_id
                .as_ref()
                .map(|id| id.0.as_str())
                .unwrap_or(""),
            appointment: view
                .appointment
                .as_ref()
                .map(|appointment| {
                    format!(
                        "{} @ {}",
                        appointment.date_time.to_rfc3339(),
                        appointment.location
                    )
                })
                .unwrap_or_default(),
            completed: view.is_completed,
            rejected: view.is_rejected,
            updated_at: view.updated_at.to_rfc3339(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
