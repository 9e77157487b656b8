use crate::infra::{build_portal, Portal, COMMITTEE_ID, INSTRUCTOR_ID, STAFF_ID, SUPERVISOR_ID};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, ValueEnum};
use internship_portal::config::{AppConfig, WorkflowConfig};
use internship_portal::error::AppError;
use internship_portal::workflows::placement::{
    write_status_csv, ActorId, ApplicationId, Appointment, InternshipId, ReviewInput,
    StageHandlerError, StudentId, WorkflowStatusView,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RejectingReviewer {
    Staff,
    CourseInstructor,
    Committee,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Student submitting the application (seeded: stu-001, stu-002, stu-003)
    #[arg(long, default_value = "stu-001")]
    pub(crate) student: String,
    /// Internship posting applied to
    #[arg(long, default_value = "posting-2025-001")]
    pub(crate) internship: String,
    /// Stop the run with a rejection from this reviewer
    #[arg(long, value_enum)]
    pub(crate) reject_at: Option<RejectingReviewer>,
    /// Appointment time (RFC 3339 or YYYY-MM-DD HH:MM). Defaults to one week from now.
    #[arg(long, value_parser = crate::infra::parse_datetime)]
    pub(crate) appointment_at: Option<DateTime<Utc>>,
    /// Appointment location
    #[arg(long, default_value = "Faculty of Engineering, Room 402")]
    pub(crate) location: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Write CSV to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

fn workflow_config() -> Result<WorkflowConfig, AppError> {
    Ok(AppConfig::load()?.workflow)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        student,
        internship,
        reject_at,
        appointment_at,
        location,
    } = args;

    let portal = build_portal(&workflow_config()?);
    let student = StudentId(student);

    println!("Internship placement workflow demo");
    let report = portal.service.eligibility(&student)?;
    println!(
        "Eligibility for {}: {}% complete (minimum {}%) -> {}",
        student,
        report.completion_percent,
        report.minimum_percent,
        if report.eligible { "eligible" } else { "ineligible" }
    );
    if let Some(reason) = &report.reason {
        println!("  {reason}");
    }

    let application = portal
        .service
        .submit(&student, &InternshipId(internship))?;
    print_status(&portal, &application.id, "student submits")?;

    let appointment = Appointment {
        date_time: appointment_at.unwrap_or_else(|| Utc::now() + Duration::days(7)),
        location,
        notes: Some("Bring a printed CV".to_string()),
    };
    walk(&portal, &application.id, reject_at, appointment, |label| {
        print_status(&portal, &application.id, label)
    })?;

    println!("\nHand-off trail");
    for event in portal.publisher.events() {
        let next = event
            .next_actor_role
            .map(|role| role.display_name())
            .unwrap_or("nobody");
        println!(
            "- {} by {} -> {} (next: {})",
            event.application_id,
            event.actor_role.display_name(),
            event.new_stage,
            next
        );
    }

    let final_record = portal.service.get(&application.id)?;
    let violations = final_record.check_invariants();
    if violations.is_empty() {
        println!("\nRecord consistent at version {}", final_record.version);
    } else {
        for violation in violations {
            println!("Invariant violated: {violation}");
        }
    }

    Ok(())
}

/// Drive the application through every reviewer, stopping early when `reject_at` fires.
/// `observe` runs after each step with a short label.
fn walk(
    portal: &Portal,
    id: &ApplicationId,
    reject_at: Option<RejectingReviewer>,
    appointment: Appointment,
    mut observe: impl FnMut(&str) -> Result<(), AppError>,
) -> Result<(), AppError> {
    let service = &portal.service;
    let staff = ActorId(STAFF_ID.to_string());
    let instructor = ActorId(INSTRUCTOR_ID.to_string());
    let supervisor = ActorId(SUPERVISOR_ID.to_string());
    let committee = ActorId(COMMITTEE_ID.to_string());

    service.staff().receive(id, &staff)?;
    observe("staff receives")?;
    if reject_at == Some(RejectingReviewer::Staff) {
        service.staff().review(
            id,
            &staff,
            ReviewInput::reject("Internship agreement form is unsigned"),
        )?;
        return observe("staff rejects");
    }
    service.staff().review(id, &staff, ReviewInput::approve())?;
    observe("staff approves")?;

    service.course_instructor().receive(id, &instructor)?;
    observe("course instructor receives")?;
    if reject_at == Some(RejectingReviewer::CourseInstructor) {
        service.course_instructor().reject(
            id,
            &instructor,
            "Required course CPE-301 not yet completed",
        )?;
        return observe("course instructor rejects");
    }
    service.course_instructor().approve(
        id,
        &instructor,
        supervisor.clone(),
        Some("Good match for the embedded systems team".to_string()),
    )?;
    observe("course instructor approves and assigns supervisor")?;

    service.supervisor().receive_assignment(id, &supervisor)?;
    observe("supervisor receives assignment")?;
    service.supervisor().confirm_assignment(id, &supervisor, None)?;
    observe("supervisor confirms")?;
    service
        .supervisor()
        .schedule_appointment(id, &supervisor, appointment)?;
    observe("supervisor schedules appointment")?;

    service.committee().receive(id, &committee)?;
    observe("committee receives")?;
    if reject_at == Some(RejectingReviewer::Committee) {
        service.committee().review(
            id,
            &committee,
            ReviewInput::reject("Host company has no signed MOU with the faculty"),
        )?;
        return observe("committee rejects");
    }
    service
        .committee()
        .review(id, &committee, ReviewInput::approve())?;
    observe("committee approves")
}

fn print_status(portal: &Portal, id: &ApplicationId, label: &str) -> Result<(), AppError> {
    let view = portal.service.status(id)?;
    println!("\n[{label}]");
    println!(
        "Stage: {} | Step: {} | Next: {}",
        view.lifecycle_stage,
        view.current_step_label,
        view.next_actor
            .map(|role| role.display_name())
            .unwrap_or("-")
    );
    for actor in &view.actors {
        match &actor.feedback {
            Some(feedback) => println!(
                "  - {}: {} ({feedback})",
                actor.role_label, actor.status_label
            ),
            None => println!("  - {}: {}", actor.role_label, actor.status_label),
        }
    }
    if let Some(appointment) = &view.appointment {
        println!(
            "  Appointment: {} at {}",
            appointment.date_time.format("%Y-%m-%d %H:%M UTC"),
            appointment.location
        );
    }
    Ok(())
}

/// Seed one application per outcome, then export every status view.
pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let portal = build_portal(&workflow_config()?);
    let appointment = || Appointment {
        date_time: Utc::now() + Duration::days(7),
        location: "Faculty of Engineering, Room 402".to_string(),
        notes: None,
    };

    let scenarios = [
        ("stu-001", "posting-2025-001", None),
        ("stu-001", "posting-2025-002", Some(RejectingReviewer::CourseInstructor)),
        ("stu-002", "posting-2025-003", Some(RejectingReviewer::Committee)),
    ];
    for (student, internship, reject_at) in scenarios {
        let application = portal.service.submit(
            &StudentId(student.to_string()),
            &InternshipId(internship.to_string()),
        )?;
        walk(&portal, &application.id, reject_at, appointment(), |_| Ok(()))?;
    }
    portal.service.submit(
        &StudentId("stu-002".to_string()),
        &InternshipId("posting-2025-004".to_string()),
    )?;

    let views: Vec<WorkflowStatusView> = portal
        .repository
        .all()
        .map_err(StageHandlerError::from)?
        .iter()
        .map(|application| portal.service.project(application))
        .collect();

    match args.output {
        Some(path) => {
            let file = File::create(&path)?;
            write_status_csv(&views, BufWriter::new(file))?;
            eprintln!("Wrote {} applications to {}", views.len(), path.display());
        }
        None => write_status_csv(&views, io::stdout().lock())?,
    }
    Ok(())
}
