//! The instructor's displayed schedule list and the create-schedule form.
//!
//! Phases move `Idle -> Incomplete -> Submitting -> Succeeded | Failed` and back
//! to `Idle` once the notice has been shown. Validation happens before any
//! request is made, and the list only changes on a successful create or delete.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data_api::DataApiClient;
use crate::dates;
use crate::error::AppError;
use crate::models::{InstructorCourse, NewSchedule, Program, Schedule};
use crate::services::notice::Notice;

pub const MISSING_FIELDS: &str = "Please fill all the fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    #[default]
    Idle,
    Incomplete,
    Submitting,
    Succeeded,
    Failed,
}

/// Raw form input. Either `program_id` + `date` + `fixed`, or the freeform
/// course/class/date/start/end/fixed set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleForm {
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub fixed: Option<bool>,
}

fn required(value: &Option<String>) -> Result<&str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))
}

fn invalid_input(err: AppError) -> AppError {
    match err {
        AppError::Parse(msg) => AppError::Validation(msg),
        other => other,
    }
}

impl ScheduleForm {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Builds the POST body, or a `Validation` error naming what is wrong.
    ///
    /// Freeform course/class pairs must be one of the instructor's `courses`.
    pub fn to_new_schedule(
        &self,
        programs: &[Program],
        courses: &[InstructorCourse],
    ) -> Result<NewSchedule, AppError> {
        let fixed = self
            .fixed
            .ok_or_else(|| AppError::Validation(MISSING_FIELDS.to_string()))?;
        let date = dates::parse_date(required(&self.date)?).map_err(invalid_input)?;

        match self.program_id {
            Some(program_id) => {
                let program = programs
                    .iter()
                    .find(|p| p.id == program_id)
                    .ok_or_else(|| AppError::Validation(format!("Unknown program {}", program_id)))?;
                let (session_start, session_end) = dates::session_range(program, date)?;

                Ok(NewSchedule {
                    session_start,
                    session_end,
                    class: program.class.clone(),
                    course_code: program.course_code.clone(),
                    fixed,
                })
            }
            None => {
                let course_code = required(&self.course_code)?;
                let class = required(&self.class)?;
                if !teaches(courses, course_code, class) {
                    return Err(AppError::Validation(format!(
                        "{} is not taught to class {}",
                        course_code, class
                    )));
                }
                let start = dates::parse_time(required(&self.start_time)?).map_err(invalid_input)?;
                let end = dates::parse_time(required(&self.end_time)?).map_err(invalid_input)?;

                let session_start = date.and_time(start);
                let session_end = date.and_time(end);
                dates::ensure_ordered(session_start, session_end)?;

                Ok(NewSchedule {
                    session_start,
                    session_end,
                    class: class.to_string(),
                    course_code: course_code.to_string(),
                    fixed,
                })
            }
        }
    }
}

fn teaches(courses: &[InstructorCourse], course_code: &str, class: &str) -> bool {
    courses
        .iter()
        .any(|c| c.course_code == course_code && c.class.as_deref() == Some(class))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleBoard {
    schedules: Vec<Schedule>,
    programs: Vec<Program>,
    courses: Vec<InstructorCourse>,
    form: ScheduleForm,
    phase: FormPhase,
}

impl ScheduleBoard {
    pub fn new(
        schedules: Vec<Schedule>,
        programs: Vec<Program>,
        courses: Vec<InstructorCourse>,
    ) -> Self {
        Self {
            schedules,
            programs,
            courses,
            ..Self::default()
        }
    }

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn courses(&self) -> &[InstructorCourse] {
        &self.courses
    }

    pub fn form(&self) -> &ScheduleForm {
        &self.form
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Replaces the displayed data after a dashboard load. The form is kept.
    pub fn load(
        &mut self,
        schedules: Vec<Schedule>,
        programs: Vec<Program>,
        courses: Vec<InstructorCourse>,
    ) {
        self.schedules = schedules;
        self.programs = programs;
        self.courses = courses;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn edit(&mut self, form: ScheduleForm) {
        self.phase = if form.is_empty() {
            FormPhase::Idle
        } else {
            FormPhase::Incomplete
        };
        self.form = form;
    }

    /// Validates the form. On success the board is `Submitting` and the
    /// returned body is ready to send; on failure nothing is sent.
    pub fn begin_submit(&mut self) -> Result<NewSchedule, Notice> {
        match self.form.to_new_schedule(&self.programs, &self.courses) {
            Ok(new_schedule) => {
                self.phase = FormPhase::Submitting;
                Ok(new_schedule)
            }
            Err(e) => {
                self.phase = FormPhase::Incomplete;
                Err(Notice::validation(e.to_string()))
            }
        }
    }

    pub fn complete_submit(&mut self, result: Result<Schedule, AppError>) -> Notice {
        match result {
            Ok(created) => {
                info!(schedule_id = created.id, course = %created.course_code, "schedule created");
                self.schedules.push(created);
                self.form = ScheduleForm::default();
                self.phase = FormPhase::Succeeded;
                Notice::success("Schedule created")
            }
            Err(e) => {
                warn!("schedule creation failed: {}", e);
                self.phase = FormPhase::Failed;
                Notice::failure("Error creating schedule", &e, "Failed to create schedule")
            }
        }
    }

    pub async fn submit(&mut self, api: &dyn DataApiClient) -> Notice {
        let new_schedule = match self.begin_submit() {
            Ok(new_schedule) => new_schedule,
            Err(notice) => return notice,
        };
        let result = api.create_schedule(&new_schedule).await;
        self.complete_submit(result)
    }

    /// Returns to `Idle` once the notice for a finished submit has been shown.
    pub fn acknowledge(&mut self) {
        if matches!(self.phase, FormPhase::Succeeded | FormPhase::Failed) {
            self.phase = FormPhase::Idle;
        }
    }

    pub async fn delete(&mut self, api: &dyn DataApiClient, id: i64) -> Notice {
        let result = api.delete_schedule(id).await;
        self.complete_delete(id, result)
    }

    pub fn complete_delete(&mut self, id: i64, result: Result<i64, AppError>) -> Notice {
        match result {
            Ok(deleted) => {
                self.schedules.retain(|s| s.id != deleted);
                info!(schedule_id = deleted, "schedule deleted");
                Notice::success("Schedule Deleted")
            }
            Err(e) => {
                warn!(schedule_id = id, "schedule deletion failed: {}", e);
                Notice::failure("Failed to delete schedule", &e, "Failed to delete schedule")
            }
        }
    }
}
