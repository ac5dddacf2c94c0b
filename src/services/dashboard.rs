use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::data_api::DataApiClient;
use crate::dates;
use crate::error::AppError;
use crate::models::{Instructor, InstructorCourse, Program, Schedule, Student};
use crate::services::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStage {
    InstructorDetails,
    InstructorCourses,
    Schedules,
    Programs,
    StudentDetails,
    StudentSchedules,
}

impl DashboardStage {
    /// Notice title for a failed load; the student view only loads schedules.
    pub fn failure_title(self) -> &'static str {
        match self {
            DashboardStage::StudentDetails | DashboardStage::StudentSchedules => {
                "Error fetching schedules"
            }
            _ => "Error fetching data",
        }
    }
}

impl fmt::Display for DashboardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DashboardStage::InstructorDetails => "instructor details",
            DashboardStage::InstructorCourses => "instructor courses",
            DashboardStage::Schedules => "schedules",
            DashboardStage::Programs => "programs",
            DashboardStage::StudentDetails => "student details",
            DashboardStage::StudentSchedules => "student schedules",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("Failed to load {stage}: {source}")]
pub struct DashboardError {
    pub stage: DashboardStage,
    #[source]
    pub source: AppError,
}

impl DashboardError {
    pub fn notice(&self) -> Notice {
        let mut notice = Notice::failure(self.stage.failure_title(), &self.source, "Failed to load data");
        notice.description = Some(self.to_string());
        notice
    }
}

trait AtStage<T> {
    fn at(self, stage: DashboardStage) -> Result<T, DashboardError>;
}

impl<T> AtStage<T> for Result<T, AppError> {
    fn at(self, stage: DashboardStage) -> Result<T, DashboardError> {
        self.map_err(|source| {
            error!(%stage, "dashboard load failed: {}", source);
            DashboardError { stage, source }
        })
    }
}

/// One table row as the dashboards display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub id: i64,
    pub weekday: String,
    pub date: String,
    pub course_code: String,
    pub class: String,
    pub start_time: String,
    pub end_time: String,
    pub kind: &'static str,
}

impl From<&Schedule> for ScheduleRow {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id,
            weekday: dates::weekday_from_datetime(&schedule.session_start),
            date: dates::format_date_from_datetime(&schedule.session_start),
            course_code: schedule.course_code.clone(),
            class: schedule.class.clone(),
            start_time: dates::format_time_from_datetime(&schedule.session_start),
            end_time: dates::format_time_from_datetime(&schedule.session_end),
            kind: if schedule.fixed { "Fixed" } else { "Not Fixed" },
        }
    }
}

pub fn rows(schedules: &[Schedule]) -> Vec<ScheduleRow> {
    schedules.iter().map(ScheduleRow::from).collect()
}

#[derive(Debug, Clone)]
pub struct InstructorDashboard {
    pub instructor: Instructor,
    pub courses: Vec<InstructorCourse>,
    pub schedules: Vec<Schedule>,
    pub programs: Vec<Program>,
}

impl InstructorDashboard {
    /// Distinct course codes in the order they were assigned.
    pub fn course_codes(&self) -> Vec<String> {
        distinct_codes(&self.courses)
    }

    pub fn courses_label(&self) -> String {
        self.course_codes().join(" - ")
    }
}

fn distinct_codes(courses: &[InstructorCourse]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::with_capacity(courses.len());
    for course in courses {
        if !codes.contains(&course.course_code) {
            codes.push(course.course_code.clone());
        }
    }
    codes
}

/// details -> courses -> upcoming schedules -> programs
pub async fn load_instructor_dashboard(
    api: &dyn DataApiClient,
    instructor_id: i64,
    cutoff: NaiveDateTime,
) -> Result<InstructorDashboard, DashboardError> {
    let instructor = api
        .get_instructor_details(instructor_id)
        .await
        .at(DashboardStage::InstructorDetails)?;

    let courses = api
        .get_instructor_courses(instructor_id)
        .await
        .at(DashboardStage::InstructorCourses)?;
    let codes = distinct_codes(&courses);

    let schedules = api
        .get_schedules(&codes, cutoff)
        .await
        .at(DashboardStage::Schedules)?;

    let programs = api
        .get_programs(&codes)
        .await
        .at(DashboardStage::Programs)?;

    info!(
        instructor_id,
        courses = codes.len(),
        schedules = schedules.len(),
        programs = programs.len(),
        "instructor dashboard loaded"
    );

    Ok(InstructorDashboard {
        instructor,
        courses,
        schedules,
        programs,
    })
}

#[derive(Debug, Clone)]
pub struct StudentDashboard {
    pub student: Student,
    pub schedules: Vec<Schedule>,
}

/// details -> upcoming schedules for the student's class
pub async fn load_student_dashboard(
    api: &dyn DataApiClient,
    student_id: i64,
    cutoff: NaiveDateTime,
) -> Result<StudentDashboard, DashboardError> {
    let student = api
        .get_student_details(student_id)
        .await
        .at(DashboardStage::StudentDetails)?;

    let schedules = api
        .get_student_schedules(&student.class, cutoff)
        .await
        .at(DashboardStage::StudentSchedules)?;

    info!(student_id, class = %student.class, schedules = schedules.len(), "student dashboard loaded");

    Ok(StudentDashboard { student, schedules })
}
