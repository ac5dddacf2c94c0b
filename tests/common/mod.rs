#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::Notify;

use schedule_portal::data_api::DataApiClient;
use schedule_portal::data_api::filter::{Filter, FilterValue, Op};
use schedule_portal::dates;
use schedule_portal::db;
use schedule_portal::error::AppError;
use schedule_portal::models::{
    Course, Instructor, InstructorCourse, NewSchedule, Program, Role, Schedule, Student,
    UserRecord,
};

pub fn dt(value: &str) -> NaiveDateTime {
    dates::parse_datetime(value).expect("valid datetime")
}

pub fn schedule(id: i64, course_code: &str, class: &str, start: &str, end: &str, fixed: bool) -> Schedule {
    Schedule {
        id,
        session_start: dt(start),
        session_end: dt(end),
        class: class.to_string(),
        course_code: course_code.to_string(),
        fixed,
    }
}

pub fn program(id: i64, course_code: &str, class: &str, weekday: &str, start: &str, end: &str) -> Program {
    Program {
        id,
        class: class.to_string(),
        weekday: weekday.to_string(),
        course_code: course_code.to_string(),
        start_time: dates::parse_time(start).expect("valid time"),
        end_time: dates::parse_time(end).expect("valid time"),
    }
}

pub fn user_record(user_id: i64, role: Role, username: &str, password: &str) -> UserRecord {
    UserRecord {
        user_id,
        role,
        username: Some(username.to_string()),
        password: Some(password.to_string()),
    }
}

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

/// Data API double that evaluates filters against in-memory rows.
#[derive(Default)]
pub struct InMemoryDataApi {
    pub users: Vec<UserRecord>,
    pub students: Vec<Student>,
    pub instructors: Vec<Instructor>,
    pub instructor_courses: Vec<InstructorCourse>,
    pub courses: Vec<Course>,
    pub programs: Vec<Program>,
    pub schedules: Mutex<Vec<Schedule>>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub calls: Mutex<Vec<String>>,
    pub create_gate: Mutex<Option<Arc<Notify>>>,
    next_id: AtomicI64,
}

impl InMemoryDataApi {
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub fn with_schedules(mut self, schedules: Vec<Schedule>) -> Self {
        let max_id = schedules.iter().map(|s| s.id).max().unwrap_or(0);
        self.next_id = AtomicI64::new(max_id);
        self.schedules = Mutex::new(schedules);
        self
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Creates wait on the returned `Notify` before completing.
    pub fn hold_creates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored_schedules(&self) -> Vec<Schedule> {
        self.schedules.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(operation.to_string());
        if self.failing.lock().unwrap().contains(operation) {
            return Err(AppError::Fetch {
                resource: operation,
                status: Some(500),
                message: "500 Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

fn user_matches(filter: &Filter, user: &UserRecord) -> bool {
    match filter {
        Filter::Compare { field, op: Op::Eq, value } => match (*field, value) {
            ("user_id", FilterValue::Integer(id)) => user.user_id == *id,
            ("username", FilterValue::Text(name)) => user.username.as_deref() == Some(name.as_str()),
            ("password", FilterValue::Text(pw)) => user.password.as_deref() == Some(pw.as_str()),
            _ => false,
        },
        Filter::Compare { .. } => false,
        Filter::Group(inner) => user_matches(inner, user),
        Filter::And(clauses) => clauses.iter().all(|c| user_matches(c, user)),
        Filter::Or(clauses) => clauses.iter().any(|c| user_matches(c, user)),
    }
}

#[async_trait]
impl DataApiClient for InMemoryDataApi {
    async fn fetch_users(&self, filter: &Filter) -> Result<Vec<UserRecord>, AppError> {
        self.record("users")?;
        Ok(self
            .users
            .iter()
            .filter(|u| user_matches(filter, u))
            .cloned()
            .collect())
    }

    async fn get_student_details(&self, id: i64) -> Result<Student, AppError> {
        self.record("student_details")?;
        self.students
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn get_instructor_details(&self, id: i64) -> Result<Instructor, AppError> {
        self.record("instructor_details")?;
        self.instructors
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn get_instructor_courses(&self, instructor_id: i64) -> Result<Vec<InstructorCourse>, AppError> {
        self.record("instructor_courses")?;
        Ok(self
            .instructor_courses
            .iter()
            .filter(|c| c.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn get_courses(&self) -> Result<Vec<Course>, AppError> {
        self.record("courses")?;
        Ok(self.courses.clone())
    }

    async fn get_programs(&self, course_codes: &[String]) -> Result<Vec<Program>, AppError> {
        self.record("programs")?;
        Ok(self
            .programs
            .iter()
            .filter(|p| course_codes.contains(&p.course_code))
            .cloned()
            .collect())
    }

    async fn get_schedules(
        &self,
        course_codes: &[String],
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Schedule>, AppError> {
        self.record("schedules")?;
        Ok(self
            .stored_schedules()
            .into_iter()
            .filter(|s| course_codes.contains(&s.course_code) && s.session_start > cutoff)
            .collect())
    }

    async fn get_student_schedules(
        &self,
        class: &str,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Schedule>, AppError> {
        self.record("student_schedules")?;
        Ok(self
            .stored_schedules()
            .into_iter()
            .filter(|s| s.class == class && s.session_start > cutoff)
            .collect())
    }

    async fn create_schedule(&self, schedule: &NewSchedule) -> Result<Schedule, AppError> {
        self.calls.lock().unwrap().push("create".to_string());
        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains("create") {
            return Err(AppError::Persistence(
                "Failed to create schedule: 500 Internal Server Error".to_string(),
            ));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = schedule.clone().with_id(id);
        self.schedules.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_schedule(&self, id: i64) -> Result<i64, AppError> {
        self.calls.lock().unwrap().push("delete".to_string());
        if self.failing.lock().unwrap().contains("delete") {
            return Err(AppError::Persistence(
                "Failed to delete schedule: 404 Not Found".to_string(),
            ));
        }
        self.schedules.lock().unwrap().retain(|s| s.id != id);
        Ok(id)
    }
}

/// Instructor 7 teaching CS101 (CS-2) and CS202 (CS-3); student 21 in CS-2.
pub fn campus() -> InMemoryDataApi {
    InMemoryDataApi {
        users: vec![
            user_record(7, Role::Instructor, "turing", "enigma"),
            user_record(21, Role::Student, "ada", "engine"),
        ],
        students: vec![Student {
            id: 21,
            name: "Ada".to_string(),
            age: Some(20),
            class: "CS-2".to_string(),
        }],
        instructors: vec![Instructor {
            id: 7,
            name: "Alan".to_string(),
        }],
        instructor_courses: vec![
            InstructorCourse {
                instructor_id: 7,
                course_code: "CS101".to_string(),
                class: Some("CS-2".to_string()),
            },
            InstructorCourse {
                instructor_id: 7,
                course_code: "CS202".to_string(),
                class: Some("CS-3".to_string()),
            },
        ],
        programs: vec![
            program(3, "CS101", "CS-2", "Monday", "09:00", "10:30"),
            program(4, "CS202", "CS-3", "Wednesday", "13:00", "15:00"),
        ],
        ..InMemoryDataApi::default()
    }
    .with_schedules(vec![
        schedule(1, "CS101", "CS-2", "2099-03-02T09:00:00", "2099-03-02T10:30:00", true),
        schedule(2, "CS202", "CS-3", "2099-03-04T13:00:00", "2099-03-04T15:00:00", false),
        schedule(3, "CS101", "CS-2", "2001-03-05T09:00:00", "2001-03-05T10:30:00", true),
        schedule(4, "MA100", "CS-2", "2099-03-06T08:00:00", "2099-03-06T09:00:00", false),
    ])
}
