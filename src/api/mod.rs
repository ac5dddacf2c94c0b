pub mod gate;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, post};
use axum::{Router, http::StatusCode, routing::get};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::dates;
use crate::error::AppError;
use crate::models::{Instructor, Program, Student, User};
use crate::services::auth::{self, Credentials};
use crate::services::dashboard::{self, ScheduleRow};
use crate::services::{FormPhase, Notice, ScheduleBoard, ScheduleForm};
use crate::state::AppState;

use self::gate::{Gate, Page};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/instructor", get(instructor_dashboard))
        .route("/instructor/schedules", post(create_schedule))
        .route("/instructor/schedules/{id}", delete(delete_schedule))
        .route("/student", get(student_dashboard))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// The signed-in user if `page` may be rendered, otherwise the redirect to send.
async fn admit(state: &AppState, page: Page) -> Result<User, Response> {
    let user = state.session.current().await;
    match (gate::resolve(page, user.as_ref()), user) {
        (Gate::Render, Some(user)) => Ok(user),
        (Gate::Redirect(path), _) => Err(Redirect::to(path).into_response()),
        (Gate::Render, None) => Err(Redirect::to(Page::Login.path()).into_response()),
    }
}

#[derive(Serialize)]
struct LoginView {
    view: &'static str,
    login_mode: String,
}

async fn index(State(state): State<AppState>) -> Response {
    let user = state.session.current().await;
    match gate::resolve(Page::Login, user.as_ref()) {
        Gate::Redirect(path) => Redirect::to(path).into_response(),
        Gate::Render => Json(LoginView {
            view: "login",
            login_mode: state.login_mode.to_string(),
        })
        .into_response(),
    }
}

#[derive(Serialize)]
struct LoginResponse {
    user: Option<User>,
    redirect: Option<&'static str>,
    notice: Notice,
}

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    match auth::login(state.data_api.as_ref(), &credentials, state.login_mode).await {
        Ok(user) => {
            state.session.sign_in(user.clone()).await?;
            state.board.lock().await.clear();
            let redirect = gate::home_for(user.role).path();

            Ok(Json(LoginResponse {
                user: Some(user),
                redirect: Some(redirect),
                notice: Notice::success("Login successful"),
            })
            .into_response())
        }
        Err(e) => {
            warn!(username = %credentials.username, "login failed: {}", e);
            let status = match e {
                AppError::Auth(_) => StatusCode::UNAUTHORIZED,
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            let notice = Notice::failure("Login failed", &e, "Please check your credentials");

            Ok((
                status,
                Json(LoginResponse {
                    user: None,
                    redirect: None,
                    notice,
                }),
            )
                .into_response())
        }
    }
}

async fn logout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.session.sign_out().await?;
    state.board.lock().await.clear();
    Ok(Redirect::to(Page::Login.path()))
}

#[derive(Serialize)]
struct InstructorView {
    instructor: Option<Instructor>,
    courses: String,
    schedules: Vec<ScheduleRow>,
    programs: Vec<Program>,
    form: ScheduleForm,
    phase: FormPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

async fn instructor_dashboard(State(state): State<AppState>) -> Response {
    let user = match admit(&state, Page::Instructor).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let cutoff = dates::future_cutoff(Utc::now());
    let result =
        dashboard::load_instructor_dashboard(state.data_api.as_ref(), user.user_id, cutoff).await;

    let mut board = state.board.lock().await;
    let (status, instructor, courses, notice) = match result {
        Ok(loaded) => {
            let courses = loaded.courses_label();
            board.load(loaded.schedules, loaded.programs, loaded.courses);
            (StatusCode::OK, Some(loaded.instructor), courses, None)
        }
        Err(e) => {
            board.load(Vec::new(), Vec::new(), Vec::new());
            (StatusCode::BAD_GATEWAY, None, String::new(), Some(e.notice()))
        }
    };

    let view = InstructorView {
        instructor,
        courses,
        schedules: dashboard::rows(board.schedules()),
        programs: board.programs().to_vec(),
        form: board.form().clone(),
        phase: board.phase(),
        notice,
    };
    (status, Json(view)).into_response()
}

#[derive(Serialize)]
struct BoardResponse {
    notice: Notice,
    schedules: Vec<ScheduleRow>,
    form: ScheduleForm,
    phase: FormPhase,
}

impl BoardResponse {
    fn new(board: &ScheduleBoard, notice: Notice) -> Self {
        Self {
            notice,
            schedules: dashboard::rows(board.schedules()),
            form: board.form().clone(),
            phase: board.phase(),
        }
    }
}

/// The board lock is only held while validating and while applying the
/// result, never across the data API call.
async fn create_schedule(
    State(state): State<AppState>,
    Json(form): Json<ScheduleForm>,
) -> Response {
    if let Err(redirect) = admit(&state, Page::Instructor).await {
        return redirect;
    }

    let new_schedule = {
        let mut board = state.board.lock().await;
        board.edit(form);
        match board.begin_submit() {
            Ok(new_schedule) => new_schedule,
            Err(notice) => {
                let body = BoardResponse::new(&board, notice);
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
        }
    };

    let result = state.data_api.create_schedule(&new_schedule).await;

    let mut board = state.board.lock().await;
    let notice = board.complete_submit(result);
    let status = match board.phase() {
        FormPhase::Succeeded => StatusCode::CREATED,
        _ => StatusCode::BAD_GATEWAY,
    };
    let body = BoardResponse::new(&board, notice);
    board.acknowledge();

    (status, Json(body)).into_response()
}

async fn delete_schedule(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    if let Err(redirect) = admit(&state, Page::Instructor).await {
        return redirect;
    }

    let result = state.data_api.delete_schedule(id).await;

    let mut board = state.board.lock().await;
    let notice = board.complete_delete(id, result);
    let status = if notice.is_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };

    (status, Json(BoardResponse::new(&board, notice))).into_response()
}

#[derive(Serialize)]
struct StudentView {
    student: Option<Student>,
    schedules: Vec<ScheduleRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

async fn student_dashboard(State(state): State<AppState>) -> Response {
    let user = match admit(&state, Page::Student).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let cutoff = dates::future_cutoff(Utc::now());
    match dashboard::load_student_dashboard(state.data_api.as_ref(), user.user_id, cutoff).await {
        Ok(loaded) => Json(StudentView {
            schedules: dashboard::rows(&loaded.schedules),
            student: Some(loaded.student),
            notice: None,
        })
        .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(StudentView {
                student: None,
                schedules: Vec::new(),
                notice: Some(e.notice()),
            }),
        )
            .into_response(),
    }
}
