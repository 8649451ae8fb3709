//! Request handlers.
//!
//! Handlers never fail: every outcome becomes either a rendered page or a
//! redirect to `/` carrying a flash notice.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use tracing::{error, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::registry::Registry;
use crate::student::{ProfileForm, StudentForm};

use super::flash::{self, Flash};
use super::views;
use super::AppState;

/// Run a registry call on the blocking pool.
async fn blocking<T, F>(state: &Arc<AppState>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Registry) -> Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(&state.registry))
        .await
        .map_err(|err| Error::internal(format!("blocking task failed: {err}")))?
}

fn log_failure(action: &str, err: &Error) {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::DuplicateKey | ErrorKind::NotFound => {
            warn!("{} rejected: {}", action, err);
        }
        ErrorKind::Storage | ErrorKind::Config | ErrorKind::Internal => {
            error!("{} failed: {}", action, err);
        }
    }
}

/// Redirect to the list page with a notice.
fn redirect_with(state: &AppState, notice: &Flash) -> Response {
    match state.flash.set_cookie(notice) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to("/")).into_response(),
        Err(err) => {
            error!("Failed to encode flash notice: {}", err);
            Redirect::to("/").into_response()
        }
    }
}

/// Render `page`, clearing the flash cookie if the request carried one.
fn render(headers: &HeaderMap, page: String) -> Response {
    if flash::has_cookie(headers) {
        ([(SET_COOKIE, flash::clear_cookie())], Html(page)).into_response()
    } else {
        Html(page).into_response()
    }
}

/// GET / - list every student.
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let mut notices: Vec<Flash> = state.flash.take(&headers).into_iter().collect();

    let students = match blocking(&state, |registry| registry.list_students()).await {
        Ok(students) => students,
        Err(err) => {
            log_failure("Listing students", &err);
            notices.push(Flash::error(err.user_message("loading students")));
            Vec::new()
        }
    };

    render(&headers, views::index_page(&students, &notices))
}

/// POST /add - create a student.
pub async fn add_student(
    State(state): State<Arc<AppState>>,
    Form(form): Form<StudentForm>,
) -> Response {
    let notice = match blocking(&state, move |registry| registry.add_student(&form)).await {
        Ok(_) => Flash::success("Student added successfully!"),
        Err(err) => {
            log_failure("Adding student", &err);
            Flash::error(err.user_message("adding student"))
        }
    };
    redirect_with(&state, &notice)
}

/// GET /edit/{roll_no} - show the edit form.
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Path(roll_no): Path<String>,
    headers: HeaderMap,
) -> Response {
    match blocking(&state, move |registry| registry.find_student(&roll_no)).await {
        Ok(student) => {
            let notices: Vec<Flash> = state.flash.take(&headers).into_iter().collect();
            render(&headers, views::edit_page(&student, &notices))
        }
        Err(err) => {
            log_failure("Loading student", &err);
            let notice = if err.is_not_found() {
                Flash::error("Student not found")
            } else {
                Flash::error(err.user_message("loading student"))
            };
            redirect_with(&state, &notice)
        }
    }
}

/// POST /edit/{roll_no} - update a student.
pub async fn edit_student(
    State(state): State<Arc<AppState>>,
    Path(roll_no): Path<String>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let result = blocking(&state, move |registry| {
        registry.edit_student(&roll_no, &form)
    })
    .await;

    let notice = match result {
        Ok(()) => Flash::success("Student updated successfully!"),
        Err(err) => {
            log_failure("Updating student", &err);
            Flash::error(err.user_message("updating student"))
        }
    };
    redirect_with(&state, &notice)
}

/// POST /delete/{roll_no} - delete a student.
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(roll_no): Path<String>,
) -> Response {
    let notice = match blocking(&state, move |registry| registry.delete_student(&roll_no)).await
    {
        Ok(()) => Flash::success("Student deleted successfully!"),
        Err(err) => {
            log_failure("Deleting student", &err);
            Flash::error(err.user_message("deleting student"))
        }
    };
    redirect_with(&state, &notice)
}
