use crate::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Instructor,
    Student,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Login => "/",
            Page::Instructor => "/instructor",
            Page::Student => "/student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Render,
    Redirect(&'static str),
}

pub fn home_for(role: Role) -> Page {
    match role {
        Role::Instructor => Page::Instructor,
        Role::Student => Page::Student,
    }
}

/// Signed-in users skip the login page; dashboards need the matching role.
pub fn resolve(page: Page, user: Option<&User>) -> Gate {
    match (page, user) {
        (Page::Login, None) => Gate::Render,
        (Page::Login, Some(user)) => Gate::Redirect(home_for(user.role).path()),
        (Page::Instructor, Some(User { role: Role::Instructor, .. })) => Gate::Render,
        (Page::Student, Some(User { role: Role::Student, .. })) => Gate::Render,
        _ => Gate::Redirect(Page::Login.path()),
    }
}
