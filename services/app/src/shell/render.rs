//! services/app/src/shell/render.rs
//!
//! Turns screen views into terminal text.

use std::fmt::Write;
use todo_core::screens::{LoginView, ProfileView, TodoView};

pub fn login(view: &LoginView) -> String {
    let mut out = String::from("== Welcome Back! ==\nSign in to manage your todos.\n");
    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {}", error);
    }
    let _ = write!(out, "[{}] login <email> <password>", view.button_label());
    out
}

pub fn todos(view: &TodoView) -> String {
    if view.loading {
        return "Loading todos...".to_string();
    }
    let mut out = String::from("== Todos ==");
    if view.todos.is_empty() {
        out.push_str("\n(nothing to do)");
    }
    for todo in &view.todos {
        let mark = if todo.is_completed { "x" } else { " " };
        let _ = write!(out, "\n[{}] {:>4}  {}", mark, todo.id, todo.task);
    }
    out
}

pub fn profile(view: &ProfileView) -> String {
    match view {
        ProfileView::Loading => "Loading profile...".to_string(),
        ProfileView::NotLoggedIn => "No user logged in.".to_string(),
        ProfileView::User { id, email, error } => {
            let mut out = String::from("== My Profile ==\n");
            let _ = writeln!(out, "Email:   {}", email.as_deref().unwrap_or("-"));
            let _ = write!(out, "User ID: {}", id);
            if let Some(error) = error {
                let _ = write!(out, "\n! {}", error);
            }
            out
        }
    }
}
