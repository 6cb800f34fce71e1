//! crates/todo_core/src/screens/mod.rs
//!
//! Screen controllers. Each one holds its own state, talks to the ports on
//! user actions and exposes a plain view struct for the front end to render.

pub mod gate;
pub mod login;
pub mod profile;
pub mod todos;

pub use gate::{GateView, SessionGate};
pub use login::{LoginFlow, LoginMount, LoginView, SubmitOutcome};
pub use profile::{ProfileSurface, ProfileView};
pub use todos::{Mutation, TodoError, TodoSurface, TodoView};
