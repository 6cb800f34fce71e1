pub mod domain;
pub mod ports;
pub mod screens;
pub mod session;

pub use domain::{
    AuthEvent, NewTodo, Session, SessionChange, Todo, TodoFilter, TodoOrder, TodoPatch, User,
};
pub use ports::{
    AuthService, Navigator, PortError, PortResult, Route, SessionBroadcaster, Subscription,
    TodoStore,
};
pub use session::SessionContext;
