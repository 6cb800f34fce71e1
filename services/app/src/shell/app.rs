//! services/app/src/shell/app.rs
//!
//! The interactive loop: reads commands, feeds them to the mounted screen
//! controller and follows route changes, whichever task requests them.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use todo_core::ports::{Navigator, Route, TodoStore};
use todo_core::screens::{
    GateView, LoginFlow, LoginMount, Mutation, ProfileSurface, SessionGate, SubmitOutcome,
    TodoSurface,
};
use todo_core::session::SessionContext;
use tracing::{debug, info};

use super::command::{Command, HELP};
use super::render;
use super::router::ShellNavigator;
use crate::error::AppError;

enum Screen {
    Blank,
    Login(LoginFlow),
    Todos(TodoSurface),
    Profile(ProfileSurface),
}

pub struct Shell {
    ctx: Arc<SessionContext>,
    store: Arc<dyn TodoStore>,
    navigator: Arc<ShellNavigator>,
    routes: watch::Receiver<Route>,
    /// Mounted while the user is on the todo or profile tab.
    gate: Option<SessionGate>,
    screen: Screen,
}

impl Shell {
    /// Creates a shell that starts at the main surface, behind the session gate.
    pub fn new(ctx: Arc<SessionContext>, store: Arc<dyn TodoStore>) -> Self {
        let (navigator, routes) = ShellNavigator::new(Route::Todos);
        Self {
            ctx,
            store,
            navigator: Arc::new(navigator),
            routes,
            gate: None,
            screen: Screen::Blank,
        }
    }

    /// Runs until `quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let initial = *self.routes.borrow_and_update();
        self.enter(initial, &mut output).await?;

        loop {
            tokio::select! {
                biased;
                changed = self.routes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let route = *self.routes.borrow_and_update();
                    self.enter(route, &mut output).await?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed.");
                        break;
                    };
                    if !self.handle(&line, &mut output).await? {
                        break;
                    }
                }
            }
        }

        self.unmount_screen().await;
        self.unmount_gate().await;
        Ok(())
    }

    /// Unmounts the current screen and mounts the one for `route`.
    async fn enter<W: AsyncWrite + Unpin>(&mut self, route: Route, out: &mut W) -> Result<(), AppError> {
        debug!(?route, "Entering screen.");
        self.unmount_screen().await;

        if route == Route::Login {
            self.unmount_gate().await;
            let login = LoginFlow::new(self.ctx.clone(), self.navigator.clone());
            if login.mount().await == LoginMount::Redirected {
                return Ok(());
            }
            emit(out, &render::login(&login.view().await)).await?;
            self.screen = Screen::Login(login);
            return Ok(());
        }

        if self.gate.is_none() {
            let mut gate = SessionGate::new(self.ctx.clone(), self.navigator.clone());
            let view = gate.mount().await;
            self.gate = Some(gate);
            if view == GateView::RedirectedToLogin {
                return Ok(());
            }
        }

        if route == Route::Todos {
            let surface = TodoSurface::new(self.ctx.clone(), self.store.clone());
            if let Err(e) = surface.mount().await {
                emit(out, &format!("! {}", e)).await?;
            }
            emit(out, &render::todos(&surface.view().await)).await?;
            self.screen = Screen::Todos(surface);
        } else {
            let profile = ProfileSurface::new(self.ctx.clone());
            profile.mount().await;
            emit(out, &render::profile(&profile.view().await)).await?;
            self.screen = Screen::Profile(profile);
        }
        Ok(())
    }

    /// Handles one input line. Returns `false` when the shell should exit.
    async fn handle<W: AsyncWrite + Unpin>(&mut self, line: &str, out: &mut W) -> Result<bool, AppError> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(true),
            Err(e) => {
                emit(out, &e.to_string()).await?;
                return Ok(true);
            }
        };

        match command {
            Command::Quit => return Ok(false),
            Command::Help => emit(out, HELP).await?,
            Command::Refresh => {
                let route = self.navigator.current();
                self.enter(route, out).await?;
            }
            command => self.dispatch(command, out).await?,
        }
        Ok(true)
    }

    /// Routes a screen-specific command to the mounted controller.
    async fn dispatch<W: AsyncWrite + Unpin>(&self, command: Command, out: &mut W) -> Result<(), AppError> {
        match (command, &self.screen) {
            (Command::Login { email, password }, Screen::Login(login)) => {
                login.set_email(email).await;
                login.set_password(password).await;
                match login.submit().await {
                    SubmitOutcome::SignedIn => emit(out, "Signed in.").await?,
                    SubmitOutcome::Failed(_) => emit(out, &render::login(&login.view().await)).await?,
                    SubmitOutcome::AlreadySubmitting => emit(out, "Already signing in.").await?,
                }
            }

            (Command::List, Screen::Todos(todos)) => {
                emit(out, &render::todos(&todos.view().await)).await?;
            }
            (Command::Add(text), Screen::Todos(todos)) => {
                todos.set_input(text).await;
                let result = todos.add().await;
                report(out, todos, result).await?;
            }
            (Command::Toggle(id), Screen::Todos(todos)) => {
                let current = todos
                    .view()
                    .await
                    .todos
                    .iter()
                    .find(|todo| todo.id == id)
                    .map(|todo| todo.is_completed);
                match current {
                    Some(is_completed) => {
                        let result = todos.toggle(id, is_completed).await;
                        report(out, todos, result).await?;
                    }
                    None => emit(out, &format!("No todo with id {}.", id)).await?,
                }
            }
            (Command::Delete(id), Screen::Todos(todos)) => {
                let result = todos.delete(id).await;
                report(out, todos, result).await?;
            }

            (Command::Logout, Screen::Profile(profile)) => {
                if profile.logout().await.is_ok() {
                    info!("Logged out from the shell.");
                }
                emit(out, &render::profile(&profile.view().await)).await?;
            }

            (Command::Todos, Screen::Todos(_) | Screen::Profile(_)) => {
                self.navigator.replace(Route::Todos);
            }
            (Command::Profile, Screen::Todos(_) | Screen::Profile(_)) => {
                self.navigator.replace(Route::Profile);
            }

            (Command::Logout, Screen::Todos(_)) => {
                emit(out, "Open your profile to log out.").await?;
            }
            (_, Screen::Login(_) | Screen::Blank) => {
                emit(out, "Please sign in first: login <email> <password>").await?;
            }
            (_, _) => emit(out, "Not available on this screen.").await?,
        }
        Ok(())
    }

    async fn unmount_screen(&mut self) {
        if let Screen::Todos(todos) = std::mem::replace(&mut self.screen, Screen::Blank) {
            todos.unmount().await;
        }
    }

    async fn unmount_gate(&mut self) {
        if let Some(mut gate) = self.gate.take() {
            gate.unmount().await;
        }
    }
}

/// Prints the list after a successful mutation, or why nothing changed.
async fn report<W: AsyncWrite + Unpin>(
    out: &mut W,
    todos: &TodoSurface,
    result: Result<Mutation, todo_core::screens::TodoError>,
) -> Result<(), AppError> {
    match result {
        Ok(Mutation::Applied) => emit(out, &render::todos(&todos.view().await)).await?,
        Ok(Mutation::Ignored) => emit(out, "Nothing changed.").await?,
        Err(e) => emit(out, &format!("! {}", e)).await?,
    }
    Ok(())
}

async fn emit<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
