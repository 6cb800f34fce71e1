//! services/app/src/shell/router.rs
//!
//! The shell's `Navigator`: route requests from any task land in a watch
//! channel that the shell loop follows.

use tokio::sync::watch;
use todo_core::ports::{Navigator, Route};
use tracing::debug;

pub struct ShellNavigator {
    tx: watch::Sender<Route>,
}

impl ShellNavigator {
    /// Creates the navigator and the receiver the shell loop watches.
    pub fn new(initial: Route) -> (Self, watch::Receiver<Route>) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, rx)
    }

    pub fn current(&self) -> Route {
        *self.tx.borrow()
    }
}

impl Navigator for ShellNavigator {
    fn replace(&self, route: Route) {
        debug!(?route, "Navigation requested.");
        self.tx.send_replace(route);
    }
}
