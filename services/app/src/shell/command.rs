//! services/app/src/shell/command.rs
//!
//! Defines the line protocol between the person at the terminal and the shell.

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    List,
    Add(String),
    Toggle(i64),
    Delete(i64),
    /// Switches to the todo tab.
    Todos,
    /// Switches to the profile tab.
    Profile,
    Logout,
    /// Re-mounts the current screen, refetching its data.
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a todo id")]
    BadId(String),
}

pub const HELP: &str = "\
Commands:
  login <email> <password>   sign in
  list                       show your todos
  add <text>                 add a todo
  toggle <id>                mark a todo done / not done
  rm <id>                    delete a todo
  todos | profile            switch tab
  logout                     sign out (profile tab)
  refresh                    reload the current screen
  help                       show this help
  quit                       exit";

impl Command {
    /// Parses a non-empty input line. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(email), Some(password), None) => Command::Login {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err(CommandError::Usage("login <email> <password>")),
                }
            }
            "list" | "ls" => Command::List,
            // Blank text is left for the todo surface to reject.
            "add" => Command::Add(rest.to_string()),
            "toggle" | "done" => Command::Toggle(parse_id(rest, "toggle <id>")?),
            "rm" | "delete" => Command::Delete(parse_id(rest, "rm <id>")?),
            "todos" => Command::Todos,
            "profile" => Command::Profile,
            "logout" => Command::Logout,
            "refresh" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_id(arg: &str, usage: &'static str) -> Result<i64, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    arg.parse::<i64>()
        .map_err(|_| CommandError::BadId(arg.to_string()))
}
