//! Command grammar shared by the client and server.

use std::fmt;

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ls,
    Exit,
    Get(String),
    Put(String),
    Delete(String),
}

/// Why a command line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The line did not match the grammar.
    Parse,
    /// The command is recognized but not served by this build.
    NotImplemented,
}

impl CommandError {
    /// The reply string a server echoes for a rejected command, quoting the
    /// line as the client sent it.
    pub fn reply_for(&self, raw: &str) -> String {
        match self {
            CommandError::Parse => format!("Invalid command: {raw}"),
            CommandError::NotImplemented => format!("Command not yet implemented: {raw}"),
        }
    }
}

impl Command {
    /// Parse one command line.
    ///
    /// Tokens are separated by whitespace (space, tab, newline, carriage
    /// return, vertical tab, form feed); no command takes more than two
    /// tokens and filenames are single non-empty tokens.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().ok_or(CommandError::Parse)?;
        let second = tokens.next();

        if tokens.next().is_some() {
            return Err(CommandError::Parse);
        }

        match (first, second) {
            ("ls", None) => Ok(Command::Ls),
            ("exit", None) => Ok(Command::Exit),
            ("get", Some(name)) => Ok(Command::Get(name.to_string())),
            ("put", Some(name)) => Ok(Command::Put(name.to_string())),
            ("delete", Some(name)) => Ok(Command::Delete(name.to_string())),
            _ => Err(CommandError::Parse),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Ls => write!(f, "ls"),
            Command::Exit => write!(f, "exit"),
            Command::Get(name) => write!(f, "get {name}"),
            Command::Put(name) => write!(f, "put {name}"),
            Command::Delete(name) => write!(f, "delete {name}"),
        }
    }
}
