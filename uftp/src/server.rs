//! Single-peer file server session.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};
use uftp_kftp::KftpError;
use uftp_rudp::{Endpoint, RudpChannel, RudpError, MAX_DATA_SIZE};

use crate::command::Command;

/// Upper bound on filenames in one listing reply.
pub const MAX_LISTED_FILES: usize = 100;

/// Commands are short strings; one frame's worth of buffer is plenty.
const COMMAND_BUFSIZE: usize = 1024;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Transport(#[from] RudpError),

    #[error(transparent)]
    Transfer(#[from] KftpError),

    #[error("listing of {size} bytes does not fit one message")]
    ListingTooLarge { size: usize },
}

/// Serves one client at a time over a reliable channel.
///
/// The working directory is injected so the filesystem surface stays
/// testable; `ls`, `get`, `put` and `delete` all resolve names against it.
pub struct UftpServer<E: Endpoint> {
    channel: RudpChannel<E>,
    root: PathBuf,
}

impl<E: Endpoint> UftpServer<E> {
    pub fn new(channel: RudpChannel<E>, root: impl Into<PathBuf>) -> Self {
        Self {
            channel,
            root: root.into(),
        }
    }

    /// Serve commands until the peer asks to exit.
    ///
    /// Parse failures are echoed back to the client; host and transport
    /// failures end the session.
    pub fn serve(&mut self) -> Result<()> {
        loop {
            let mut buf = [0u8; COMMAND_BUFSIZE];
            let n = self.channel.recv(&mut buf)?;
            let raw = String::from_utf8_lossy(&buf[..n]).into_owned();
            info!(bytes = n, command = %raw, "received command");

            match Command::parse(&raw) {
                Ok(Command::Exit) => {
                    self.channel.send(b"Exiting gracefully")?;
                    info!("exiting gracefully");
                    return Ok(());
                }
                Ok(command) => self.dispatch(&command)?,
                Err(err) => {
                    let reply = err.reply_for(&raw);
                    warn!(command = %raw, "rejected command");
                    self.channel.send(reply.as_bytes())?;
                }
            }
        }
    }

    fn dispatch(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Ls => self.handle_ls(),
            Command::Get(name) => self.handle_get(name),
            Command::Put(name) => self.handle_put(name),
            Command::Delete(name) => self.handle_delete(name),
            // handled by the serve loop
            Command::Exit => Ok(()),
        }
    }

    /// Reply with the regular files in the working directory, one per line.
    fn handle_ls(&mut self) -> Result<()> {
        let listing = self.list_files()?;
        self.channel.send(listing.as_bytes())?;
        Ok(())
    }

    fn list_files(&self) -> Result<String> {
        let mut listing = String::new();
        let mut count = 0;

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if count == MAX_LISTED_FILES {
                warn!("directory holds more than {MAX_LISTED_FILES} files, truncating listing");
                break;
            }
            listing.push_str(&entry.file_name().to_string_lossy());
            listing.push('\n');
            count += 1;
        }

        // The listing must travel as a single message.
        if listing.len() > MAX_DATA_SIZE {
            return Err(ServerError::ListingTooLarge {
                size: listing.len(),
            });
        }
        Ok(listing)
    }

    fn handle_get(&mut self, name: &str) -> Result<()> {
        let mut file = File::open(self.root.join(name))?;
        uftp_kftp::send_file(&mut self.channel, &mut file)?;
        Ok(())
    }

    fn handle_put(&mut self, name: &str) -> Result<()> {
        let mut file = File::create(self.root.join(name))?;
        uftp_kftp::recv_file(&mut self.channel, &mut file)?;
        Ok(())
    }

    /// Removing a file that does not exist is not an error, and only a
    /// successful removal gets a reply.
    fn handle_delete(&mut self, name: &str) -> Result<()> {
        match fs::remove_file(self.root.join(name)) {
            Ok(()) => {
                self.channel.send(b"Deleted file\n")?;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
