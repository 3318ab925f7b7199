//! Interactive client session.

use std::fs::File;
use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, info};
use uftp_kftp::KftpError;
use uftp_rudp::{Endpoint, RudpChannel, RudpError};

use crate::command::Command;

/// Responses are limited to a single message, like the commands themselves.
const RESPONSE_BUFSIZE: usize = 1024;

const MENU: &str = "Please enter one of the following messages: \n\
                    \tget <file_name>\n\
                    \tput <file_name>\n\
                    \tdelete <file_name>\n\
                    \tls\n\
                    \texit\n\
                    > ";

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Transport(#[from] RudpError),

    #[error(transparent)]
    Transfer(#[from] KftpError),
}

/// Drives commands against a file server over a reliable channel.
///
/// Transferred files are read from and written to the process working
/// directory.
pub struct UftpClient<E: Endpoint> {
    channel: RudpChannel<E>,
}

impl<E: Endpoint> UftpClient<E> {
    pub fn new(channel: RudpChannel<E>) -> Self {
        Self { channel }
    }

    /// Run the interactive shell until end of input or `exit`.
    ///
    /// Lines that fail to parse are reported locally and nothing is sent.
    /// After every executed command the channel is drained of straggler
    /// retransmissions, since the server may not have seen our final acks.
    pub fn run_shell<R, W>(&mut self, input: &mut R, output: &mut W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let mut line = String::new();
        loop {
            output.write_all(MENU.as_bytes())?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                debug!("end of input");
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(err) => {
                    writeln!(output, "{}", err.reply_for(line.trim_end()))?;
                    continue;
                }
            };

            let done = self.run_command(&command, output)?;
            let stragglers = self.channel.check_acks()?;
            if stragglers > 0 {
                debug!(stragglers, "re-acked straggler retransmissions");
            }
            if done {
                return Ok(());
            }
        }
    }

    /// Execute one command; returns `true` when the session is over.
    pub fn run_command<W: Write>(&mut self, command: &Command, output: &mut W) -> Result<bool> {
        info!(%command, "running command");
        match command {
            Command::Ls => {
                self.channel.send(b"ls")?;
                self.print_response(output)?;
            }
            Command::Exit => {
                self.channel.send(b"exit")?;
                // the server confirms before shutting down
                self.print_response(output)?;
                return Ok(true);
            }
            Command::Get(name) => {
                self.channel.send(command.to_string().as_bytes())?;
                let mut file = File::create(name)?;
                uftp_kftp::recv_file(&mut self.channel, &mut file)?;
                writeln!(output, "Downloaded file: {name}")?;
            }
            Command::Put(name) => {
                // Open before announcing the transfer: a missing local file
                // must not leave the server waiting for content.
                let mut file = File::open(name)?;
                self.channel.send(command.to_string().as_bytes())?;
                uftp_kftp::send_file(&mut self.channel, &mut file)?;
                writeln!(output, "Sent file: {name}")?;
            }
            Command::Delete(name) => {
                self.channel.send(command.to_string().as_bytes())?;
                self.print_response(output)?;
            }
        }
        Ok(false)
    }

    /// Receive one response message and print it.
    fn print_response<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let mut buf = [0u8; RESPONSE_BUFSIZE];
        let n = self.channel.recv(&mut buf)?;
        writeln!(output, "{}", String::from_utf8_lossy(&buf[..n]))?;
        Ok(())
    }
}
