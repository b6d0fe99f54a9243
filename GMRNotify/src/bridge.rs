//! Line-oriented feed of renderer variable changes.
//!
//! Each line reads `<service> <variable> <value>`, where `service` is
//! `AVTransport` or `RenderingControl` and the value runs to the end of the
//! line. `Log Level <level>` changes the log level at runtime.

use std::str::FromStr;

use gmrdbus::RendererEvents;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::logs::LogControl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Transport { name: String, value: String },
    Control { name: String, value: String },
    LogLevel(String),
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (service, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| format!("Missing variable in '{}'", line))?;
        let rest = rest.trim_start();
        let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if name.is_empty() {
            return Err(format!("Missing variable in '{}'", line));
        }

        let name = name.to_string();
        let value = value.to_string();
        match service {
            "AVTransport" => Ok(Command::Transport { name, value }),
            "RenderingControl" => Ok(Command::Control { name, value }),
            "Log" if name == "Level" => Ok(Command::LogLevel(value.trim().to_string())),
            other => Err(format!("Unknown service '{}'", other)),
        }
    }
}

/// Forwards every line of `reader` until end of input, returning the number
/// of commands handled.
pub async fn run<R>(reader: R, events: &RendererEvents, logs: &LogControl) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Transport { name, value }) => {
                events.transport_variable_changed(&name, &value)
            }
            Ok(Command::Control { name, value }) => events.control_variable_changed(&name, &value),
            Ok(Command::LogLevel(level)) => {
                logs.set_max_level(&level);
            }
            Err(e) => {
                warn!("Ignoring input line: {}", e);
                continue;
            }
        }
        handled += 1;
    }

    debug!(handled, "End of renderer input");
    Ok(handled)
}
