//! Container backend driven by shell commands.
//!
//! Each command is run through `sh -c` after replacing `{name}` with the
//! generated container name. The name is also exported as `CONTAINER_NAME`,
//! and the start command additionally sees `WAIT_FOR_NETWORK=1|0`.
//!
//! ```text
//! CONTAINER_CREATE_CMD='lxc-copy -n base -N {name} -e'
//! CONTAINER_START_CMD='lxc-start -n {name} && lxc-wait -n {name} -s RUNNING'
//! CONTAINER_DESTROY_CMD='lxc-destroy -f -n {name}'
//! ```

use std::fmt;
use std::process::Command;

use tracing::debug;
use uuid::Uuid;

use crate::config::FactoryConfig;
use crate::pool::{BoxError, Container, ContainerFactory};

/// Placeholder replaced with the container name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Longest stderr tail kept in error messages.
const STDERR_LIMIT: usize = 512;

/// A command that could not be run or exited unsuccessfully.
#[derive(Debug)]
pub enum CommandError {
    /// The shell could not be spawned.
    Spawn { command: String, error: std::io::Error },
    /// The command exited with a failure status.
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { command, error } => {
                write!(f, "failed to run '{}': {}", command, error)
            }
            Self::Failed {
                command,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "'{}' exited with status {}", command, code)?,
                    None => write!(f, "'{}' was killed by a signal", command)?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn { error, .. } => Some(error),
            Self::Failed { .. } => None,
        }
    }
}

/// Factory that creates containers with [`FactoryConfig::create_cmd`].
#[derive(Clone, Debug)]
pub struct CommandFactory {
    config: FactoryConfig,
}

impl CommandFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// Fresh container name: `<prefix>-<8 hex chars>`.
    fn next_name(&self) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.config.name_prefix, &id[..8])
    }
}

impl ContainerFactory for CommandFactory {
    type Container = CommandContainer;

    fn create_container(&self) -> Result<CommandContainer, BoxError> {
        let name = self.next_name();
        run(&self.config.create_cmd, &name, &[])?;
        debug!(container = %name, "container created");

        Ok(CommandContainer {
            name,
            start_cmd: self.config.start_cmd.clone(),
            destroy_cmd: self.config.destroy_cmd.clone(),
        })
    }
}

/// A container created by [`CommandFactory`].
///
/// Dropping it leaves the underlying container alone; only
/// [`Container::destroy`] runs the destroy command.
#[derive(Debug)]
pub struct CommandContainer {
    name: String,
    start_cmd: Option<String>,
    destroy_cmd: Option<String>,
}

impl Container for CommandContainer {
    fn start(&mut self, wait_for_network: bool) -> Result<(), BoxError> {
        if let Some(cmd) = &self.start_cmd {
            let flag = if wait_for_network { "1" } else { "0" };
            run(cmd, &self.name, &[("WAIT_FOR_NETWORK", flag)])?;
            debug!(container = %self.name, "container started");
        }
        Ok(())
    }

    fn destroy(self) -> Result<(), BoxError> {
        if let Some(cmd) = &self.destroy_cmd {
            run(cmd, &self.name, &[])?;
            debug!(container = %self.name, "container destroyed");
        }
        Ok(())
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Substitute the name into `template` and run it through `sh -c`.
fn run(template: &str, name: &str, env: &[(&str, &str)]) -> Result<(), CommandError> {
    let command = template.replace(NAME_PLACEHOLDER, name);

    let output = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .env("CONTAINER_NAME", name)
        .envs(env.iter().copied())
        .output()
        .map_err(|error| CommandError::Spawn {
            command: command.clone(),
            error,
        })?;

    if !output.status.success() {
        return Err(CommandError::Failed {
            command,
            code: output.status.code(),
            stderr: stderr_tail(&output.stderr),
        });
    }

    Ok(())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_LIMIT {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_LIMIT;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
