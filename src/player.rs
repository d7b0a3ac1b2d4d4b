use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::config::{PlayTarget, PlayerConfig};

const URL_PLACEHOLDER: &str = "%URL%";

/// Where a "play" ended up, for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launched {
    Browser(String),
    Command { program: String, url: String },
}

/// Hands a media item to the playback collaborator: the server's play page
/// in a browser, or an external player fed the stream URL.
#[derive(Debug, Clone)]
pub struct Launcher {
    target: PlayTarget,
    command: Vec<String>,
}

impl Launcher {
    pub fn new(cfg: &PlayerConfig) -> Self {
        Self {
            target: cfg.open_with,
            command: cfg.command.clone(),
        }
    }

    pub fn target(&self) -> PlayTarget {
        self.target
    }

    pub fn launch(&self, play_url: &str, stream_url: &str) -> Result<Launched> {
        match self.target {
            PlayTarget::Browser => {
                webbrowser::open(play_url)
                    .with_context(|| format!("open {play_url} in browser"))?;
                tracing::info!(url = play_url, "opened play page");
                Ok(Launched::Browser(play_url.to_string()))
            }
            PlayTarget::Command => {
                let argv = build_command(&self.command, stream_url)?;
                let (program, args) = argv.split_first().context("player command is empty")?;
                Command::new(program)
                    .args(args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                    .with_context(|| format!("spawn player {program}"))?;
                tracing::info!(program = %program, url = stream_url, "spawned player");
                Ok(Launched::Command {
                    program: program.clone(),
                    url: stream_url.to_string(),
                })
            }
        }
    }
}

/// Substitutes the URL into the command template, appending it when the
/// template has no placeholder.
pub fn build_command(template: &[String], url: &str) -> Result<Vec<String>> {
    if template.is_empty() || template[0].trim().is_empty() {
        bail!("player command is empty");
    }
    let mut substituted = false;
    let mut argv: Vec<String> = template
        .iter()
        .map(|arg| {
            if arg.contains(URL_PLACEHOLDER) {
                substituted = true;
                arg.replace(URL_PLACEHOLDER, url)
            } else {
                arg.clone()
            }
        })
        .collect();
    if !substituted {
        argv.push(url.to_string());
    }
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn replaces_placeholder() {
        let argv = build_command(&strings(&["mpv", "--fs", "%URL%"]), "http://x/video/a.mp4").unwrap();
        assert_eq!(argv, ["mpv", "--fs", "http://x/video/a.mp4"]);
    }

    #[test]
    fn appends_url_without_placeholder() {
        let argv = build_command(&strings(&["vlc"]), "http://x/video/a.mp4").unwrap();
        assert_eq!(argv, ["vlc", "http://x/video/a.mp4"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(build_command(&[], "u").is_err());
        assert!(build_command(&strings(&[" "]), "u").is_err());
    }

    #[test]
    fn launcher_follows_config() {
        let launcher = Launcher::new(&PlayerConfig {
            open_with: PlayTarget::Command,
            command: strings(&["mpv"]),
        });
        assert_eq!(launcher.target(), PlayTarget::Command);
    }
}
