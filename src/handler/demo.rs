//! Small demonstration functions: hello world, ping and environment dump

use std::fmt::Write;

use axum::extract::{Query, State};
use serde::Deserialize;
use tokio::process::Command;

use crate::handler::AppState;

/// Commands whose output is appended to the environment dump
const DIAGNOSTIC_COMMANDS: &[(&str, &[&str])] = &[
    ("whoami", &[]),
    ("who", &["am", "i"]),
    ("uname", &["-a"]),
    ("which", &["runc"]),
    ("which", &["docker"]),
    ("cat", &["/proc/version"]),
];

#[derive(Debug, Default, Deserialize)]
pub struct HelloQuery {
    pub name: Option<String>,
}

pub async fn hello_world(Query(query): Query<HelloQuery>) -> String {
    let name = query
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "world".to_string());
    format!("Hello {name}")
}

pub async fn ping(State(state): State<AppState>) -> String {
    format!("pong\nazurefuncs version {}\n", state.build_version)
}

pub async fn env_dump() -> String {
    let mut out = String::new();
    for (key, value) in std::env::vars_os() {
        let _ = writeln!(out, "{}={}", key.to_string_lossy(), value.to_string_lossy());
    }
    for (cmd, args) in DIAGNOSTIC_COMMANDS {
        write_command_output(&mut out, cmd, args).await;
    }
    out
}

/// Append the command line and its combined output; failures are written
/// as `error: ...` and never abort the dump.
async fn write_command_output(out: &mut String, cmd: &str, args: &[&str]) {
    let _ = writeln!(out, "{} {}", cmd, args.join(" "));
    match Command::new(cmd).args(args).output().await {
        Ok(output) => {
            if !output.status.success() {
                let _ = writeln!(out, "error: {}", output.status);
            }
            out.push_str(&String::from_utf8_lossy(&output.stdout));
            out.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        Err(e) => {
            let _ = writeln!(out, "error: {e}");
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "Hello world")]
    #[case(Some(""), "Hello world")]
    #[case(Some("Gopher"), "Hello Gopher")]
    #[tokio::test]
    async fn hello_world_greets_name_or_world(
        #[case] name: Option<&str>,
        #[case] expected: &str,
    ) {
        let query = HelloQuery {
            name: name.map(str::to_string),
        };
        assert_eq!(hello_world(Query(query)).await, expected);
    }

    #[tokio::test]
    async fn env_dump_runs_every_diagnostic_command_in_order() {
        let body = env_dump().await;

        let positions: Vec<usize> = [
            "whoami \n",
            "who am i\n",
            "uname -a\n",
            "which runc\n",
            "which docker\n",
            "cat /proc/version\n",
        ]
        .iter()
        .map(|line| body.find(line).unwrap_or_else(|| panic!("missing {line:?}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[tokio::test]
    async fn write_command_output_reports_missing_command() {
        let mut out = String::new();
        write_command_output(&mut out, "definitely-not-a-real-command-azurefuncs", &["-x"]).await;

        assert!(out.starts_with("definitely-not-a-real-command-azurefuncs -x\n"));
        assert!(out.contains("error: "));
    }
}
