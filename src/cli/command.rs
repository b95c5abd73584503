use std::ffi::OsString;
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::error::LogsError;
use crate::logs::LogRequest;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub debug: bool,
    pub server: Option<String>,
    pub namespace: Option<String>,
    pub kubectl: Option<PathBuf>,
}

/// Raw `logs` flags. The log type is checked by [`LogsOptions::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsOptions {
    pub log: String,
    pub archive: bool,
    pub previous: bool,
    pub node: Option<String>,
    pub sidecars: bool,
}

impl LogsOptions {
    pub fn request(&self) -> Result<LogRequest, LogsError> {
        LogRequest::new(
            &self.log,
            self.archive,
            self.previous,
            self.node.clone(),
            self.sidecars,
        )
    }
}

pub enum CliCommand {
    Logs(LogsOptions),
}

pub struct TridentCli {
    pub global: GlobalOptions,
    pub command: CliCommand,
}

pub fn command() -> Command {
    Command::new("tridentctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A CLI tool for NetApp Trident")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug output"),
        )
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .global(true)
                .env("TRIDENT_SERVER")
                .help("Address/port of Trident REST interface"),
        )
        .arg(
            Arg::new("namespace")
                .short('n')
                .long("namespace")
                .global(true)
                .help("Namespace of Trident deployment"),
        )
        .arg(
            Arg::new("kubectl")
                .long("kubectl")
                .global(true)
                .env("KUBECTL")
                .value_parser(value_parser!(PathBuf))
                .help("Kubernetes CLI to invoke instead of discovering oc or kubectl"),
        )
        .subcommand(
            Command::new("logs")
                .about("Print the logs from Trident")
                .long_about("Print the logs from the Trident storage orchestrator for Kubernetes")
                .arg(
                    Arg::new("log")
                        .short('l')
                        .long("log")
                        .default_value("auto")
                        .help("Trident log to display. One of trident|auto|all"),
                )
                .arg(
                    Arg::new("archive")
                        .short('a')
                        .long("archive")
                        .action(ArgAction::SetTrue)
                        .help("Create a support archive with all logs unless otherwise specified."),
                )
                .arg(
                    Arg::new("previous")
                        .short('p')
                        .long("previous")
                        .action(ArgAction::SetTrue)
                        .help("Get the logs for the previous container instance if it exists."),
                )
                .arg(
                    Arg::new("node")
                        .long("node")
                        .help("The kubernetes node name to gather node pod logs from."),
                )
                .arg(
                    Arg::new("sidecars")
                        .long("sidecars")
                        .action(ArgAction::SetTrue)
                        .help("Get the logs for the sidecar containers as well."),
                ),
        )
}

impl TridentCli {
    pub fn new() -> Self {
        Self::try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let global = GlobalOptions {
            debug: matches.get_flag("debug"),
            server: matches.get_one::<String>("server").cloned(),
            namespace: matches.get_one::<String>("namespace").cloned(),
            kubectl: matches.get_one::<PathBuf>("kubectl").cloned(),
        };

        let command = match matches.subcommand() {
            Some(("logs", sub)) => CliCommand::Logs(LogsOptions {
                log: sub
                    .get_one::<String>("log")
                    .cloned()
                    .unwrap_or_else(|| "auto".to_string()),
                archive: sub.get_flag("archive"),
                previous: sub.get_flag("previous"),
                node: sub.get_one::<String>("node").cloned(),
                sidecars: sub.get_flag("sidecars"),
            }),
            _ => unreachable!("subcommand_required"),
        };

        Self { global, command }
    }
}
