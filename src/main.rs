//! Command-line interface to the Droplet-on-Demand robot controller.
//!
//! Arguments are parsed in two passes: a minimal pre-pass picks up the
//! connection options, discovery runs against the robot, and the full
//! parser is then built with the legal `--move`/`--task`/`--get` choices
//! taken from the live capability table.

use std::path::Path;
use std::process::ExitCode;

use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};

use dod_robot_client::protocol::response::STATUS_KEY;
use dod_robot_client::{ClientResult, ResponsePayload, RobotClient};

const DEFAULT_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_CAPABILITY_FILE: &str = "dod_capabilities.json";
const CLIENT_NAME: &str = "dod-cli";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> ClientResult<ExitCode> {
    // Pre-pass: connection options only, everything else ignored.
    let pre = Command::new("dod")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .ignore_errors(true)
        .arg(connection_arg("url"))
        .arg(connection_arg("capabilities"))
        .get_matches();
    let url = pre.get_one::<String>("url").cloned().unwrap_or_default();
    let capabilities = pre
        .get_one::<String>("capabilities")
        .cloned()
        .unwrap_or_default();

    let client = RobotClient::connect_to(&url, Path::new(&capabilities))?;

    let table = client.capabilities();
    let matches = build_cli(
        &table.get_names(),
        &table.do_values("Move"),
        &table.do_values("ExecuteTask"),
    )
    .get_matches();

    let reply = dispatch(&client, &matches)?;
    Ok(report(reply))
}

fn connection_arg(name: &'static str) -> Arg {
    match name {
        "url" => Arg::new("url")
            .long("url")
            .value_name("URL")
            .default_value(DEFAULT_URL)
            .env("DOD_URL")
            .help("Base URL of the robot controller"),
        _ => Arg::new("capabilities")
            .long("capabilities")
            .value_name("FILE")
            .default_value(DEFAULT_CAPABILITY_FILE)
            .env("DOD_CAPABILITIES")
            .help("Path to the capability file"),
    }
}

/// Build the full parser. Choice lists come from discovery; an empty list
/// means the enumeration is unresolved and the argument stays free-form.
fn build_cli(gets: &[String], moves: &[String], tasks: &[String]) -> Command {
    let choices = |arg: Arg, values: &[String]| -> Arg {
        if values.is_empty() {
            arg
        } else {
            arg.value_parser(PossibleValuesParser::new(values.to_vec()))
        }
    };

    Command::new("dod")
        .about("Droplet-on-Demand robot controller client")
        .arg(connection_arg("url"))
        .arg(connection_arg("capabilities"))
        .arg(choices(
            Arg::new("get")
                .long("get")
                .value_name("ENDPOINT")
                .help("Query a read-only endpoint"),
            gets,
        ))
        .arg(
            Arg::new("connect")
                .long("connect")
                .action(ArgAction::SetTrue)
                .help("Open a control session with the robot"),
        )
        .arg(
            Arg::new("disconnect")
                .long("disconnect")
                .action(ArgAction::SetTrue)
                .help("Close the control session"),
        )
        .arg(choices(
            Arg::new("move")
                .long("move")
                .value_name("POSITION")
                .help("Move to a named position"),
            moves,
        ))
        .arg(choices(
            Arg::new("task")
                .long("task")
                .value_name("TASK")
                .help("Execute a named task"),
            tasks,
        ))
        .group(
            ArgGroup::new("action")
                .args(["get", "connect", "disconnect", "move", "task"])
                .required(true),
        )
}

fn dispatch(client: &RobotClient, matches: &ArgMatches) -> ClientResult<Option<ResponsePayload>> {
    if let Some(endpoint) = matches.get_one::<String>("get") {
        client.get(endpoint)
    } else if matches.get_flag("connect") {
        client.connect(CLIENT_NAME)
    } else if matches.get_flag("disconnect") {
        client.disconnect()
    } else if let Some(position) = matches.get_one::<String>("move") {
        client.move_to(position)
    } else {
        // The action group is required, so --task is all that is left.
        let task = matches.get_one::<String>("task").expect("required group");
        client.execute_task(task)
    }
}

fn report(reply: Option<ResponsePayload>) -> ExitCode {
    match reply {
        Some(payload) => {
            let status = payload
                .status
                .get(STATUS_KEY)
                .map(String::as_str)
                .unwrap_or("?");
            println!("Status: {}", status);
            println!("Result: {}", payload.result);
            if payload.is_error() {
                eprintln!(
                    "robot error {}: {}",
                    payload.error_code, payload.error_message
                );
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("no response from robot");
            ExitCode::from(2)
        }
    }
}
