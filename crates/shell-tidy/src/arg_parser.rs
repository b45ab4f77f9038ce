use anyhow::Result;
use clap::ArgMatches;
use thiserror::Error;

use crate::utils::LogLevel;
use crate::utils::StdInReader;

pub struct CliArgs {
  pub sub_command: SubCommand,
  /// Overrides the log level from the settings file.
  pub log_level: Option<LogLevel>,
  pub config: Option<String>,
  pub workspace_folder: Option<String>,
}

impl CliArgs {
  pub fn is_stdout_machine_readable(&self) -> bool {
    // stdout is the formatted text
    matches!(self.sub_command, SubCommand::Fmt(..))
  }

  pub fn new_with_sub_command(sub_command: SubCommand) -> CliArgs {
    CliArgs {
      sub_command,
      log_level: None,
      config: None,
      workspace_folder: None,
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubCommand {
  Fmt(FmtSubCommand),
  Download,
  Info,
  Prewarm,
  Version,
  Help(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct FmtSubCommand {
  pub file_path: String,
  pub file_text: String,
  pub language_id: String,
  pub uri_scheme: String,
  pub tab_size: u32,
  pub insert_spaces: bool,
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseArgsError(#[from] anyhow::Error);

pub fn parse_args<TStdInReader: StdInReader>(args: Vec<String>, std_in_reader: TStdInReader) -> Result<CliArgs, ParseArgsError> {
  inner_parse_args(args, std_in_reader).map_err(ParseArgsError)
}

fn inner_parse_args<TStdInReader: StdInReader>(args: Vec<String>, std_in_reader: TStdInReader) -> Result<CliArgs> {
  // output the help text ourselves rather than as a clap error
  if args.len() == 1 || (args.len() == 2 && (args[1] == "help" || args[1] == "--help" || args[1] == "-h")) {
    let mut cli_parser = create_cli_parser();
    let help_text = format!("{}", cli_parser.render_help());
    return Ok(CliArgs::new_with_sub_command(SubCommand::Help(help_text)));
  } else if args.len() == 2 && (args[1] == "-v" || args[1] == "-V" || args[1] == "--version") {
    return Ok(CliArgs::new_with_sub_command(SubCommand::Version));
  }

  let cli_parser = create_cli_parser();
  let matches = cli_parser.try_get_matches_from(&args)?;
  let sub_command = match matches.subcommand() {
    Some(("fmt", matches)) => SubCommand::Fmt(parse_fmt_sub_command(matches, &std_in_reader)?),
    Some(("download", _)) => SubCommand::Download,
    Some(("info", _)) => SubCommand::Info,
    Some(("prewarm", _)) => SubCommand::Prewarm,
    Some(("version", _)) => SubCommand::Version,
    _ => unreachable!(),
  };

  Ok(CliArgs {
    sub_command,
    log_level: parse_log_level(&matches),
    config: matches.get_one::<String>("config").map(String::from),
    workspace_folder: matches.get_one::<String>("workspace-folder").map(String::from),
  })
}

fn parse_fmt_sub_command(matches: &ArgMatches, std_in_reader: &impl StdInReader) -> Result<FmtSubCommand> {
  let file_path = matches.get_one::<String>("stdin").map(String::from).unwrap_or_default();
  let language_id = match matches.get_one::<String>("language-id") {
    Some(language_id) => language_id.to_string(),
    None => language_id_from_file_path(&file_path).to_string(),
  };
  Ok(FmtSubCommand {
    file_text: std_in_reader.read()?,
    language_id,
    uri_scheme: matches.get_one::<String>("uri-scheme").map(String::from).unwrap_or_else(|| "file".to_string()),
    tab_size: matches.get_one::<u32>("tab-size").copied().unwrap_or(2),
    insert_spaces: !matches.get_flag("use-tabs"),
    file_path,
  })
}

fn parse_log_level(matches: &ArgMatches) -> Option<LogLevel> {
  if matches.get_flag("verbose") {
    return Some(LogLevel::Debug);
  }
  match matches.get_one::<String>("log-level").map(|s| s.as_str()) {
    Some("debug") => Some(LogLevel::Debug),
    Some("info") => Some(LogLevel::Info),
    _ => None,
  }
}

fn language_id_from_file_path(file_path: &str) -> &'static str {
  if file_path.to_lowercase().ends_with(".bats") {
    "bats"
  } else {
    "shellscript"
  }
}

pub fn create_cli_parser() -> clap::Command {
  use clap::Arg;
  use clap::Command;

  Command::new("shell-tidy")
    .bin_name("shell-tidy")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Formats shell scripts with shfmt, downloading it when necessary.")
    .subcommand_required(true)
    .disable_version_flag(true)
    .override_usage("shell-tidy <SUBCOMMAND> [OPTIONS]")
    .help_template(r#"{bin} {version}
{about}

USAGE:
    {usage}

SUBCOMMANDS:
{subcommands}

More details at `shell-tidy help <SUBCOMMAND>`

OPTIONS:
{options}

ENVIRONMENT VARIABLES:
  SHELL_TIDY_STORAGE_DIR        Directory to store downloaded shfmt binaries in.
  SHELL_TIDY_DOWNLOAD_BASE_URL  Base url to download shfmt releases from.
  HTTPS_PROXY                   Proxy to use when downloading shfmt (set
                                HTTP_PROXY for HTTP).{after-help}"#)
    .after_help(r#"

EXAMPLES:
  Format a script provided on stdin:
    shell-tidy fmt --stdin ./script.sh < ./script.sh

  Download the configured shfmt version:
    shell-tidy download"#)
    .subcommand(
      Command::new("fmt")
        .about("Formats the text provided on stdin and outputs the result to stdout.")
        .arg(
          Arg::new("stdin")
            .long("stdin")
            .value_name("file-path")
            .help("Path of the file the text belongs to. Used for EditorConfig resolution and dialect detection.")
            .required(true)
            .num_args(1),
        )
        .arg(
          Arg::new("language-id")
            .long("language-id")
            .help("Language of the document. Defaults to bats for .bats files and shellscript otherwise.")
            .num_args(1),
        )
        .arg(
          Arg::new("uri-scheme")
            .long("uri-scheme")
            .help("Scheme of the document. EditorConfig is only resolved for file documents.")
            .default_value("file")
            .num_args(1),
        )
        .arg(
          Arg::new("tab-size")
            .long("tab-size")
            .help("Indent width used when indenting with spaces.")
            .value_parser(clap::value_parser!(u32))
            .default_value("2")
            .num_args(1),
        )
        .arg(
          Arg::new("use-tabs")
            .long("use-tabs")
            .help("Indent with tabs instead of spaces.")
            .action(clap::ArgAction::SetTrue),
        ),
    )
    .subcommand(Command::new("download").about("Ensures the managed shfmt binary is installed."))
    .subcommand(Command::new("info").about("Outputs the version, source, and path of the resolved shfmt."))
    .subcommand(Command::new("prewarm").about("Installs the managed shfmt binary when it would be used. Never fails."))
    .subcommand(Command::new("version").about("Outputs the version."))
    .arg(
      Arg::new("config")
        .long("config")
        .short('c')
        .help("Path to the JSON settings file. Defaults to shell-tidy.json in the workspace folder.")
        .global(true)
        .num_args(1),
    )
    .arg(
      Arg::new("workspace-folder")
        .long("workspace-folder")
        .help("Folder used for ${workspaceFolder} substitution and settings discovery. Defaults to the current directory.")
        .global(true)
        .num_args(1),
    )
    .arg(
      Arg::new("log-level")
        .long("log-level")
        .help("Overrides the log level from the settings.")
        .value_parser(["info", "debug"])
        .global(true)
        .num_args(1),
    )
    .arg(
      Arg::new("verbose")
        .long("verbose")
        .help("Prints additional diagnostic information.")
        .global(true)
        .action(clap::ArgAction::SetTrue),
    )
}
