//! Command-line argument parsing.
//!
//! Parsing is hand-written: one optional command word, an optional `HH:MM`
//! argument for the commands that take one, and options that may appear
//! anywhere on the line. Help and version flags win over everything else.

/// Options shared by every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOptions {
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
    pub ip: Option<String>,
    pub profile: Option<String>,
    pub auto_off_hours: Option<f64>,
    pub dry_run: bool,
    /// Simulated-time multiplier, e.g. 60 runs one minute per second.
    pub speed: Option<f64>,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a sunrise immediately
    Now,
    /// Sunrise starts at the given (or configured) time
    At(Option<String>),
    /// Sunrise completes at the given (or configured) time
    Up(Option<String>),
    Demo,
    Off,
    Status,
    Profiles,
    /// Print the three-day ablation schedule
    Ablation(Option<String>),
    Setup,
}

impl Command {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "now" => Command::Now,
            "at" => Command::At(None),
            "up" => Command::Up(None),
            "demo" => Command::Demo,
            "off" => Command::Off,
            "status" => Command::Status,
            "profiles" => Command::Profiles,
            "ablation" => Command::Ablation(None),
            "setup" => Command::Setup,
            _ => return None,
        })
    }

    /// Attach the positional time argument, if this command takes one.
    fn with_time(self, time: String) -> Option<Self> {
        match self {
            Command::At(None) => Some(Command::At(Some(time))),
            Command::Up(None) => Some(Command::Up(Some(time))),
            Command::Ablation(None) => Some(Command::Ablation(Some(time))),
            _ => None,
        }
    }
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    Run {
        command: Command,
        options: GlobalOptions,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse arguments, including the program name in first position.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        if args_vec
            .iter()
            .any(|arg| arg == "--version" || arg == "-V" || arg == "-v")
        {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if args_vec.iter().any(|arg| arg == "--help" || arg == "-h") {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let action = Self::parse_command_line(&args_vec).unwrap_or(CliAction::ShowHelpDueToError);
        ParsedArgs { action }
    }

    fn parse_command_line(args: &[String]) -> Option<CliAction> {
        let mut options = GlobalOptions::default();
        let mut command: Option<Command> = None;
        let mut time_given = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => options.debug_enabled = true,
                "--dry-run" => options.dry_run = true,
                "--config" | "-c" => options.config_dir = Some(iter.next()?.clone()),
                "--ip" => options.ip = Some(iter.next()?.clone()),
                "--profile" | "-p" => options.profile = Some(iter.next()?.clone()),
                "--log" => options.log_file = Some(iter.next()?.clone()),
                "--auto-off" | "-o" => {
                    let hours: f64 = iter.next()?.parse().ok()?;
                    if !hours.is_finite() {
                        return None;
                    }
                    options.auto_off_hours = Some(hours);
                }
                "--speed" => {
                    let multiplier: f64 = iter.next()?.parse().ok()?;
                    if !multiplier.is_finite() || multiplier <= 0.0 {
                        return None;
                    }
                    options.speed = Some(multiplier);
                }
                "help" if command.is_none() => return Some(CliAction::ShowHelp),
                flag if flag.starts_with('-') => return None,
                word => match command.take() {
                    None => command = Some(Command::from_word(word)?),
                    Some(current) if !time_given => {
                        command = Some(current.with_time(word.to_string())?);
                        time_given = true;
                    }
                    Some(_) => return None,
                },
            }
        }

        match command {
            Some(command) => Some(CliAction::Run { command, options }),
            None => Some(CliAction::ShowHelp),
        }
    }

    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!("{}", env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("sol [OPTIONS] <COMMAND>");
    log_block_start!("Commands:");
    log_indented!("now                    Start a sunrise immediately");
    log_indented!("at [HH:MM]             Sunrise starts at HH:MM (default: wake_time)");
    log_indented!("up [HH:MM]             Sunrise completes at HH:MM (default: wake_time)");
    log_indented!("demo                   35 second light show");
    log_indented!("off                    Turn the bulb off");
    log_indented!("status                 Show bulb reachability and power state");
    log_indented!("profiles               List sunrise profiles");
    log_indented!("ablation [HH:MM]       Print the 3-day ablation test schedule");
    log_indented!("setup                  Interactive setup screen");
    log_indented!("help                   Print this help");
    log_block_start!("Options:");
    log_indented!("    --ip <addr>        Bulb address (host or host:port)");
    log_indented!("-p, --profile <name>   Sunrise profile (see 'sol profiles')");
    log_indented!("-o, --auto-off <hours> Turn the bulb off N hours after completion");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("    --dry-run          Log bulb commands instead of sending them");
    log_indented!("    --speed <factor>   Run the clock faster, e.g. 60 = 1 min per second");
    log_indented!("    --log <file>       Also write output to a log file");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(command: Command, options: GlobalOptions) -> CliAction {
        CliAction::Run { command, options }
    }

    #[test]
    fn test_parse_no_args_shows_help() {
        let parsed = ParsedArgs::parse(vec!["sol"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_help_command_and_flag() {
        assert_eq!(ParsedArgs::parse(vec!["sol", "help"]).action, CliAction::ShowHelp);
        assert_eq!(ParsedArgs::parse(vec!["sol", "-h"]).action, CliAction::ShowHelp);
        assert_eq!(
            ParsedArgs::parse(vec!["sol", "now", "--help"]).action,
            CliAction::ShowHelp
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["sol", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
        assert_eq!(ParsedArgs::parse(vec!["sol", "-V"]).action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_now() {
        let parsed = ParsedArgs::parse(vec!["sol", "now"]);
        assert_eq!(parsed.action, run(Command::Now, GlobalOptions::default()));
    }

    #[test]
    fn test_parse_at_with_time_and_options() {
        let parsed = ParsedArgs::parse(vec![
            "sol", "at", "06:30", "-p", "gentle", "--ip", "10.0.0.9", "-o", "2",
        ]);
        assert_eq!(
            parsed.action,
            run(
                Command::At(Some("06:30".into())),
                GlobalOptions {
                    ip: Some("10.0.0.9".into()),
                    profile: Some("gentle".into()),
                    auto_off_hours: Some(2.0),
                    ..Default::default()
                }
            )
        );
    }

    #[test]
    fn test_options_before_command() {
        let parsed = ParsedArgs::parse(vec!["sol", "-d", "--config", "/tmp/sol", "up"]);
        assert_eq!(
            parsed.action,
            run(
                Command::Up(None),
                GlobalOptions {
                    debug_enabled: true,
                    config_dir: Some("/tmp/sol".into()),
                    ..Default::default()
                }
            )
        );
    }

    #[test]
    fn test_dry_run_with_speed() {
        let parsed = ParsedArgs::parse(vec!["sol", "now", "--dry-run", "--speed", "60", "--log", "run.log"]);
        assert_eq!(
            parsed.action,
            run(
                Command::Now,
                GlobalOptions {
                    dry_run: true,
                    speed: Some(60.0),
                    log_file: Some("run.log".into()),
                    ..Default::default()
                }
            )
        );
    }

    #[test]
    fn test_ablation_time() {
        let parsed = ParsedArgs::parse(vec!["sol", "ablation", "7:00"]);
        assert_eq!(
            parsed.action,
            run(Command::Ablation(Some("7:00".into())), GlobalOptions::default())
        );
    }

    #[test]
    fn test_time_not_accepted_by_now() {
        let parsed = ParsedArgs::parse(vec!["sol", "now", "06:30"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["sol", "discover"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["sol", "now", "--unknown"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_missing_option_value() {
        let parsed = ParsedArgs::parse(vec!["sol", "now", "--ip"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_malformed_numbers() {
        for args in [
            vec!["sol", "now", "-o", "soon"],
            vec!["sol", "now", "--speed", "0"],
            vec!["sol", "now", "--speed", "-5"],
            vec!["sol", "now", "-o", "inf"],
        ] {
            assert_eq!(ParsedArgs::parse(args).action, CliAction::ShowHelpDueToError);
        }
    }

    #[test]
    fn test_too_many_positionals() {
        let parsed = ParsedArgs::parse(vec!["sol", "at", "06:30", "07:00"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
