mod app;
mod core;
mod effect;
mod event;
mod ipc;
mod platform;
mod rules_store;
mod x11;

use std::path::PathBuf;

use anyhow::{bail, Result};
use argh::FromArgs;
use hashira_ipc::{Command, MatchField, Response, WindowRule};
use ipc::IpcClient;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hashira - keep windows above or on all workspaces by rule
#[derive(FromArgs)]
struct Cli {
    /// control socket path (default: /tmp/hashira.sock)
    #[argh(option)]
    socket: Option<PathBuf>,
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    ListRules(ListRulesCmd),
    AddRule(AddRuleCmd),
    RemoveRule(RemoveRuleCmd),
    MoveRule(MoveRuleCmd),
    ListWindows(ListWindowsCmd),
    GetState(GetStateCmd),
    Reload(ReloadCmd),
    Quit(QuitCmd),
}

/// Start the hashira daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// rules file (default: $XDG_CONFIG_HOME/hashira/rules.json)
    #[argh(option)]
    rules: Option<PathBuf>,
    /// delay before evaluating a new window, in milliseconds
    #[argh(option)]
    debounce_ms: Option<u64>,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// List rules in priority order
#[derive(FromArgs)]
#[argh(subcommand, name = "list-rules")]
struct ListRulesCmd {}

/// Append a rule
#[derive(FromArgs)]
#[argh(subcommand, name = "add-rule")]
struct AddRuleCmd {
    /// case-insensitive regex matched against the title (or class)
    #[argh(positional)]
    pattern: String,
    /// match the window class instead of the title
    #[argh(switch)]
    class: bool,
    /// show matching windows on all workspaces
    #[argh(switch)]
    sticky: bool,
    /// keep matching windows above others
    #[argh(switch)]
    above: bool,
}

/// Remove the rule at an index
#[derive(FromArgs)]
#[argh(subcommand, name = "remove-rule")]
struct RemoveRuleCmd {
    /// rule index, 0-based
    #[argh(positional)]
    index: usize,
}

/// Move a rule to a new priority
#[derive(FromArgs)]
#[argh(subcommand, name = "move-rule")]
struct MoveRuleCmd {
    /// current 0-based index
    #[argh(positional)]
    from: usize,
    /// new 0-based index
    #[argh(positional)]
    to: usize,
}

/// List tracked windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-windows")]
struct ListWindowsCmd {}

/// Get daemon state
#[derive(FromArgs)]
#[argh(subcommand, name = "get-state")]
struct GetStateCmd {}

/// Re-read the rules file
#[derive(FromArgs)]
#[argh(subcommand, name = "reload")]
struct ReloadCmd {}

/// Quit the hashira daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();
    let socket_path = cli
        .socket
        .unwrap_or_else(|| PathBuf::from(crate::core::DEFAULT_SOCKET_PATH));

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["hashira", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            let config = crate::core::Config {
                socket_path,
                ..crate::core::Config::new()
            }
            .with_rules_path(cmd.rules)
            .with_debounce_ms(cmd.debounce_ms);

            tracing::info!("hashira {} starting", VERSION);
            app::App::run(config)
        }
        Some(SubCommand::Version(_)) => {
            println!("hashira {}", VERSION);
            Ok(())
        }
        Some(SubCommand::ListRules(_)) => run_cli(Command::ListRules, &socket_path),
        Some(SubCommand::AddRule(cmd)) => run_cli(cmd.into_command()?, &socket_path),
        Some(SubCommand::RemoveRule(cmd)) => {
            run_cli(Command::RemoveRule { index: cmd.index }, &socket_path)
        }
        Some(SubCommand::MoveRule(cmd)) => run_cli(
            Command::MoveRule {
                from: cmd.from,
                to: cmd.to,
            },
            &socket_path,
        ),
        Some(SubCommand::ListWindows(_)) => run_cli(Command::ListWindows, &socket_path),
        Some(SubCommand::GetState(_)) => run_cli(Command::GetState, &socket_path),
        Some(SubCommand::Reload(_)) => run_cli(Command::Reload, &socket_path),
        Some(SubCommand::Quit(_)) => run_cli(Command::Quit, &socket_path),
    }
}

impl AddRuleCmd {
    fn into_command(self) -> Result<Command> {
        if self.pattern.trim().is_empty() {
            bail!("add-rule requires a non-empty pattern");
        }
        let field = if self.class {
            MatchField::Class
        } else {
            MatchField::Title
        };
        Ok(Command::AddRule {
            rule: WindowRule::new(self.pattern, field, self.sticky, self.above),
        })
    }
}

fn run_cli(cmd: Command, socket_path: &std::path::Path) -> Result<()> {
    let mut client = IpcClient::connect(socket_path)?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Rules { rules } => {
            for (index, rule) in rules.iter().enumerate() {
                println!("{}: {}", index, format_rule(rule));
            }
        }
        Response::Windows { windows } => {
            for w in windows {
                println!(
                    "{:#x}: {} [{}] above={} sticky={} owned={} ({:?})",
                    w.id,
                    w.title.as_deref().unwrap_or("-"),
                    w.class.as_deref().unwrap_or("-"),
                    w.above,
                    w.sticky,
                    w.owns_behavior,
                    w.phase
                );
            }
        }
        Response::State { state } => {
            println!("Rules: {}", state.rule_count);
            println!("Tracked windows: {}", state.tracked_windows);
            println!("Owned windows: {}", state.owned_windows);
            println!("Pending timers: {}", state.pending_timers);
        }
    }

    Ok(())
}

fn format_rule(rule: &WindowRule) -> String {
    let mut behaviors = Vec::new();
    if rule.above {
        behaviors.push("above");
    }
    if rule.sticky {
        behaviors.push("sticky");
    }
    let behaviors = if behaviors.is_empty() {
        "none".to_string()
    } else {
        behaviors.join(",")
    };
    format!("{} /{}/ -> {}", rule.field.as_str(), rule.pattern, behaviors)
}
