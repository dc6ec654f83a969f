//! The `:` command surface: parsing, aliases, and fuzzy suggestions for
//! typos.

use std::fmt;

const SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dm { user: String },
    Join { room: String },
    Split,
    VSplit,
    Quit,
    QuitAll,
    Shell,
    Registers,
    Help { topic: Option<String> },
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown {
        name: String,
        suggestion: Option<String>,
    },
    Usage(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "No command given"),
            Self::Unknown { name, suggestion } => {
                write!(f, "Not a client command: {name}")?;
                if let Some(suggestion) = suggestion {
                    write!(f, " (did you mean :{suggestion}?)")?;
                }
                Ok(())
            }
            Self::Usage(usage) => write!(f, "usage: {usage}"),
        }
    }
}

struct CommandSpec {
    name: &'static str,
    aliases: &'static [&'static str],
    usage: &'static str,
    summary: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "dm",
        aliases: &[],
        usage: "dm <user>",
        summary: "open a direct chat",
    },
    CommandSpec {
        name: "join",
        aliases: &[],
        usage: "join <room>",
        summary: "open a conference room",
    },
    CommandSpec {
        name: "split",
        aliases: &["sp"],
        usage: "split",
        summary: "split the focused pane horizontally",
    },
    CommandSpec {
        name: "vsplit",
        aliases: &["vsp"],
        usage: "vsplit",
        summary: "split the focused pane vertically",
    },
    CommandSpec {
        name: "quit",
        aliases: &["q", "Q"],
        usage: "quit",
        summary: "close the focused pane, exit when it is the last",
    },
    CommandSpec {
        name: "qall",
        aliases: &["qa", "Qa"],
        usage: "qall",
        summary: "exit the client",
    },
    CommandSpec {
        name: "shell",
        aliases: &["sh", "Sh"],
        usage: "shell",
        summary: "suspend the UI and run $SHELL",
    },
    CommandSpec {
        name: "registers",
        aliases: &["reg", "register"],
        usage: "registers",
        summary: "list registers in the lobby",
    },
    CommandSpec {
        name: "help",
        aliases: &["h"],
        usage: "help [command]",
        summary: "show this list or help for one command",
    },
];

/// Parses a command bar line. The leading `:` and surrounding spaces are
/// stripped; arguments are whitespace-split.
pub fn parse(input: &str) -> Result<Command, CommandError> {
    let line = input.trim().trim_start_matches(':').trim();
    let mut argv = line.split_whitespace();
    let Some(name) = argv.next() else {
        return Err(CommandError::Empty);
    };
    let args: Vec<&str> = argv.collect();

    let Some(spec) = lookup(name) else {
        return Err(CommandError::Unknown {
            name: name.to_string(),
            suggestion: suggest(name),
        });
    };

    match spec.name {
        "dm" => match args.as_slice() {
            [user] => Ok(Command::Dm {
                user: (*user).to_string(),
            }),
            _ => Err(CommandError::Usage("dm <user>")),
        },
        "join" => match args.as_slice() {
            [room] => Ok(Command::Join {
                room: (*room).to_string(),
            }),
            _ => Err(CommandError::Usage("join <room>")),
        },
        "split" => no_args(args, Command::Split, "split"),
        "vsplit" => no_args(args, Command::VSplit, "vsplit"),
        "quit" => no_args(args, Command::Quit, "quit"),
        "qall" => no_args(args, Command::QuitAll, "qall"),
        "shell" => no_args(args, Command::Shell, "shell"),
        "registers" => no_args(args, Command::Registers, "registers"),
        "help" => match args.as_slice() {
            [] => Ok(Command::Help { topic: None }),
            [topic] => Ok(Command::Help {
                topic: Some((*topic).to_string()),
            }),
            _ => Err(CommandError::Usage("help [command]")),
        },
        _ => unreachable!("command table covers every spec"),
    }
}

/// Command names offered to the command bar's tab completion.
pub fn completions(stem: &str) -> Vec<String> {
    if stem.is_empty() {
        return Vec::new();
    }
    COMMANDS
        .iter()
        .filter_map(|spec| spec.name.strip_prefix(stem))
        .filter(|suffix| !suffix.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// `:help` output, either the whole table or one entry.
pub fn help_lines(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => COMMANDS
            .iter()
            .map(|spec| format!(":{:<16} {}", spec.usage, spec.summary))
            .collect(),
        Some(topic) => match lookup(topic) {
            Some(spec) => {
                let mut line = format!(":{} - {}", spec.usage, spec.summary);
                if !spec.aliases.is_empty() {
                    line.push_str(&format!(" (aliases: {})", spec.aliases.join(", ")));
                }
                vec![line]
            }
            None => vec![format!("No help for: {topic}")],
        },
    }
}

fn no_args(args: Vec<&str>, command: Command, usage: &'static str) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage(usage))
    }
}

fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.contains(&name))
}

fn suggest(name: &str) -> Option<String> {
    COMMANDS
        .iter()
        .flat_map(|spec| std::iter::once(spec.name).chain(spec.aliases.iter().copied()))
        .min_by_key(|candidate| strsim::levenshtein(name, candidate))
        .filter(|candidate| strsim::levenshtein(name, candidate) <= SUGGESTION_DISTANCE)
        .map(ToString::to_string)
}
