#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    Attach,
    Detach,
    Reset,
    History,
    Help,
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: CommandAction,
}

pub(crate) const PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "attach",
        action: CommandAction::Attach,
    },
    CommandSpec {
        command: "image",
        action: CommandAction::Attach,
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "detach",
        action: CommandAction::Detach,
    },
    CommandSpec {
        command: "reset",
        action: CommandAction::Reset,
    },
    CommandSpec {
        command: "clear",
        action: CommandAction::Reset,
    },
    CommandSpec {
        command: "history",
        action: CommandAction::History,
    },
    CommandSpec {
        command: "help",
        action: CommandAction::Help,
    },
    CommandSpec {
        command: "quit",
        action: CommandAction::Quit,
    },
    CommandSpec {
        command: "exit",
        action: CommandAction::Quit,
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/attach <path>",
    "/detach",
    "/reset",
    "/history",
    "/help",
    "/quit",
];
