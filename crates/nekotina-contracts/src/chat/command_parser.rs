use super::command_registry::{CommandAction, CommandSpec, NO_ARG_COMMANDS, PATH_COMMANDS};

/// A line typed into the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Noop,
    Message(String),
    Attach(String),
    Detach,
    Reset,
    History,
    Help,
    Quit,
    Unknown { command: String, arg: String },
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<CommandAction> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect::<Vec<String>>()
            .join(" "),
        Err(_) => arg.trim().to_string(),
    }
}

fn no_arg_command(action: CommandAction) -> ChatCommand {
    match action {
        CommandAction::Detach => ChatCommand::Detach,
        CommandAction::Reset => ChatCommand::Reset,
        CommandAction::History => ChatCommand::History,
        CommandAction::Help => ChatCommand::Help,
        CommandAction::Quit => ChatCommand::Quit,
        CommandAction::Attach => ChatCommand::Attach(String::new()),
    }
}

/// Splits slash commands from plain messages. Plain messages keep their
/// inner whitespace but lose surrounding blanks.
pub fn parse_command(text: &str) -> ChatCommand {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatCommand::Noop;
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if find_action(&command, PATH_COMMANDS).is_some() {
                return ChatCommand::Attach(parse_path_arg(arg));
            }
            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return no_arg_command(action);
            }
            return ChatCommand::Unknown {
                command,
                arg: arg.to_string(),
            };
        }
    }

    ChatCommand::Message(raw_trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{parse_command, ChatCommand};

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_command("  crie um gato  \n"),
            ChatCommand::Message("crie um gato".to_string())
        );
        assert_eq!(parse_command("   "), ChatCommand::Noop);
    }

    #[test]
    fn attach_accepts_quoted_paths() {
        assert_eq!(
            parse_command("/attach \"/tmp/minha foto.png\""),
            ChatCommand::Attach("/tmp/minha foto.png".to_string())
        );
        assert_eq!(
            parse_command("/image cat.jpg"),
            ChatCommand::Attach("cat.jpg".to_string())
        );
        assert_eq!(parse_command("/attach"), ChatCommand::Attach(String::new()));
    }

    #[test]
    fn unbalanced_quotes_fall_back_to_raw_argument() {
        assert_eq!(
            parse_command("/attach \"/tmp/a b.png"),
            ChatCommand::Attach("\"/tmp/a b.png".to_string())
        );
    }

    #[test]
    fn no_arg_commands_and_aliases() {
        assert_eq!(parse_command("/detach"), ChatCommand::Detach);
        assert_eq!(parse_command("/RESET"), ChatCommand::Reset);
        assert_eq!(parse_command("/clear"), ChatCommand::Reset);
        assert_eq!(parse_command("/history"), ChatCommand::History);
        assert_eq!(parse_command("/help"), ChatCommand::Help);
        assert_eq!(parse_command("/exit"), ChatCommand::Quit);
    }

    #[test]
    fn unknown_commands_keep_their_argument() {
        assert_eq!(
            parse_command("/magic foo bar"),
            ChatCommand::Unknown {
                command: "magic".to_string(),
                arg: "foo bar".to_string(),
            }
        );
    }

    #[test]
    fn lone_slash_is_a_message() {
        assert_eq!(parse_command("/ hm"), ChatCommand::Message("/ hm".to_string()));
    }
}
