mod command_parser;
mod command_registry;
mod context_window;
mod intent;

pub use command_parser::{parse_command, ChatCommand};
pub use command_registry::CHAT_HELP_COMMANDS;
pub use context_window::{
    build_chat_context, CurrentAttachment, DEFAULT_CONTEXT_LIMIT, DEFAULT_VISION_PROMPT,
};
pub use intent::{classify, Intent, IntentPolicy, KeywordIntentPolicy};
