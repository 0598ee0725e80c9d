mod attachment;
mod history;
mod image_ref;
mod turn;

pub use attachment::Attachment;
pub use history::Conversation;
pub use image_ref::ImageRef;
pub use turn::{Role, Turn, TurnKind};
