pub mod attachment;
pub mod backend;
pub mod captions;
pub mod config;
pub mod normalize;
pub mod orchestrator;
pub mod requests;

pub use attachment::{encode_bytes, encode_file, AttachmentReadError};
pub use backend::{Backend, BackendTransportError, GeminiBackend, TransportErrorKind};
pub use config::{EngineConfig, OperationModels, OrchestratorSettings};
pub use normalize::{normalize, Reply, ReplyOutcome};
pub use orchestrator::{PendingSend, SendState, TurnOrchestrator};
pub use requests::{
    build_chat_request, build_edit_request, build_generate_request, BackendRequest,
};
