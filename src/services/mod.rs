pub mod emitter;
pub mod input_source;
pub mod session_handle;
pub mod text_source;
pub mod trigger;
pub mod typing_service;
pub mod typing_session;

pub use emitter::create_emitter;
pub use input_source::{create_layout_registry, InputSourceGuard};
pub use text_source::{ClipboardCommand, FixedText, TextSource};
pub use trigger::create_trigger_listener;
pub use typing_service::TypingService;
