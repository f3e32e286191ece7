mod dry_run;
#[cfg(test)]
pub mod recording;
mod r#trait;
pub mod unicode;
mod virtual_device;

pub use self::r#trait::{create_emitter, KeyEmitter};
