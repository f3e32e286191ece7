mod dry_run;
mod hotkey_listener;
mod r#trait;

pub use self::r#trait::create_trigger_listener;
