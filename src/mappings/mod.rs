pub mod key_code_table;
pub mod key_names;

pub use key_code_table::{KeyCodeTable, KeyMapping};
pub use key_names::KeyNames;
