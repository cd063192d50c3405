mod atomic_io;

pub use atomic_io::{write_json_atomic, write_text_atomic, PersistError};
