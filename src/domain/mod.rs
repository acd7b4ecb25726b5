mod bot_email;
mod redaction;
mod stream_name;

pub use bot_email::*;
pub use redaction::*;
pub use stream_name::*;
