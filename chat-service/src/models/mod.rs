pub mod message;
pub mod session;
pub mod user;

pub use message::ChatMessage;
pub use session::{ChatSession, SessionStatus};
pub use user::User;
