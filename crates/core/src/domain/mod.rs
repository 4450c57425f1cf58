pub mod conversation;
pub mod feature;
pub mod insight;
pub mod lenient;
pub mod request;
pub mod session;
