pub mod app;
pub mod chat_stream;
pub mod chat_view;
pub mod chord;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod message;
pub mod reveal;
pub mod selection;
pub mod side_chat;
pub mod text_wrapping;
