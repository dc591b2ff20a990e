pub mod config;
pub mod init;
pub mod lesson;
pub mod llm;
pub mod task;
