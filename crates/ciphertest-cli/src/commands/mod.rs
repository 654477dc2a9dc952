pub mod decrypt;
pub mod encode;
pub mod init;
pub mod run;
pub mod validate;
