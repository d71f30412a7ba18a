//! Kkobot core library — config, Kakao skill gateway, and deferred callback
//! delivery, used by the `kkobot` CLI.

pub mod callback;
pub mod config;
pub mod gateway;
pub mod init;
