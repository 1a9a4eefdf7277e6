pub mod command;
pub mod config;
pub mod constants;
pub mod devices;
pub mod helpers;
pub mod interfaces;
pub mod readers;
pub mod schedule;
