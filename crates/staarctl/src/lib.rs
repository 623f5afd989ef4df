//! STAAR control - command-line front end for the progression engine.

pub mod cli;
pub mod commands;
pub mod display;
