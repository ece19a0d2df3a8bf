//! G-Code instruction handling
//!
//! This module provides:
//! - The canonical command type
//! - Line filtering from raw text into canonical commands

pub mod command;
pub mod parser;

pub use command::*;
pub use parser::*;
