//! Command-line host for the `permitted-contents` validator.

pub mod cli;
