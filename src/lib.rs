//! indexvol — index volume data cleaning.
//!
//! Parses magnitude-suffixed volume strings ("12.3B", "450M") and derives
//! the series used to chart index history. Domain logic lives in
//! [`domain`], port traits in [`ports`], concrete implementations in
//! [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
