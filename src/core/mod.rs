//! Core conversion modules

pub mod spectre2spice;
