//! Core simulation plumbing

pub mod time;
