//! Rapport Core Library
//!
//! Core functionality for Rapport - Nostr-based social discovery.
//! This crate provides the local reaction ledger and the mutual-visibility
//! policy that decides which users a discovery feed may show each other.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod reaction;
