// Copyright 2026 Quill Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quill library — conversational SQL assistant with per-table query memory.
//!
//! This library crate exposes the core modules for integration testing.

#![allow(dead_code, clippy::new_without_default)]

pub mod audit;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod db;
pub mod directive;
pub mod error;
pub mod export;
pub mod nl;
pub mod session;
