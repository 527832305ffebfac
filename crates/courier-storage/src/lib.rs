// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Courier.
//!
//! Provides the durable, per-conversation message log, user profiles, and
//! pending scheduled tasks: WAL-mode SQLite with embedded migrations and a
//! single-writer connection via `tokio-rusqlite`.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
