//! casemail: internal messaging core of a legal case-management backend.
//!
//! Role-based contact discovery, two-party conversation threads with
//! read-on-view, inbox/sent listings, and send. The HTTP layer and
//! authentication live elsewhere; callers hand in a trusted user id and role.
//!
//! See `DESIGN.md` for the architecture and its open-question decisions.

pub mod config;
pub mod db;
pub mod logging;

pub mod messaging;
