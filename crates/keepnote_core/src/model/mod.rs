//! Domain model for notes, labels, checklist items and their owners.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Host the pure rule functions (flag transitions, reorder plans,
//!   checklist reconciliation) so they can be tested without storage.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Every note and label has exactly one owner for its whole life.

pub mod checklist;
pub mod datetime;
pub mod label;
pub mod note;
pub mod ordering;
pub mod user;
pub mod validation;
