//! Use-case services layered over the report store.
//!
//! # Responsibility
//! - Combine external collaborators with store operations.
//! - Keep callers decoupled from collaborator transport details.

pub mod assist_service;
