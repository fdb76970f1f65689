//! The task board: the six task operations composed from the record store,
//! blob store and label detector atoms.
//!
//! `service` holds the operations as plain async functions returning typed
//! results; `http` turns them into API responses.

pub mod http;
pub mod service;
