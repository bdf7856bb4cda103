//! Storage implementations. The in-memory store is the reference backend;
//! anything implementing `RefundStore` can replace it without touching the
//! call contracts above it.

pub mod in_memory;
