//! MemTable Module
//!
//! In-memory data structure for recent writes.
//!
//! ## Responsibilities
//! - Insert-or-update and point lookup in logarithmic time
//! - Track entry count for the flush trigger
//! - Full traversal for segment creation
//!
//! ## Data Structure Choice
//! A red-black tree stored in an index-based arena: parent links are plain
//! indices, so the tree needs no reference counting or unsafe code.

mod rbtree;
mod table;

pub use rbtree::{Color, InvariantViolation, Iter, RbTree};
pub use table::MemTable;
