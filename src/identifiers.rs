//! Type-safe identifier wrappers.
//!
//! Newtypes keep command identifiers and session identifiers from being
//! mixed with plain integers or strings.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CommandId
// ============================================================================

/// Identifier correlating a command with its response.
///
/// Allocated by a [`CommandIdAllocator`] owned by one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Wraps a raw identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CommandIdAllocator
// ============================================================================

/// Per-connection source of command identifiers.
///
/// Starts at 0 and increases by one per allocation. Never reset.
#[derive(Debug, Default)]
pub struct CommandIdAllocator {
    next: AtomicU64,
}

impl CommandIdAllocator {
    /// Creates an allocator whose first identifier is 0.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Allocates the next identifier.
    #[inline]
    pub fn next_id(&self) -> CommandId {
        CommandId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Identifier of one browser session, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random session identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First group is enough to tell sessions apart in logs.
        let text = self.0.simple().to_string();
        write!(f, "{}", &text[..8])
    }
}

// ============================================================================
// Tests
// ============================================================================
