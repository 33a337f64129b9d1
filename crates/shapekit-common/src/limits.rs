//! Centralized limits and thresholds for the shapekit crates.
//!
//! Keeping these in one place prevents duplicate definitions with
//! inconsistent values and documents the rationale for each limit.

/// Maximum nesting depth the descriptor compiler accepts for a single
/// type expression.
///
/// Parse trees come from an external grammar, but a hostile or generated
/// declaration like `array<array<array<...>>>` nested thousands deep
/// would otherwise recurse without bound. 64 is far beyond anything a
/// human-written declaration reaches.
pub const MAX_TYPE_NESTING: usize = 64;

/// Maximum recursion depth of the runtime validator.
///
/// Validation recurses over both the descriptor and the value. Descriptor
/// depth is bounded by `MAX_TYPE_NESTING`, but the value side is attacker
/// controlled, so the validator grows the stack in segments and bails out
/// past this depth.
pub const MAX_VALIDATION_DEPTH: usize = 512;

/// Remaining-stack threshold below which the validator grows the stack.
pub const STACK_RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment allocated when the red zone is hit.
pub const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Pre-allocation size for shape element buffers during compilation.
///
/// Most declared shapes have a handful of fields; 8 keeps the common
/// case on the stack (`SmallVec` inline capacity).
pub const SHAPE_ELEMENTS_INLINE: usize = 8;

/// Pre-allocation size for union/intersection member buffers.
pub const TYPE_LIST_INLINE: usize = 4;
