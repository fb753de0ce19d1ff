//! Weighted-lottery winner selection.
//!
//! The lottery turns a participant list and multiplier configuration into a
//! bounded, deduplicated winner list. It never fails: bad inputs are coerced
//! (with a warning), unresolvable candidates shrink the result, and an empty
//! winner list is a legitimate outcome the delivery pipeline knows how to
//! announce.
//!
//! # Key Invariants
//!
//! 1. **Bounded**: `|pick(P, K)| <= K` for every participant list and quota.
//! 2. **Unique**: a winner list never repeats an id; a participant's extra
//!    tickets only improve their odds of appearing once.
//! 3. **Max, not sum**: a participant holding several weighted roles gets
//!    the largest single multiplier, so stacking roles cannot explode the
//!    ticket pool.
//! 4. **Isolation**: one unresolvable candidate never aborts the pick.

pub mod draw;
pub mod weights;

// Re-export commonly used types
pub use draw::{DEFAULT_SHUFFLE_WINDOW_FACTOR, LotteryEngine, Winner};
pub use weights::{DEFAULT_MULTIPLIER, effective_multiplier, merged_table};
