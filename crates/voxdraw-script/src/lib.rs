//! voxdraw Script - Rhai scripting integration
//!
//! A draw script defines one function, evaluated once per grid cell:
//!
//! ```rhai
//! // A hollow sphere, red on top and blue below
//! fn draw(x, y, z, n) {
//!     let c = (n - 1) / 2.0;
//!     let d = hypot(hypot(x - c, y - c), z - c);
//!     if d > c || d < c - 1.5 {
//!         return false;
//!     }
//!     if y > c { "red" } else { "#3060ff" }
//! }
//! ```
//!
//! ## Return values
//!
//! - a string fills the cell with that color token (`"red"`, `"#ff8800"`,
//!   `"rgb(10, 20, 30)"`, `"hsl(200, 80%, 50%)"`)
//! - `true` fills the cell with the default color
//! - anything else leaves the cell empty
//!
//! ## Built-ins
//!
//! `max min abs round floor ceil random sqrt sin cos tan asin acos atan atan2
//! pow log exp log10 log2 log1p hypot mod div range len`, the constants
//! `PI E LN2 LN10 LOG2E LOG10E SQRT1_2 SQRT2 TAU`, and `print`/`debug`/`log(text)`
//! for diagnostics.
//!
//! ## Precision Notes
//!
//! Cell coordinates arrive as integers. Mixing them with floats is fine: every
//! math function accepts either.

pub mod engine;
pub mod math_api;

#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use engine::{DRAW_ARITY, DRAW_FN, DrawProgram, ScriptEngine, ScriptLimits};
pub use math_api::register_math_api;

#[cfg(feature = "file-watcher")]
pub use watcher::{ScriptChange, ScriptWatcher, WatchError};

// Re-export for convenience
pub use voxdraw_core::{CompileError, DrawValue, EvalError, Interpreter};
