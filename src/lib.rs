//! Ownership Patterns
//!
//! Two hand-built containers that show how shared and exclusive ownership
//! work underneath `Rc` and `Vec`.
//!
//! ## Patterns Covered
//!
//! 1. **Reference Counting** - `RefCountedBox`, an intrusive count in one heap node
//! 2. **Named Owners** - `SharedHandle`, a resettable slot that reports double release
//! 3. **Growable Buffer** - `GrowableBuffer`, doubling growth, deep copy, take-style move
//! 4. **Tracing** - `Tracer`, lifecycle lines passed in as a value instead of global macros
//!
//! ## Running Examples
//!
//! ```bash
//! cargo run --bin shared_ptr_demo
//! cargo run --bin custom_vector_demo -- trace.toml
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ownership_patterns::{GrowableBuffer, RefCountedBox, Release};
//!
//! let first: RefCountedBox<i32> = RefCountedBox::new(5);
//! let second = first.clone();
//! assert_eq!(first.count(), 2);
//! assert_eq!(first.release(), Release::Shared { remaining: 1 });
//! assert_eq!(second.release(), Release::Freed);
//!
//! let mut buffer = GrowableBuffer::with_capacity(1);
//! buffer.push(10);
//! buffer.push(11);
//! buffer.push(12);
//! assert_eq!(buffer.capacity(), 4);
//! assert_eq!(buffer.to_string(), "[10][11][12]");
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod handle;
mod raw;
pub mod refcount;
pub mod trace;

pub use buffer::{GrowableBuffer, Iter};
pub use config::{TraceConfig, TraceTarget};
pub use error::{BufferError, ConfigError, HandleError};
pub use handle::SharedHandle;
pub use refcount::{AtomicCount, LocalCount, RefCountedBox, RefCounter, Release, SyncRefCountedBox};
pub use trace::Tracer;
