//! # chatcast automation
//!
//! Drives a chat site's page from declarative [`Step`](chatcast_protocols::Step) lists.
//!
//! - [`FrameDriver`] - the seam between automation logic and a concrete frame
//!   (a live CDP frame, or the in-memory [`SnapshotFrame`])
//! - [`EditorKind`] / [`EditorAdapter`] - committing text into editors
//! - [`StepInterpreter`] / [`execute_steps`] - sequential step execution with polling

pub mod driver;
pub mod editor;
pub mod error;
pub mod interpreter;
pub mod keys;
pub mod snapshot;

pub use driver::{ContentReset, DispatchTarget, FrameDriver, SyntheticEvent, ValueSetter};
pub use editor::{apply_content_reset, EditorAdapter, EditorKind};
pub use error::DriverError;
pub use interpreter::{execute_steps, wait_for, StepInterpreter};
pub use keys::KeyStroke;
pub use snapshot::{FrameAction, SnapshotFrame};
