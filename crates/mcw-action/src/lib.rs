//! Conversion actions for the McW converter.
//!
//! An analysis run produces a list of [`Action`]s. Each renders to a single
//! text line beginning with its action name, and [`Action::parse`] reads that
//! line back:
//!
//! ```text
//! RenameBlock modid:blockName 433 -> modid:block_name 433
//! RenameItem modid:itemName 12 -> modid:item_name 12
//! RenameBlockEntity multipart modid:oldPart -> multipart modid:old_part
//! SwapBlock 112:7 -> 0:0 (modid:old_name -> unknown)
//! ```
//!
//! # Key Types
//!
//! - [`Action`] / [`ActionKind`] - The action sum type and its names
//! - [`RegistryRename`] - Block and item registry renames
//! - [`BlockEntityRename`] - Block entity id renames, multipart aware
//! - [`BlockSwap`] / [`BlockNames`] - Block id/meta replacement with name hints
//! - [`Script`] - Line-by-line parse of a whole report

pub mod action;
pub mod error;
pub mod rename;
pub mod swap;

pub use action::{sort_actions, Action, ActionKind, LineError, Script};
pub use error::{ActionError, ActionResult};
pub use rename::{BlockEntityRename, RegistryRename, MULTIPART_KEYWORD};
pub use swap::{BlockNames, BlockSwap, BLOCK_ID_LIMIT, BLOCK_META_LIMIT};
