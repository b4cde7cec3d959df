//! Named-tag (NBT) access for the McW converter.
//!
//! Tag trees are read and written with `quartz_nbt`; this crate adds the
//! pieces the save reader shares: flavor-aware [`read`]/[`write`] over byte
//! buffers and typed lookups along space-separated key paths ([`TagPath`]).
//!
//! # Example
//!
//! ```
//! use mcw_nbt::{NbtCompound, NbtTag, TagPath};
//!
//! let data = NbtCompound::new().with("RandomSeed", NbtTag::Long(42));
//! let root = NbtCompound::new().with("Data", NbtTag::Compound(data));
//! let bytes = mcw_nbt::encode("", &root).unwrap();
//! let decoded = mcw_nbt::decode(&bytes).unwrap();
//! assert_eq!(decoded.root.get_value::<i64>("Data RandomSeed"), Some(42));
//! assert_eq!(decoded.root.get_value::<i32>("Data RandomSeed"), None);
//! ```

pub mod error;
pub mod io;
pub mod path;

pub use error::{NbtError, NbtResult};
pub use io::{decode, encode, read, write, NamedTag};
pub use path::{as_compound, TagPath};
pub use quartz_nbt::io::Flavor;
pub use quartz_nbt::{NbtCompound, NbtList, NbtTag};
