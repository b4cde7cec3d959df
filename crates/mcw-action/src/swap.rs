use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use mcw_types::ResourceLocation;
use serde::Serialize;

use crate::error::{ActionError, ActionResult};
use crate::rename::ARROW;

/// Block ids are 12 bits wide.
pub const BLOCK_ID_LIMIT: u16 = 4096;
/// Block metadata is a nibble.
pub const BLOCK_META_LIMIT: u8 = 16;

/// Numeric block id to registry name tables used to annotate swaps.
///
/// A swap's old id lives in the old save's id space and its new id in the
/// new save's, so each side has its own table. Within a table lookups return
/// the first entry with a matching id: insertion order decides which name
/// wins when an id is listed twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockNames {
    old: Vec<(u16, ResourceLocation)>,
    new: Vec<(u16, ResourceLocation)>,
}

impl BlockNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_old(&mut self, id: u16, name: ResourceLocation) {
        self.old.push((id, name));
    }

    pub fn push_new(&mut self, id: u16, name: ResourceLocation) {
        self.new.push((id, name));
    }

    /// Name of `id` in the old save.
    pub fn old_name(&self, id: u16) -> Option<&ResourceLocation> {
        first_match(&self.old, id)
    }

    /// Name of `id` in the new save.
    pub fn new_name(&self, id: u16) -> Option<&ResourceLocation> {
        first_match(&self.new, id)
    }

    pub fn len(&self) -> usize {
        self.old.len() + self.new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }
}

fn first_match(table: &[(u16, ResourceLocation)], id: u16) -> Option<&ResourceLocation> {
    table
        .iter()
        .find(|(entry_id, _)| *entry_id == id)
        .map(|(_, name)| name)
}

/// Replace every `old_id:old_meta` block with `new_id:new_meta`.
///
/// ```text
/// 112:7 -> 879:2 (modid:old_name -> modid:new_name)
/// ```
///
/// The parenthesised hint is rendered from an attached [`BlockNames`] table
/// and ignored when parsing. It takes no part in equality or hashing.
#[derive(Clone, Debug, Serialize)]
pub struct BlockSwap {
    old_id: u16,
    old_meta: u8,
    new_id: u16,
    new_meta: u8,
    #[serde(skip)]
    hints: Option<Arc<BlockNames>>,
}

impl BlockSwap {
    pub fn new(old_id: u16, old_meta: u8, new_id: u16, new_meta: u8) -> ActionResult<Self> {
        check_range(Side::Old.id_field(), old_id.into(), BLOCK_ID_LIMIT.into())?;
        check_range(Side::Old.meta_field(), old_meta.into(), BLOCK_META_LIMIT.into())?;
        check_range(Side::New.id_field(), new_id.into(), BLOCK_ID_LIMIT.into())?;
        check_range(Side::New.meta_field(), new_meta.into(), BLOCK_META_LIMIT.into())?;
        Ok(Self {
            old_id,
            old_meta,
            new_id,
            new_meta,
            hints: None,
        })
    }

    /// A block that disappeared: the replacement is left as `0:0`.
    pub fn vanished(old_id: u16, old_meta: u8) -> ActionResult<Self> {
        Self::new(old_id, old_meta, 0, 0)
    }

    pub fn old_id(&self) -> u16 {
        self.old_id
    }

    pub fn old_meta(&self) -> u8 {
        self.old_meta
    }

    pub fn new_id(&self) -> u16 {
        self.new_id
    }

    pub fn new_meta(&self) -> u8 {
        self.new_meta
    }

    pub fn hints(&self) -> Option<&BlockNames> {
        self.hints.as_deref()
    }

    pub fn with_hints(mut self, hints: Arc<BlockNames>) -> Self {
        self.hints = Some(hints);
        self
    }

    /// `(old -> new)` annotation, present only when the old id has a name.
    pub fn hint(&self) -> Option<String> {
        let hints = self.hints.as_ref()?;
        let old = hints.old_name(self.old_id)?;
        let new = hints
            .new_name(self.new_id)
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        Some(format!("({old} {ARROW} {new})"))
    }

    /// Text form without the hint.
    pub fn body(&self) -> String {
        format!(
            "{}:{} {ARROW} {}:{}",
            self.old_id, self.old_meta, self.new_id, self.new_meta
        )
    }

    pub fn parse(body: &str) -> ActionResult<Self> {
        let mut parts = body.split_whitespace();
        let (Some(old), Some(arrow), Some(new)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ActionError::Syntax(format!(
                "expected `<id>:<meta> -> <id>:<meta>`, got {body:?}"
            )));
        };
        if arrow != ARROW {
            return Err(ActionError::Syntax(format!("expected `->`, got {arrow:?}")));
        }
        if let Some(rest) = parts.next() {
            if !rest.starts_with('(') {
                return Err(ActionError::Syntax(format!("unexpected trailing text {rest:?}")));
            }
        }

        let (old_id, old_meta) = parse_block(Side::Old, old)?;
        let (new_id, new_meta) = parse_block(Side::New, new)?;
        Self::new(old_id, old_meta, new_id, new_meta)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Old,
    New,
}

impl Side {
    fn id_field(self) -> &'static str {
        match self {
            Self::Old => "old block id",
            Self::New => "new block id",
        }
    }

    fn meta_field(self) -> &'static str {
        match self {
            Self::Old => "old block metadata",
            Self::New => "new block metadata",
        }
    }
}

/// `<id>:<meta>`
fn parse_block(side: Side, token: &str) -> ActionResult<(u16, u8)> {
    let Some((id, meta)) = token.split_once(':') else {
        return Err(ActionError::Syntax(format!("expected `<id>:<meta>`, got {token:?}")));
    };
    let id = parse_bounded(side.id_field(), id, BLOCK_ID_LIMIT.into())?;
    let meta = parse_bounded(side.meta_field(), meta, BLOCK_META_LIMIT.into())?;
    // Both values were checked against limits that fit the target types.
    Ok((id as u16, meta as u8))
}

fn parse_bounded(field: &'static str, token: &str, limit: u32) -> ActionResult<u32> {
    let value: i64 = token.parse().map_err(|_| ActionError::InvalidNumber {
        field,
        value: token.to_string(),
    })?;
    check_range(field, value, limit)?;
    Ok(value as u32)
}

fn check_range(field: &'static str, value: i64, limit: u32) -> ActionResult<()> {
    if !(0..i64::from(limit)).contains(&value) {
        return Err(ActionError::OutOfRange { field, value, limit });
    }
    Ok(())
}

impl PartialEq for BlockSwap {
    fn eq(&self, other: &Self) -> bool {
        self.old_id == other.old_id
            && self.old_meta == other.old_meta
            && self.new_id == other.new_id
            && self.new_meta == other.new_meta
    }
}

impl Eq for BlockSwap {}

impl Hash for BlockSwap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.old_id, self.old_meta, self.new_id, self.new_meta).hash(state);
    }
}

impl fmt::Display for BlockSwap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body())?;
        if let Some(hint) = self.hint() {
            write!(f, " {hint}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str) -> ResourceLocation {
        ResourceLocation::from_name(name)
    }

    fn names() -> Arc<BlockNames> {
        let mut names = BlockNames::new();
        names.push_old(5, loc("mod:old_block"));
        names.push_old(5, loc("mod:shadowed"));
        names.push_old(9, loc("mod:old_nine"));
        names.push_new(9, loc("mod:new_block"));
        names.push_new(9, loc("mod:shadowed_too"));
        Arc::new(names)
    }

    #[test]
    fn renders_without_hint() {
        let swap = BlockSwap::new(1432, 3, 122, 0).unwrap();
        assert_eq!(swap.to_string(), "1432:3 -> 122:0");
    }

    #[test]
    fn renders_hint_first_match_wins() {
        let swap = BlockSwap::new(5, 1, 9, 0).unwrap().with_hints(names());
        assert_eq!(swap.to_string(), "5:1 -> 9:0 (mod:old_block -> mod:new_block)");
    }

    #[test]
    fn each_side_resolves_in_its_own_save() {
        // 9 names mod:old_nine in the old save but mod:new_block in the new one.
        let forward = BlockSwap::new(5, 0, 9, 0).unwrap().with_hints(names());
        assert_eq!(forward.hint().unwrap(), "(mod:old_block -> mod:new_block)");
        let back = BlockSwap::new(9, 0, 5, 0).unwrap().with_hints(names());
        assert_eq!(back.hint().unwrap(), "(mod:old_nine -> unknown)");
    }

    #[test]
    fn unknown_new_name() {
        let swap = BlockSwap::vanished(5, 2).unwrap().with_hints(names());
        assert_eq!(swap.to_string(), "5:2 -> 0:0 (mod:old_block -> unknown)");
    }

    #[test]
    fn no_hint_without_old_name() {
        let swap = BlockSwap::new(7, 0, 9, 0).unwrap().with_hints(names());
        assert_eq!(swap.hint(), None);
        assert_eq!(swap.to_string(), "7:0 -> 9:0");
    }

    #[test]
    fn hint_ignored_for_equality_and_parse() {
        let hinted = BlockSwap::new(5, 1, 9, 0).unwrap().with_hints(names());
        let plain = BlockSwap::new(5, 1, 9, 0).unwrap();
        assert_eq!(hinted, plain);
        assert_eq!(BlockSwap::parse(&hinted.to_string()).unwrap(), plain);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            BlockSwap::parse("4096:0 -> 1:0").unwrap_err(),
            ActionError::OutOfRange {
                field: "old block id",
                value: 4096,
                limit: 4096
            }
        );
        assert_eq!(
            BlockSwap::parse("1:0 -> 1:16").unwrap_err(),
            ActionError::OutOfRange {
                field: "new block metadata",
                value: 16,
                limit: 16
            }
        );
        assert!(matches!(
            BlockSwap::parse("-1:0 -> 1:0"),
            Err(ActionError::OutOfRange { value: -1, .. })
        ));
        assert!(BlockSwap::new(0, 16, 0, 0).is_err());
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(BlockSwap::parse("1:0 -> 2"), Err(ActionError::Syntax(_))));
        assert!(matches!(BlockSwap::parse("1:0 2:0"), Err(ActionError::Syntax(_))));
        assert!(matches!(BlockSwap::parse("1:0 -> 2:0 junk"), Err(ActionError::Syntax(_))));
        assert!(matches!(
            BlockSwap::parse("a:0 -> 2:0"),
            Err(ActionError::InvalidNumber { .. })
        ));
    }
}
