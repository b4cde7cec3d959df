use std::fmt;

use mcw_types::ResourceLocation;
use serde::Serialize;

use crate::error::{ActionError, ActionResult};

/// Keyword marking a multipart block entity in the text form.
pub const MULTIPART_KEYWORD: &str = "multipart";

pub(crate) const ARROW: &str = "->";

pub(crate) fn parse_name(token: &str) -> ActionResult<ResourceLocation> {
    token
        .parse()
        .map_err(|_| ActionError::InvalidName(token.to_string()))
}

/// A registry entry renamed between two saves.
///
/// Shared by block and item renames; the action name tells them apart.
///
/// ```text
/// modid:blockName 433 -> modid:block_name 182
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RegistryRename {
    pub old_name: ResourceLocation,
    pub old_id: i32,
    pub new_name: ResourceLocation,
    pub new_id: i32,
}

impl RegistryRename {
    pub fn new(
        old_name: ResourceLocation,
        old_id: i32,
        new_name: ResourceLocation,
        new_id: i32,
    ) -> Self {
        Self {
            old_name,
            old_id,
            new_name,
            new_id,
        }
    }

    /// Parse the body of a rename line (everything after the action name).
    pub fn parse(body: &str) -> ActionResult<Self> {
        let parts: Vec<&str> = body.split_whitespace().collect();
        let [old_name, old_id, arrow, new_name, new_id] = parts.as_slice() else {
            return Err(ActionError::Syntax(format!(
                "expected `<old> <id> -> <new> <id>`, got {body:?}"
            )));
        };
        if *arrow != ARROW {
            return Err(ActionError::Syntax(format!("expected `->`, got {arrow:?}")));
        }
        Ok(Self {
            old_name: parse_name(old_name)?,
            old_id: parse_id("old id", old_id)?,
            new_name: parse_name(new_name)?,
            new_id: parse_id("new id", new_id)?,
        })
    }
}

fn parse_id(field: &'static str, token: &str) -> ActionResult<i32> {
    token.parse().map_err(|_| ActionError::InvalidNumber {
        field,
        value: token.to_string(),
    })
}

impl fmt::Display for RegistryRename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {ARROW} {} {}",
            self.old_name, self.old_id, self.new_name, self.new_id
        )
    }
}

/// A block entity id renamed between two saves.
///
/// Either side may be a multipart sub-entity. A plain block entity can never
/// become a multipart one, so that combination is unconstructible.
///
/// ```text
/// multipart modid:oldPart -> multipart modid:old_part
/// modid:oldEntity -> modid:new_entity
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BlockEntityRename {
    old_name: ResourceLocation,
    old_multipart: bool,
    new_name: ResourceLocation,
    new_multipart: bool,
}

impl BlockEntityRename {
    pub fn new(
        old_name: ResourceLocation,
        old_multipart: bool,
        new_name: ResourceLocation,
        new_multipart: bool,
    ) -> ActionResult<Self> {
        if !old_multipart && new_multipart {
            return Err(ActionError::MultipartTransition);
        }
        Ok(Self {
            old_name,
            old_multipart,
            new_name,
            new_multipart,
        })
    }

    pub fn old_name(&self) -> &ResourceLocation {
        &self.old_name
    }

    pub fn old_multipart(&self) -> bool {
        self.old_multipart
    }

    pub fn new_name(&self) -> &ResourceLocation {
        &self.new_name
    }

    pub fn new_multipart(&self) -> bool {
        self.new_multipart
    }

    pub fn parse(body: &str) -> ActionResult<Self> {
        let Some((old, new)) = body.split_once(ARROW) else {
            return Err(ActionError::Syntax(format!("missing `->` in {body:?}")));
        };
        let (old_multipart, old_name) = parse_side(old)?;
        let (new_multipart, new_name) = parse_side(new)?;
        Self::new(old_name, old_multipart, new_name, new_multipart)
    }
}

/// `[multipart] <name>`
fn parse_side(side: &str) -> ActionResult<(bool, ResourceLocation)> {
    let parts: Vec<&str> = side.split_whitespace().collect();
    match parts.as_slice() {
        [name] => Ok((false, parse_name(name)?)),
        [keyword, name] if keyword.eq_ignore_ascii_case(MULTIPART_KEYWORD) => {
            Ok((true, parse_name(name)?))
        }
        _ => Err(ActionError::Syntax(format!(
            "expected `[multipart] <name>`, got {:?}",
            side.trim()
        ))),
    }
}

impl fmt::Display for BlockEntityRename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.old_multipart {
            write!(f, "{MULTIPART_KEYWORD} ")?;
        }
        write!(f, "{} {ARROW} ", self.old_name)?;
        if self.new_multipart {
            write!(f, "{MULTIPART_KEYWORD} ")?;
        }
        write!(f, "{}", self.new_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(name: &str) -> ResourceLocation {
        ResourceLocation::from_name(name)
    }

    #[test]
    fn registry_rename_text() {
        let rename = RegistryRename::new(loc("modid:blockName"), 433, loc("modid:block_name"), 182);
        assert_eq!(rename.to_string(), "modid:blockName 433 -> modid:block_name 182");
        assert_eq!(RegistryRename::parse(&rename.to_string()).unwrap(), rename);
    }

    #[test]
    fn registry_rename_tolerates_extra_spaces() {
        let parsed = RegistryRename::parse("  a:b   1 ->  c:d 2 ").unwrap();
        assert_eq!(parsed, RegistryRename::new(loc("a:b"), 1, loc("c:d"), 2));
    }

    #[test]
    fn registry_rename_rejects_bad_ids() {
        let err = RegistryRename::parse("a:b x -> c:d 2").unwrap_err();
        assert_eq!(
            err,
            ActionError::InvalidNumber {
                field: "old id",
                value: "x".into()
            }
        );
    }

    #[test]
    fn registry_rename_rejects_wrong_shape() {
        assert!(matches!(
            RegistryRename::parse("a:b 1 => c:d 2"),
            Err(ActionError::Syntax(_))
        ));
        assert!(matches!(
            RegistryRename::parse("a:b 1 -> c:d"),
            Err(ActionError::Syntax(_))
        ));
    }

    #[test]
    fn block_entity_rename_text() {
        let rename =
            BlockEntityRename::new(loc("mod:oldPart"), true, loc("mod:old_part"), false).unwrap();
        assert_eq!(rename.to_string(), "multipart mod:oldPart -> mod:old_part");

        let both = BlockEntityRename::new(loc("mod:a"), true, loc("mod:b"), true).unwrap();
        assert_eq!(both.to_string(), "multipart mod:a -> multipart mod:b");
        assert_eq!(BlockEntityRename::parse(&both.to_string()).unwrap(), both);
    }

    #[test]
    fn multipart_transition_rejected() {
        assert_eq!(
            BlockEntityRename::new(loc("mod:a"), false, loc("mod:b"), true).unwrap_err(),
            ActionError::MultipartTransition
        );
        assert_eq!(
            BlockEntityRename::parse("mod:a -> multipart mod:b").unwrap_err(),
            ActionError::MultipartTransition
        );
    }

    #[test]
    fn multipart_in_name_is_not_a_keyword() {
        let parsed = BlockEntityRename::parse("mcmultipart:part -> mcmultipart:new_part").unwrap();
        assert!(!parsed.old_multipart());
        assert_eq!(parsed.old_name(), &loc("mcmultipart:part"));
    }

    #[test]
    fn block_entity_rename_syntax_errors() {
        assert!(matches!(
            BlockEntityRename::parse("mod:a mod:b"),
            Err(ActionError::Syntax(_))
        ));
        assert!(matches!(
            BlockEntityRename::parse("multi mod:a -> mod:b"),
            Err(ActionError::Syntax(_))
        ));
        assert!(matches!(
            BlockEntityRename::parse(" -> mod:b"),
            Err(ActionError::Syntax(_))
        ));
    }
}
