//! Text rendering of a [`Comparison`] as an editable action script.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use mcw_action::Action;
use mcw_diff::Comparison;
use mcw_store::SaveMetadata;

const HEADER: &str = include_str!("../resources/header.txt");

/// Report sections in output order: header text, whether the actions start
/// commented out, and the actions themselves.
fn sections(c: &Comparison) -> [(&'static str, bool, &[Action]); 7] {
    [
        (include_str!("../resources/block_renames.txt"), false, c.block_renames.as_slice()),
        (include_str!("../resources/missing_blocks.txt"), true, c.missing_blocks.as_slice()),
        (include_str!("../resources/item_renames.txt"), false, c.item_renames.as_slice()),
        (include_str!("../resources/missing_items.txt"), true, c.missing_items.as_slice()),
        (include_str!("../resources/block_swaps.txt"), false, c.block_swaps.as_slice()),
        (
            include_str!("../resources/block_entity_renames.txt"),
            false,
            c.block_entity_renames.as_slice(),
        ),
        (
            include_str!("../resources/missing_block_entities.txt"),
            true,
            c.missing_block_entities.as_slice(),
        ),
    ]
}

pub struct ReportWriter<W> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn header(
        &mut self,
        old: &SaveMetadata,
        new: &SaveMetadata,
        generated: DateTime<Local>,
    ) -> io::Result<()> {
        let text = HEADER
            .trim_end()
            .replace("[version]", env!("CARGO_PKG_VERSION"))
            .replace("[old_version]", &old.version_name)
            .replace("[new_version]", &new.version_name)
            .replace("[seed]", &old.seed.to_string())
            .replace("[date]", &generated.format("%Y.%m.%d %H:%M").to_string());
        write!(self.out, "{text}\n\n")
    }

    /// Write `actions` in their given order. A section with a header is
    /// preceded by two blank lines and the header, each line `#`-prefixed.
    pub fn section(
        &mut self,
        actions: &[Action],
        header: Option<&str>,
        commented: bool,
    ) -> io::Result<()> {
        if let Some(header) = header {
            writeln!(self.out)?;
            writeln!(self.out)?;
            for line in header.lines() {
                writeln!(self.out, "# {line}")?;
            }
        }
        let prefix = if commented { "# " } else { "" };
        for action in actions {
            writeln!(self.out, "{prefix}{}", action.render())?;
        }
        Ok(())
    }

    pub fn comparison(
        &mut self,
        comparison: &Comparison,
        generated: DateTime<Local>,
    ) -> io::Result<()> {
        if let (Some(old), Some(new)) = (&comparison.old, &comparison.new) {
            self.header(old, new, generated)?;
        }
        for (header, commented, actions) in sections(comparison) {
            self.section(actions, Some(header), commented)?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
