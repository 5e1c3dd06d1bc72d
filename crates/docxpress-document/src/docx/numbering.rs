// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// List numbering registry and `word/numbering.xml`.
//
// Two abstract definitions exist: bullets and multi-level decimal. Every
// bullet list shares one concrete instance; every top-level ordered list gets
// its own instance with a start override so numbering restarts.

use docxpress_core::error::Result;

use super::xml::XmlWriter;
use super::writer::W_NAMESPACE;

const BULLET_ABSTRACT_ID: &str = "0";
const ORDERED_ABSTRACT_ID: &str = "1";

/// Number of levels defined per abstract list.
const LEVELS: u8 = 9;

const BULLET_GLYPHS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];
const ORDERED_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// A concrete list instance (`w:num`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumInstance {
    pub num_id: u32,
    pub kind: ListKind,
    /// `(level, start)` for ordered lists.
    pub start_override: Option<(u8, u32)>,
}

/// Lists allocated while converting the stories of one document.
#[derive(Debug, Default)]
pub struct Numbering {
    bullet: Option<u32>,
    instances: Vec<NumInstance>,
}

impl Numbering {
    /// The shared bullet instance, allocated on first use.
    pub fn bullet(&mut self) -> u32 {
        match self.bullet {
            Some(id) => id,
            None => {
                let id = self.allocate(ListKind::Bullet, None);
                self.bullet = Some(id);
                id
            }
        }
    }

    /// A fresh ordered instance that starts counting at `start` on `level`.
    pub fn ordered(&mut self, level: u8, start: u32) -> u32 {
        self.allocate(ListKind::Ordered, Some((level, start)))
    }

    fn allocate(&mut self, kind: ListKind, start_override: Option<(u8, u32)>) -> u32 {
        let num_id = self.instances.len() as u32 + 1;
        self.instances.push(NumInstance {
            num_id,
            kind,
            start_override,
        });
        num_id
    }

    pub fn instances(&self) -> &[NumInstance] {
        &self.instances
    }

    /// Serialise `word/numbering.xml`.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new()?;
        w.start("w:numbering", &[("xmlns:w", W_NAMESPACE)])?;

        write_abstract(&mut w, BULLET_ABSTRACT_ID, ListKind::Bullet)?;
        write_abstract(&mut w, ORDERED_ABSTRACT_ID, ListKind::Ordered)?;

        for instance in &self.instances {
            let num_id = instance.num_id.to_string();
            let abstract_id = match instance.kind {
                ListKind::Bullet => BULLET_ABSTRACT_ID,
                ListKind::Ordered => ORDERED_ABSTRACT_ID,
            };
            w.start("w:num", &[("w:numId", &num_id)])?;
            w.empty("w:abstractNumId", &[("w:val", abstract_id)])?;
            if let Some((level, start)) = instance.start_override {
                w.start("w:lvlOverride", &[("w:ilvl", &level.to_string())])?;
                w.empty("w:startOverride", &[("w:val", &start.to_string())])?;
                w.end("w:lvlOverride")?;
            }
            w.end("w:num")?;
        }

        w.end("w:numbering")?;
        Ok(w.finish())
    }
}

fn write_abstract(w: &mut XmlWriter, id: &str, kind: ListKind) -> Result<()> {
    w.start("w:abstractNum", &[("w:abstractNumId", id)])?;
    w.empty("w:multiLevelType", &[("w:val", "hybridMultilevel")])?;

    for level in 0..LEVELS {
        let idx = usize::from(level % 3);
        let (format, text) = match kind {
            ListKind::Bullet => ("bullet", BULLET_GLYPHS[idx].to_owned()),
            ListKind::Ordered => (ORDERED_FORMATS[idx], format!("%{}.", level + 1)),
        };
        let left = (u32::from(level) + 1) * 720;

        w.start("w:lvl", &[("w:ilvl", &level.to_string())])?;
        w.empty("w:start", &[("w:val", "1")])?;
        w.empty("w:numFmt", &[("w:val", format)])?;
        w.empty("w:lvlText", &[("w:val", &text)])?;
        w.empty("w:lvlJc", &[("w:val", "left")])?;
        w.start("w:pPr", &[])?;
        w.empty("w:ind", &[("w:left", &left.to_string()), ("w:hanging", "360")])?;
        w.end("w:pPr")?;
        if kind == ListKind::Bullet {
            w.start("w:rPr", &[])?;
            w.empty("w:rFonts", &[("w:ascii", "Arial"), ("w:hAnsi", "Arial")])?;
            w.end("w:rPr")?;
        }
        w.end("w:lvl")?;
    }

    w.end("w:abstractNum")
}
