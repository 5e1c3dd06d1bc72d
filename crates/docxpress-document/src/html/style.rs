// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inline style reading: the subset of CSS values the converter understands.
//
// After CSS inlining every applicable rule lives in a `style` attribute, so
// this module only needs to parse declaration lists and individual values:
// colours, lengths, font sizes, weights, and families.

/// Points per CSS pixel (96 px = 72 pt).
const PT_PER_PX: f32 = 0.75;

/// Parsed `style` attribute: lowercase property names with trimmed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    entries: Vec<(String, String)>,
}

impl Declarations {
    /// Parse a declaration list such as `color: red; font-size: 12px`.
    ///
    /// Malformed declarations are skipped and `!important` is ignored.
    pub fn parse(style: &str) -> Self {
        let entries = style
            .split(';')
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim().to_ascii_lowercase();
                let value = value.trim();
                let value = value
                    .strip_suffix("!important")
                    .map(str::trim_end)
                    .unwrap_or(value);
                if prop.is_empty() || value.is_empty() {
                    None
                } else {
                    Some((prop, value.to_owned()))
                }
            })
            .collect();
        Self { entries }
    }

    /// Value of a property; later declarations win.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(prop, _)| prop == property)
            .map(|(_, value)| value.as_str())
    }

    /// All `(property, value)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(prop, value)| (prop.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    /// Parse a CSS `text-align` value or an HTML `align` attribute.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }

    /// `w:jc` value.
    pub fn ooxml_value(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
        }
    }
}

/// Parse a CSS colour into an uppercase `RRGGBB` hex string.
///
/// Returns `None` for `transparent`, `inherit`, and anything unrecognised.
pub fn parse_color(value: &str) -> Option<String> {
    let value = value.trim().to_ascii_lowercase();

    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            3 | 4 => {
                let mut out = String::with_capacity(6);
                for c in hex.chars().take(3) {
                    c.to_digit(16)?;
                    out.push(c);
                    out.push(c);
                }
                Some(out.to_ascii_uppercase())
            }
            6 | 8 if hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                Some(hex[..6].to_ascii_uppercase())
            }
            _ => None,
        };
    }

    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = args
            .split([',', ' ', '/'])
            .filter(|part| !part.is_empty())
            .take(3)
            .map(parse_channel)
            .collect::<Option<_>>()?;
        if channels.len() != 3 {
            return None;
        }
        return Some(format!("{:02X}{:02X}{:02X}", channels[0], channels[1], channels[2]));
    }

    named_color(&value).map(str::to_owned)
}

fn parse_channel(part: &str) -> Option<u8> {
    if let Some(pct) = part.strip_suffix('%') {
        let pct: f32 = pct.trim().parse().ok()?;
        return Some((pct.clamp(0.0, 100.0) * 2.55).round() as u8);
    }
    let value: f32 = part.trim().parse().ok()?;
    Some(value.clamp(0.0, 255.0).round() as u8)
}

fn named_color(name: &str) -> Option<&'static str> {
    let hex = match name {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "blue" => "0000FF",
        "yellow" => "FFFF00",
        "gray" | "grey" => "808080",
        "silver" => "C0C0C0",
        "maroon" => "800000",
        "purple" => "800080",
        "fuchsia" | "magenta" => "FF00FF",
        "lime" => "00FF00",
        "olive" => "808000",
        "navy" => "000080",
        "teal" => "008080",
        "aqua" | "cyan" => "00FFFF",
        "orange" => "FFA500",
        "darkgray" | "darkgrey" => "A9A9A9",
        "lightgray" | "lightgrey" => "D3D3D3",
        "darkred" => "8B0000",
        "darkblue" => "00008B",
        "darkgreen" => "006400",
        _ => return None,
    };
    Some(hex)
}

/// Parse a CSS length into points. `em`, `rem`, and `%` are relative to
/// `base_pt`.
pub fn parse_length_pt(value: &str, base_pt: f32) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    if value == "0" {
        return Some(0.0);
    }

    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f32 = number.parse().ok()?;

    let pt = match unit.trim() {
        "px" | "" => number * PT_PER_PX,
        "pt" => number,
        "em" | "rem" => number * base_pt,
        "%" => number / 100.0 * base_pt,
        "in" => number * 72.0,
        "cm" => number * 72.0 / 2.54,
        "mm" => number * 72.0 / 25.4,
        "pc" => number * 12.0,
        _ => return None,
    };
    pt.is_finite().then_some(pt)
}

/// Parse a CSS `font-size` (length or keyword) into points.
pub fn parse_font_size_pt(value: &str, parent_pt: f32) -> Option<f32> {
    let keyword = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => Some(7.0),
        "x-small" => Some(7.5),
        "small" => Some(10.0),
        "medium" => Some(12.0),
        "large" => Some(13.5),
        "x-large" => Some(18.0),
        "xx-large" => Some(24.0),
        "smaller" => Some(parent_pt * 0.83),
        "larger" => Some(parent_pt * 1.2),
        _ => None,
    };
    keyword
        .or_else(|| parse_length_pt(value, parent_pt))
        .filter(|pt| *pt > 0.0)
}

/// Map a legacy `<font size="1..7">` attribute to points.
pub fn legacy_font_size_pt(value: &str) -> Option<f32> {
    let size = match value.trim() {
        "1" => 7.5,
        "2" => 10.0,
        "3" => 12.0,
        "4" => 13.5,
        "5" => 18.0,
        "6" => 24.0,
        "7" => 36.0,
        _ => return None,
    };
    Some(size)
}

/// Interpret a `font-weight` value; `None` when it should be inherited.
pub fn parse_font_weight(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        numeric => numeric.parse::<u16>().ok().map(|w| w >= 600),
    }
}

/// First family in a `font-family` list, without quotes. Generic families
/// map to common concrete fonts.
pub fn first_font_family(value: &str) -> Option<String> {
    let first = value.split(',').next()?.trim().trim_matches(['"', '\'']).trim();
    if first.is_empty() {
        return None;
    }
    let family = match first.to_ascii_lowercase().as_str() {
        "serif" => "Times New Roman",
        "sans-serif" | "system-ui" => "Arial",
        "monospace" => "Courier New",
        "inherit" | "initial" => return None,
        _ => first,
    };
    Some(family.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_last_one_wins() {
        let decls = Declarations::parse("color: red; font-size: 10px; COLOR: blue !important;;bad");
        assert_eq!(decls.get("color"), Some("blue"));
        assert_eq!(decls.get("font-size"), Some("10px"));
        assert_eq!(decls.get("bad"), None);
        assert_eq!(decls.iter().count(), 3);
    }

    #[test]
    fn colors_in_all_notations() {
        assert_eq!(parse_color("#666").as_deref(), Some("666666"));
        assert_eq!(parse_color("#1a2B3c").as_deref(), Some("1A2B3C"));
        assert_eq!(parse_color("rgb(255, 0, 10)").as_deref(), Some("FF000A"));
        assert_eq!(parse_color("rgba(150,150,150,1)").as_deref(), Some("969696"));
        assert_eq!(parse_color("Navy").as_deref(), Some("000080"));
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn lengths_convert_to_points() {
        assert_eq!(parse_length_pt("16px", 11.0), Some(12.0));
        assert_eq!(parse_length_pt("10pt", 11.0), Some(10.0));
        assert_eq!(parse_length_pt("2em", 11.0), Some(22.0));
        assert_eq!(parse_length_pt("1in", 11.0), Some(72.0));
        assert_eq!(parse_length_pt("0", 11.0), Some(0.0));
        assert_eq!(parse_length_pt("auto", 11.0), None);
    }

    #[test]
    fn font_sizes_accept_keywords() {
        assert_eq!(parse_font_size_pt("10px", 11.0), Some(7.5));
        assert_eq!(parse_font_size_pt("x-large", 11.0), Some(18.0));
        assert_eq!(parse_font_size_pt("150%", 10.0), Some(15.0));
        assert_eq!(parse_font_size_pt("-3px", 10.0), None);
        assert_eq!(legacy_font_size_pt("7"), Some(36.0));
    }

    #[test]
    fn weights_and_families() {
        assert_eq!(parse_font_weight("700"), Some(true));
        assert_eq!(parse_font_weight("400"), Some(false));
        assert_eq!(parse_font_weight("bold"), Some(true));
        assert_eq!(first_font_family("'Open Sans', Arial").as_deref(), Some("Open Sans"));
        assert_eq!(first_font_family("monospace").as_deref(), Some("Courier New"));
    }

    #[test]
    fn alignment_values() {
        assert_eq!(TextAlign::parse("CENTER"), Some(TextAlign::Center));
        assert_eq!(TextAlign::parse("justify").unwrap().ooxml_value(), "both");
        assert_eq!(TextAlign::parse("inherit"), None);
    }
}
