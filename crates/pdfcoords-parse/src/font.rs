//! Font loading: widths, vertical metrics and code-to-Unicode decoding.
//!
//! Simple fonts use one byte per code with `/FirstChar` + `/Widths`; Type0
//! fonts use two-byte codes with the descendant font's `/DW` and `/W`.
//! Unicode comes from `/ToUnicode` first, then from the simple encoding
//! (`/Differences` glyph names over WinAnsi, MacRoman or Standard).

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use crate::cmap::CMap;
use crate::objects::{get, get_array, get_dict, get_name, get_number, number, rect, resolve, stream_bytes};

const DEFAULT_ASCENT: f64 = 750.0;
const DEFAULT_DESCENT: f64 = -250.0;
const DEFAULT_WIDTH: f64 = 600.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Vertical metrics of a font in glyph space (thousandths of text space).
#[derive(Debug, Clone, PartialEq)]
pub struct FontInfo {
    /// Base font name with any subset prefix removed.
    pub name: String,
    pub ascent: f64,
    pub descent: f64,
    /// 0 when the descriptor has no `/CapHeight`.
    pub cap_height: f64,
    pub bbox: Option<[f64; 4]>,
}

impl FontInfo {
    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            cap_height: 0.0,
            bbox: None,
        }
    }

    /// `(top, bottom)` of the line box: one em tall, anchored at the descent.
    ///
    /// A descriptor with both ascent and descent at 0 means "unknown" and
    /// gives a box from the baseline up.
    pub fn line_extent(&self) -> (f64, f64) {
        if self.ascent == 0.0 && self.descent == 0.0 {
            (1000.0, 0.0)
        } else {
            (1000.0 + self.descent, self.descent)
        }
    }
}

/// One character code read from a shown string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCode {
    pub code: u32,
    /// Byte length of the code, 1 or 2.
    pub len: usize,
}

impl CharCode {
    /// Word spacing applies only to the single-byte code 32.
    pub fn is_word_space(&self) -> bool {
        self.len == 1 && self.code == 32
    }
}

#[derive(Debug, Clone)]
enum Widths {
    Simple { first_char: u32, widths: Vec<f64> },
    Cid { default: f64, widths: HashMap<u32, f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseEncoding {
    WinAnsi,
    MacRoman,
    Standard,
}

#[derive(Debug, Clone)]
struct SimpleEncoding {
    base: BaseEncoding,
    differences: HashMap<u32, String>,
}

impl SimpleEncoding {
    fn decode(&self, code: u32) -> Option<String> {
        if let Some(name) = self.differences.get(&code) {
            return glyph_name_to_unicode(name);
        }
        let bytes = [u8::try_from(code).ok()?];
        let text = match self.base {
            BaseEncoding::MacRoman => encoding_rs::MACINTOSH.decode_without_bom_handling(&bytes).0,
            // Standard agrees with WinAnsi on the letters and digits that matter here.
            BaseEncoding::WinAnsi | BaseEncoding::Standard => {
                encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes).0
            }
        };
        Some(text.into_owned())
    }
}

/// A loaded font.
#[derive(Debug, Clone)]
pub struct Font {
    info: FontInfo,
    widths: Widths,
    missing_width: f64,
    to_unicode: Option<CMap>,
    encoding: Option<SimpleEncoding>,
}

impl Font {
    /// Load a font dictionary. Missing entries fall back to defaults.
    pub fn load(doc: &Document, dict: &Dictionary, resource_name: &str) -> Self {
        let name = get_name(doc, dict, b"BaseFont")
            .map(|n| strip_subset_prefix(&n).to_string())
            .unwrap_or_else(|| resource_name.to_string());
        let to_unicode = get(doc, dict, b"ToUnicode")
            .and_then(|obj| obj.as_stream().ok())
            .and_then(|stream| stream_bytes(stream).ok())
            .and_then(|bytes| CMap::parse(&bytes).ok());

        let is_type0 = get_name(doc, dict, b"Subtype").as_deref() == Some("Type0");
        if is_type0 {
            let descendant = get_array(doc, dict, b"DescendantFonts")
                .and_then(|fonts| fonts.first())
                .and_then(|obj| resolve(doc, obj).as_dict().ok());
            let (info, widths) = match descendant {
                Some(cid_font) => (
                    descriptor_info(doc, cid_font, name),
                    Widths::Cid {
                        default: get_number(doc, cid_font, b"DW").unwrap_or(DEFAULT_CID_WIDTH),
                        widths: cid_widths(doc, cid_font),
                    },
                ),
                None => (
                    FontInfo::fallback(name),
                    Widths::Cid {
                        default: DEFAULT_CID_WIDTH,
                        widths: HashMap::new(),
                    },
                ),
            };
            return Self {
                info,
                widths,
                missing_width: DEFAULT_CID_WIDTH,
                to_unicode,
                encoding: None,
            };
        }

        let first_char = get_number(doc, dict, b"FirstChar").map_or(0, |v| v as u32);
        let widths = get_array(doc, dict, b"Widths")
            .map(|items| {
                items
                    .iter()
                    .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let missing_width = get_dict(doc, dict, b"FontDescriptor")
            .and_then(|d| get_number(doc, d, b"MissingWidth"))
            .unwrap_or(DEFAULT_WIDTH);
        Self {
            info: descriptor_info(doc, dict, name),
            widths: Widths::Simple { first_char, widths },
            missing_width,
            to_unicode,
            encoding: Some(simple_encoding(doc, dict)),
        }
    }

    /// Defaults for a font that is missing from the resources.
    pub fn fallback(resource_name: &str) -> Self {
        Self {
            info: FontInfo::fallback(resource_name),
            widths: Widths::Simple {
                first_char: 0,
                widths: Vec::new(),
            },
            missing_width: DEFAULT_WIDTH,
            to_unicode: None,
            encoding: Some(SimpleEncoding {
                base: BaseEncoding::Standard,
                differences: HashMap::new(),
            }),
        }
    }

    pub fn info(&self) -> &FontInfo {
        &self.info
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.widths, Widths::Cid { .. })
    }

    /// Split a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<CharCode> {
        if self.is_composite() {
            bytes
                .chunks(2)
                .map(|c| CharCode {
                    code: c.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)),
                    len: c.len(),
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|&b| CharCode {
                    code: u32::from(b),
                    len: 1,
                })
                .collect()
        }
    }

    /// Advance of a code in glyph space units divided by 1000.
    pub fn width(&self, code: u32) -> f64 {
        let raw = match &self.widths {
            Widths::Simple { first_char, widths } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize).copied())
                .unwrap_or(self.missing_width),
            Widths::Cid { default, widths } => widths.get(&code).copied().unwrap_or(*default),
        };
        raw / 1000.0
    }

    /// Unicode text of a code, or `None` if the font gives no mapping.
    pub fn unicode(&self, code: u32) -> Option<String> {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.lookup(code)) {
            return Some(text.to_string());
        }
        self.encoding.as_ref()?.decode(code)
    }
}

fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest)) if prefix.len() == 6 && prefix.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

fn descriptor_info(doc: &Document, font: &Dictionary, name: String) -> FontInfo {
    let Some(desc) = get_dict(doc, font, b"FontDescriptor") else {
        return FontInfo::fallback(name);
    };
    FontInfo {
        name,
        ascent: get_number(doc, desc, b"Ascent").unwrap_or(DEFAULT_ASCENT),
        descent: get_number(doc, desc, b"Descent").unwrap_or(DEFAULT_DESCENT),
        cap_height: get_number(doc, desc, b"CapHeight").unwrap_or(0.0),
        bbox: get_array(doc, desc, b"FontBBox").and_then(|a| rect(doc, a)),
    }
}

/// `/W` entries: `c [w1 w2 ...]` and `c_first c_last w`.
fn cid_widths(doc: &Document, cid_font: &Dictionary) -> HashMap<u32, f64> {
    let mut out = HashMap::new();
    let Some(items) = get_array(doc, cid_font, b"W") else {
        return out;
    };
    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve(doc, &items[i])) else {
            i += 1;
            continue;
        };
        let first = first as u32;
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(ws)) => {
                for (offset, w) in ws.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        out.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).map_or(first, |v| v as u32);
                let width = items.get(i + 2).and_then(|o| number(resolve(doc, o)));
                if let Some(w) = width {
                    for code in first..=last.min(first.saturating_add(0xFFFF)) {
                        out.insert(code, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    out
}

fn base_encoding(name: &str) -> BaseEncoding {
    match name {
        "WinAnsiEncoding" => BaseEncoding::WinAnsi,
        "MacRomanEncoding" => BaseEncoding::MacRoman,
        _ => BaseEncoding::Standard,
    }
}

fn simple_encoding(doc: &Document, font: &Dictionary) -> SimpleEncoding {
    let mut encoding = SimpleEncoding {
        base: BaseEncoding::Standard,
        differences: HashMap::new(),
    };
    match get(doc, font, b"Encoding") {
        Some(Object::Name(name)) => encoding.base = base_encoding(&String::from_utf8_lossy(name)),
        Some(Object::Dictionary(dict)) => {
            if let Some(base) = get_name(doc, dict, b"BaseEncoding") {
                encoding.base = base_encoding(&base);
            }
            if let Some(diffs) = get_array(doc, dict, b"Differences") {
                let mut code = 0u32;
                for item in diffs {
                    match resolve(doc, item) {
                        Object::Integer(start) => code = u32::try_from(*start).unwrap_or(0),
                        Object::Name(glyph) => {
                            encoding
                                .differences
                                .insert(code, String::from_utf8_lossy(glyph).into_owned());
                            code += 1;
                        }
                        _ => {}
                    }
                }
            }
        }
        _ => {}
    }
    encoding
}

/// Unicode for a glyph name: `uniXXXX`, `uXXXX[XX]`, single letters and a
/// table of the common Latin names.
fn glyph_name_to_unicode(name: &str) -> Option<String> {
    let base = name.split('.').next().unwrap_or(name);
    if let Some(hex) = base.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = (0..hex.len())
                .step_by(4)
                .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
                .collect();
            return units.map(|u| String::from_utf16_lossy(&u));
        }
    }
    if let Some(hex) = base.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(ch) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(ch.to_string());
            }
        }
    }
    let mut chars = base.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c.to_string());
        }
    }
    GLYPH_NAMES
        .iter()
        .find(|(glyph, _)| *glyph == base)
        .map(|(_, text)| (*text).to_string())
}

const GLYPH_NAMES: &[(&str, &str)] = &[
    ("space", " "),
    ("exclam", "!"),
    ("quotedbl", "\""),
    ("numbersign", "#"),
    ("dollar", "$"),
    ("percent", "%"),
    ("ampersand", "&"),
    ("quotesingle", "'"),
    ("quoteright", "\u{2019}"),
    ("quoteleft", "\u{2018}"),
    ("quotedblleft", "\u{201C}"),
    ("quotedblright", "\u{201D}"),
    ("parenleft", "("),
    ("parenright", ")"),
    ("asterisk", "*"),
    ("plus", "+"),
    ("comma", ","),
    ("hyphen", "-"),
    ("minus", "\u{2212}"),
    ("period", "."),
    ("slash", "/"),
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("colon", ":"),
    ("semicolon", ";"),
    ("less", "<"),
    ("equal", "="),
    ("greater", ">"),
    ("question", "?"),
    ("at", "@"),
    ("bracketleft", "["),
    ("backslash", "\\"),
    ("bracketright", "]"),
    ("underscore", "_"),
    ("braceleft", "{"),
    ("bar", "|"),
    ("braceright", "}"),
    ("endash", "\u{2013}"),
    ("emdash", "\u{2014}"),
    ("bullet", "\u{2022}"),
    ("ellipsis", "\u{2026}"),
    ("fi", "fi"),
    ("fl", "fl"),
    ("ff", "ff"),
    ("ffi", "ffi"),
    ("ffl", "ffl"),
    ("eacute", "\u{e9}"),
    ("egrave", "\u{e8}"),
    ("agrave", "\u{e0}"),
    ("aacute", "\u{e1}"),
    ("ccedilla", "\u{e7}"),
    ("odieresis", "\u{f6}"),
    ("udieresis", "\u{fc}"),
    ("adieresis", "\u{e4}"),
    ("germandbls", "\u{df}"),
    ("Eacute", "\u{c9}"),
    ("degree", "\u{b0}"),
    ("copyright", "\u{a9}"),
    ("registered", "\u{ae}"),
    ("section", "\u{a7}"),
    ("paragraph", "\u{b6}"),
    ("Euro", "\u{20ac}"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // --- simple fonts ---

    #[test]
    fn simple_widths_and_missing_width() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "ABCDEF+Arial",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(667), Object::Integer(667), Object::Real(722.0)],
            "FontDescriptor" => dictionary! {
                "Ascent" => 905,
                "Descent" => -212,
                "CapHeight" => 716,
                "MissingWidth" => 250,
                "FontBBox" => vec![(-665).into(), (-325).into(), 2000.into(), 1006.into()],
            },
        };
        let font = Font::load(&doc, &dict, "F1");
        assert_eq!(font.info().name, "Arial");
        assert_approx(font.width(65), 0.667);
        assert_approx(font.width(67), 0.722);
        assert_approx(font.width(68), 0.25);
        assert_approx(font.width(10), 0.25);
        assert_eq!(font.info().cap_height, 716.0);
        assert_eq!(font.info().bbox, Some([-665.0, -325.0, 2000.0, 1006.0]));
        assert!(!font.is_composite());
    }

    #[test]
    fn line_extent_rules() {
        let mut info = FontInfo::fallback("F");
        assert_eq!(info.line_extent(), (750.0, -250.0));
        info.ascent = 905.0;
        info.descent = -212.0;
        assert_eq!(info.line_extent(), (788.0, -212.0));
        info.ascent = 0.0;
        info.descent = 0.0;
        assert_eq!(info.line_extent(), (1000.0, 0.0));
    }

    #[test]
    fn missing_descriptor_uses_defaults() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica" };
        let font = Font::load(&doc, &dict, "F1");
        assert_approx(font.width(72), 0.6);
        assert_eq!(font.info().ascent, 750.0);
        assert_eq!(font.info().descent, -250.0);
        assert_eq!(font.unicode(72).as_deref(), Some("H"));
    }

    #[test]
    fn win_ansi_and_differences() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => dictionary! {
                "BaseEncoding" => "WinAnsiEncoding",
                "Differences" => vec![
                    Object::Integer(65),
                    Object::Name(b"eacute".to_vec()),
                    Object::Name(b"uni03A9".to_vec()),
                    Object::Integer(200),
                    Object::Name(b"fi".to_vec()),
                    Object::Name(b"g123".to_vec()),
                ],
            },
        };
        let font = Font::load(&doc, &dict, "F1");
        assert_eq!(font.unicode(65).as_deref(), Some("\u{e9}"));
        assert_eq!(font.unicode(66).as_deref(), Some("\u{3a9}"));
        assert_eq!(font.unicode(200).as_deref(), Some("fi"));
        assert_eq!(font.unicode(201), None);
        assert_eq!(font.unicode(0x80).as_deref(), Some("\u{20ac}"));
        assert_eq!(font.unicode(0x61).as_deref(), Some("a"));
    }

    #[test]
    fn mac_roman_encoding() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Subtype" => "Type1", "Encoding" => "MacRomanEncoding" };
        let font = Font::load(&doc, &dict, "F2");
        assert_eq!(font.info().name, "F2");
        assert_eq!(font.unicode(0x8E).as_deref(), Some("\u{e9}"));
    }

    #[test]
    fn to_unicode_wins_over_encoding() {
        let mut doc = Document::with_version("1.5");
        let cmap = b"1 beginbfchar <41> <0058> endbfchar".to_vec();
        let cmap_id = doc.add_object(Stream::new(Dictionary::new(), cmap));
        let dict = dictionary! { "Subtype" => "Type1", "ToUnicode" => cmap_id };
        let font = Font::load(&doc, &dict, "F1");
        assert_eq!(font.unicode(0x41).as_deref(), Some("X"));
        assert_eq!(font.unicode(0x42).as_deref(), Some("B"));
    }

    // --- composite fonts ---

    fn type0_dict(doc: &mut Document) -> Dictionary {
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "MSGothic",
            "DW" => 1000,
            "W" => vec![
                Object::Integer(1),
                Object::Array(vec![500.into(), 600.into()]),
                Object::Integer(10),
                Object::Integer(12),
                Object::Integer(250),
            ],
            "FontDescriptor" => dictionary! { "Ascent" => 880, "Descent" => -120 },
        });
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "MSGothic",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
        }
    }

    #[test]
    fn type0_uses_two_byte_codes_and_w_array() {
        let mut doc = Document::with_version("1.5");
        let dict = type0_dict(&mut doc);
        let font = Font::load(&doc, &dict, "F3");
        assert!(font.is_composite());
        let codes = font.codes(&[0x00, 0x01, 0x00, 0x0B, 0x30]);
        assert_eq!(
            codes,
            vec![
                CharCode { code: 1, len: 2 },
                CharCode { code: 11, len: 2 },
                CharCode { code: 0x30, len: 1 },
            ]
        );
        assert_approx(font.width(1), 0.5);
        assert_approx(font.width(2), 0.6);
        assert_approx(font.width(11), 0.25);
        assert_approx(font.width(3), 1.0);
        assert_eq!(font.info().ascent, 880.0);
        // No ToUnicode and no simple encoding.
        assert_eq!(font.unicode(1), None);
    }

    #[test]
    fn word_space_only_for_single_byte_32() {
        assert!(CharCode { code: 32, len: 1 }.is_word_space());
        assert!(!CharCode { code: 32, len: 2 }.is_word_space());
    }

    #[test]
    fn subset_prefix_rules() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial"), "Arial");
        assert_eq!(strip_subset_prefix("Abcdef+Arial"), "Abcdef+Arial");
        assert_eq!(strip_subset_prefix("Arial"), "Arial");
    }

    #[test]
    fn glyph_names() {
        assert_eq!(glyph_name_to_unicode("a.sc").as_deref(), Some("a"));
        assert_eq!(glyph_name_to_unicode("u1F600").as_deref(), Some("\u{1F600}"));
        assert_eq!(glyph_name_to_unicode("uni00660069").as_deref(), Some("fi"));
        assert_eq!(glyph_name_to_unicode("seven").as_deref(), Some("7"));
        assert_eq!(glyph_name_to_unicode("cid42"), None);
    }
}
