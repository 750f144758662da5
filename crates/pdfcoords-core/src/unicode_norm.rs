//! Optional Unicode normalization of decoded glyph text.

use unicode_normalization::UnicodeNormalization;

/// Normalization form applied to the text of each glyph.
///
/// Runs before assembly, so when a form changes the char count (NFKC turns
/// the `ﬁ` ligature into `fi`) every resulting char carries the glyph's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UnicodeNorm {
    #[default]
    None,
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl UnicodeNorm {
    pub fn apply(self, text: String) -> String {
        match self {
            UnicodeNorm::None => text,
            UnicodeNorm::Nfc => text.nfc().collect(),
            UnicodeNorm::Nfd => text.nfd().collect(),
            UnicodeNorm::Nfkc => text.nfkc().collect(),
            UnicodeNorm::Nfkd => text.nfkd().collect(),
        }
    }
}
