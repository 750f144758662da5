//! Content stream tokenizer.
//!
//! Turns raw content stream bytes into a flat list of [`Operator`]s, each
//! holding the operands that preceded it. Comments are dropped and inline
//! images (`BI ... ID ... EI`) are skipped entirely since they carry no text.

use crate::error::BackendError;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Integer or real number.
    Number(f64),
    /// Name without the leading `/`, `#xx` escapes decoded.
    Name(String),
    /// Literal or hex string, escapes decoded.
    String(Vec<u8>),
    Array(Vec<Operand>),
    Dict(Vec<(String, Operand)>),
    Bool(bool),
    Null,
}

impl Operand {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::String(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// An operator with its operands in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

impl Operator {
    /// Numeric operand at `index`.
    pub fn number(&self, index: usize) -> Option<f64> {
        self.operands.get(index).and_then(Operand::as_f64)
    }

    /// The first six operands as a matrix, if they are all numbers.
    pub fn matrix(&self) -> Option<[f64; 6]> {
        let mut m = [0.0; 6];
        for (i, slot) in m.iter_mut().enumerate() {
            *slot = self.number(i)?;
        }
        Some(m)
    }
}

/// Tokenize a content stream.
///
/// # Errors
///
/// Returns [`BackendError::Interpreter`] for unterminated strings, arrays or
/// dictionaries and for malformed numbers.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, BackendError> {
    let mut lexer = Lexer::new(input);
    let mut ops = Vec::new();
    let mut operands = Vec::new();

    while let Some(token) = lexer.next_token()? {
        match token {
            Token::Value(operand) => operands.push(operand),
            Token::Keyword(word) if word == "BI" => {
                lexer.skip_inline_image();
                operands.clear();
            }
            Token::Keyword(word) => ops.push(Operator {
                name: word,
                operands: std::mem::take(&mut operands),
            }),
            Token::ArrayEnd | Token::DictEnd => {
                return Err(BackendError::Interpreter(format!(
                    "unbalanced delimiter at byte {}",
                    lexer.pos
                )));
            }
        }
    }
    Ok(ops)
}

enum Token {
    Value(Operand),
    Keyword(String),
    ArrayEnd,
    DictEnd,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(c) = self.peek() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, BackendError> {
        self.skip_whitespace();
        let Some(b) = self.peek() else {
            return Ok(None);
        };
        let token = match b {
            b'(' => Token::Value(Operand::String(self.literal_string()?)),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Token::Value(self.dict()?)
            }
            b'<' => Token::Value(Operand::String(self.hex_string()?)),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Token::DictEnd
            }
            b'[' => {
                self.pos += 1;
                Token::Value(self.array()?)
            }
            b']' => {
                self.pos += 1;
                Token::ArrayEnd
            }
            b'/' => {
                self.pos += 1;
                Token::Value(Operand::Name(self.name()))
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' => Token::Value(self.number()?),
            _ if is_regular(b) => {
                let word = self.regular_run();
                match word.as_str() {
                    "true" => Token::Value(Operand::Bool(true)),
                    "false" => Token::Value(Operand::Bool(false)),
                    "null" => Token::Value(Operand::Null),
                    _ => Token::Keyword(word),
                }
            }
            _ => {
                // Stray `)`, `>`, `{` or `}`.
                self.pos += 1;
                return self.next_token();
            }
        };
        Ok(Some(token))
    }

    fn regular_run(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        let mut out = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' && i + 2 < raw.len() {
                if let (Some(hi), Some(lo)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                    out.push(hi << 4 | lo);
                    i += 3;
                    continue;
                }
            }
            out.push(raw[i]);
            i += 1;
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    fn number(&mut self) -> Result<Operand, BackendError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or_default();
        // Producers occasionally write `--5` or `4.-2`; keep the leading sign
        // and the longest numeric prefix.
        let negative = text.starts_with('-');
        let body = text.trim_start_matches(['+', '-']);
        let prefix_len = body
            .char_indices()
            .find(|&(i, c)| c == '+' || c == '-' || (c == '.' && body[..i].contains('.')))
            .map_or(body.len(), |(i, _)| i);
        let body = &body[..prefix_len];
        if body.is_empty() || body == "." {
            return Err(BackendError::Interpreter(format!(
                "invalid number '{text}' at byte {start}"
            )));
        }
        let value: f64 = body.parse().map_err(|_| {
            BackendError::Interpreter(format!("invalid number '{text}' at byte {start}"))
        })?;
        Ok(Operand::Number(if negative { -value } else { value }))
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, BackendError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => self.escape(&mut out),
                _ => out.push(b),
            }
        }
        Err(BackendError::Interpreter(format!(
            "unterminated string starting at byte {start}"
        )))
    }

    fn escape(&mut self, out: &mut Vec<u8>) {
        let Some(b) = self.peek() else {
            return;
        };
        self.pos += 1;
        match b {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            // Line continuation.
            b'\r' => {
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            other => out.push(other),
        }
    }

    fn hex_string(&mut self) -> Result<Vec<u8>, BackendError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        let mut high: Option<u8> = None;
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'>' {
                if let Some(h) = high {
                    out.push(h << 4);
                }
                return Ok(out);
            }
            let Some(v) = hex_value(b) else {
                continue;
            };
            match high.take() {
                Some(h) => out.push(h << 4 | v),
                None => high = Some(v),
            }
        }
        Err(BackendError::Interpreter(format!(
            "unterminated hex string starting at byte {start}"
        )))
    }

    fn array(&mut self) -> Result<Operand, BackendError> {
        let mut items = Vec::new();
        loop {
            match self.next_token()? {
                Some(Token::ArrayEnd) => return Ok(Operand::Array(items)),
                Some(Token::Value(v)) => items.push(v),
                // Operators are not allowed inside arrays; ignore them.
                Some(Token::Keyword(_)) | Some(Token::DictEnd) => {}
                None => {
                    return Err(BackendError::Interpreter(
                        "unterminated array".to_string(),
                    ));
                }
            }
        }
    }

    fn dict(&mut self) -> Result<Operand, BackendError> {
        let mut entries = Vec::new();
        let mut key: Option<String> = None;
        loop {
            match self.next_token()? {
                Some(Token::DictEnd) => return Ok(Operand::Dict(entries)),
                Some(Token::Value(v)) => match key.take() {
                    Some(k) => entries.push((k, v)),
                    None => match v {
                        Operand::Name(name) => key = Some(name),
                        _ => {
                            return Err(BackendError::Interpreter(
                                "dictionary key is not a name".to_string(),
                            ));
                        }
                    },
                },
                Some(Token::Keyword(_)) | Some(Token::ArrayEnd) => {}
                None => {
                    return Err(BackendError::Interpreter(
                        "unterminated dictionary".to_string(),
                    ));
                }
            }
        }
    }

    /// Skip past the `EI` closing an inline image whose `BI` was just read.
    fn skip_inline_image(&mut self) {
        // `ID` sits at pos - 1 and pos, with whitespace on both sides.
        while self.pos + 1 < self.input.len() {
            if self.pos >= 2
                && self.input[self.pos - 1] == b'I'
                && self.input[self.pos] == b'D'
                && is_whitespace(self.input[self.pos - 2])
                && is_whitespace(self.input[self.pos + 1])
            {
                self.pos += 2;
                break;
            }
            self.pos += 1;
        }
        while self.pos + 1 < self.input.len() {
            let ends_here = self.input[self.pos] == b'E'
                && self.input[self.pos + 1] == b'I'
                && self.pos > 0
                && is_whitespace(self.input[self.pos - 1])
                && self
                    .input
                    .get(self.pos + 2)
                    .is_none_or(|&b| is_whitespace(b) || is_delimiter(b));
            if ends_here {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.input.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ops: &[Operator]) -> Vec<&str> {
        ops.iter().map(|op| op.name.as_str()).collect()
    }

    // --- basic operators ---

    #[test]
    fn text_object() {
        let ops = tokenize(b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET").unwrap();
        assert_eq!(names(&ops), ["BT", "Tf", "Td", "Tj", "ET"]);
        assert_eq!(
            ops[1].operands,
            vec![Operand::Name("F1".into()), Operand::Number(12.0)]
        );
        assert_eq!(ops[3].operands, vec![Operand::String(b"Hello".to_vec())]);
    }

    #[test]
    fn matrix_operands() {
        let ops = tokenize(b"0.5 0 0 .5 -10 +20 cm").unwrap();
        assert_eq!(ops[0].matrix(), Some([0.5, 0.0, 0.0, 0.5, -10.0, 20.0]));
    }

    #[test]
    fn quote_operators() {
        let ops = tokenize(b"(a) ' 1 2 (b) \" T*").unwrap();
        assert_eq!(names(&ops), ["'", "\"", "T*"]);
        assert_eq!(ops[1].operands.len(), 3);
    }

    #[test]
    fn comments_are_dropped() {
        let ops = tokenize(b"% header\nq % save\nQ").unwrap();
        assert_eq!(names(&ops), ["q", "Q"]);
    }

    // --- strings ---

    #[test]
    fn literal_string_escapes() {
        let ops = tokenize(b"(a\\(b\\)c\\n\\101\\\\) Tj").unwrap();
        assert_eq!(ops[0].operands[0].as_bytes(), Some(&b"a(b)c\nA\\"[..]));
    }

    #[test]
    fn literal_string_balanced_parens() {
        let ops = tokenize(b"(f(x)) Tj").unwrap();
        assert_eq!(ops[0].operands[0].as_bytes(), Some(&b"f(x)"[..]));
    }

    #[test]
    fn literal_string_line_continuation() {
        let ops = tokenize(b"(ab\\\ncd) Tj").unwrap();
        assert_eq!(ops[0].operands[0].as_bytes(), Some(&b"abcd"[..]));
    }

    #[test]
    fn hex_string_with_odd_digits() {
        let ops = tokenize(b"<48 65 6C6C 6F> Tj <ABC> Tj").unwrap();
        assert_eq!(ops[0].operands[0].as_bytes(), Some(&b"Hello"[..]));
        assert_eq!(ops[1].operands[0].as_bytes(), Some(&[0xAB, 0xC0][..]));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize(b"(never closed Tj").is_err());
        assert!(tokenize(b"<4142 Tj").is_err());
    }

    // --- composite operands ---

    #[test]
    fn tj_array() {
        let ops = tokenize(b"[(H) -20 (i)] TJ").unwrap();
        assert_eq!(
            ops[0].operands[0],
            Operand::Array(vec![
                Operand::String(b"H".to_vec()),
                Operand::Number(-20.0),
                Operand::String(b"i".to_vec()),
            ])
        );
    }

    #[test]
    fn dictionary_operand() {
        let ops = tokenize(b"/Span << /ActualText (x) /MCID 3 >> BDC EMC").unwrap();
        assert_eq!(names(&ops), ["BDC", "EMC"]);
        assert_eq!(
            ops[0].operands[1],
            Operand::Dict(vec![
                ("ActualText".into(), Operand::String(b"x".to_vec())),
                ("MCID".into(), Operand::Number(3.0)),
            ])
        );
    }

    #[test]
    fn name_hex_escapes() {
        let ops = tokenize(b"/A#20B 1 Tf").unwrap();
        assert_eq!(ops[0].operands[0].as_name(), Some("A B"));
    }

    #[test]
    fn unbalanced_array_end_is_an_error() {
        assert!(tokenize(b"1 2 ] cm").is_err());
        assert!(tokenize(b"[1 2").is_err());
    }

    // --- numbers ---

    #[test]
    fn sloppy_numbers_keep_numeric_prefix() {
        let ops = tokenize(b"--5 4.-2 Td").unwrap();
        assert_eq!(ops[0].number(0), Some(-5.0));
        assert_eq!(ops[0].number(1), Some(4.0));
    }

    #[test]
    fn lone_sign_is_an_error() {
        assert!(tokenize(b"- Td").is_err());
    }

    // --- inline images ---

    #[test]
    fn inline_image_is_skipped() {
        let ops = tokenize(b"q BI /W 2 /H 1 /BPC 8 /CS /G ID \x00EI\xff EI Q BT ET").unwrap();
        assert_eq!(names(&ops), ["q", "Q", "BT", "ET"]);
    }

    #[test]
    fn text_after_inline_image_survives() {
        let ops = tokenize(b"BT (AB) Tj ET q BI /W 1 /H 1 /BPC 8 ID \x7f EI Q BT (CD) Tj ET")
            .unwrap();
        assert_eq!(names(&ops), ["BT", "Tj", "ET", "q", "Q", "BT", "Tj", "ET"]);
        assert_eq!(ops[6].operands, vec![Operand::String(b"CD".to_vec())]);
    }

    #[test]
    fn booleans_and_null() {
        let ops = tokenize(b"true false null op").unwrap();
        assert_eq!(
            ops[0].operands,
            vec![Operand::Bool(true), Operand::Bool(false), Operand::Null]
        );
    }
}
