//! Graphics state stack: the CTM plus the text parameters saved by `q`.

use pdfcoords_core::Ctm;

use crate::text_state::TextParams;

#[derive(Debug, Clone, PartialEq)]
struct Saved {
    ctm: Ctm,
    text: TextParams,
}

/// Current transformation matrix with its `q`/`Q` save stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphicsState {
    ctm: Ctm,
    stack: Vec<Saved>,
}

impl GraphicsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an initial CTM, as a Form XObject does with its `/Matrix`.
    pub fn with_ctm(ctm: Ctm) -> Self {
        Self {
            ctm,
            stack: Vec::new(),
        }
    }

    pub fn ctm(&self) -> &Ctm {
        &self.ctm
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// `q`
    pub fn save(&mut self, text: &TextParams) {
        self.stack.push(Saved {
            ctm: self.ctm,
            text: text.clone(),
        });
    }

    /// `Q`. Returns the saved text parameters, or `None` for an unbalanced `Q`,
    /// which leaves the state untouched.
    pub fn restore(&mut self) -> Option<TextParams> {
        let saved = self.stack.pop()?;
        self.ctm = saved.ctm;
        Some(saved.text)
    }

    /// `cm`: the new matrix applies before the current CTM.
    pub fn concat(&mut self, m: &Ctm) {
        self.ctm = m.concat(&self.ctm);
    }
}
