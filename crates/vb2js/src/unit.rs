//! The buffer of physical lines being translated, plus the cursor and
//! nesting bookkeeping that the statement translators share.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::line::Line;
use crate::token::EOF;

#[derive(Debug)]
pub(crate) struct TranslationUnit {
    /// All input lines, trimmed. Mutated by the pre-parse rewrites.
    lines: Vec<String>,
    /// Index of the current line. Advance happens first, so this starts at -1.
    current: i32,
    /// The single reusable Line object, re-parsed on every advance.
    line: Line,
    /// Output indentation depth; must be back to 0 at end of input.
    depth: i32,
    /// Name of the function currently being translated; empty for subs and
    /// top level.
    function_name: String,
    /// Sub/Function nesting. Local array names are dropped when it returns
    /// to 0.
    sub_nesting: i32,
    /// User-defined `Type` names. Variables of these types get a real
    /// constructor call instead of a type comment.
    type_names: HashSet<String>,
}

impl TranslationUnit {
    pub(crate) fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: -1,
            line: Line::new(),
            depth: 0,
            function_name: String::new(),
            sub_nesting: 0,
            type_names: HashSet::new(),
        }
    }

    /// Loads the input and applies the pre-parse rewrites: trims every line,
    /// splices `_`-continuations into single lines, expands one-line `If`
    /// statements into block form, and appends the `(EOF)` sentinel.
    pub(crate) fn cleanup<I>(&mut self, input: I)
    where
        I: IntoIterator<Item = String>,
    {
        for line in input {
            self.lines.push(line.trim().to_string());
        }

        let mut i = self.lines.len();
        while i > 0 {
            i -= 1;
            if self.lines[i].ends_with('_') && i + 1 < self.lines.len() {
                let next = self.lines.remove(i + 1);
                let mut merged = self.lines[i][..self.lines[i].len() - 1].to_string();
                merged.push_str(&next);
                self.lines[i] = merged;
            }
        }

        let mut i = self.lines.len();
        while i > 0 {
            i -= 1;
            if is_one_line_if(&self.lines[i]) {
                self.rewrite_one_line_if(i);
            }
        }

        self.lines.push(EOF.to_string());
    }

    /// Advances to the next line and re-parses it into the Line object.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        if (self.current as usize) < self.lines.len() {
            let text = self.lines[self.current as usize].clone();
            self.line.parse_line(&text);
        }
    }

    pub(crate) fn line(&self) -> &Line {
        &self.line
    }

    pub(crate) fn line_mut(&mut self) -> &mut Line {
        &mut self.line
    }

    pub(crate) fn depth(&self) -> i32 {
        self.depth
    }

    pub(crate) fn indent(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn undent(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn function_name(&self) -> &str {
        &self.function_name
    }

    pub(crate) fn set_function_name(&mut self, name: &str) {
        self.function_name = name.to_string();
    }

    pub(crate) fn enter_sub(&mut self) {
        self.sub_nesting += 1;
    }

    /// Returns true when the outermost Sub/Function just ended, i.e. local
    /// names should be dropped.
    pub(crate) fn leave_sub(&mut self) -> bool {
        self.sub_nesting -= 1;
        self.sub_nesting == 0
    }

    pub(crate) fn sub_nesting(&self) -> i32 {
        self.sub_nesting
    }

    pub(crate) fn is_type_name(&self, name: &str) -> bool {
        self.type_names.contains(name)
    }

    pub(crate) fn add_type_name(&mut self, name: &str) {
        self.type_names.insert(name.to_string());
    }

    /// 1-based number of the current line in the rewritten buffer.
    pub(crate) fn error_line_number(&self) -> i32 {
        self.current + 1
    }

    pub(crate) fn current_line_text(&self) -> Option<&str> {
        usize::try_from(self.current)
            .ok()
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// Converts `If cond Then body [Else body]` on one line into the block
    /// form the If translator expects. Operates on the raw line so any
    /// trailing comment travels with the branch body.
    fn rewrite_one_line_if(&mut self, index: usize) {
        static THEN_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Then .*").unwrap());
        static UP_TO_THEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i).*Then ").unwrap());
        static ELSE_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Else .*").unwrap());
        static HAS_ELSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Else .+").unwrap());
        static UP_TO_ELSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i).*Else ").unwrap());

        let original = self.lines[index].clone();

        self.lines[index] = THEN_TAIL.replace(&original, "Then").into_owned();
        let then_part = UP_TO_THEN.replace(&original, "").into_owned();
        let then_part = ELSE_TAIL.replace(&then_part, "").trim().to_string();
        let mut at = index + 1;
        self.lines.insert(at, then_part);
        if HAS_ELSE.is_match(&original) {
            let else_part = UP_TO_ELSE.replace(&original, "").trim().to_string();
            at += 1;
            self.lines.insert(at, "Else".to_string());
            at += 1;
            self.lines.insert(at, else_part);
        }
        self.lines.insert(at + 1, "End If".to_string());
    }
}

/// One-line `If` detection, applied to the canonicalized residue so `Then`
/// inside a trailing comment does not false-match.
fn is_one_line_if(line: &str) -> bool {
    static ONE_LINE_IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Then .+").unwrap());
    ONE_LINE_IF.is_match(&Line::new().parse_line(line).residue())
}
