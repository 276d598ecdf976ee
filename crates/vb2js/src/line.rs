//! One physical line of VBA: preprocessing, tokenizing, and the
//! string-building expression grammar.
//!
//! A `Line` is reused across the whole conversion; `parse_line` resets it for
//! the next physical line. Preprocessing extracts the comment, canonicalizes
//! quoted strings and `[bracketed]` names, and rewrites visibility modifiers,
//! after which token production works on an immutable buffer behind a cursor.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::scope::ScopeState;
use crate::token::{self, TokenKind, EOF};

/// Spliced in for missing arguments, e.g. `f(, x)` becomes `f(undefined, x)`.
const EMPTY_ARG: &str = "undefined";

/// Peeks tolerated on one line before the input is declared ill-formed.
const MAX_PEEK_LIMIT: u32 = 1000;

#[derive(Debug)]
pub(crate) struct Line {
    original: String,
    /// Preprocessed line text; tokens are scanned at `pos`.
    converted: String,
    pos: usize,
    comment: String,
    /// Most recently produced token and its category.
    token: String,
    kind: TokenKind,
    peek_count: u32,
}

impl Line {
    pub(crate) fn new() -> Self {
        Self {
            original: String::new(),
            converted: String::new(),
            pos: 0,
            comment: String::new(),
            token: String::new(),
            kind: TokenKind::End,
            peek_count: 0,
        }
    }

    /// Resets this object onto a new physical line: splits off the comment,
    /// canonicalizes strings and `[...]` groups, then applies the
    /// visibility/property rewrites.
    pub(crate) fn parse_line(&mut self, line: &str) -> &mut Self {
        self.original = line.to_string();
        self.peek_count = 0;
        self.comment.clear();
        self.converted.clear();
        self.token.clear();
        self.kind = TokenKind::End;
        self.pos = 0;

        let mut rest = line;
        while let Some(first) = rest.chars().next() {
            match first {
                '\'' => {
                    self.comment = rest[1..].to_string();
                    break;
                }
                '"' => rest = self.take_string(rest),
                '[' => rest = self.take_bracketed(rest),
                _ => {
                    self.converted.push(first);
                    rest = &rest[first.len_utf8()..];
                }
            }
        }
        self.converted = canonicalize(self.converted.trim());
        self
    }

    /// Collects a quoted string into the converted buffer, turning the VBA
    /// `""` embedded quote into `\"` and doubling backslashes. An unterminated
    /// string runs to end of line.
    fn take_string<'a>(&mut self, s: &'a str) -> &'a str {
        self.converted.push('"');
        let mut input = &s[1..];
        loop {
            let Some(c) = input.chars().next() else {
                break;
            };
            if c == '\\' {
                self.converted.push_str("\\\\");
                input = &input[1..];
            } else if c == '"' && input[1..].starts_with('"') {
                self.converted.push_str("\\\"");
                input = &input[2..];
            } else if c == '"' {
                self.converted.push('"');
                input = &input[1..];
                break;
            } else {
                self.converted.push(c);
                input = &input[c.len_utf8()..];
            }
        }
        input
    }

    /// `[Sheet1!A1]` becomes `Range("Sheet1.A1")`.
    fn take_bracketed<'a>(&mut self, s: &'a str) -> &'a str {
        let mut inside = String::new();
        let mut rest = &s[1..];
        while let Some(c) = rest.chars().next() {
            rest = &rest[c.len_utf8()..];
            match c {
                ']' => break,
                '!' => inside.push('.'),
                _ => inside.push(c),
            }
        }
        self.converted.push_str("Range(\"");
        self.converted.push_str(&inside);
        self.converted.push_str("\")");
        rest
    }

    fn is_eof(&self) -> bool {
        self.original.trim() == EOF
    }

    /// Returns the next token without consuming it. Guards against loops on
    /// ill-formed input by capping consecutive peeks.
    pub(crate) fn peek(&mut self) -> Result<String, ParseError> {
        if self.is_eof() {
            return Ok(EOF.to_string());
        }
        self.peek_count += 1;
        if self.peek_count > MAX_PEEK_LIMIT {
            return Err(ParseError::new(format!(
                "Looping because of illegal input: {}",
                self.original
            )));
        }
        self.scan(false)
    }

    /// Consumes and returns the next token.
    pub(crate) fn next_token(&mut self) -> Result<String, ParseError> {
        self.scan(true)
    }

    /// Steps over one token. Mismatches with `expected` are tolerated; the
    /// end-of-input depth check is the safety net for derailed parses.
    pub(crate) fn eat(&mut self, expected: &str) -> Result<(), ParseError> {
        let _ = expected;
        self.next_token()?;
        Ok(())
    }

    fn scan(&mut self, advance: bool) -> Result<String, ParseError> {
        if self.is_eof() {
            return Ok(EOF.to_string());
        }
        loop {
            // Whitespace (and tossed modifier keywords below) are consumed
            // permanently, even on a peek.
            let rest = self.converted[self.pos..].trim_start();
            self.pos = self.converted.len() - rest.len();

            let (kind, len) = token::scan_token(rest).ok_or_else(|| {
                ParseError::new(format!("Unknown token, can't parse: {rest}"))
            })?;
            if kind == TokenKind::Toss {
                self.pos += len;
                continue;
            }

            let raw = &rest[..len];
            let mut text = match kind {
                TokenKind::Date => format!("\"{}\"", &raw[1..raw.len() - 1]),
                TokenKind::Hex => format!("0x{}", &raw[2..]),
                _ => raw.to_string(),
            };
            if text == "!" {
                text = ".".to_string();
            }
            if advance {
                self.pos += len;
                self.peek_count = 0;
            }
            if kind == TokenKind::Num && (text.ends_with('&') || text.ends_with('#')) {
                text.pop();
            }
            let text = token::canonical_keyword(&text.to_lowercase())
                .map(str::to_string)
                .unwrap_or(text);

            self.kind = kind;
            self.token = text.clone();
            return Ok(text);
        }
    }

    /// Category of the most recently produced (usually peeked) token.
    pub(crate) fn kind(&self) -> TokenKind {
        self.kind
    }

    pub(crate) fn current_token(&self) -> &str {
        &self.token
    }

    pub(crate) fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub(crate) fn comment(&self) -> &str {
        &self.comment
    }

    pub(crate) fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    /// The trimmed original input line.
    pub(crate) fn original(&self) -> String {
        self.original.trim().to_string()
    }

    /// Whatever remains of the converted line, untokenized.
    pub(crate) fn residue(&self) -> String {
        self.converted[self.pos..].trim().to_string()
    }

    /// Consumes the remaining tokens, applying operator fix-ups.
    pub(crate) fn rest(&mut self) -> Result<String, ParseError> {
        let mut rest = String::new();
        loop {
            let p = self.peek()?;
            if p.is_empty() || p == EOF {
                break;
            }
            rest.push_str(&token::fix_operators(&self.next_token()?));
        }
        Ok(rest)
    }

    /// Next expression, rendered as JavaScript text. A named argument
    /// `name := value` becomes the pair `"name :=", value`.
    pub(crate) fn expression(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut expression = self.arg(scope)?;
        if self.peek()? == ":=" {
            self.next_token()?;
            expression = format!("\"{} :=\", {}", expression, self.logic(scope)?);
        }
        Ok(expression)
    }

    fn arg(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut arg = self.logic(scope)?;
        while token::is_logical_op(&self.peek()?) {
            let op = token::fix_operators(&self.next_token()?);
            arg.push_str(&op);
            arg.push_str(&self.logic(scope)?);
        }
        Ok(arg)
    }

    fn logic(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut expr = if self.peek()? != "Not" {
            self.relation(scope)?
        } else {
            String::new()
        };
        while self.peek()? == "Not" {
            let op = token::fix_operators(&self.next_token()?);
            expr.push_str(&op);
            expr.push_str(&add_paren(&self.logic(scope)?));
        }
        Ok(expr)
    }

    fn relation(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut expr = self.arith(scope)?;
        while token::is_relational_op(&self.peek()?) {
            let op = token::fix_operators(&self.next_token()?);
            if op == "Like" {
                expr = format!("Like({},{})", expr, self.arith(scope)?);
            } else {
                expr = format!("{}{}{}", expr, op, self.arith(scope)?);
            }
        }
        Ok(expr)
    }

    fn arith(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut expr = self.unary(scope)?;
        while token::is_arithmetic_op(&self.peek()?) {
            let op = token::fix_operators(&self.next_token()?);
            expr.push_str(&op);
            expr.push_str(&self.unary(scope)?);
        }
        Ok(expr)
    }

    fn unary(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut sign = String::new();
        loop {
            let p = self.peek()?;
            if p != "+" && p != "-" {
                break;
            }
            sign.push_str(&self.next_token()?);
        }
        let expr = self.power(scope)?;
        Ok(format!("{}{}", sign, expr))
    }

    /// Right-associative exponentiation, emitted as an `exp(a, b)` call.
    fn power(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut expr = self.factor(scope)?;
        while self.peek()? == "^" {
            self.next_token()?;
            expr = format!("exp({}, {})", expr, self.power(scope)?);
        }
        Ok(expr)
    }

    fn factor(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let peeked = self.peek()?;
        let kind = self.kind;
        let mut expr = String::new();
        if kind == TokenKind::Ident {
            let name = self.name(scope)?;
            expr.push_str(&name);
            if scope.is_array_name(&name) && self.peek()? == "(" {
                let bp = self.balanced_parens(scope)?;
                expr.push_str(&set_brackets(&bp));
            }
        } else if kind == TokenKind::Num || kind == TokenKind::Str {
            expr.push_str(&self.next_token()?);
        } else if peeked == "." {
            expr.push_str(scope.with_prefix());
            expr.push_str(&self.next_token()?);
            expr.push_str(&self.name(scope)?);
        } else if peeked == "Not" {
            expr.push_str(&self.logic(scope)?);
        } else if peeked == "(" {
            expr.push_str(&self.next_token()?);
            expr.push_str(&self.expression(scope)?);
            expr.push_str(&self.next_token()?);
        } else {
            expr.push_str(&self.next_token()?);
        }
        Ok(expr)
    }

    /// Next name, with `.members` chained, `With` targets expanded, and
    /// subscripts of known arrays rewritten from `(...)` to `[...]`.
    pub(crate) fn name(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        if self.peek()? == "." {
            let dot = self.next_token()?;
            let tail = self.name(scope)?;
            return Ok(format!("{}{}{}", scope.with_prefix(), dot, tail));
        }
        if self.kind != TokenKind::Ident {
            return Ok(String::new());
        }
        let mut name = self.next_token()?;
        if self.peek()? == "(" {
            let expressions = self.expression_list(scope)?;
            if scope.is_array_name(&name) {
                name.push_str(&set_brackets(&expressions));
            } else {
                name.push_str(&expressions);
            }
        }
        if self.peek()? == "(" {
            // e.g. Range("A1")(cnt)
            let expressions = self.expression_list(scope)?;
            name.push_str(&expressions);
        }
        while self.peek()? == "." {
            // e.g. Range("A3").Selection.Cells(1, j)
            name.push_str(&self.next_token()?);
            name.push_str(&self.name(scope)?);
        }
        Ok(name)
    }

    /// A parenthesized expression list, parens included. Empty items become
    /// `undefined` so positional arguments keep their slots.
    pub(crate) fn expression_list(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut expressions = self.next_token()?; // "("
        loop {
            let p = self.peek()?;
            if p == ")" || p.is_empty() {
                break;
            }
            if p == "," {
                expressions.push_str(EMPTY_ARG);
                expressions.push_str(&self.next_token()?);
                expressions.push(' ');
                if self.peek()? == ")" {
                    expressions.push_str(EMPTY_ARG);
                }
                continue;
            }
            expressions.push_str(&self.expression(scope)?);
            if self.peek()? == "," {
                expressions.push_str(&self.next_token()?);
                expressions.push(' ');
                if self.peek()? == ")" {
                    expressions.push_str(EMPTY_ARG);
                }
            }
        }
        expressions.push_str(&self.next_token()?); // terminating ")"
        Ok(expressions)
    }

    /// A balanced-parenthesis token sequence, parens included. Unlike
    /// [`Line::expression_list`] the items need not be expressions.
    pub(crate) fn balanced_parens(&mut self, scope: &ScopeState) -> Result<String, ParseError> {
        let mut balanced = self.next_token()?; // "("
        loop {
            let p = self.peek()?;
            if p == ")" || p.is_empty() {
                break;
            }
            if p == "(" {
                balanced.push_str(&self.balanced_parens(scope)?);
            } else if p == "." {
                balanced.push_str(scope.with_prefix());
                balanced.push_str(&self.next_token()?);
                balanced.push_str(&self.name(scope)?);
            } else if self.kind == TokenKind::Ident {
                let name = self.name(scope)?;
                balanced.push_str(&name);
                if scope.is_array_name(&name) && self.peek()? == "(" {
                    let bp = self.balanced_parens(scope)?;
                    balanced.push_str(&set_brackets(&bp));
                }
            } else {
                balanced.push_str(&token::fix_operators(&self.next_token()?));
            }
        }
        balanced.push_str(&self.next_token()?); // terminating ")"
        Ok(balanced)
    }
}

/// Converts an outer `( ... )` group to `[ ... ]`, splitting on commas when
/// no nested call could be broken by doing so. Deliberately narrow: commas
/// inside nested parens or strings are left alone.
pub(crate) fn set_brackets(s: &str) -> String {
    let Some(inner) = s.get(1..s.len().saturating_sub(1)) else {
        return s.to_string();
    };
    if inner.contains('(') {
        return format!("[{}]", inner);
    }
    let mut out = String::with_capacity(inner.len() + 2);
    out.push('[');
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            out.push_str("][");
            while chars.peek() == Some(&' ') {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out.push(']');
    out
}

/// Wraps `s` in parens when it appears to contain an operator.
fn add_paren(s: &str) -> String {
    if s.chars()
        .any(|c| "-+*/%^<>=!&|".contains(c))
    {
        format!("({})", s)
    } else {
        s.to_string()
    }
}

static VIS_SUB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(Public|Private|Friend) +Sub").unwrap());
static VIS_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Public|Private|Friend) +Function").unwrap());
static VIS_DIM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(Public|Private|Friend) +Dim").unwrap());
static VIS_GLOBAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Public|Private|Friend) +Global").unwrap());
static VIS_CONST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Public|Private|Friend|Global) +Const").unwrap());
static VIS_DECLARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Public|Private|Friend) +Declare").unwrap());
static VIS_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r"Public|Private|Static").unwrap());

/// Rewrites lexical forms that would otherwise need their own statement
/// handlers: property procedures become functions, and visibility modifiers
/// collapse into the declaration keyword they precede.
fn canonicalize(s: &str) -> String {
    let s = s
        .replace("Property Get ", "Function Get ")
        .replace("Property Let ", "Function Let ")
        .replace("Property Set ", "Function Set ")
        .replace("End Property", "End Function");
    let s = VIS_SUB.replace_all(&s, "Sub");
    let s = VIS_FUNCTION.replace_all(&s, "Function");
    let s = VIS_DIM.replace_all(&s, "Dim");
    let s = VIS_GLOBAL.replace_all(&s, "Global");
    let s = VIS_CONST.replace_all(&s, "Const");
    let s = VIS_DECLARE.replace_all(&s, "Declare");
    VIS_ANY.replace_all(&s, "Dim").into_owned()
}
