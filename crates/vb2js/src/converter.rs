//! The recursive-descent statement translator.
//!
//! `Converter` drives the line buffer: it dispatches on the first token of
//! the current line, emits indented JavaScript into the output buffer, and
//! recurses for the body of each block construct. Translation is best-effort
//! and syntactic; lines it cannot handle come out as
//! `// original ; // UNTOUCHED`.

use crate::error::ParseError;
use crate::scope::ScopeState;
use crate::token::{self, TokenKind, EOF};
use crate::unit::TranslationUnit;

const INDENT: &str = "  ";

pub(crate) struct Converter {
    unit: TranslationUnit,
    scope: ScopeState,
    out: String,
}

impl Converter {
    pub(crate) fn new() -> Self {
        Self {
            unit: TranslationUnit::new(),
            scope: ScopeState::new(),
            out: String::new(),
        }
    }

    pub(crate) fn run(mut self, lines: Vec<String>) -> Result<String, ParseError> {
        if lines.is_empty() {
            return Ok(String::new());
        }
        self.unit.cleanup(lines);
        self.unit.advance();
        while self.peek()? != EOF {
            self.translate()?;
        }
        if self.unit.depth() != 0 {
            return Err(ParseError::with_location(
                format!("Statement nesting error: depth = {}", self.unit.depth()),
                self.unit.error_line_number(),
                self.unit.current_line_text().map(str::to_string),
            ));
        }
        Ok(self.out)
    }

    // ----- small helpers over the current line -----

    fn peek(&mut self) -> Result<String, ParseError> {
        self.unit.line_mut().peek()
    }

    fn kind(&self) -> TokenKind {
        self.unit.line().kind()
    }

    fn next_token(&mut self) -> Result<String, ParseError> {
        self.unit.line_mut().next_token()
    }

    fn eat(&mut self, expected: &str) -> Result<(), ParseError> {
        self.unit.line_mut().eat(expected)
    }

    fn expression(&mut self) -> Result<String, ParseError> {
        self.unit.line_mut().expression(&self.scope)
    }

    fn name(&mut self) -> Result<String, ParseError> {
        self.unit.line_mut().name(&self.scope)
    }

    fn rest(&mut self) -> Result<String, ParseError> {
        self.unit.line_mut().rest()
    }

    fn balanced_parens(&mut self) -> Result<String, ParseError> {
        self.unit.line_mut().balanced_parens(&self.scope)
    }

    fn advance(&mut self) {
        self.unit.advance();
    }

    fn unexpected_eof(&self) -> ParseError {
        ParseError::with_location(
            format!("Unexpected end of file, line {}", self.unit.line().original()),
            self.unit.error_line_number(),
            None,
        )
    }

    /// Emits one output line at the current indentation, with the input
    /// line's comment (if any) trailing as `// ...`.
    fn emit(&mut self, js: &str) {
        let mut comment = String::new();
        if self.unit.line().has_comment() {
            comment = format!(" // {}", self.unit.line().comment().trim());
        }
        if js.is_empty() {
            comment = comment.trim().to_string();
        }
        for _ in 0..self.unit.depth().max(0) {
            self.out.push_str(INDENT);
        }
        self.out.push_str(js);
        self.out.push_str(&comment);
        self.out.push('\n');
    }

    /// Records `name` as an array in the scope appropriate to where we are.
    fn set_array_name(&mut self, name: &str) {
        if self.unit.sub_nesting() > 0 {
            self.scope.add_local_name(name);
        } else {
            self.scope.add_global_name(name);
        }
    }

    fn leave_sub(&mut self) {
        if self.unit.leave_sub() {
            self.scope.clear_local_names();
        }
    }

    /// Empty lines might carry comments; either way, print them.
    fn skip_empty_lines(&mut self) -> Result<(), ParseError> {
        while self.peek()?.is_empty() {
            self.translate_empty();
        }
        Ok(())
    }

    // ----- dispatch -----

    fn translate(&mut self) -> Result<(), ParseError> {
        let peek = self.peek()?;
        let kind = self.kind();

        if peek == EOF {
            return Err(self.unexpected_eof());
        }

        if peek.is_empty() {
            self.translate_empty();
            Ok(())
        } else if matches!(peek.as_str(), "Dim" | "ReDim" | "Global" | "Const") {
            self.translate_dim()
        } else if peek == "If" {
            self.translate_if()
        } else if peek == "For" {
            self.translate_for()
        } else if peek == "Do" {
            self.translate_do()
        } else if peek == "While" {
            self.translate_while()
        } else if peek == "Sub" {
            self.translate_sub()
        } else if peek == "Function" {
            self.translate_function()
        } else if peek == "Call" {
            self.translate_call()
        } else if peek == "Select" {
            self.translate_select()
        } else if peek == "Exit" {
            self.translate_exit()
        } else if peek == "With" {
            self.translate_with()
        } else if peek == "Type" {
            self.translate_type()
        } else if kind == TokenKind::Punt {
            self.translate_punt();
            Ok(())
        } else if peek == "On Error" {
            self.translate_on_error()
        } else if kind == TokenKind::Ident || peek == "." {
            self.translate_assignment_or_call()
        } else {
            self.translate_other()
        }
    }

    fn translate_empty(&mut self) {
        self.emit("");
        self.advance();
    }

    // ----- statements -----

    /// `Dim x As type, y(10) As type, z As type = expr` and friends.
    /// Array declarations become `new Array(...)` and the name is remembered
    /// so later uses convert `()` to `[]`.
    fn translate_dim(&mut self) -> Result<(), ParseError> {
        let kind = self.next_token()?; // Dim, ReDim, Global or Const

        loop {
            let mut var = self.next_token()?;
            if var == "Preserve" {
                var = self.next_token()?;
            }

            let mut dim = String::new(); // empty means not an array
            let mut indices: Vec<String> = Vec::new();
            if self.peek()? == "(" {
                dim = self.balanced_parens()?;

                indices = dim
                    .replace('(', "")
                    .replace(')', "")
                    .split(',')
                    .map(str::to_string)
                    .collect();
                for index in &mut indices {
                    // `a To b` keeps only the upper bound.
                    if let Some(pos) = index.rfind("To") {
                        *index = index[pos + 2..].to_string();
                    }
                }

                if dim.contains("To") {
                    let spaced = dim.replace("To", " To ");
                    dim = format!("(/* {} */)", spaced);
                }
            }

            let mut vtype = String::new();
            if self.peek()? == "As" {
                // As [New] type
                self.eat("As")?;
                if self.peek()? == "New" {
                    vtype.push_str("New ");
                    self.eat("New")?;
                }
                vtype.push_str(&self.name()?);

                // Dim foo As String * 100 (fixed-length string)
                if self.peek()? == "*" {
                    vtype.push_str(&self.next_token()?);
                    vtype.push_str(&self.expression()?);
                }
            }

            let mut expr = String::new();
            if self.peek()? == "=" {
                self.eat("=")?;
                if self.peek()? == "{" {
                    self.eat("{")?;
                    loop {
                        let p = self.peek()?;
                        if p == "}" || p == EOF {
                            break;
                        }
                        expr.push_str(&self.next_token()?);
                    }
                    self.eat("}")?;
                } else {
                    expr.push_str(&self.expression()?);
                }
            }

            let mut is_user_defined_type = false;
            if !vtype.is_empty() {
                if self.unit.is_type_name(&vtype) {
                    is_user_defined_type = true;
                } else {
                    vtype = format!("// {}", vtype);
                }
            }

            if dim.is_empty() {
                let init = if expr.is_empty() {
                    String::new()
                } else {
                    format!(" = {}", expr)
                };
                if is_user_defined_type {
                    self.emit(&format!("var {}{} = new {}();", var, init, vtype));
                } else {
                    self.emit(&format!("var {}{}; {}", var, init, vtype));
                }
            } else if kind == "ReDim" {
                if !self.scope.is_array_name(&var) {
                    // ReDim used to declare the array.
                    self.emit(&format!("var {} = new Array{}; {} // ReDim decl", var, dim, vtype));
                    self.set_array_name(&var);
                } else if dim.contains(',') {
                    self.generate_multi_dim_array(&var, &vtype, &indices);
                }
            } else {
                if expr.is_empty() {
                    if indices.len() > 1 {
                        vtype.push_str(" // multi-dim");
                        self.generate_multi_dim_array(&var, &vtype, &indices);
                    } else {
                        self.emit(&format!("var {} = new Array({});", var, indices[0]));
                    }
                } else {
                    self.emit(&format!("var {} = new Array({}); {}", var, expr, vtype));
                }
                self.set_array_name(&var);
            }

            if self.peek()? != "," {
                break;
            }
            self.eat(",")?;
        }
        self.advance();
        Ok(())
    }

    /// JavaScript multi-dimensional arrays are arrays of arrays; emit the
    /// head allocation plus nested loops initializing each inner dimension.
    /// VBA names cannot start with `_`, so `_a`, `_b`, ... cannot clash with
    /// user variables.
    fn generate_multi_dim_array(&mut self, var: &str, vtype: &str, indices: &[String]) {
        self.emit(&format!("var {} = new Array({}); {}", var, indices[0], vtype));
        // Index letters run _a.._z; dimensions beyond 26 would collide.
        let mut idx = b'a';
        let mut subscript = String::new();
        for i in 1..indices.len() {
            let internal = format!("_{}", idx as char);
            self.emit(&format!(
                "for (var {internal} = 0; {internal} < {}; ++{internal}) {{",
                indices[i - 1]
            ));
            self.unit.indent();
            subscript.push_str(&format!("[{internal}]"));
            idx += 1;
            self.emit(&format!("{}{} = new Array({});", var, subscript, indices[i]));
        }
        for _ in 1..indices.len() {
            self.unit.undent();
            self.emit("}");
        }
    }

    /// `If ... Then` / `ElseIf ... Then` / `Else` / `End If`.
    fn translate_if(&mut self) -> Result<(), ParseError> {
        self.eat("If")?;
        let expression = self.expression()?;
        self.eat("Then")?;
        self.emit(&format!("if ({}) {{", expression));
        self.unit.indent();
        self.advance();

        while !matches!(self.peek()?.as_str(), "End If" | "Else" | "ElseIf") {
            self.translate()?;
        }

        while self.peek()? == "ElseIf" {
            self.eat("ElseIf")?;
            self.unit.undent();
            let expression = self.expression()?;
            self.eat("Then")?;
            self.emit(&format!("}} else if ({}) {{", expression));
            self.unit.indent();
            self.advance();

            while !matches!(self.peek()?.as_str(), "End If" | "Else" | "ElseIf") {
                self.translate()?;
            }
        }

        if self.peek()? == "Else" {
            self.eat("Else")?;
            self.unit.undent();
            self.emit("} else {");
            self.advance();
            self.unit.indent();
            while self.peek()? != "End If" {
                self.translate()?;
            }
        }

        self.eat("End If")?;
        self.unit.undent();
        self.emit("}");
        self.advance();
        Ok(())
    }

    /// `For v = a To|Downto b [Step s]` ... `Next`.
    fn translate_for(&mut self) -> Result<(), ParseError> {
        self.eat("For")?;

        if self.peek()? == "Each" {
            return self.translate_for_each();
        }

        let var = self.next_token()?;
        self.eat("=")?;
        let start = self.expression()?;
        let updown = self.next_token()?;

        let (mut rel, mut incr) = if updown == "To" {
            ("<=", "+=")
        } else {
            // Downto
            (">=", "-=")
        };

        let stop = self.expression()?;

        let step = if self.peek()? == "Step" {
            self.eat("Step")?;
            let step = self.expression()?;
            if step.starts_with('-') {
                rel = ">=";
                incr = "+=";
            }
            step
        } else {
            "1".to_string()
        };

        // Collapse steps of one into ++/--.
        let reincr = if step == "1" && incr == "+=" {
            format!("++{}", var)
        } else if step == "-1" && incr == "-=" {
            format!("++{}", var)
        } else if step == "1" && incr == "-=" {
            format!("--{}", var)
        } else if step == "-1" && incr == "+=" {
            format!("--{}", var)
        } else {
            format!("{} {} {}", var, incr, step)
        };

        self.emit(&format!(
            "for (var {} = {}; {} {} {}; {}) {{",
            var, start, var, rel, stop, reincr
        ));
        self.unit.indent();
        self.advance();

        loop {
            let p = self.peek()?;
            if p == "Next" || p == EOF {
                break;
            }
            self.translate()?;
        }

        self.unit.undent();
        self.emit("}");
        self.advance();
        Ok(())
    }

    /// `For Each v In expr` ... `Next`.
    fn translate_for_each(&mut self) -> Result<(), ParseError> {
        self.eat("Each")?;
        let var = self.next_token()?;
        if self.peek()? == "As" {
            // skip optional As type
            self.eat("As")?;
            self.name()?;
        }
        self.eat("In")?;
        let expr = self.expression()?;
        self.emit(&format!("for (var {} in {}) {{", var, expr));
        self.unit.indent();
        self.advance();
        loop {
            let p = self.peek()?;
            if p == "Next" || p == EOF {
                break;
            }
            self.translate()?;
        }
        self.unit.undent();
        self.emit("}");
        self.advance();
        Ok(())
    }

    /// `Do [While e | Until e]` ... `Loop [While e | Until e]`.
    fn translate_do(&mut self) -> Result<(), ParseError> {
        self.eat("Do")?;
        let p = self.peek()?;
        if p == "While" {
            self.eat("While")?;
            let expr = self.expression()?;
            self.emit(&format!("while ({}) {{", expr));
        } else if p == "Until" {
            self.eat("Until")?;
            let expr = self.expression()?;
            self.emit(&format!("while (!({})) {{", expr));
        } else {
            self.emit("while (1) {");
        }

        self.advance();
        self.unit.indent();

        while self.peek()? != "Loop" {
            self.translate()?;
        }

        self.eat("Loop")?;
        let p = self.peek()?;
        if p == "While" {
            self.eat("While")?;
            let expr = self.expression()?;
            self.emit(&format!("if (!({}))", expr));
            self.unit.indent();
            self.emit("break;");
            self.unit.undent();
        } else if p == "Until" {
            self.eat("Until")?;
            let expr = self.expression()?;
            self.emit(&format!("if ({})", expr));
            self.unit.indent();
            self.emit("break;");
            self.unit.undent();
        }

        self.unit.undent();
        self.emit("}");
        self.advance();
        Ok(())
    }

    /// `While e` ... `End While` (or `Wend`).
    fn translate_while(&mut self) -> Result<(), ParseError> {
        self.eat("While")?;
        let expr = self.expression()?;
        self.advance();
        self.emit(&format!("while ({}) {{", expr));
        self.unit.indent();

        loop {
            let p = self.peek()?;
            if p == "End While" || p == "Wend" {
                break;
            }
            self.translate()?;
        }

        self.next_token()?; // End While or Wend
        self.unit.undent();
        self.emit("}");
        self.advance();
        Ok(())
    }

    /// `Sub name(arglist)` ... `End Sub`.
    fn translate_sub(&mut self) -> Result<(), ParseError> {
        self.unit.enter_sub();
        self.eat("Sub")?;
        let subname = self.next_token()?;
        let arg_list = self.collect_arg_list()?;
        self.emit(&format!("function {}({}) {{", subname, arg_list));
        self.unit.indent();
        self.advance();

        loop {
            let p = self.peek()?;
            if p == "End Sub" || p == EOF {
                break;
            }
            self.translate()?;
        }

        self.eat("End Sub")?;
        self.unit.undent();
        self.emit("}");
        self.leave_sub();
        self.advance();
        Ok(())
    }

    /// `Function name(arglist) As type` ... `End Function`. The return value
    /// travels through a synthetic `_name` variable so `name = expr`
    /// assignments inside the body work.
    fn translate_function(&mut self) -> Result<(), ParseError> {
        self.unit.enter_sub();
        self.eat("Function")?;
        let fname = self.next_token()?;
        self.unit.set_function_name(&fname);
        let arg_list = self.collect_arg_list()?;
        let return_variable = format!("_{}", self.unit.function_name());

        // Whatever trails the argument list (usually `As type`) becomes a
        // comment on the function line.
        let mut ret = String::new();
        while self.unit.line().has_token() {
            self.next_token()?;
            if !self
                .unit
                .line()
                .current_token()
                .eq_ignore_ascii_case("As")
            {
                ret.push_str(&self.unit.line().current_token().to_string());
            } else {
                self.eat("As")?;
                ret.push_str(&self.unit.line().current_token().to_string());
            }
        }
        if !ret.is_empty() {
            ret = format!(" // {}", ret);
        }

        self.emit(&format!("function {}({}) {{{}", fname, arg_list, ret));
        self.unit.indent();
        self.emit(&format!("var {} = \"\"; // Stores return value", return_variable));
        self.advance();

        while self.peek()? != "End Function" {
            self.translate()?;
        }

        self.eat("End Function")?;
        self.emit(&format!("return {};", return_variable));
        self.unit.undent();
        self.unit.set_function_name("");
        self.emit("}");
        self.leave_sub();
        self.advance();
        Ok(())
    }

    /// Argument list of a Sub/Function definition. `ByVal` is dropped,
    /// `ByRef`/`Optional` and default values are preserved as comments, and
    /// an argument declared with parens is recorded as an array.
    fn collect_arg_list(&mut self) -> Result<String, ParseError> {
        let mut arg_list = String::new();
        if self.peek()? != "(" {
            return Ok(arg_list);
        }

        self.eat("(")?;

        while self.peek()? != ")" {
            let mut reference = "";
            let p = self.peek()?;
            if p == "ByRef" {
                reference = "/*ByRef*/";
                self.eat("ByRef")?;
            } else if p == "Optional" {
                reference = "/*Optional*/";
                self.eat("Optional")?;
            } else if p == "ByVal" {
                self.eat("ByVal")?;
            }
            let bare = self.peek()?;
            let name = self.name()?;
            if bare != name {
                self.set_array_name(&bare);
            }

            arg_list.push_str(reference);
            arg_list.push_str(&bare);

            if self.peek()? == "As" {
                self.next_token()?; // As
                self.name()?; // type
            }

            if self.peek()? == "=" {
                // presumably only if Optional
                self.eat("=")?;
                let expr = self.expression()?;
                arg_list.push_str(&format!(" /*= {}*/", expr));
            }

            if self.peek()? == "," {
                arg_list.push_str(&self.next_token()?);
                arg_list.push(' ');
            }
        }
        self.eat(")")?;
        Ok(arg_list)
    }

    /// Explicit `Call this, that` or `Call f(this, that)`.
    fn translate_call(&mut self) -> Result<(), ParseError> {
        self.eat("Call")?;
        let name = self.name()?;
        let mut params = String::new();
        let p = self.peek()?;
        if p.is_empty() {
            // Call foo(...) or Call foo
            if has_call_parens(&name) {
                self.emit(&format!("{};", name));
            } else {
                self.emit(&format!("{}();", name));
            }
        } else if p == "(" {
            while !self.peek()?.is_empty() {
                params.push_str(&self.expression()?);
                if self.peek()? == "," {
                    params.push_str(&self.next_token()?);
                    params.push(' ');
                }
            }
            self.emit(&format!("{}{};", name, params));
        } else {
            while !self.peek()?.is_empty() {
                params.push_str(&self.expression()?);
                if self.peek()? == "," {
                    params.push_str(&self.next_token()?);
                    params.push(' ');
                }
            }
            self.emit(&format!("{}({});", name, params));
        }
        self.advance();
        Ok(())
    }

    /// `Select Case e` ... `End Select` becomes an if/else-if chain keyed on
    /// `e`; each `Case` supplies one link.
    fn translate_select(&mut self) -> Result<(), ParseError> {
        self.eat("Select")?;
        self.eat("Case")?;
        let expr = self.expression()?;
        self.skip_empty_lines()?;
        let mut n = 1;

        loop {
            let p = self.peek()?;
            if p == "End Select" {
                break;
            }
            if p == EOF {
                return Err(self.unexpected_eof());
            }
            if p == "Case" {
                self.translate_case(&expr, n)?;
                n += 1;
            }
        }

        self.eat("End Select")?;
        self.emit("}");
        self.advance();
        Ok(())
    }

    /// One `Case` alternative. Items come in three forms — `a To b`,
    /// `[Is] op expr`, bare `expr` — and a comma-separated list ORs them.
    fn translate_case(&mut self, expr: &str, n: i32) -> Result<(), ParseError> {
        self.eat("Case")?;
        let else_part = if n == 1 { "" } else { "} else " };

        if self.peek()? == "Else" {
            self.eat("Else")?;
            self.emit("} else {");
        } else {
            let mut if_expr = String::new();
            loop {
                let p = self.peek()?;
                if p.is_empty() || p == ":" {
                    break;
                }
                if p == "Is" {
                    self.eat("Is")?;
                }
                let was_op = self.kind() == TokenKind::Op;
                let p = self.peek()?;
                if was_op && p != "-" && p != "+" {
                    let rel_op = token::fix_operators(&self.next_token()?);
                    let to_expr = self.expression()?;
                    if_expr.push_str(&format!("{} {} {}", expr, rel_op, parenthesize(&to_expr)));
                } else {
                    let to_expr = self.expression()?;
                    if self.peek()? == "To" {
                        self.eat("To")?;
                        let high = self.expression()?;
                        if_expr.push_str(&format!(
                            "{} >= {} && {} <= {}",
                            expr, to_expr, expr, high
                        ));
                    } else {
                        if_expr.push_str(&format!("{} == {}", expr, parenthesize(&to_expr)));
                    }
                }
                if self.peek()? == "," {
                    self.eat(",")?;
                    if_expr.push_str(" || ");
                }
            }
            self.emit(&format!("{}if ({}) {{", else_part, if_expr));
        }

        self.unit.indent();
        if self.peek()? == ":" {
            // one-line Case body
            self.eat(":")?;
            self.translate()?;
        } else {
            self.advance();
            while !matches!(self.peek()?.as_str(), "Case" | "End Select") {
                self.translate()?;
            }
        }
        self.unit.undent();
        Ok(())
    }

    /// `Exit For/While/Do/Sub/Function`.
    fn translate_exit(&mut self) -> Result<(), ParseError> {
        self.eat("Exit")?;
        let token = self.next_token()?;
        if token == "For" || token == "While" || token == "Do" {
            self.emit("break;");
        } else if token == "Sub" {
            self.emit("return;");
        } else if token == "Function" {
            let line = format!("return _{};", self.unit.function_name());
            self.emit(&line);
        } else {
            let rest = self.rest()?;
            self.emit(&format!("{}; // BUG", rest));
        }

        self.advance();
        Ok(())
    }

    /// `With x` ... `End With`. The target is kept implicit: `.member`
    /// references inside the block pick up the prefix during name
    /// production.
    fn translate_with(&mut self) -> Result<(), ParseError> {
        self.eat("With")?;
        let name = self.name()?;
        self.scope.push_with(name);
        let marker = format!("// With {}", self.scope.with_prefix());
        self.emit(&marker);
        self.advance();

        while self.peek()? != "End With" {
            self.translate()?;
        }

        self.eat("End With")?;
        if self.scope.pop_with().is_none() {
            return Err(ParseError::new(
                "Failed while translating With... End With. Out of statements to parse.",
            ));
        }
        self.advance();
        Ok(())
    }

    /// `Type name` ... `End Type` becomes an empty constructor plus one
    /// prototype slot per member.
    fn translate_type(&mut self) -> Result<(), ParseError> {
        let mut is_user_defined_type = false;
        self.eat("Type")?;
        let type_name = self.next_token()?;

        // Remember the name: later `Dim x As <name>` gets a constructor call.
        self.unit.add_type_name(&type_name);

        self.advance();

        self.emit(&format!("{} = function() {{}};  // Creates an empty class", type_name));

        loop {
            let p = self.peek()?;
            if p == "End Type" {
                break;
            }
            if p == EOF {
                return Err(self.unexpected_eof());
            }
            let name = self.next_token()?;
            let mut vtype = String::new();
            if self.peek()? == "As" {
                self.eat("As")?;
                vtype = self.peek()?;
            }

            if self.unit.is_type_name(&vtype) {
                is_user_defined_type = true;
            } else {
                vtype = format!("// {}", vtype);
            }

            if name.is_empty() {
                // only a comment on this line
                let rest = self.rest()?;
                self.emit(&rest);
            } else if is_user_defined_type {
                self.emit(&format!("{}.prototype.{} = new {}();", type_name, name, vtype));
            } else {
                self.emit(&format!("{}.prototype.{}; {}", type_name, name, vtype));
            }
            self.advance();
        }

        self.eat("End Type")?;
        self.advance();
        Ok(())
    }

    /// `On Error GoTo label` wraps the following statements in try/catch;
    /// the other `On Error` forms come out untouched.
    fn translate_on_error(&mut self) -> Result<(), ParseError> {
        self.eat("On Error")?;
        let p = self.peek()?;
        if p == "Resume" {
            self.eat("Resume")?;
            let rest = self.rest()?;
            self.emit(&format!("// On Error Resume {}; // UNTOUCHED", rest));
            self.advance();
        } else if p == "GoTo" {
            self.eat("GoTo")?;
            let label = self.next_token()?;
            if label == "0" {
                // special case in VB: restore normal handling
                self.emit("// On Error GoTo 0; // UNTOUCHED");
                self.advance();
                return Ok(());
            }

            self.emit("try {");
            self.unit.indent();
            self.advance();

            while self.peek()? != label {
                self.translate()?;
            }

            self.advance();
            self.unit.undent();
            let header = format!("}} catch(e) {{ // {}", label);
            self.emit(&header);
            self.unit.indent();

            while !matches!(self.peek()?.as_str(), "End Sub" | "End Function") {
                self.translate()?;
            }

            self.unit.undent();
            self.emit("}");
        }
        Ok(())
    }

    /// `foo`, `foo(bar)`, `foo bar, glop`, `foo = expr`, or a label.
    /// Disambiguated by peeking: this is balanced on a pinhead.
    fn translate_assignment_or_call(&mut self) -> Result<(), ParseError> {
        let mut name = self.name()?;

        if self.peek()? == ":" {
            // a label?
            let rest = self.rest()?.trim().to_string();
            let marked = mark_untouched(&format!("{} {}", name, rest));
            self.emit(&marked);
            self.advance();
            return Ok(());
        }

        // `foo (p1), (p2)` is rewritten to `foo ((p1), (p2))` and redone.
        if self.peek()? == "," {
            let original = self.unit.line().original();
            if let Some(separator) = original.find(' ') {
                self.unit.line_mut().parse_line(&original); // start over
                let converted = self.unit.line().residue();
                let (Some(head), Some(tail)) =
                    (converted.get(..separator), converted.get(separator + 1..))
                else {
                    let marked = mark_untouched(&self.unit.line().residue());
                    self.emit(&marked);
                    self.advance();
                    return Ok(());
                };
                let mut rebuilt = format!("{}({})", head, tail.trim());
                if self.unit.line().has_comment() {
                    let comment = self.unit.line().comment().to_string();
                    rebuilt.push_str("' ");
                    rebuilt.push_str(&comment);
                }
                self.unit.line_mut().parse_line(&rebuilt);
                return self.translate_assignment_or_call();
            }
        }

        let expr;
        if self.peek()? == "=" {
            // assignment
            self.eat("=")?;
            if name == self.unit.function_name() {
                name = format!("_{}", name);
            }
            let mut new_str = "";

            let p = self.peek()?;
            if p == "New" {
                self.eat("New")?;
                new_str = "new ";
            } else if p.starts_with("Array") {
                new_str = "new ";
                self.set_array_name(&name);
            }

            expr = format!("{} = {}{}", name, new_str, self.expression()?);
        } else if matches!(self.kind(), TokenKind::Ident | TokenKind::Num | TokenKind::Str)
            || self.peek()? == "-"
        {
            // probably foo bar,glop
            let mut call_params = String::new();
            loop {
                let p = self.peek()?;
                if p.is_empty() || self.kind() == TokenKind::Key || p == ":" {
                    break;
                }
                call_params.push_str(&self.expression()?);
                if self.peek()? == "," {
                    call_params.push_str(&self.next_token()?);
                    call_params.push(' ');
                }
            }
            expr = format!("{}({})", name, call_params);
        } else {
            // who knows
            let rest = self.rest()?.trim().to_string();
            if rest.is_empty() && !has_call_parens(&name) {
                expr = format!("{}()", name); // guess it's a function call
            } else {
                expr = format!("{} {}", name, rest);
            }
        }
        self.emit(&format!("{};", expr.trim()));

        // Multiple statements on one line, separated by ":".
        if self.peek()? == ":" {
            self.eat(":")?;
        } else {
            self.advance();
        }
        Ok(())
    }

    /// Known to be beyond help (`Attribute`, `Option`, file I/O, ...).
    fn translate_punt(&mut self) {
        let marked = mark_untouched(&self.unit.line().residue());
        self.emit(&marked);
        self.advance();
    }

    /// Not sure, so just put it out.
    fn translate_other(&mut self) -> Result<(), ParseError> {
        let rest = self.rest()?;
        let marked = mark_untouched(&rest);
        self.emit(&marked);
        self.advance();
        Ok(())
    }
}

fn mark_untouched(line: &str) -> String {
    format!("// {}; // UNTOUCHED", line)
}

/// `name` already carries a parenthesized argument list.
fn has_call_parens(name: &str) -> bool {
    name.ends_with(')') && name.contains('(')
}

/// Parens around `str` unless it is a plain word or string literal.
fn parenthesize(s: &str) -> String {
    let plain_word = !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let plain_string = s.len() >= 2
        && s.starts_with('"')
        && s.ends_with('"')
        && !s[1..s.len() - 1].contains('"');
    if plain_word || plain_string {
        s.to_string()
    } else {
        format!("({})", s)
    }
}
