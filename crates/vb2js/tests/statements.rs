//! End-to-end statement translation.

use pretty_assertions::assert_eq;

fn js_lines(src: &str) -> Vec<String> {
    vb2js::convert(src)
        .expect("conversion succeeds")
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}

fn js(src: &str) -> String {
    vb2js::convert(src).expect("conversion succeeds")
}

#[test]
fn scalar_dim_keeps_the_type_as_a_comment() {
    assert_eq!(js_lines("Dim x As Integer"), vec!["var x; // Integer"]);
}

#[test]
fn dim_with_initializer() {
    assert_eq!(js_lines("Const N = 10"), vec!["var N = 10;"]);
    assert_eq!(js_lines("Dim x As Integer, y As Double"), vec!["var x; // Integer", "var y; // Double"]);
}

#[test]
fn multi_dimensional_array_allocates_each_dimension() {
    assert_eq!(
        js_lines("Dim a(3, 2) As Double"),
        vec![
            "var a = new Array(3); // Double // multi-dim",
            "for (var _a = 0; _a < 3; ++_a) {",
            "  a[_a] = new Array(2);",
            "}",
        ]
    );
}

#[test]
fn one_dimensional_array() {
    assert_eq!(js_lines("Dim v(10)"), vec!["var v = new Array(10);"]);
}

#[test]
fn array_bounds_keep_only_the_upper_limit() {
    assert_eq!(js_lines("Dim r(1 To 5)"), vec!["var r = new Array(5);"]);
}

#[test]
fn redim_declares_once_and_is_silent_afterwards() {
    let out = js("ReDim a(5)\nReDim a(6)\nReDim Preserve a(7)");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("var a = new Array(5);"));
    assert!(lines[0].contains("// ReDim decl"));
}

#[test]
fn if_elseif_else_chain() {
    let src = "If x > 0 Then\ny = 1\nElseIf x = 0 Then\ny = 0\nElse\ny = -1\nEnd If";
    assert_eq!(
        js_lines(src),
        vec![
            "if (x > 0) {",
            "  y = 1;",
            "} else if (x == 0) {",
            "  y = 0;",
            "} else {",
            "  y = -1;",
            "}",
        ]
    );
}

#[test]
fn for_counts_up_by_default() {
    let src = "For i = 1 To 10\nx = i\nNext";
    assert_eq!(
        js_lines(src),
        vec!["for (var i = 1; i <= 10; ++i) {", "  x = i;", "}"]
    );
}

#[test]
fn for_with_negative_step_counts_down() {
    let src = "For i = 10 To 1 Step -1\nx = i\nNext";
    assert_eq!(
        js_lines(src),
        vec!["for (var i = 10; i >= 1; --i) {", "  x = i;", "}"]
    );
}

#[test]
fn for_with_non_unit_step_keeps_the_increment() {
    let src = "For i = 0 To 10 Step 2\nNext";
    assert_eq!(js_lines(src)[0], "for (var i = 0; i <= 10; i += 2) {");
}

#[test]
fn for_each_iterates_with_in() {
    let src = "For Each cell In Range(\"A1:A3\")\nx = cell\nNext";
    assert_eq!(
        js_lines(src),
        vec![
            "for (var cell in Range(\"A1:A3\")) {",
            "  x = cell;",
            "}",
        ]
    );
}

#[test]
fn select_case_builds_an_if_chain() {
    let src = "Select Case n\nCase 1, 2: x = \"a\"\nCase 3 To 5\nx = \"b\"\nCase Else\nx = \"c\"\nEnd Select";
    assert_eq!(
        js_lines(src),
        vec![
            "",
            "if (n == 1 || n == 2) {",
            "  x = \"a\";",
            "} else if (n >= 3 && n <= 5) {",
            "  x = \"b\";",
            "} else {",
            "  x = \"c\";",
            "}",
        ]
    );
}

#[test]
fn select_case_is_comparison() {
    let src = "Select Case n\nCase Is >= 14\nx = 1\nEnd Select";
    let out = js(src);
    assert!(out.contains("if (n  >=  14) {") || out.contains("if (n >= 14) {"), "got: {out}");
}

#[test]
fn function_gets_a_synthetic_return_variable() {
    let src = "Function Add(ByVal a, ByRef b) As Double\nAdd = a + b\nEnd Function";
    assert_eq!(
        js_lines(src),
        vec![
            "function Add(a, /*ByRef*/b) { // Double",
            "  var _Add = \"\"; // Stores return value",
            "  _Add = a + b;",
            "  return _Add;",
            "}",
        ]
    );
}

#[test]
fn exit_function_returns_the_synthetic_variable() {
    let src = "Function F()\nIf x Then Exit Function\nF = 1\nEnd Function";
    assert_eq!(
        js_lines(src),
        vec![
            "function F() {",
            "  var _F = \"\"; // Stores return value",
            "  if (x) {",
            "    return _F;",
            "  }",
            "  _F = 1;",
            "  return _F;",
            "}",
        ]
    );
}

#[test]
fn sub_translates_to_a_function_without_return_value() {
    let src = "Sub Greet(name)\nIf name = \"\" Then Exit Sub\nMsgBox name\nEnd Sub";
    assert_eq!(
        js_lines(src),
        vec![
            "function Greet(name) {",
            "  if (name == \"\") {",
            "    return;",
            "  }",
            "  MsgBox(name);",
            "}",
        ]
    );
}

#[test]
fn optional_arguments_keep_their_defaults_as_comments() {
    let src = "Sub S(Optional n = 3)\nEnd Sub";
    assert_eq!(js_lines(src)[0], "function S(/*Optional*/n /*= 3*/) {");
}

#[test]
fn exit_for_breaks() {
    let src = "For i = 1 To 3\nExit For\nNext";
    assert_eq!(js_lines(src)[1], "  break;");
}

#[test]
fn do_while_pre_test() {
    let src = "Do While x < 3\nx = x + 1\nLoop";
    assert_eq!(
        js_lines(src),
        vec!["while (x < 3) {", "  x = x + 1;", "}"]
    );
}

#[test]
fn do_until_pre_test_negates() {
    let src = "Do Until x = 3\nx = x + 1\nLoop";
    assert_eq!(js_lines(src)[0], "while (!(x == 3)) {");
}

#[test]
fn headless_do_with_post_test_until() {
    let src = "Do\nx = x + 1\nLoop Until x = 3";
    assert_eq!(
        js_lines(src),
        vec![
            "while (1) {",
            "  x = x + 1;",
            "  if (x == 3)",
            "    break;",
            "}",
        ]
    );
}

#[test]
fn headless_do_with_post_test_while() {
    let src = "Do\nx = x + 1\nLoop While x < 3";
    assert_eq!(
        js_lines(src),
        vec![
            "while (1) {",
            "  x = x + 1;",
            "  if (!(x < 3))",
            "    break;",
            "}",
        ]
    );
}

#[test]
fn while_wend_block() {
    let src = "While x < 3\nx = x + 1\nWend";
    assert_eq!(
        js_lines(src),
        vec!["while (x < 3) {", "  x = x + 1;", "}"]
    );
}

#[test]
fn with_block_qualifies_dot_members() {
    let src = "With Range(\"A1\")\n.Value = 5\nEnd With";
    assert_eq!(
        js_lines(src),
        vec!["// With Range(\"A1\")", "Range(\"A1\").Value = 5;"]
    );
}

#[test]
fn nested_with_blocks_restore_the_outer_target() {
    let src = "With a\nWith b\n.x = 1\nEnd With\n.y = 2\nEnd With";
    assert_eq!(
        js_lines(src),
        vec!["// With a", "// With b", "b.x = 1;", "a.y = 2;"]
    );
}

#[test]
fn type_block_becomes_constructor_and_prototype_slots() {
    let src = "Type Point\nx As Integer\ny As Integer\nEnd Type\nDim p As Point";
    assert_eq!(
        js_lines(src),
        vec![
            "Point = function() {};  // Creates an empty class",
            "Point.prototype.x; // Integer",
            "Point.prototype.y; // Integer",
            "var p = new Point();",
        ]
    );
}

#[test]
fn nested_user_types_are_constructed() {
    let src = "Type Inner\nv As Integer\nEnd Type\nType Outer\ni As Inner\nEnd Type";
    let out = js(src);
    assert!(out.contains("Outer.prototype.i = new Inner();"), "got: {out}");
}

#[test]
fn on_error_goto_wraps_in_try_catch() {
    let src = "Sub T()\nOn Error GoTo Handler\nx = 1\nExit Sub\nHandler:\ny = 2\nEnd Sub";
    assert_eq!(
        js_lines(src),
        vec![
            "function T() {",
            "  try {",
            "    x = 1;",
            "    return;",
            "  } catch(e) { // Handler",
            "    y = 2;",
            "  }",
            "}",
        ]
    );
}

#[test]
fn on_error_resume_next_is_untouched() {
    assert_eq!(
        js_lines("On Error Resume Next"),
        vec!["// On Error Resume Next; // UNTOUCHED"]
    );
}

#[test]
fn on_error_goto_zero_is_untouched() {
    assert_eq!(
        js_lines("On Error GoTo 0"),
        vec!["// On Error GoTo 0; // UNTOUCHED"]
    );
}

#[test]
fn attribute_option_declare_are_untouched() {
    assert_eq!(
        js_lines("Attribute VB_Name = \"Module1\"\nOption Explicit"),
        vec![
            "// Attribute VB_Name = \"Module1\"; // UNTOUCHED",
            "// Option Explicit; // UNTOUCHED",
        ]
    );
}

#[test]
fn file_io_is_untouched() {
    let out = js("Open \"data.txt\" For Input As #1\nClose #1");
    for line in out.lines() {
        assert!(line.starts_with("// "), "got: {line}");
        assert!(line.ends_with("; // UNTOUCHED"), "got: {line}");
    }
}

#[test]
fn labels_are_untouched() {
    let out = js("Start: x = 1");
    assert!(out.starts_with("// Start"), "got: {out}");
    assert!(out.trim_end().ends_with("; // UNTOUCHED"), "got: {out}");
}

#[test]
fn colon_separates_statements_on_one_line() {
    assert_eq!(js_lines("a = 1: b = 2"), vec!["a = 1;", "b = 2;"]);
}

#[test]
fn call_statement_forms() {
    assert_eq!(js_lines("Call Foo"), vec!["Foo();"]);
    assert_eq!(js_lines("Call Foo(1, 2)"), vec!["Foo(1, 2);"]);
}

#[test]
fn bare_name_becomes_a_guessed_call() {
    assert_eq!(js_lines("DoCleanup"), vec!["DoCleanup();"]);
}

#[test]
fn positional_arguments_without_parens() {
    assert_eq!(js_lines("MsgBox msg, 16"), vec!["MsgBox(msg, 16);"]);
}

#[test]
fn set_assignment_drops_the_keyword_and_lifts_new() {
    assert_eq!(
        js_lines("Set x = New Collection"),
        vec!["x = new Collection;"]
    );
}

#[test]
fn array_literal_assignment_records_the_array() {
    let out = js("a = Array(1, 2)\na(1) = 5");
    assert_eq!(
        out.lines().collect::<Vec<_>>(),
        vec!["a = new Array(1, 2);", "a[1] = 5;"]
    );
}

#[test]
fn local_array_names_are_forgotten_after_the_sub() {
    let src = "Sub First()\nDim a(5)\na(1) = 2\nEnd Sub\nSub Second()\na(1) = 2\nEnd Sub";
    let out = js(src);
    assert!(out.contains("a[1] = 2;"), "got: {out}");
    assert!(out.contains("a(1) = 2;"), "got: {out}");
}

#[test]
fn property_blocks_parse_as_functions() {
    let src = "Property Get Value()\nValue = 42\nEnd Property";
    let out = js(src);
    assert!(out.contains("function Get("), "got: {out}");
    assert!(out.contains("return _Get;"), "got: {out}");
}

#[test]
fn braces_balance_across_a_whole_module() {
    let src = "\
Sub Demo(total)
Dim i As Integer
Dim grid(2, 2) As Double
For i = 1 To 10
If i > 5 Then
total = total + i
Else
total = total - i
End If
Next
Do While total > 0
total = total - 1
Loop
Select Case total
Case 0
total = 1
Case Else
total = 2
End Select
While total < 5
total = total + 1
Wend
End Sub";
    let out = js(src);
    let opens = out.matches('{').count();
    let closes = out.matches('}').count();
    assert_eq!(opens, closes, "unbalanced braces in:\n{out}");
}
