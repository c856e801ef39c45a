// Syntax highlighting for method source
//
// Produces CSS-classed spans so the colours live in the stylesheet.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt::Write;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tera::{try_get_value, Value};
use tracing::warn;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

fn find_syntax(language: &str) -> &'static SyntaxReference {
    SYNTAX_SET
        .find_syntax_by_token(language)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Highlight `code` as `language`, numbering lines from `start_line`.
///
/// The result is a two-column table: line numbers, then code.
pub fn highlight(code: &str, start_line: usize, language: &str) -> String {
    let syntax = find_syntax(language);
    let code_html = match classed_html(code, syntax) {
        Ok(html) => html,
        Err(e) => {
            warn!(language, "highlighting failed, showing plain text: {}", e);
            tera::escape_html(code)
        }
    };

    let lines = code.lines().count().max(1);
    code_table(start_line, lines, &code_html)
}

fn classed_html(code: &str, syntax: &SyntaxReference) -> Result<String, syntect::Error> {
    let terminated;
    let code = if code.ends_with('\n') {
        code
    } else {
        terminated = format!("{}\n", code);
        &terminated
    };

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

#[allow(unused_must_use)]
fn code_table(start_line: usize, lines: usize, code_html: &str) -> String {
    let mut table = String::new();
    write!(&mut table, "<table class=\"highlighttable\"><tr>");

    write!(&mut table, "<td class=\"linenos\"><pre>");
    for number in start_line..start_line + lines {
        if number + 1 < start_line + lines {
            writeln!(&mut table, "{}", number);
        } else {
            write!(&mut table, "{}", number);
        }
    }
    write!(&mut table, "</pre></td>");

    write!(
        &mut table,
        "<td class=\"code\"><div class=\"highlight\"><pre>{}</pre></div></td>",
        code_html.trim_end_matches('\n')
    );
    write!(&mut table, "</tr></table>");
    table
}

/// Tera filter: `{{ code | highlight(lang="python", start=12) }}`
pub fn highlight_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let code = try_get_value!("highlight", "value", String, value);
    let language = args
        .get("lang")
        .and_then(Value::as_str)
        .unwrap_or("python");
    let start = args.get("start").and_then(Value::as_u64).unwrap_or(1) as usize;

    Ok(Value::String(highlight(&code, start, language)))
}
