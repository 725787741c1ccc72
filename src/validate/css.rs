//! Stylesheet validation and pretty-printing.
//!
//! Parsing is strict: any rule or declaration the tokenizer cannot make sense
//! of rejects the whole stylesheet instead of being skipped the way a browser
//! would. Comments are not carried into the output.

use cssparser::{
    AtRuleParser, BasicParseErrorKind, CowRcStr, DeclarationParser, ParseError, ParseErrorKind,
    Parser, ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
    StyleSheetParser, ToCss, Token,
};

use super::ValidationError;

const INDENT: &str = "  ";

/// At-rules whose block holds further rules rather than declarations.
const GROUPING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "-moz-document",
    "layer",
    "container",
    "scope",
    "starting-style",
    "keyframes",
    "-webkit-keyframes",
    "-moz-keyframes",
];

/// Validate a stylesheet and reformat it.
///
/// Each rule is written as its selectors (one per line), an opening brace,
/// one indented `name: value;` line per declaration and a closing brace.
/// Consecutive blocks are separated by a blank line. There is no trailing
/// newline.
pub fn prettify_css(source: &str) -> Result<String, ValidationError> {
    let mut input = ParserInput::new(source);
    check_terminated(&mut Parser::new(&mut input)).map_err(stylesheet_error)?;

    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let rules = parse_rule_list(&mut parser).map_err(stylesheet_error)?;

    let mut out = String::new();
    write_rules(&mut out, &rules, 0);
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    name: String,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CssRule {
    Style {
        selectors: Vec<String>,
        declarations: Vec<Declaration>,
    },
    /// `@import url(x.css);` and other block-less at-rules.
    Statement { name: String, prelude: String },
    Group {
        name: String,
        prelude: String,
        rules: Vec<CssRule>,
    },
    Descriptors {
        name: String,
        prelude: String,
        declarations: Vec<Declaration>,
    },
}

/// Custom failures raised by the rule parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StyleIssue {
    EmptySelector,
    EmptyValue(String),
    Serialize,
    /// A block, string, comment or `url(` ran into the end of the input.
    Unterminated(&'static str),
}

type StyleParseError<'i> = ParseError<'i, StyleIssue>;

fn parse_rule_list<'i>(parser: &mut Parser<'i, '_>) -> Result<Vec<CssRule>, StyleParseError<'i>> {
    let mut rule_parser = RuleListParser;
    let mut rules = Vec::new();
    for result in StyleSheetParser::new(parser, &mut rule_parser) {
        rules.push(result.map_err(|(error, _slice)| error)?);
    }
    Ok(rules)
}

fn parse_declarations<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<Vec<Declaration>, StyleParseError<'i>> {
    let mut decl_parser = DeclarationListParser;
    let mut declarations = Vec::new();
    for result in RuleBodyParser::new(parser, &mut decl_parser) {
        declarations.push(result.map_err(|(error, _slice)| error)?);
    }
    Ok(declarations)
}

/// Reject input that only parses because the tokenizer closes whatever is
/// still open at the end of the input.
fn check_terminated<'i>(input: &mut Parser<'i, '_>) -> Result<(), StyleParseError<'i>> {
    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        let what = match token {
            Token::Function(_) | Token::ParenthesisBlock => "parenthesis",
            Token::SquareBracketBlock => "bracket",
            Token::CurlyBracketBlock => "block",
            Token::QuotedString(_) => {
                let raw = input.slice_from(start);
                let quote = if raw.starts_with('\'') { "'" } else { "\"" };
                if raw.len() < 2 || !ends_unescaped(raw, quote) {
                    return Err(input.new_custom_error(StyleIssue::Unterminated("string")));
                }
                continue;
            }
            Token::UnquotedUrl(_) => {
                if !ends_unescaped(input.slice_from(start), ")") {
                    return Err(input.new_custom_error(StyleIssue::Unterminated("url(")));
                }
                continue;
            }
            Token::Comment(_) => {
                let raw = input.slice_from(start);
                if raw.len() < 4 || !raw.ends_with("*/") {
                    return Err(input.new_custom_error(StyleIssue::Unterminated("comment")));
                }
                continue;
            }
            _ => continue,
        };
        // A block closed by the end of input leaves nothing after its content.
        let content_end = input.parse_nested_block(|nested| {
            check_terminated(nested)?;
            Ok(nested.position())
        })?;
        if input.position() == content_end {
            return Err(input.new_custom_error(StyleIssue::Unterminated(what)));
        }
    }
}

/// Whether `raw` ends with `terminator` that is not itself escaped.
fn ends_unescaped(raw: &str, terminator: &str) -> bool {
    let Some(body) = raw.strip_suffix(terminator) else {
        return false;
    };
    let backslashes = body.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 0
}

/// Parser for a list of rules, at the top level or inside a grouping at-rule.
struct RuleListParser;

/// Name and prelude of an at-rule, kept until its body (if any) is known.
struct AtPrelude {
    name: String,
    prelude: String,
}

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = AtPrelude;
    type AtRule = CssRule;
    type Error = StyleIssue;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, StyleParseError<'i>> {
        let mut prelude = String::new();
        serialize_tokens(input, &mut prelude)?;
        Ok(AtPrelude {
            name: name.to_ascii_lowercase(),
            prelude: prelude.trim_end().to_string(),
        })
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(CssRule::Statement {
            name: prelude.name,
            prelude: prelude.prelude,
        })
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, StyleParseError<'i>> {
        if GROUPING_AT_RULES.contains(&prelude.name.as_str()) {
            Ok(CssRule::Group {
                name: prelude.name,
                prelude: prelude.prelude,
                rules: parse_rule_list(input)?,
            })
        } else {
            Ok(CssRule::Descriptors {
                name: prelude.name,
                prelude: prelude.prelude,
                declarations: parse_declarations(input)?,
            })
        }
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = Vec<String>;
    type QualifiedRule = CssRule;
    type Error = StyleIssue;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, StyleParseError<'i>> {
        input.parse_comma_separated(|input| {
            let mut selector = String::new();
            serialize_tokens(input, &mut selector)?;
            let selector = selector.trim_end().to_string();
            if selector.is_empty() {
                return Err(input.new_custom_error(StyleIssue::EmptySelector));
            }
            Ok(selector)
        })
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, StyleParseError<'i>> {
        Ok(CssRule::Style {
            selectors: prelude,
            declarations: parse_declarations(input)?,
        })
    }
}

/// Parser for the `name: value;` list inside a rule block.
struct DeclarationListParser;

impl<'i> AtRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = StyleIssue;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, StyleParseError<'i>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleInvalid(name)))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, StyleParseError<'i>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = StyleIssue;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, StyleParseError<'i>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, StyleParseError<'i>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser {
    type Declaration = Declaration;
    type Error = StyleIssue;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, StyleParseError<'i>> {
        let mut value = String::new();
        serialize_tokens(input, &mut value)?;
        let value = value.trim_end().to_string();
        if value.is_empty() {
            return Err(input.new_custom_error(StyleIssue::EmptyValue(name.to_string())));
        }
        Ok(Declaration {
            name: name.to_string(),
            value,
        })
    }
}

impl<'i> RuleBodyItemParser<'i, Declaration, StyleIssue> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Re-serialize the remaining tokens of `input`, collapsing whitespace runs
/// into single spaces. Leading whitespace is skipped.
fn serialize_tokens<'i>(
    input: &mut Parser<'i, '_>,
    out: &mut String,
) -> Result<(), StyleParseError<'i>> {
    while let Ok(token) = input.next_including_whitespace() {
        let token = token.clone();
        let closing = match token {
            Token::WhiteSpace(_) => {
                if !out.is_empty() && !out.ends_with([' ', '(', '[']) {
                    out.push(' ');
                }
                continue;
            }
            Token::Function(_) | Token::ParenthesisBlock => Some(')'),
            Token::SquareBracketBlock => Some(']'),
            Token::CurlyBracketBlock => Some('}'),
            Token::BadUrl(_)
            | Token::BadString(_)
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::CloseCurlyBracket => return Err(input.new_unexpected_token_error(token)),
            _ => None,
        };
        if token.to_css(out).is_err() {
            return Err(input.new_custom_error(StyleIssue::Serialize));
        }
        if let Some(close) = closing {
            input.parse_nested_block(|nested| serialize_tokens(nested, out))?;
            if out.ends_with(' ') {
                out.pop();
            }
            out.push(close);
        }
    }
    Ok(())
}

fn write_rules(out: &mut String, rules: &[CssRule], depth: usize) {
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        write_rule(out, rule, depth);
    }
}

fn write_rule(out: &mut String, rule: &CssRule, depth: usize) {
    let indent = INDENT.repeat(depth);
    match rule {
        CssRule::Style {
            selectors,
            declarations,
        } => {
            let separator = format!(",\n{indent}");
            out.push_str(&indent);
            out.push_str(&selectors.join(&separator));
            write_declarations(out, declarations, depth);
        }
        CssRule::Statement { name, prelude } => {
            out.push_str(&indent);
            out.push_str(&at_rule_header(name, prelude));
            out.push(';');
        }
        CssRule::Group {
            name,
            prelude,
            rules,
        } => {
            out.push_str(&indent);
            out.push_str(&at_rule_header(name, prelude));
            out.push_str(" {\n");
            write_rules(out, rules, depth + 1);
            out.push('\n');
            out.push_str(&indent);
            out.push('}');
        }
        CssRule::Descriptors {
            name,
            prelude,
            declarations,
        } => {
            out.push_str(&indent);
            out.push_str(&at_rule_header(name, prelude));
            write_declarations(out, declarations, depth);
        }
    }
}

fn at_rule_header(name: &str, prelude: &str) -> String {
    if prelude.is_empty() {
        format!("@{name}")
    } else {
        format!("@{name} {prelude}")
    }
}

fn write_declarations(out: &mut String, declarations: &[Declaration], depth: usize) {
    let indent = INDENT.repeat(depth);
    out.push_str(" {\n");
    for declaration in declarations {
        out.push_str(&indent);
        out.push_str(INDENT);
        out.push_str(&declaration.name);
        out.push_str(": ");
        out.push_str(&declaration.value);
        out.push_str(";\n");
    }
    out.push_str(&indent);
    out.push('}');
}

fn stylesheet_error(error: StyleParseError<'_>) -> ValidationError {
    let message = match &error.kind {
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected token {}", token.to_css_string())
        }
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            "unexpected end of input".to_string()
        }
        ParseErrorKind::Basic(BasicParseErrorKind::AtRuleInvalid(name)) => {
            format!("invalid at-rule @{}", &**name)
        }
        ParseErrorKind::Basic(BasicParseErrorKind::AtRuleBodyInvalid) => {
            "invalid at-rule body".to_string()
        }
        ParseErrorKind::Basic(BasicParseErrorKind::QualifiedRuleInvalid) => {
            "invalid rule".to_string()
        }
        ParseErrorKind::Custom(StyleIssue::EmptySelector) => "empty selector".to_string(),
        ParseErrorKind::Custom(StyleIssue::EmptyValue(name)) => {
            format!("missing value for property {name}")
        }
        ParseErrorKind::Custom(StyleIssue::Serialize) => "could not serialize token".to_string(),
        ParseErrorKind::Custom(StyleIssue::Unterminated(what)) => format!("unterminated {what}"),
    };
    ValidationError::Stylesheet {
        line: error.location.line + 1,
        column: error.location.column,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prettify_reformats_rules() {
        let source = "h1 {
      text-align: center;
    }
    p {
      font-family: sans-serif;
    }";
        assert_eq!(
            prettify_css(source).unwrap(),
            "h1 {\n  text-align: center;\n}\n\np {\n  font-family: sans-serif;\n}"
        );
    }

    #[test]
    fn test_prettify_collapses_whitespace() {
        let source = "body{margin:0   auto;font-family:Georgia ,  serif}";
        assert_eq!(
            prettify_css(source).unwrap(),
            "body {\n  margin: 0 auto;\n  font-family: Georgia , serif;\n}"
        );
    }

    #[test]
    fn test_prettify_splits_selector_lists() {
        assert_eq!(
            prettify_css("h1,h2 , h3>em{color:red}").unwrap(),
            "h1,\nh2,\nh3>em {\n  color: red;\n}"
        );
    }

    #[test]
    fn test_prettify_keeps_functions_and_important() {
        assert_eq!(
            prettify_css("a { color: rgb( 1, 2, 3 ) !important; background: url(img.png) }")
                .unwrap(),
            "a {\n  color: rgb(1, 2, 3) !important;\n  background: url(img.png);\n}"
        );
    }

    #[test]
    fn test_prettify_nested_media_block() {
        assert_eq!(
            prettify_css("@media screen and (min-width: 30em) { p { margin: 0 } }").unwrap(),
            "@media screen and (min-width: 30em) {\n  p {\n    margin: 0;\n  }\n}"
        );
    }

    #[test]
    fn test_prettify_statement_and_descriptor_at_rules() {
        let source = "@import url(\"base.css\");@font-face{font-family:Serif;src:url(f.woff)}";
        assert_eq!(
            prettify_css(source).unwrap(),
            "@import url(\"base.css\");\n\n@font-face {\n  font-family: Serif;\n  src: url(f.woff);\n}"
        );
    }

    #[test]
    fn test_prettify_drops_comments() {
        assert_eq!(
            prettify_css("/* heading */ h1 { color: red; /* why */ }").unwrap(),
            "h1 {\n  color: red;\n}"
        );
    }

    #[test]
    fn test_prettify_empty_stylesheet() {
        assert_eq!(prettify_css("").unwrap(), "");
        assert_eq!(prettify_css("  \n ").unwrap(), "");
    }

    #[test]
    fn test_prettify_is_idempotent() {
        let once = prettify_css("h1{color:red}@media print{h1{color:black}}").unwrap();
        assert_eq!(prettify_css(&once).unwrap(), once);
    }

    #[test]
    fn test_rejects_plain_text() {
        let err = prettify_css("This is not valid CSS").unwrap_err();
        assert!(matches!(err, ValidationError::Stylesheet { .. }));
    }

    #[test]
    fn test_rejects_malformed_declarations() {
        assert!(prettify_css("p { color red }").is_err());
        assert!(prettify_css("p { color: ; }").is_err());
        assert!(prettify_css("p { color: red; ) }").is_err());
    }

    #[test]
    fn test_rejects_rule_without_selector() {
        assert!(prettify_css("{ color: red }").is_err());
        assert!(prettify_css("h1, { color: red }").is_err());
    }

    #[test]
    fn test_rejects_truncated_input() {
        for source in [
            "p { color: red",
            "p { content: \"abc",
            "p { content: 'abc\\'",
            "@media print { p { color: red }",
            "p { color: rgb(1, 2, 3 }",
            "p { background: url(a.png }",
            "p { color: red } /* trailing",
            "a[href { color: red }",
            "p { color: red\\}",
        ] {
            let err = prettify_css(source).unwrap_err();
            assert!(err.to_string().contains("unterminated"), "{source}: {err}");
        }
    }

    #[test]
    fn test_accepts_closers_inside_strings_and_comments() {
        assert_eq!(
            prettify_css("p { content: \"}\" } /* ) */").unwrap(),
            "p {\n  content: \"}\";\n}"
        );
        assert!(prettify_css("p { background: url(a.png) }").is_ok());
        assert!(prettify_css("p { content: 'it\\'s' }").is_ok());
    }

    #[test]
    fn test_error_reports_line() {
        let err = prettify_css("h1 { color: red }\np { color blue }").unwrap_err();
        match err {
            ValidationError::Stylesheet { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
