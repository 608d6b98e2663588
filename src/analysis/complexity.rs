//! Language-aware source metrics
//!
//! A small scanner classifies lines (blank / comment / code) and strips
//! comments and string literals. The stripped token stream then feeds:
//!
//! - decision points (branch keywords, `&&`/`||`, ternaries, match arms)
//! - function declarations (per-family patterns)
//! - Halstead volume, `V = N * log2(n)`
//! - the maintainability index
//!
//! This is a lexical approximation, not a parser. It is stable across runs
//! and cheap enough to apply to every file of a repository.

use crate::models::Language;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static TOKEN: OnceLock<Regex> = OnceLock::new();
static C_FUNCTION: OnceLock<Regex> = OnceLock::new();
static JS_METHOD: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN.get_or_init(|| {
        Regex::new(
            r"[A-Za-z_$][A-Za-z0-9_$]*|\d[\w.]*|&&|\|\||==|!=|<=|>=|=>|->|::|\?\.|\?\?|\+\+|--|[^\sA-Za-z0-9_$]",
        )
        .expect("token pattern is valid")
    })
}

fn c_function_re() -> &'static Regex {
    C_FUNCTION.get_or_init(|| {
        Regex::new(r"^\s*(?:[\w<>\[\],.*&:~]+\s+)+[*&]?[A-Za-z_~][\w:~]*\s*\(")
            .expect("function pattern is valid")
    })
}

fn js_method_re() -> &'static Regex {
    JS_METHOD.get_or_init(|| {
        Regex::new(
            r"^\s*(?:(?:public|private|protected|static|async|get|set|override|readonly)\s+)*([A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::[^{]*)?\{",
        )
        .expect("method pattern is valid")
    })
}

/// Words that look like a call or declaration head but open a statement.
const STATEMENT_WORDS: &[&str] = &[
    "if", "for", "foreach", "while", "switch", "catch", "return", "new", "else", "throw", "case",
    "do", "delete", "sizeof", "using", "lock", "await", "yield",
];

/// How function declarations are recognized.
#[derive(Debug, Clone, Copy)]
enum FunctionStyle {
    /// A declaration keyword token (`def`, `func`, `fn`, ...)
    Keyword(&'static str),
    /// `function`, arrow functions and class methods
    JavaScript,
    /// `type name(args)` heads that do not end in `;`
    CFamily,
}

/// Comment, string and branching syntax of one language family.
#[derive(Debug)]
pub struct Syntax {
    line_comments: &'static [&'static str],
    block_comment: Option<(&'static str, &'static str)>,
    /// (open, close, may span lines)
    strings: &'static [(&'static str, &'static str, bool)],
    decision_keywords: &'static [&'static str],
    ternary: bool,
    match_arms: bool,
    functions: FunctionStyle,
}

const C_STRINGS: &[(&str, &str, bool)] = &[("\"\"\"", "\"\"\"", true), ("\"", "\"", false), ("'", "'", false)];
const C_KEYWORDS: &[&str] = &["if", "for", "foreach", "while", "case", "catch", "elseif"];

static PYTHON: Syntax = Syntax {
    line_comments: &["#"],
    block_comment: None,
    strings: &[
        ("\"\"\"", "\"\"\"", true),
        ("'''", "'''", true),
        ("\"", "\"", false),
        ("'", "'", false),
    ],
    decision_keywords: &["if", "elif", "for", "while", "except", "and", "or", "case"],
    ternary: false,
    match_arms: false,
    functions: FunctionStyle::Keyword("def"),
};

static RUBY: Syntax = Syntax {
    line_comments: &["#"],
    block_comment: Some(("=begin", "=end")),
    strings: &[("\"", "\"", false), ("'", "'", false)],
    decision_keywords: &[
        "if", "elsif", "unless", "while", "until", "for", "when", "rescue", "and", "or",
    ],
    ternary: true,
    match_arms: false,
    functions: FunctionStyle::Keyword("def"),
};

static JAVASCRIPT: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: &[("`", "`", true), ("\"", "\"", false), ("'", "'", false)],
    decision_keywords: C_KEYWORDS,
    ternary: true,
    match_arms: false,
    functions: FunctionStyle::JavaScript,
};

static C_FAMILY: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: C_STRINGS,
    decision_keywords: C_KEYWORDS,
    ternary: true,
    match_arms: false,
    functions: FunctionStyle::CFamily,
};

static PHP: Syntax = Syntax {
    line_comments: &["//", "#"],
    block_comment: Some(("/*", "*/")),
    strings: &[("\"", "\"", false), ("'", "'", false)],
    decision_keywords: C_KEYWORDS,
    ternary: true,
    match_arms: false,
    functions: FunctionStyle::Keyword("function"),
};

static GO: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: &[("`", "`", true), ("\"", "\"", false), ("'", "'", false)],
    decision_keywords: &["if", "for", "case"],
    ternary: false,
    match_arms: false,
    functions: FunctionStyle::Keyword("func"),
};

static RUST: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    // Lifetimes make `'` ambiguous; char literals are left in the code stream
    strings: &[("\"", "\"", true)],
    decision_keywords: &["if", "for", "while"],
    ternary: false,
    match_arms: true,
    functions: FunctionStyle::Keyword("fn"),
};

static KOTLIN: Syntax = Syntax {
    line_comments: &["//"],
    block_comment: Some(("/*", "*/")),
    strings: C_STRINGS,
    decision_keywords: &["if", "for", "while", "when", "catch"],
    ternary: false,
    match_arms: false,
    functions: FunctionStyle::Keyword("fun"),
};

impl Syntax {
    /// Syntax table for a supported language.
    pub fn for_language(language: Language) -> Option<&'static Syntax> {
        let syntax = match language {
            Language::Python => &PYTHON,
            Language::Ruby => &RUBY,
            Language::JavaScript | Language::TypeScript => &JAVASCRIPT,
            Language::Java | Language::CSharp | Language::C | Language::Cpp => &C_FAMILY,
            Language::Php => &PHP,
            Language::Go => &GO,
            Language::Rust => &RUST,
            Language::Kotlin => &KOTLIN,
            _ => return None,
        };
        Some(syntax)
    }
}

/// Line classification of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
}

impl LineCounts {
    pub fn non_blank(&self) -> usize {
        self.code + self.comment
    }
}

/// Metrics of one file in a supported language.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetrics {
    pub lines: LineCounts,
    pub decision_points: usize,
    pub functions: usize,
    /// Mean per-function cyclomatic complexity
    pub complexity: f64,
    pub volume: f64,
    pub maintainability: f64,
}

#[derive(Clone, Copy)]
enum State {
    Code,
    LineComment,
    Block(&'static str),
    Str { close: &'static str, multiline: bool },
}

fn starts_with_at(chars: &[char], i: usize, pat: &str) -> bool {
    let mut j = i;
    for p in pat.chars() {
        if chars.get(j) != Some(&p) {
            return false;
        }
        j += 1;
    }
    true
}

/// Classify lines and produce the code with comments removed and every
/// string literal replaced by a `STR` token. Newlines are preserved.
pub fn strip(source: &str, syntax: &Syntax) -> (LineCounts, String) {
    let chars: Vec<char> = source.chars().collect();
    let mut counts = LineCounts::default();
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut has_code = false;
    let mut has_comment = false;
    let mut line_has_text = false;
    let mut i = 0;

    let mut end_line = |has_code: &mut bool, has_comment: &mut bool, text: &mut bool| {
        if !*text {
            counts.blank += 1;
        } else if *has_code {
            counts.code += 1;
        } else if *has_comment {
            counts.comment += 1;
        } else {
            counts.blank += 1;
        }
        *has_code = false;
        *has_comment = false;
        *text = false;
    };

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            end_line(&mut has_code, &mut has_comment, &mut line_has_text);
            out.push('\n');
            state = match state {
                State::LineComment => State::Code,
                State::Str { multiline: false, .. } => State::Code,
                other => other,
            };
            i += 1;
            continue;
        }
        if !c.is_whitespace() {
            line_has_text = true;
        }

        match state {
            State::Code => {
                if let Some((open, close)) = syntax.block_comment {
                    if starts_with_at(&chars, i, open) {
                        state = State::Block(close);
                        has_comment = true;
                        out.push(' ');
                        i += open.chars().count();
                        continue;
                    }
                }
                if let Some(tok) = syntax.line_comments.iter().find(|t| starts_with_at(&chars, i, t)) {
                    state = State::LineComment;
                    has_comment = true;
                    i += tok.chars().count();
                    continue;
                }
                if let Some((open, close, multiline)) =
                    syntax.strings.iter().find(|(open, _, _)| starts_with_at(&chars, i, open))
                {
                    state = State::Str {
                        close: *close,
                        multiline: *multiline,
                    };
                    has_code = true;
                    out.push_str(" STR ");
                    i += open.chars().count();
                    continue;
                }
                if !c.is_whitespace() {
                    has_code = true;
                }
                out.push(c);
                i += 1;
            }
            State::LineComment => {
                i += 1;
            }
            State::Block(close) => {
                has_comment = true;
                if starts_with_at(&chars, i, close) {
                    state = State::Code;
                    out.push(' ');
                    i += close.chars().count();
                } else {
                    i += 1;
                }
            }
            State::Str { close, .. } => {
                has_code = true;
                if c == '\\' && chars.get(i + 1) != Some(&'\n') {
                    i += 2;
                } else if starts_with_at(&chars, i, close) {
                    state = State::Code;
                    i += close.chars().count();
                } else {
                    i += 1;
                }
            }
        }
    }

    if line_has_text {
        end_line(&mut has_code, &mut has_comment, &mut line_has_text);
    }
    (counts, out)
}

/// Tokens of stripped code.
fn tokenize(stripped: &str) -> Vec<&str> {
    token_re().find_iter(stripped).map(|m| m.as_str()).collect()
}

fn count_decisions(tokens: &[&str], syntax: &Syntax) -> usize {
    tokens
        .iter()
        .filter(|t| match **t {
            "&&" | "||" => true,
            "?" => syntax.ternary,
            "=>" => syntax.match_arms,
            word => syntax.decision_keywords.contains(&word),
        })
        .count()
}

fn count_functions(stripped: &str, tokens: &[&str], syntax: &Syntax) -> usize {
    match syntax.functions {
        FunctionStyle::Keyword(keyword) => tokens.iter().filter(|t| **t == keyword).count(),
        FunctionStyle::JavaScript => {
            let declared = tokens.iter().filter(|t| matches!(**t, "function" | "=>")).count();
            let methods = stripped
                .lines()
                .filter_map(|line| js_method_re().captures(line))
                .filter(|caps| {
                    caps.get(1)
                        .is_some_and(|name| !STATEMENT_WORDS.contains(&name.as_str()) && name.as_str() != "function")
                })
                .count();
            declared + methods
        }
        FunctionStyle::CFamily => stripped
            .lines()
            .filter(|line| {
                let trimmed = line.trim_end();
                if trimmed.ends_with(';') || !c_function_re().is_match(line) {
                    return false;
                }
                let first = line.split(|c: char| !c.is_alphanumeric() && c != '_').find(|w| !w.is_empty());
                !first.is_some_and(|w| STATEMENT_WORDS.contains(&w))
            })
            .count(),
    }
}

/// Halstead volume `N * log2(n)` of a token stream.
pub fn halstead_volume(tokens: &[&str]) -> f64 {
    let total = tokens.len() as f64;
    let distinct = tokens.iter().collect::<HashSet<_>>().len() as f64;
    if distinct < 2.0 {
        return 0.0;
    }
    total * distinct.log2()
}

/// Maintainability index on a 0-100 scale.
///
/// `(171 - 5.2 ln V - 0.23 CC - 16.2 ln SLOC + 50 sin(sqrt(2.46 * rad(C%)))) * 100 / 171`,
/// clamped. Empty or token-free code scores 100.
pub fn maintainability_index(volume: f64, complexity: f64, sloc: usize, comment_pct: f64) -> f64 {
    if volume <= 0.0 || sloc == 0 {
        return 100.0;
    }
    let comment_term = 50.0 * (2.46 * comment_pct.clamp(0.0, 100.0).to_radians()).sqrt().sin();
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * complexity - 16.2 * (sloc as f64).ln() + comment_term;
    (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}

/// Measure one file. `None` when the language has no syntax table.
pub fn measure(source: &str, language: Language) -> Option<SourceMetrics> {
    let syntax = Syntax::for_language(language)?;
    let (lines, stripped) = strip(source, syntax);
    let tokens = tokenize(&stripped);

    let decision_points = count_decisions(&tokens, syntax);
    let functions = count_functions(&stripped, &tokens, syntax);
    let complexity = 1.0 + decision_points as f64 / functions.max(1) as f64;
    let volume = halstead_volume(&tokens);

    let comment_pct = if lines.non_blank() == 0 {
        0.0
    } else {
        lines.comment as f64 / lines.non_blank() as f64 * 100.0
    };
    let maintainability = maintainability_index(volume, complexity, lines.code, comment_pct);

    Some(SourceMetrics {
        lines,
        decision_points,
        functions,
        complexity,
        volume,
        maintainability,
    })
}

/// Non-blank line count, for languages without a syntax table.
pub fn count_non_blank(source: &str) -> usize {
    source.lines().filter(|l| !l.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_line_classification() {
        let src = "# header\n\ndef f(x):\n    \"\"\"Doc\n    string\"\"\"\n    return x  # trailing\n";
        let m = measure(src, Language::Python).unwrap();
        assert_eq!(m.lines.comment, 1);
        assert_eq!(m.lines.blank, 1);
        assert_eq!(m.lines.code, 4);
        assert_eq!(m.functions, 1);
    }

    #[test]
    fn test_block_comments_and_strings_are_stripped() {
        let src = "/* if (a && b) */\nint f(int a) {\n    char *s = \"if || for\";\n    return a;\n}\n";
        let (lines, stripped) = strip(src, Syntax::for_language(Language::C).unwrap());
        assert_eq!(lines.comment, 1);
        assert_eq!(lines.code, 4);
        assert!(!stripped.contains("if"));
        assert!(!stripped.contains("||"));

        let m = measure(src, Language::C).unwrap();
        assert_eq!(m.decision_points, 0);
        assert_eq!(m.functions, 1);
        assert_eq!(m.complexity, 1.0);
    }

    #[test]
    fn test_decision_points_per_function() {
        let src = "\
def a(x):
    if x and x > 1:
        return 1
    return 0

def b(xs):
    for x in xs:
        if x:
            return x
";
        let m = measure(src, Language::Python).unwrap();
        assert_eq!(m.functions, 2);
        assert_eq!(m.decision_points, 4);
        assert!((m.complexity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_go_and_rust_branching() {
        let go = "package main\n\nfunc f(a int) int {\n\tif a > 0 && a < 9 {\n\t\treturn 1\n\t}\n\treturn 0\n}\n";
        let m = measure(go, Language::Go).unwrap();
        assert_eq!(m.functions, 1);
        assert_eq!(m.decision_points, 2);

        let rust = "fn f(a: Option<u8>) -> u8 {\n    match a {\n        Some(v) => v,\n        None => 0,\n    }\n}\n";
        let m = measure(rust, Language::Rust).unwrap();
        assert_eq!(m.functions, 1);
        assert_eq!(m.decision_points, 2);
    }

    #[test]
    fn test_javascript_functions() {
        let src = "function a() { return 1; }\nconst b = (x) => x ? 1 : 2;\nclass C {\n  run(x) {\n    if (x) { return 1; }\n  }\n}\n";
        let m = measure(src, Language::JavaScript).unwrap();
        assert_eq!(m.functions, 3);
        assert_eq!(m.decision_points, 2);
    }

    #[test]
    fn test_c_family_ignores_calls_and_control_flow() {
        let src = "public int Run(int a) {\n    if (a > 0) {\n        Helper(a);\n    }\n    return Compute(a);\n}\n";
        let m = measure(src, Language::Java).unwrap();
        assert_eq!(m.functions, 1);
        assert_eq!(m.decision_points, 1);
    }

    #[test]
    fn test_maintainability_bounds() {
        assert_eq!(maintainability_index(0.0, 1.0, 10, 0.0), 100.0);
        assert_eq!(maintainability_index(100.0, 1.0, 0, 0.0), 100.0);
        let huge = maintainability_index(1e12, 500.0, 1_000_000, 0.0);
        assert_eq!(huge, 0.0);
        let mid = maintainability_index(500.0, 3.0, 50, 10.0);
        assert!(mid > 0.0 && mid < 100.0);
    }

    #[test]
    fn test_more_decisions_never_raise_maintainability() {
        let plain = measure("x = a + b\n", Language::Python).unwrap();
        let branchy = measure("x = a and b\n", Language::Python).unwrap();
        assert_eq!(plain.volume, branchy.volume);
        assert!(branchy.complexity > plain.complexity);
        assert!(branchy.maintainability <= plain.maintainability);
    }

    #[test]
    fn test_unsupported_language() {
        assert!(measure("<html></html>", Language::Html).is_none());
        assert_eq!(count_non_blank("a\n\n  \nb\n"), 2);
    }
}
