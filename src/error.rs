use color_print::ceprintln;

use crate::ast::Loc;
use crate::source::Source;

/// Diagnostic class, as surfaced to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Lexical,
    Syntax,
    Type,
    Scope,
    Semantic,
}

impl ErrorClass {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorClass::Lexical => "Lexical",
            ErrorClass::Syntax => "Syntax",
            ErrorClass::Type => "Type",
            ErrorClass::Scope => "Scope",
            ErrorClass::Semantic => "Semantic",
        }
    }

    /// Fixed guidance shown with every diagnostic of this class.
    fn hint(&self) -> &'static str {
        match self {
            ErrorClass::Lexical => {
                "this occurs during tokenization; check for invalid characters or malformed literals"
            }
            ErrorClass::Syntax => "check your syntax - missing semicolon, brace, or incorrect keyword?",
            ErrorClass::Type => "type mismatch detected; verify variable types match their usage",
            ErrorClass::Scope => "name not found; did you declare it, and is it in the correct scope?",
            ErrorClass::Semantic => "semantic analysis found a logic issue in the program",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub class: ErrorClass,
    pub message: String,
    pub loc: Loc,
    /// Extra context line, e.g. the offending types.
    pub context: Option<String>,
    /// "did you mean" candidate.
    pub suggestion: Option<String>,
}

/// Append-only error log. Errors are accumulated, printed in discovery order
/// at the end of compilation, and only then fail the compile.
#[derive(Debug, Default)]
pub struct DiagLog {
    diags: Vec<Diagnostic>,
}

impl DiagLog {
    pub fn new() -> Self {
        Self { diags: Vec::new() }
    }

    pub fn error(&mut self, class: ErrorClass, loc: Loc, message: impl Into<String>) {
        self.diags.push(Diagnostic {
            class,
            message: message.into(),
            loc,
            context: None,
            suggestion: None,
        });
    }

    pub fn error_with(
        &mut self,
        class: ErrorClass,
        loc: Loc,
        message: impl Into<String>,
        context: Option<String>,
        suggestion: Option<String>,
    ) {
        self.diags.push(Diagnostic {
            class,
            message: message.into(),
            loc,
            context,
            suggestion,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.diags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    /// Render every accumulated diagnostic to stderr.
    pub fn dump(&self, source: &Source, path: &str) {
        if self.diags.is_empty() {
            return;
        }
        ceprintln!(
            "<red,bold>compilation failed</>: {} error(s) found",
            self.diags.len()
        );
        for d in &self.diags {
            print_diag(d, source, path);
        }
    }
}

fn print_diag(d: &Diagnostic, source: &Source, path: &str) {
    eprintln!();
    match d.class {
        ErrorClass::Lexical | ErrorClass::Syntax => {
            ceprintln!("<red,bold>{} error</>: {}", d.class.name(), d.message)
        }
        _ => ceprintln!("<yellow,bold>{} error</>: {}", d.class.name(), d.message),
    }
    if d.loc.line > 0 {
        ceprintln!("  <blue>--></> {}:{}:{}", path, d.loc.line, d.loc.col);
        if let Some(text) = source.line_text(d.loc.line as usize) {
            ceprintln!("   <blue>|</>");
            ceprintln!("   <blue>|</> {}", text);
            ceprintln!(
                "   <blue>|</> {}<red,bold>^</>",
                Source::caret_pad(text, d.loc.col as usize)
            );
        }
    } else {
        ceprintln!("  <blue>--></> {}", path);
    }
    if let Some(ctx) = &d.context {
        ceprintln!("   <blue>=</> <cyan>context</>: {}", ctx);
    }
    if let Some(sug) = &d.suggestion {
        ceprintln!("   <blue>=</> <green>help</>: did you mean '<cyan>{}</>'?", sug);
    }
    ceprintln!("   <blue>=</> <cyan>hint</>: {}", d.class.hint());
}

/// Report an internal invariant violation and abort with exit code 2.
pub fn internal_error(msg: &str) -> ! {
    ceprintln!("<red,bold>internal error</>: {}", msg);
    std::process::exit(2);
}

/// Edit distance used for "did you mean" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Pick the closest candidate to `target`. Only suggests when the distance is
/// at most 2 and strictly less than the target length.
pub fn closest_match<'a, I>(target: &str, options: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    if target.is_empty() {
        return None;
    }
    let mut best: Option<(usize, &str)> = None;
    for opt in options {
        let dist = levenshtein(target, opt);
        if best.map(|(d, _)| dist < d).unwrap_or(true) {
            best = Some((dist, opt));
        }
    }
    match best {
        Some((dist, name)) if dist <= 2 && dist < target.chars().count() => {
            Some(name.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn suggestion_respects_distance_bound() {
        let names = ["counter", "count", "main"];
        let opts = || names.iter().copied();
        assert_eq!(closest_match("countr", opts()), Some("counter".to_string()));
        assert_eq!(closest_match("cout", opts()), Some("count".to_string()));
        assert_eq!(closest_match("zzzzzz", opts()), None);
    }

    #[test]
    fn suggestion_must_beat_identifier_length() {
        // distance 2 but target only 2 chars long: no suggestion.
        assert_eq!(closest_match("ab", ["cd"]), None);
        assert_eq!(closest_match("abcd", ["abxy"]), Some("abxy".to_string()));
    }

    #[test]
    fn log_accumulates_in_order() {
        let mut log = DiagLog::new();
        assert!(!log.has_errors());
        log.error(ErrorClass::Syntax, Loc::new(1, 1), "first");
        log.error(ErrorClass::Type, Loc::new(2, 1), "second");
        assert!(log.has_errors());
        let msgs: Vec<&str> = log.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, vec!["first", "second"]);
    }
}
