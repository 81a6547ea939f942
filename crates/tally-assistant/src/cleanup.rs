//! Text cleanup applied to extracted replies
//!
//! Every [`Rule`] is a pure text transformation. Rules are order-sensitive:
//! later rules assume earlier ones already ran, so a [`Pipeline`] always
//! applies them in the order it was built with.

use std::sync::OnceLock;

use regex::Regex;
use strum::IntoStaticStr;

use crate::extract::FALLBACK_GREETING;

/// Upper bound on full pipeline passes while looking for a fixed point
const MAX_PASSES: usize = 4;

/// Options shared by all rules of a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Join lines with spaces instead of keeping newlines
    pub single_line: bool,
}

/// A single named cleanup step
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Rule {
    /// Bold, heading, code, spoiler and strikethrough markers; links and images
    Markdown,
    /// Escaped math delimiters and stray backslashes
    MathEscapes,
    /// Literal `\n` escapes and whitespace runs
    Whitespace,
    /// Thinking lead-ins and commentary about the user's message
    LeadIns,
    /// Internal dialogue trailing after the answer
    TrailingDialogue,
    /// Parenthetical, bracketed and braced asides, `Send|` markers
    Asides,
    /// Trim, substituting the fallback greeting for nothing presentable
    Finalize,
}

impl Rule {
    /// Full chat reply cleanup, in order
    pub const CHAT: [Self; 7] = [
        Self::Markdown,
        Self::MathEscapes,
        Self::Whitespace,
        Self::LeadIns,
        Self::TrailingDialogue,
        Self::Asides,
        Self::Finalize,
    ];

    /// Light cleanup for image solutions, where math notation must survive
    pub const SOLUTION: [Self; 2] = [Self::Markdown, Self::Whitespace];

    /// Stable name for logs
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Apply this rule to `text`
    pub fn apply(self, text: &str, options: CleanupOptions) -> String {
        match self {
            Self::Markdown => strip_markdown(text),
            Self::MathEscapes => unescape_math(text),
            Self::Whitespace => normalize_whitespace(text, options.single_line),
            Self::LeadIns => strip_lead_ins(text),
            Self::TrailingDialogue => truncate_dialogue(text),
            Self::Asides => remove_asides(text),
            Self::Finalize => finalize(text),
        }
    }
}

/// Ordered list of rules applied to extracted text
#[derive(Debug, Clone)]
pub struct Pipeline {
    rules: Vec<Rule>,
    options: CleanupOptions,
}

impl Pipeline {
    /// Build a pipeline from rules in application order
    pub fn new(rules: impl Into<Vec<Rule>>, options: CleanupOptions) -> Self {
        Self {
            rules: rules.into(),
            options,
        }
    }

    /// Pipeline for chat replies
    pub fn chat(options: CleanupOptions) -> Self {
        Self::new(Rule::CHAT, options)
    }

    /// Pipeline for image solutions
    pub fn solution(options: CleanupOptions) -> Self {
        Self::new(Rule::SOLUTION, options)
    }

    /// Rules in application order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Apply every rule once
    pub fn run_once(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_owned(), |current, rule| rule.apply(&current, self.options))
    }

    /// Apply the pipeline until the text stops changing
    ///
    /// A rule can expose text an earlier rule would have matched (an aside
    /// hiding a lead-in, for example), so passes repeat up to a small bound.
    pub fn clean(&self, text: &str) -> String {
        let mut current = self.run_once(text);

        for pass in 1..MAX_PASSES {
            let next = self.run_once(&current);
            if next == current {
                break;
            }
            tracing::trace!(pass, "cleanup changed text on repeat pass");
            current = next;
        }

        current
    }
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid cleanup regex"))
}

fn strip_markdown(text: &str) -> String {
    static IMAGE: OnceLock<Regex> = OnceLock::new();
    static LINK: OnceLock<Regex> = OnceLock::new();
    static HEADING: OnceLock<Regex> = OnceLock::new();

    let text = cached(&IMAGE, r"!\[[^\]]*\]\([^)]*\)").replace_all(text, "");
    let text = cached(&LINK, r"\[([^\]]*)\]\([^)]*\)").replace_all(&text, "$1");
    let text = cached(&HEADING, r"(?m)^[ \t]*#{1,6}[ \t]+|#{2,}").replace_all(&text, "");

    ["**", "`", "||", "~~"]
        .iter()
        .fold(text.into_owned(), |current, marker| current.replace(marker, ""))
}

fn unescape_math(text: &str) -> String {
    static LATEX_N_COMMAND: OnceLock<Regex> = OnceLock::new();
    static STRAY_BACKSLASH: OnceLock<Regex> = OnceLock::new();

    let text = text
        .replace(r"\(", "(")
        .replace(r"\)", ")")
        .replace(r"\times", "times");

    // Commands starting with `n` would otherwise pass for a `\n` escape
    let text = cached(
        &LATEX_N_COMMAND,
        r"\\(n(?:eq|e|abla|ot|otin|i|u|eg|leq|geq|mid|parallel|subseteq|subset|supseteq|supset|exists)\b)",
    )
    .replace_all(&text, "$1");

    // `\n` escapes are left for the whitespace rule
    cached(&STRAY_BACKSLASH, r"\\([^n]|$)")
        .replace_all(&text, "$1")
        .into_owned()
}

fn normalize_whitespace(text: &str, single_line: bool) -> String {
    static ANY_SPACE: OnceLock<Regex> = OnceLock::new();
    static INLINE_SPACE: OnceLock<Regex> = OnceLock::new();
    static LINE_EDGE: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    if single_line {
        let text = text.replace(r"\n", " ");
        return cached(&ANY_SPACE, r"\s+").replace_all(&text, " ").into_owned();
    }

    let text = text.replace(r"\n", "\n").replace("\r\n", "\n").replace('\r', "\n");
    let text = cached(&INLINE_SPACE, r"[\t\x0B\x0C ]+").replace_all(&text, " ");
    let text = cached(&LINE_EDGE, r" ?\n ?").replace_all(&text, "\n");

    cached(&BLANK_LINES, r"\n{3,}")
        .replace_all(&text, "\n\n")
        .into_owned()
}

fn strip_lead_ins(text: &str) -> String {
    let mut current = text.to_owned();
    let mut stripped = false;

    // Commentary can sit behind an interjection and the other way round
    while let Some(rest) = strip_user_commentary(&current).or_else(|| strip_one_lead_in(&current)) {
        current = rest;
        stripped = true;
    }

    if stripped {
        capitalize_first(&current)
    } else {
        current
    }
}

/// Strip one lead-in phrase at the start, unless nothing would remain
fn strip_one_lead_in(text: &str) -> Option<String> {
    static INTERJECTION: OnceLock<Regex> = OnceLock::new();
    static THINKING: OnceLock<Regex> = OnceLock::new();
    static FRAMING: OnceLock<Regex> = OnceLock::new();
    static HERES: OnceLock<Regex> = OnceLock::new();

    let patterns = [
        cached(&INTERJECTION, r"(?i)^(?:okay|ok|well|sure|alright|first)[,.!:]+\s*"),
        cached(
            &THINKING,
            r"(?i)^(?:i think|let me|i will|i['’]ll|i can|i should|i need to)\b[^.!?\n]*[.!?]+\s+",
        ),
        cached(
            &FRAMING,
            r"(?i)^(?:as an ai(?: language model| assistant)?|based on)\b[^,.!?\n]*,\s*",
        ),
        cached(&HERES, r"(?i)^here(?:['’]s| is)\b[^:\n]*:\s*"),
    ];

    let text = text.trim_start();
    patterns.iter().find_map(|pattern| {
        let matched = pattern.find(text)?;
        let rest = &text[matched.end()..];
        (!rest.trim().is_empty()).then(|| rest.to_owned())
    })
}

/// Remove a leading sentence describing what the user said or asked
///
/// A sentence ends at punctuation followed by whitespace or the end of the
/// text, so decimals like `2.5` stay inside it.
fn strip_user_commentary(text: &str) -> Option<String> {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    static SENTENCE: OnceLock<Regex> = OnceLock::new();

    let patterns = [
        cached(
            &QUOTED,
            r#"(?i)^\s*(?:the user|they)\s+(?:said|wrote|typed|asked|sent)\s*:?\s*(?:"[^"]*"|'[^']*'|“[^”]*”)[.,]?\s*"#,
        ),
        cached(
            &SENTENCE,
            r"(?i)^\s*(?:the user|they)\s+(?:said|asked|wrote|typed|sent|mentioned|wants to know|is asking)\b(?:[^.!?\n]|[.!?]\S)*?[.!?]+(?:\s+|$)",
        ),
    ];

    patterns
        .iter()
        .find_map(|pattern| pattern.find(text).map(|matched| text[matched.end()..].to_owned()))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

fn truncate_dialogue(text: &str) -> String {
    static INNER_MONOLOGUE: OnceLock<Regex> = OnceLock::new();

    cached(
        &INNER_MONOLOGUE,
        r"(?i)\.\s+(?:let me|i will|i['’]ll|i should|maybe)\b",
    )
    .find(text)
    .map_or_else(|| text.to_owned(), |matched| text[..=matched.start()].to_owned())
}

fn remove_asides(text: &str) -> String {
    static PAREN: OnceLock<Regex> = OnceLock::new();
    static BRACKET: OnceLock<Regex> = OnceLock::new();
    static BRACE: OnceLock<Regex> = OnceLock::new();

    let asides = [
        cached(&PAREN, r"\([^()]*\)"),
        cached(&BRACKET, r"\[[^\[\]]*\]"),
        cached(&BRACE, r"\{[^{}]*\}"),
    ];

    let mut current = text.replace("Send|", "");

    // Innermost asides go first, repeat until nested ones are gone
    loop {
        let next = asides
            .iter()
            .fold(current.clone(), |acc, aside| aside.replace_all(&acc, "").into_owned());
        if next == current {
            break;
        }
        current = next;
    }

    if current == text {
        current
    } else {
        tidy_gaps(&current)
    }
}

/// Close the gaps left behind by removed text
fn tidy_gaps(text: &str) -> String {
    static DOUBLE_SPACE: OnceLock<Regex> = OnceLock::new();
    static SPACE_BEFORE_PUNCT: OnceLock<Regex> = OnceLock::new();
    static LINE_EDGE: OnceLock<Regex> = OnceLock::new();

    let text = cached(&DOUBLE_SPACE, r"[\t\x0B\x0C ]{2,}").replace_all(text, " ");
    let text = cached(&SPACE_BEFORE_PUNCT, r" +([.,!?])").replace_all(&text, "$1");

    cached(&LINE_EDGE, r"(?m)^ +| +$")
        .replace_all(&text, "")
        .into_owned()
}

fn finalize(text: &str) -> String {
    static META: OnceLock<Regex> = OnceLock::new();

    let text = text.trim();
    if text.is_empty() || cached(&META, r"(?i)^(?:the user|they|i see|i notice)(?:\s|$)").is_match(text) {
        FALLBACK_GREETING.to_owned()
    } else {
        text.to_owned()
    }
}
