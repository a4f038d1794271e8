//! Shell-style filename patterns.
//!
//! Matches the `fnmatch` dialect used by the pipeline's file conventions:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character in the set or range
//! - `[!abc]` matches one character NOT in the set
//!
//! No brace expansion and no path awareness: `*` crosses `/`.

/// Work bound for the backtracking matcher.
const MAX_MATCH_CALLS: usize = 100_000;

/// Match `input` against `pattern`, anchored at both ends.
pub fn glob_match(pattern: &str, input: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let inp: Vec<char> = input.chars().collect();
    let mut calls = 0usize;
    match_bounded(&pat, 0, &inp, 0, &mut calls)
}

fn match_bounded(
    pattern: &[char],
    pi: usize,
    input: &[char],
    ii: usize,
    calls: &mut usize,
) -> bool {
    *calls += 1;
    if *calls > MAX_MATCH_CALLS {
        return false;
    }

    if pi >= pattern.len() {
        return ii >= input.len();
    }

    match pattern[pi] {
        '*' => {
            let mut next_pi = pi;
            while next_pi < pattern.len() && pattern[next_pi] == '*' {
                next_pi += 1;
            }
            if next_pi >= pattern.len() {
                return true;
            }
            (ii..=input.len()).any(|start| match_bounded(pattern, next_pi, input, start, calls))
        }
        '?' => ii < input.len() && match_bounded(pattern, pi + 1, input, ii + 1, calls),
        '[' => {
            if ii >= input.len() {
                return false;
            }
            match match_class(pattern, pi, input[ii]) {
                Some((true, next_pi)) => match_bounded(pattern, next_pi, input, ii + 1, calls),
                Some((false, _)) => false,
                // Unterminated class: '[' is literal
                None => input[ii] == '[' && match_bounded(pattern, pi + 1, input, ii + 1, calls),
            }
        }
        c => ii < input.len() && input[ii] == c && match_bounded(pattern, pi + 1, input, ii + 1, calls),
    }
}

/// Evaluate a `[...]` class starting at `pattern[start] == '['`.
///
/// Returns `(matched, index after ']')`, or `None` when the class is not
/// terminated.
fn match_class(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = i < pattern.len() && (pattern[i] == '!' || pattern[i] == '^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pattern.len() {
        // ']' directly after the opening bracket is a literal member
        if pattern[i] == ']' && !first {
            return Some((matched != negate, i + 1));
        }
        first = false;
        if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']' {
            if pattern[i] <= c && c <= pattern[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if pattern[i] == c {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

/// Inclusion pattern plus exclusion patterns, applied exclusion-first.
#[derive(Debug, Clone)]
pub struct NameFilter {
    include: String,
    exclude: Vec<String>,
}

impl NameFilter {
    pub fn new(include: impl Into<String>) -> Self {
        Self {
            include: include.into(),
            exclude: Vec::new(),
        }
    }

    /// `*.{ext}` with the standard sex-chromosome and pooled-result
    /// exclusions.
    pub fn for_extension(ext: &str) -> Self {
        Self::new(format!("*.{}", ext.trim_start_matches('.')))
            .exclude(X_CHROMOSOME_MARKER)
            .exclude(ALL_CHROMOSOMES_MARKER)
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.exclude.iter().any(|p| glob_match(p, name)) {
            return false;
        }
        glob_match(&self.include, name)
    }
}

/// Files holding an X-chromosome-only result.
pub const X_CHROMOSOME_MARKER: &str = "*_X*";

/// Files holding a result already pooled over all chromosomes.
pub const ALL_CHROMOSOMES_MARKER: &str = "*_all_chrs*";
