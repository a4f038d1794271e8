//! Shell command assembly.
//!
//! Arguments are appended in order and rendered space-separated. Words
//! containing shell metacharacters are single-quoted; ordinary paths and
//! numbers render verbatim.

use std::fmt::Display;
use std::path::Path;

/// Flag forwarded to external programs that skip existing outputs on
/// their own.
pub const FORCE_FLAG: &str = "-f";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    words: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Display) -> Self {
        Self {
            words: vec![program.to_string()],
        }
    }

    pub fn arg(mut self, value: impl Display) -> Self {
        self.words.push(value.to_string());
        self
    }

    pub fn path(self, path: &Path) -> Self {
        self.arg(path.display())
    }

    pub fn opt(self, flag: &str, value: impl Display) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn opt_path(self, flag: &str, path: &Path) -> Self {
        self.arg(flag).path(path)
    }

    /// `flag value` only when `value` is present.
    pub fn opt_some<T: Display>(self, flag: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.opt(flag, v),
            None => self,
        }
    }

    pub fn flag_if(self, flag: &str, on: bool) -> Self {
        if on {
            self.arg(flag)
        } else {
            self
        }
    }

    pub fn render(&self) -> String {
        self.words
            .iter()
            .map(|w| quote(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run `steps` in order, stopping at the first failure.
pub fn chain(steps: &[CommandLine]) -> String {
    steps
        .iter()
        .map(CommandLine::render)
        .collect::<Vec<_>>()
        .join(" && ")
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | '=' | ',' | ':' | '@' | '%')
        });
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let cmd = CommandLine::new("Rscript")
            .arg("mr_lcv.r")
            .opt_path("--g1", Path::new("/gwa/idp/deg.fastGWA"))
            .opt("--n1", 54030)
            .opt_some::<u64>("--nca", None)
            .flag_if(FORCE_FLAG, true);
        assert_eq!(
            cmd.render(),
            "Rscript mr_lcv.r --g1 /gwa/idp/deg.fastGWA --n1 54030 -f"
        );
    }

    #[test]
    fn test_quoting() {
        let cmd = CommandLine::new("echo").arg("a b").arg("it's").arg("");
        assert_eq!(cmd.render(), r"echo 'a b' 'it'\''s' ''");
    }

    #[test]
    fn test_chain() {
        let a = CommandLine::new("munge");
        let b = CommandLine::new("ldsc");
        assert_eq!(chain(&[a, b]), "munge && ldsc");
    }
}
