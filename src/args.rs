//! Legacy command-line flag scanner.
//!
//! The historic interface uses single-dash, case-insensitive, prefix-matched
//! flags (`-in`, `-OUT`, `-header` all work). [`normalize_legacy_args`]
//! rewrites those tokens into canonical double-dash arguments
//! (`--in=<value>`, `--debug`, …) that an ordinary argument parser can take
//! over. Double-dash tokens pass through untouched; unknown single-dash
//! tokens are dropped and reported in [`NormalizedArgs::ignored`].
//! [`NormalizedArgs::retain_long_options`] does the same for double-dash
//! options the parser does not know, so no argument list is ever rejected
//! for an unrecognised flag.

use std::ffi::{OsStr, OsString};

/// A recognised legacy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyFlag {
    Input,
    Output,
    Debug,
    Css,
    Header,
    Footer,
}

impl LegacyFlag {
    /// Canonical long name, without the leading dashes.
    pub fn canonical(self) -> &'static str {
        match self {
            LegacyFlag::Input => "in",
            LegacyFlag::Output => "out",
            LegacyFlag::Debug => "debug",
            LegacyFlag::Css => "css",
            LegacyFlag::Header => "head",
            LegacyFlag::Footer => "foot",
        }
    }

    /// Whether the flag consumes the following token as its value.
    pub fn takes_value(self) -> bool {
        !matches!(self, LegacyFlag::Debug)
    }
}

/// Legacy flag keys, in match order. The first key that prefixes the token
/// (case-insensitively) wins.
pub const LEGACY_FLAGS: &[(&str, LegacyFlag)] = &[
    ("-in", LegacyFlag::Input),
    ("-out", LegacyFlag::Output),
    ("-d", LegacyFlag::Debug),
    ("-css", LegacyFlag::Css),
    ("-head", LegacyFlag::Header),
    ("-foot", LegacyFlag::Footer),
];

/// Result of [`normalize_legacy_args`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedArgs {
    /// Arguments ready for the canonical parser, program name first.
    pub args: Vec<OsString>,
    /// Tokens that were dropped (unknown single-dash flags, or legacy flags
    /// whose value was missing).
    pub ignored: Vec<OsString>,
}

impl NormalizedArgs {
    /// Move double-dash options whose name is not in `known` (names without
    /// the leading dashes) from `args` to `ignored`.
    ///
    /// `--name=value` is matched on `name`. Everything after a bare `--` is
    /// kept as-is.
    pub fn retain_long_options(self, known: &[&str]) -> Self {
        let mut out = NormalizedArgs {
            args: Vec::with_capacity(self.args.len()),
            ignored: self.ignored,
        };
        let mut iter = self.args.into_iter();
        if let Some(program) = iter.next() {
            out.args.push(program);
        }

        let mut options_ended = false;
        for token in iter {
            let keep = match token.to_str().and_then(|t| t.strip_prefix("--")) {
                _ if options_ended => true,
                Some("") => {
                    options_ended = true;
                    true
                }
                Some(name) => {
                    let name = name.split_once('=').map_or(name, |(n, _)| n);
                    known.contains(&name)
                }
                None => true,
            };
            if keep {
                out.args.push(token);
            } else {
                out.ignored.push(token);
            }
        }
        out
    }
}

/// Match a single token against [`LEGACY_FLAGS`].
pub fn match_legacy_flag(token: &str) -> Option<LegacyFlag> {
    if token.starts_with("--") {
        return None;
    }
    LEGACY_FLAGS
        .iter()
        .find(|(key, _)| starts_with_ignore_case(token, key))
        .map(|&(_, flag)| flag)
}

fn starts_with_ignore_case(token: &str, key: &str) -> bool {
    token
        .get(..key.len())
        .map(|head| head.eq_ignore_ascii_case(key))
        .unwrap_or(false)
}

/// Rewrite legacy flags into canonical double-dash form.
///
/// The first item of `args` is the program name and is copied as-is.
pub fn normalize_legacy_args<I, T>(args: I) -> NormalizedArgs
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut iter = args.into_iter().map(Into::into);
    let mut out = NormalizedArgs::default();

    if let Some(program) = iter.next() {
        out.args.push(program);
    }

    while let Some(token) = iter.next() {
        let Some(text) = token.to_str() else {
            out.args.push(token);
            continue;
        };

        // Double-dash options, their values and plain words go to the canonical parser.
        if text.starts_with("--") || !text.starts_with('-') || text == "-" {
            out.args.push(token);
            continue;
        }

        match match_legacy_flag(text) {
            Some(flag) if flag.takes_value() => match iter.next() {
                Some(value) => out.args.push(canonical_with_value(flag, &value)),
                None => out.ignored.push(token),
            },
            Some(flag) => out.args.push(OsString::from(format!("--{}", flag.canonical()))),
            None => out.ignored.push(token),
        }
    }

    out
}

fn canonical_with_value(flag: LegacyFlag, value: &OsStr) -> OsString {
    let mut arg = OsString::from(format!("--{}=", flag.canonical()));
    arg.push(value);
    arg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(args: &[&str]) -> NormalizedArgs {
        normalize_legacy_args(std::iter::once("md2pdf").chain(args.iter().copied()))
    }

    fn strings(v: &[OsString]) -> Vec<String> {
        v.iter().map(|s| s.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn full_legacy_command_line() {
        let n = normalize(&[
            "-in", "doc.md", "-out", "report.pdf", "-css", "style.css", "-d", "-head", "h.htm",
            "-foot", "f.htm",
        ]);
        assert_eq!(
            strings(&n.args),
            vec![
                "md2pdf",
                "--in=doc.md",
                "--out=report.pdf",
                "--css=style.css",
                "--debug",
                "--head=h.htm",
                "--foot=f.htm",
            ]
        );
        assert!(n.ignored.is_empty());
    }

    #[test]
    fn case_insensitive_prefix_match() {
        assert_eq!(match_legacy_flag("-IN"), Some(LegacyFlag::Input));
        assert_eq!(match_legacy_flag("-input"), Some(LegacyFlag::Input));
        assert_eq!(match_legacy_flag("-Output"), Some(LegacyFlag::Output));
        assert_eq!(match_legacy_flag("-debug"), Some(LegacyFlag::Debug));
        assert_eq!(match_legacy_flag("-Header"), Some(LegacyFlag::Header));
        assert_eq!(match_legacy_flag("-FOOTER"), Some(LegacyFlag::Footer));
        assert_eq!(match_legacy_flag("-CSSFILE"), Some(LegacyFlag::Css));
    }

    #[test]
    fn short_tokens_do_not_match_longer_keys() {
        assert_eq!(match_legacy_flag("-i"), None);
        assert_eq!(match_legacy_flag("-he"), None);
        assert_eq!(match_legacy_flag("-"), None);
    }

    #[test]
    fn double_dash_never_matches() {
        assert_eq!(match_legacy_flag("--in"), None);
        let n = normalize(&["--page-size", "A4", "-in", "a.md"]);
        assert_eq!(
            strings(&n.args),
            vec!["md2pdf", "--page-size", "A4", "--in=a.md"]
        );
    }

    #[test]
    fn unknown_single_dash_flags_are_ignored() {
        let n = normalize(&["-x", "-in", "a.md", "-verbose"]);
        assert_eq!(strings(&n.args), vec!["md2pdf", "--in=a.md"]);
        assert_eq!(strings(&n.ignored), vec!["-x", "-verbose"]);
    }

    #[test]
    fn value_starting_with_dash_is_consumed() {
        let n = normalize(&["-out", "-weird.pdf", "-in", "a.md"]);
        assert_eq!(
            strings(&n.args),
            vec!["md2pdf", "--out=-weird.pdf", "--in=a.md"]
        );
    }

    #[test]
    fn trailing_flag_without_value_is_dropped() {
        let n = normalize(&["-in", "a.md", "-css"]);
        assert_eq!(strings(&n.args), vec!["md2pdf", "--in=a.md"]);
        assert_eq!(strings(&n.ignored), vec!["-css"]);
    }

    #[test]
    fn table_order_is_first_match() {
        // "-d" is listed before every other key starting with "-d".
        assert_eq!(match_legacy_flag("-dpi"), Some(LegacyFlag::Debug));
    }

    #[test]
    fn unknown_long_options_are_ignored() {
        let n = normalize(&["-in", "a.md", "--foo", "--dpi", "300", "--bar=1", "-zz"])
            .retain_long_options(&["in", "dpi"]);
        assert_eq!(strings(&n.args), vec!["md2pdf", "--in=a.md", "--dpi", "300"]);
        assert_eq!(strings(&n.ignored), vec!["-zz", "--foo", "--bar=1"]);
    }

    #[test]
    fn tokens_after_end_of_options_are_kept() {
        let n = normalize(&["--", "--foo"]).retain_long_options(&[]);
        assert_eq!(strings(&n.args), vec!["md2pdf", "--", "--foo"]);
        assert!(n.ignored.is_empty());
    }

    #[test]
    fn empty_args() {
        let n = normalize_legacy_args(Vec::<OsString>::new());
        assert!(n.args.is_empty());
        assert!(n.ignored.is_empty());
    }
}
