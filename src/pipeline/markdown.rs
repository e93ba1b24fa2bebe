//! Markdown → HTML rendering.
//!
//! [`CmarkRenderer`] drives `pulldown-cmark` with a fixed option set
//! ([`RendererOptions::default`]): tables, hard-wrapped line breaks, no
//! intra-word emphasis and a nesting limit of 16. Options the parser does
//! not offer natively are applied as a filter over its event stream, using
//! the source offsets of each event.

use crate::error::Md2PdfError;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use std::ops::Range;
use tracing::debug;

/// Renders Markdown bytes into HTML bytes.
pub trait MarkdownRenderer: Send + Sync {
    /// Render `markdown` to an owned HTML buffer.
    fn render(&self, markdown: &[u8]) -> Result<Vec<u8>, Md2PdfError>;

    /// Short name shown in the startup banner.
    fn name(&self) -> &str {
        "markdown"
    }
}

/// Fixed rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererOptions {
    /// Every soft line break becomes `<br />`.
    pub hard_wrap: bool,
    /// GFM pipe tables.
    pub tables: bool,
    /// `foo*bar*baz` stays literal instead of emphasising `bar`.
    pub no_intra_emphasis: bool,
    /// Tags nested deeper than this are flattened to their text.
    pub max_nesting: usize,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            hard_wrap: true,
            tables: true,
            no_intra_emphasis: true,
            max_nesting: 16,
        }
    }
}

/// `pulldown-cmark` backed renderer.
#[derive(Debug, Clone, Default)]
pub struct CmarkRenderer {
    options: RendererOptions,
}

impl CmarkRenderer {
    pub fn new(options: RendererOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &[u8]) -> Result<Vec<u8>, Md2PdfError> {
        let text = String::from_utf8_lossy(markdown);
        let html = render_markdown(&text, &self.options);
        debug!(
            "Rendered {} bytes of Markdown into {} bytes of HTML",
            markdown.len(),
            html.len()
        );
        Ok(html.into_bytes())
    }

    fn name(&self) -> &str {
        "pulldown-cmark"
    }
}

/// How an open tag was handled, so its end tag is handled the same way.
enum OpenTag {
    Kept,
    Dropped,
    /// Emphasis rendered as literal text; holds the closing delimiters.
    Literal(String),
}

/// Render Markdown text to an HTML string.
pub fn render_markdown(source: &str, options: &RendererOptions) -> String {
    let mut parser_options = Options::empty();
    if options.tables {
        parser_options.insert(Options::ENABLE_TABLES);
    }

    let parser = Parser::new_ext(source, parser_options).into_offset_iter();

    let mut open: Vec<OpenTag> = Vec::new();
    let mut events: Vec<Event<'_>> = Vec::new();

    for (event, range) in parser {
        match event {
            Event::Start(tag) => {
                if open.len() >= options.max_nesting {
                    open.push(OpenTag::Dropped);
                    continue;
                }
                if options.no_intra_emphasis {
                    if let Some((opening, closing)) = intra_word_delimiters(source, &tag, &range) {
                        events.push(Event::Text(CowStr::from(opening.to_string())));
                        open.push(OpenTag::Literal(closing.to_string()));
                        continue;
                    }
                }
                open.push(OpenTag::Kept);
                events.push(Event::Start(tag));
            }
            Event::End(end) => match open.pop() {
                Some(OpenTag::Kept) | None => events.push(Event::End(end)),
                Some(OpenTag::Dropped) => {}
                Some(OpenTag::Literal(closing)) => events.push(Event::Text(CowStr::from(closing))),
            },
            Event::SoftBreak if options.hard_wrap => events.push(Event::HardBreak),
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// For an emphasis/strong span glued to a word, return its opening and
/// closing delimiters.
fn intra_word_delimiters<'s>(
    source: &'s str,
    tag: &Tag<'_>,
    range: &Range<usize>,
) -> Option<(&'s str, &'s str)> {
    let width = match tag {
        Tag::Emphasis => 1,
        Tag::Strong => 2,
        _ => return None,
    };
    if range.end < range.start + 2 * width {
        return None;
    }

    let opening = source.get(range.start..range.start + width)?;
    let closing = source.get(range.end - width..range.end)?;
    if !opening.chars().all(|c| c == '*' || c == '_') {
        return None;
    }

    let before = source.get(..range.start)?.chars().next_back();
    let after = source.get(range.end..)?.chars().next();
    let glued = before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric);

    glued.then_some((opening, closing))
}
