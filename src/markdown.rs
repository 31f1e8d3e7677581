//! Markdown filters used by page layouts.
//!
//! Two renderers are configured per run: `markdown` passes raw HTML through,
//! `md_sanitize` escapes it. Both turn soft line breaks into `<br />` and
//! bare URLs into links. `split_hr_sections` cuts rendered HTML into the
//! card-sized parts separated by `<hr>`.

use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html::push_html};
use regex::Regex;
use serde_json::Value;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[\x21-\x7E&&[^<>"']]+"#).expect("valid regex"));

static HR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<hr\s*/?>").expect("valid regex"));

/// Characters never kept at the end of an auto-linked URL.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    /// Pass raw HTML through; when false it is escaped as text.
    pub allow_html: bool,
    /// Render soft line breaks as `<br />`.
    pub breaks: bool,
    /// Turn bare `http(s)://` URLs into links.
    pub linkify: bool,
}

#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    pub fn render(&self, content: &str) -> String {
        if content.is_empty() {
            return String::new();
        }
        let parser = Parser::new_ext(content, parser_options());

        let mut writer = EventWriter::new(self.options);
        for event in parser {
            writer.push(event);
        }

        let mut html = String::with_capacity(content.len() * 2);
        push_html(&mut html, writer.finish().into_iter());
        html
    }

    /// Render a record field. Missing, null, `false`, and empty values give `""`.
    pub fn render_value(&self, value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
            Some(Value::String(s)) => self.render(s),
            Some(other) => self.render(&other.to_string()),
        }
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// The named filters available to layouts.
#[derive(Debug, Clone)]
pub struct Filters {
    pub markdown: MarkdownRenderer,
    pub md_sanitize: MarkdownRenderer,
}

impl Filters {
    pub fn new() -> Self {
        Self {
            markdown: MarkdownRenderer::new(MarkdownOptions {
                allow_html: true,
                breaks: true,
                linkify: true,
            }),
            md_sanitize: MarkdownRenderer::new(MarkdownOptions {
                allow_html: false,
                breaks: true,
                linkify: true,
            }),
        }
    }

    pub fn split_hr_sections(&self, html: &str) -> Vec<String> {
        split_hr_sections(html)
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self::new()
    }
}

/// Split on `<hr>` / `<hr/>` / `<hr />` (any case), trimming and dropping empty parts.
pub fn split_hr_sections(content: &str) -> Vec<String> {
    HR_RE
        .split(content)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rewrites the parser's event stream according to `MarkdownOptions`.
///
/// Adjacent text events are coalesced so a URL the parser split in two is
/// still linked as one.
struct EventWriter<'a> {
    options: MarkdownOptions,
    out: Vec<Event<'a>>,
    text: String,
    link_depth: usize,
    code_depth: usize,
    /// Raw text of the HTML block being collected while HTML is disallowed.
    html_block: Option<String>,
}

impl<'a> EventWriter<'a> {
    fn new(options: MarkdownOptions) -> Self {
        Self {
            options,
            out: Vec::new(),
            text: String::new(),
            link_depth: 0,
            code_depth: 0,
            html_block: None,
        }
    }

    fn push(&mut self, event: Event<'a>) {
        if let Some(raw) = &mut self.html_block {
            match event {
                Event::End(TagEnd::HtmlBlock) => {
                    let raw = std::mem::take(raw);
                    self.html_block = None;
                    self.reparse_html_block(&raw);
                }
                Event::Html(html) | Event::Text(html) => raw.push_str(&html),
                _ => {}
            }
            return;
        }
        match event {
            Event::Text(text) => self.text.push_str(&text),
            Event::InlineHtml(html) | Event::Html(html) if !self.options.allow_html => {
                self.text.push_str(&html)
            }
            Event::Start(Tag::HtmlBlock) if !self.options.allow_html => {
                self.html_block = Some(String::new());
            }
            Event::SoftBreak if self.options.breaks => self.emit(Event::HardBreak),
            other => self.emit(other),
        }
    }

    /// Parses a collected HTML block again as markdown. Every `<` is written
    /// as an entity first, so tags come back as plain text and the markdown
    /// around them still renders.
    fn reparse_html_block(&mut self, raw: &str) {
        let neutral = raw.replace('<', "&lt;");
        for event in Parser::new_ext(&neutral, parser_options()) {
            self.push(event.into_static());
        }
    }

    fn emit(&mut self, event: Event<'a>) {
        self.flush_text();
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => self.link_depth += 1,
            Event::End(TagEnd::Link | TagEnd::Image) => {
                self.link_depth = self.link_depth.saturating_sub(1)
            }
            Event::Start(Tag::CodeBlock(_)) => self.code_depth += 1,
            Event::End(TagEnd::CodeBlock) => self.code_depth = self.code_depth.saturating_sub(1),
            _ => {}
        }
        self.out.push(event);
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if self.options.linkify && self.link_depth == 0 && self.code_depth == 0 {
            self.push_linkified(&text);
        } else {
            self.out.push(Event::Text(text.into()));
        }
    }

    fn push_linkified(&mut self, text: &str) {
        let mut last = 0;
        for m in URL_RE.find_iter(text) {
            let url = m.as_str().trim_end_matches(URL_TRAILING);
            if !url.contains("://") || url.ends_with("://") {
                continue;
            }
            if m.start() > last {
                self.out
                    .push(Event::Text(text[last..m.start()].to_string().into()));
            }
            let url: CowStr<'a> = url.to_string().into();
            self.out.push(Event::Start(Tag::Link {
                link_type: LinkType::Autolink,
                dest_url: url.clone(),
                title: "".into(),
                id: "".into(),
            }));
            self.out.push(Event::Text(url));
            self.out.push(Event::End(TagEnd::Link));
            last = m.start() + m.as_str().trim_end_matches(URL_TRAILING).len();
        }
        if last < text.len() {
            self.out.push(Event::Text(text[last..].to_string().into()));
        }
    }

    fn finish(mut self) -> Vec<Event<'a>> {
        self.flush_text();
        self.out
    }
}
