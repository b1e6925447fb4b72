//! Message renderer: turns a sender-tagged payload into a displayable node.
//!
//! Agent content is markdown, parsed with pulldown-cmark into blocks of styled
//! spans. Fenced code blocks resolve the fence hint to a language and are
//! highlighted with syntect; unknown languages fall back to uncoloured text.
//! User content is never interpreted: it becomes a single literal block.

use crate::session::{Sender, TranscriptMessage};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Language used when a fence has no hint or an unknown one.
pub const PLAIN_TEXT: &str = "plaintext";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
    pub link: Option<String>,
}

/// A highlighted run of code. `color` is `None` for plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeToken {
    pub text: String,
    pub color: Option<[u8; 3]>,
    pub bold: bool,
    pub italic: bool,
}

impl CodeToken {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: None,
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    Heading { level: u8, spans: Vec<Span> },
    /// `marker` is "•", "3." or a task box; empty for continuation paragraphs.
    ListItem { depth: usize, marker: String, spans: Vec<Span> },
    Quote { depth: usize, spans: Vec<Span> },
    /// `tokens` concatenate back to `code`.
    Code {
        language: &'static str,
        code: String,
        tokens: Vec<CodeToken>,
    },
    Table { header: Vec<String>, rows: Vec<Vec<String>> },
    Rule,
    /// Uninterpreted text (user messages).
    Literal(String),
}

/// A rendered transcript message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub sender: Sender,
    /// The text as received.
    pub source: String,
    pub blocks: Vec<Block>,
}

impl MessageNode {
    /// Flattened text, one block per paragraph. Code blocks are fenced with their language.
    pub fn plain_text(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        for block in &self.blocks {
            let text = match block {
                Block::Paragraph(spans) => spans_text(spans),
                Block::Heading { level, spans } => {
                    format!("{} {}", "#".repeat(*level as usize), spans_text(spans))
                }
                Block::ListItem {
                    depth,
                    marker,
                    spans,
                } => {
                    let indent = "  ".repeat(*depth);
                    if marker.is_empty() {
                        format!("{}  {}", indent, spans_text(spans))
                    } else {
                        format!("{}{} {}", indent, marker, spans_text(spans))
                    }
                }
                Block::Quote { depth, spans } => {
                    format!("{}{}", "> ".repeat(*depth), spans_text(spans))
                }
                Block::Code { language, code, .. } => {
                    format!("```{}\n{}```", language, code)
                }
                Block::Table { header, rows } => {
                    let mut lines = vec![header.join(" | ")];
                    lines.extend(rows.iter().map(|r| r.join(" | ")));
                    lines.join("\n")
                }
                Block::Rule => "---".to_string(),
                Block::Literal(text) => text.clone(),
            };
            out.push(text);
        }
        out.join("\n\n")
    }
}

fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Render a payload for `sender`.
pub fn render_message(content: &str, sender: Sender) -> MessageNode {
    let blocks = match sender {
        Sender::User => vec![Block::Literal(content.to_string())],
        Sender::Agent => render_markdown(content),
    };
    MessageNode {
        sender,
        source: content.to_string(),
        blocks,
    }
}

pub fn render_transcript_message(message: &TranscriptMessage) -> MessageNode {
    render_message(&message.content, message.sender)
}

/// Resolve a fence info string ("rs", "python title=x", "c++") to a highlight language.
pub fn highlight_language(hint: Option<&str>) -> &'static str {
    let Some(word) = hint
        .and_then(|h| h.split(|c: char| c.is_whitespace() || c == ',').next())
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
    else {
        return PLAIN_TEXT;
    };
    match word.as_str() {
        "rust" | "rs" => "rust",
        "python" | "py" | "python3" => "python",
        "javascript" | "js" | "node" | "jsx" => "javascript",
        "typescript" | "ts" | "tsx" => "typescript",
        "bash" | "sh" | "shell" | "zsh" | "console" => "bash",
        "json" | "jsonc" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "html" | "htm" => "html",
        "xml" | "svg" => "xml",
        "css" => "css",
        "c" | "h" => "c",
        "cpp" | "c++" | "cxx" | "hpp" => "cpp",
        "go" | "golang" => "go",
        "java" => "java",
        "sql" => "sql",
        "markdown" | "md" => "markdown",
        "diff" | "patch" => "diff",
        "dockerfile" | "docker" => "dockerfile",
        "make" | "makefile" => "make",
        _ => PLAIN_TEXT,
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn code_theme() -> Option<&'static Theme> {
    static THEME: OnceLock<Option<Theme>> = OnceLock::new();
    THEME
        .get_or_init(|| {
            let mut themes = ThemeSet::load_defaults();
            themes
                .themes
                .remove("base16-ocean.dark")
                .or_else(|| themes.themes.remove("Solarized (dark)"))
                .or_else(|| themes.themes.into_values().next())
        })
        .as_ref()
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let set = syntax_set();
    set.find_syntax_by_token(language)
        .or_else(|| set.find_syntax_by_extension(language))
}

fn token_from(style: Style, text: &str) -> CodeToken {
    let fg = style.foreground;
    CodeToken {
        text: text.to_string(),
        color: Some([fg.r, fg.g, fg.b]),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
    }
}

/// Split `code` into styled tokens for `language`. Adjacent runs with the same
/// style are merged. Unknown languages, or a highlighter error, give one plain token.
pub fn highlight_code(language: &str, code: &str) -> Vec<CodeToken> {
    if code.is_empty() {
        return Vec::new();
    }
    let (Some(syntax), Some(theme)) = (find_syntax(language).filter(|_| language != PLAIN_TEXT), code_theme())
    else {
        return vec![CodeToken::plain(code)];
    };
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut tokens: Vec<CodeToken> = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = match highlighter.highlight_line(line, syntax_set()) {
            Ok(ranges) => ranges,
            Err(e) => {
                log::debug!("highlighting {} failed: {}", language, e);
                return vec![CodeToken::plain(code)];
            }
        };
        for (style, piece) in ranges {
            if piece.is_empty() {
                continue;
            }
            let token = token_from(style, piece);
            match tokens.last_mut() {
                Some(last) if (last.color, last.bold, last.italic) == (token.color, token.bold, token.italic) => {
                    last.text.push_str(piece)
                }
                _ => tokens.push(token),
            }
        }
    }
    tokens
}

fn code_block(language: &'static str, code: String) -> Block {
    let tokens = highlight_code(language, &code);
    Block::Code {
        language,
        code,
        tokens,
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[derive(Default)]
struct TableState {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

/// Event-driven block builder.
#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    style_stack: Vec<SpanStyle>,
    link: Option<String>,
    heading: Option<u8>,
    code: Option<(&'static str, String)>,
    /// One entry per open list: next number for ordered lists.
    lists: Vec<Option<u64>>,
    item_marker: Option<String>,
    quote_depth: usize,
    table: Option<TableState>,
}

impl Builder {
    fn style(&self) -> SpanStyle {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, f: impl FnOnce(&mut SpanStyle)) {
        let mut style = self.style();
        f(&mut style);
        self.style_stack.push(style);
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if let Some((_, buf)) = self.code.as_mut() {
            buf.push_str(text);
            return;
        }
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(text);
            return;
        }
        let mut style = self.style();
        style.code |= code;
        let link = self.link.clone();
        match self.spans.last_mut() {
            Some(last) if last.style == style && last.link == link => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
                link,
            }),
        }
    }

    /// Close the pending run of spans as the block kind implied by the open containers.
    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let block = if let Some(level) = self.heading {
            Block::Heading { level, spans }
        } else if !self.lists.is_empty() {
            Block::ListItem {
                depth: self.lists.len() - 1,
                marker: self.item_marker.take().unwrap_or_default(),
                spans,
            }
        } else if self.quote_depth > 0 {
            Block::Quote {
                depth: self.quote_depth,
                spans,
            }
        } else {
            Block::Paragraph(spans)
        };
        self.blocks.push(block);
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => highlight_language(Some(&*info)),
                    CodeBlockKind::Indented => PLAIN_TEXT,
                };
                self.code = Some((language, String::new()));
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{}.", n);
                        *n += 1;
                        m
                    }
                    _ => "•".to_string(),
                };
                self.item_marker = Some(marker);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::Emphasis => self.push_style(|s| s.emphasis = true),
            Tag::Strong => self.push_style(|s| s.strong = true),
            Tag::Strikethrough => self.push_style(|s| s.strikethrough = true),
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
            Tag::Table(_) => {
                self.flush();
                self.table = Some(TableState::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush(),
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
            }
            TagEnd::CodeBlock => {
                if let Some((language, code)) = self.code.take() {
                    self.blocks.push(code_block(language, code));
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link => self.link = None,
            TagEnd::TableCell => {
                if let Some(t) = self.table.as_mut() {
                    let cell = std::mem::take(&mut t.cell);
                    t.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                if let Some(t) = self.table.as_mut() {
                    t.header = std::mem::take(&mut t.row);
                }
            }
            TagEnd::TableRow => {
                if let Some(t) = self.table.as_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(t) = self.table.take() {
                    self.blocks.push(Block::Table {
                        header: t.header,
                        rows: t.rows,
                    });
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        if let Some((language, code)) = self.code.take() {
            self.blocks.push(code_block(language, code));
        }
        self.blocks
    }
}

fn render_markdown(content: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = Builder::default();
    for event in Parser::new_ext(content, options) {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(tag) => builder.end(tag),
            Event::Text(text) => builder.push_text(&text, false),
            Event::Code(code) => builder.push_text(&code, true),
            // Raw HTML is shown as text, never interpreted.
            Event::Html(html) | Event::InlineHtml(html) => builder.push_text(&html, false),
            Event::SoftBreak => builder.push_text(" ", false),
            Event::HardBreak => builder.push_text("\n", false),
            Event::Rule => {
                builder.flush();
                builder.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                builder.item_marker = Some(if checked { "[x]" } else { "[ ]" }.to_string());
            }
            _ => {}
        }
    }
    builder.finish()
}
