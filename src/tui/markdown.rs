//! Markdown → ratatui `Text` for assistant replies.
//!
//! Support answers are mostly prose with the occasional list, link or code
//! snippet, so this covers paragraphs, headings, emphasis, inline code,
//! fenced code (highlighted with syntect when the language is known), lists,
//! block quotes, links and rules. Anything else is dropped.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);
const CODE_THEME: &str = "base16-ocean.dark";

const FRAME: Style = Style::new().fg(Color::DarkGray);
const INLINE_CODE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
const LINK: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);

/// Render `content`; plain text uses `base_fg`.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        renderer.event(event);
    }
    Text::from(renderer.lines)
}

enum CodeMode {
    Highlighted(Box<HighlightLines<'static>>),
    Plain,
}

struct Renderer {
    lines: Vec<Line<'static>>,
    base: Style,
    /// Inline styles; each entry is already patched onto its parent.
    styles: Vec<Style>,
    /// Spans prepended to every new line (quote bars, code gutter).
    prefixes: Vec<Span<'static>>,
    /// `None` = bullet list, `Some(n)` = next ordinal.
    lists: Vec<Option<u64>>,
    code: Option<CodeMode>,
    link: Option<String>,
    /// A block just ended; the next block starts after a blank line.
    gap: bool,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            base: Style::default().fg(base_fg),
            styles: Vec::new(),
            prefixes: Vec::new(),
            lists: Vec::new(),
            code: None,
            link: None,
            gap: false,
        }
    }

    fn current(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, style: Style) {
        self.styles.push(self.current().patch(style));
    }

    fn new_line(&mut self, spans: Vec<Span<'static>>) {
        let mut all = self.prefixes.clone();
        all.extend(spans);
        self.lines.push(Line::from(all));
    }

    fn append(&mut self, span: Span<'static>) {
        match self.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(vec![span]),
        }
    }

    fn start_block(&mut self) {
        if self.gap {
            self.new_line(Vec::new());
            self.gap = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.append(Span::styled(code.to_string(), INLINE_CODE)),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Vec::new()),
            Event::Rule => {
                self.start_block();
                self.new_line(vec![Span::styled("─".repeat(40), FRAME)]);
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                self.append(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.start_block();
                self.new_line(Vec::new());
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                let style = self.base.patch(heading_style(level));
                let marks = "#".repeat(level as usize);
                self.new_line(vec![Span::styled(format!("{marks} "), style)]);
                self.styles.push(style);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.prefixes.push(Span::styled("│ ", FRAME));
                self.push_style(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) => lang.trim().to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let mut top = vec![Span::styled("╭──", FRAME)];
                if !lang.is_empty() {
                    top.push(Span::styled(
                        format!(" {lang} "),
                        FRAME.add_modifier(Modifier::BOLD),
                    ));
                }
                self.new_line(top);
                self.prefixes.push(Span::styled("│ ", FRAME));
                self.code = Some(highlighter_for(&lang));
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        *n += 1;
                        format!("{indent}{}. ", *n - 1)
                    }
                    _ => format!("{indent}- "),
                };
                self.new_line(vec![Span::styled(marker, FRAME)]);
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_style(LINK);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap = true,
            TagEnd::Heading(_) | TagEnd::BlockQuote(_) => {
                self.styles.pop();
                if matches!(tag, TagEnd::BlockQuote(_)) {
                    self.prefixes.pop();
                }
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.prefixes.pop();
                self.new_line(vec![Span::styled("╰──", FRAME)]);
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.gap = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link.take() {
                    self.append(Span::raw(" ("));
                    self.append(Span::styled(url, LINK));
                    self.append(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        // ratatui renders '\t' as zero width.
        let text = text.replace('\t', "    ");
        match self.code.take() {
            Some(CodeMode::Highlighted(mut hl)) => {
                for line in LinesWithEndings::from(&text) {
                    let spans = match hl.highlight_line(line, &SYNTAX_SET) {
                        Ok(ranges) => ranges
                            .into_iter()
                            .map(|(style, frag)| {
                                let fg = style.foreground;
                                Span::styled(
                                    frag.trim_end_matches('\n').to_string(),
                                    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                                )
                            })
                            .filter(|span| !span.content.is_empty())
                            .collect(),
                        Err(_) => vec![Span::raw(line.trim_end_matches('\n').to_string())],
                    };
                    self.new_line(spans);
                }
                self.code = Some(CodeMode::Highlighted(hl));
            }
            Some(CodeMode::Plain) => {
                for line in text.lines() {
                    self.new_line(vec![Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::White),
                    )]);
                }
                self.code = Some(CodeMode::Plain);
            }
            None => {
                let style = self.current();
                self.append(Span::styled(text, style));
            }
        }
    }
}

fn highlighter_for(lang: &str) -> CodeMode {
    if lang.is_empty() {
        return CodeMode::Plain;
    }
    match (
        SYNTAX_SET.find_syntax_by_token(lang),
        THEME_SET.themes.get(CODE_THEME),
    ) {
        (Some(syntax), Some(theme)) => {
            CodeMode::Highlighted(Box::new(HighlightLines::new(syntax, theme)))
        }
        _ => CodeMode::Plain,
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style,
        _ => style.add_modifier(Modifier::ITALIC),
    }
}
