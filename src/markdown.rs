//! Colour rendering of markdown for terminal streams
//!
//! Used by the CLI to print AI analysis text. The TUI has its own renderer
//! producing ratatui lines.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::Result;

/// Print markdown to stdout with colours when the terminal supports them
pub fn format_markdown(markdown: &str) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    render_markdown(&mut stdout, markdown)?;
    stdout.reset()?;
    Ok(())
}

/// Render markdown into any colour-capable writer
pub fn render_markdown<W: WriteColor>(out: &mut W, markdown: &str) -> Result<()> {
    let mut renderer = Renderer::new(out);
    for event in Parser::new_ext(markdown, Options::all()) {
        renderer.event(event)?;
    }
    renderer.out.flush()?;
    Ok(())
}

struct Renderer<'a, W: WriteColor> {
    out: &'a mut W,
    styles: Vec<ColorSpec>,
    // One entry per open list; `Some(n)` is the next number of an ordered list.
    lists: Vec<Option<u64>>,
}

impl<'a, W: WriteColor> Renderer<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self {
            out,
            styles: Vec::new(),
            lists: Vec::new(),
        }
    }

    fn push_style(&mut self, spec: ColorSpec) -> Result<()> {
        self.out.set_color(&spec)?;
        self.styles.push(spec);
        Ok(())
    }

    fn pop_style(&mut self) -> Result<()> {
        self.styles.pop();
        match self.styles.last() {
            Some(spec) => self.out.set_color(spec)?,
            None => self.out.reset()?,
        }
        Ok(())
    }

    fn indent(&self) -> String {
        "  ".repeat(self.lists.len().saturating_sub(1))
    }

    fn event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Start(tag) => self.start(tag)?,
            Event::End(tag) => self.end(tag)?,
            Event::Text(text) => write!(self.out, "{}", text)?,
            Event::Code(code) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Green));
                self.push_style(spec)?;
                write!(self.out, "`{}`", code)?;
                self.pop_style()?;
            }
            Event::SoftBreak | Event::HardBreak => writeln!(self.out)?,
            Event::Rule => writeln!(self.out, "{}", "─".repeat(40))?,
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag) -> Result<()> {
        match tag {
            Tag::Heading { level, .. } => {
                let color = match level {
                    HeadingLevel::H1 => Color::Magenta,
                    HeadingLevel::H2 => Color::Blue,
                    _ => Color::Cyan,
                };
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(color)).set_bold(true);
                writeln!(self.out)?;
                self.push_style(spec)?;
            }
            Tag::Strong => {
                let mut spec = self.styles.last().cloned().unwrap_or_default();
                spec.set_bold(true);
                self.push_style(spec)?;
            }
            Tag::Emphasis => {
                let mut spec = self.styles.last().cloned().unwrap_or_default();
                spec.set_italic(true);
                self.push_style(spec)?;
            }
            Tag::BlockQuote(_) => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Yellow));
                self.push_style(spec)?;
                write!(self.out, "│ ")?;
            }
            Tag::CodeBlock(kind) => {
                writeln!(self.out)?;
                if let CodeBlockKind::Fenced(lang) = &kind {
                    if !lang.is_empty() {
                        let mut spec = ColorSpec::new();
                        spec.set_fg(Some(Color::Blue)).set_italic(true);
                        self.push_style(spec)?;
                        writeln!(self.out, "[{}]", lang)?;
                        self.pop_style()?;
                    }
                }
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Green));
                self.push_style(spec)?;
            }
            Tag::List(start) => self.lists.push(start),
            Tag::Item => {
                let indent = self.indent();
                match self.lists.last_mut() {
                    Some(Some(n)) => {
                        write!(self.out, "{}{}. ", indent, n)?;
                        *n += 1;
                    }
                    _ => write!(self.out, "{}• ", indent)?,
                }
            }
            Tag::Link { .. } => {
                let mut spec = ColorSpec::new();
                spec.set_fg(Some(Color::Blue)).set_underline(true);
                self.push_style(spec)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, tag: TagEnd) -> Result<()> {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style()?;
                writeln!(self.out)?;
            }
            TagEnd::Paragraph => writeln!(self.out)?,
            TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link => self.pop_style()?,
            TagEnd::BlockQuote(_) | TagEnd::CodeBlock => {
                self.pop_style()?;
                writeln!(self.out)?;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    writeln!(self.out)?;
                }
            }
            TagEnd::Item => writeln!(self.out)?,
            _ => {}
        }
        Ok(())
    }
}
