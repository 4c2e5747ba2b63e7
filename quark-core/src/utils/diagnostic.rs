use std::path::PathBuf;

use codespan_reporting::diagnostic::{Label as CodespanLabel, LabelStyle, Severity};
use codespan_reporting::files::SimpleFiles;
use termcolor::Buffer;

use super::src_span::SrcSpan;

pub enum Level {
    Warning,
    Error,
}

pub struct Label {
    pub text: Option<String>,
    pub span: SrcSpan,
}

pub struct Location<'a> {
    pub src: &'a str,
    pub path: PathBuf,
    pub label: Label,
}

pub struct Diagnostic<'a> {
    pub title: String,
    pub text: String,
    pub level: Level,
    pub location: Option<Location<'a>>,
}

impl<'a> Diagnostic<'a> {
    pub fn write(&self, buf: &mut Buffer) {
        use std::io::Write;

        match &self.location {
            Some(location) => self.write_span(location, buf),
            None => self.write_title(buf),
        }

        if !self.text.is_empty() {
            writeln!(buf, "{}", self.text).expect("text write");
        }
    }

    fn write_span(&self, location: &Location, buf: &mut Buffer) {
        let mut files = SimpleFiles::new();

        let path = location.path.to_string_lossy();
        let file_id = files.add(path.as_ref(), location.src);

        let mut label = CodespanLabel::new(
            LabelStyle::Primary,
            file_id,
            (location.label.span.start as usize)..(location.label.span.end as usize),
        );
        if let Some(text) = &location.label.text {
            label = label.with_message(text.clone());
        }

        let severity = match self.level {
            Level::Error => Severity::Error,
            Level::Warning => Severity::Warning,
        };

        let diagnostic = codespan_reporting::diagnostic::Diagnostic::new(severity)
            .with_message(&self.title)
            .with_labels(vec![label]);

        let config = codespan_reporting::term::Config::default();
        codespan_reporting::term::emit(buf, &config, &files, &diagnostic)
            .expect("write_diagnostic");
    }

    fn write_title(&self, buf: &mut Buffer) {
        use std::io::Write;
        use termcolor::{Color, ColorSpec, WriteColor};

        let (kind, colour) = match self.level {
            Level::Error => ("error", Color::Red),
            Level::Warning => ("warning", Color::Yellow),
        };

        buf.set_color(ColorSpec::new().set_bold(true).set_fg(Some(colour)))
            .expect("write_title_color1");
        write!(buf, "{kind}").expect("write_title_kind");

        buf.set_color(ColorSpec::new().set_bold(true))
            .expect("write_title_color2");
        write!(buf, ": {}\n\n", self.title).expect("write_title_title");

        buf.set_color(&ColorSpec::new())
            .expect("write_title_reset");
    }
}
