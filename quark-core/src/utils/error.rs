use std::path::PathBuf;

use termcolor::Buffer;
use thiserror::Error;

use crate::{
    eval::prelude::EvalError,
    scanner::prelude::ScannerError,
};
use super::diagnostic::{Diagnostic, Label, Level, Location};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("failed to scan source code")]
    Scan {
        path: PathBuf,
        src: String,
        error: ScannerError
    },
    #[error("evaluation failed")]
    Eval {
        error: EvalError
    },
    #[error("IO operation failed")]
    StdIo {
        err: std::io::ErrorKind
    }
}

impl Error {
    pub fn pretty_string(&self) -> String {
        let mut nocolor = Buffer::no_color();
        self.pretty(&mut nocolor);
        String::from_utf8(nocolor.into_inner()).expect("Error printing produced invalid utf8")
    }

    pub fn pretty(&self, buf: &mut Buffer) {
        use std::io::Write;

        for diagnostic in self.to_diagnostics() {
            diagnostic.write(buf);
            writeln!(buf).expect("write new line diagnostic");
        }
    }

    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Scan { path, src, error } => {
                let (label, extra) = error.details();
                let text = extra.join("\n");

                vec![Diagnostic {
                    title: "Lexical error".into(),
                    text,
                    level: Level::Error,
                    location: Some(Location {
                        src,
                        path: path.clone(),
                        label: Label {
                            text: Some(label.to_string()),
                            span: error.location,
                        },
                    }),
                }]
            },
            Error::Eval { error } => {
                vec![Diagnostic {
                    title: "Evaluation error".into(),
                    text: format!("{error}"),
                    level: Level::Error,
                    location: None,
                }]
            },
            Error::StdIo { err } => {
                vec![Diagnostic {
                    title: "Standard IO error".into(),
                    text: format!("{err}"),
                    level: Level::Error,
                    location: None,
                }]
            }
        }
    }
}
