use anstyle::{AnsiColor, Style};
use is_terminal::IsTerminal;
use std::fmt::Display;
use std::io::{self, Write};

const STATUS_WIDTH: usize = 8;

fn supports_color() -> bool {
    io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Status lines go to stderr; stdout is reserved for printed environments.
fn write_status(style: Style, label: &str, message: &str) {
    let mut handle = io::stderr().lock();

    let (prefix, suffix) = if supports_color() {
        (style.render().to_string(), style.render_reset().to_string())
    } else {
        (String::new(), String::new())
    };

    for (idx, line) in message.split('\n').enumerate() {
        if idx == 0 {
            let _ = writeln!(handle, "{prefix}{label:>width$}{suffix} {line}", width = STATUS_WIDTH);
        } else {
            let _ = writeln!(handle, "{:>width$} {line}", "", width = STATUS_WIDTH);
        }
    }
    let _ = handle.flush();
}

pub fn error(message: impl Display) {
    let style = Style::new().bold().fg_color(Some(AnsiColor::Red.into()));
    write_status(style, "Error", &message.to_string());
}
