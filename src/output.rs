use std::io::{self, Write};

use crate::app::{EventLevel, ProgressEvent, ProgressSink, RunReport};

/// Prints progress lines to stdout and per-result errors to stderr.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_summary(report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(
            stdout,
            "{}: {} marker(s) from {} result(s), {} failed",
            report.normalized,
            report.markers_created(),
            report.items.len(),
            report.failures()
        )?;
        if report.markers_created() > 0 {
            writeln!(stdout, "Marker created successfully!")?;
        }
        Ok(())
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.level {
            EventLevel::Info => println!("{}", event.message),
            EventLevel::Error => eprintln!("{}", event.message),
        }
    }
}
