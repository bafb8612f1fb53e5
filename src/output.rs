//! Terminal output for query results and rebuild summaries

use crate::engine::ReindexSummary;
use crate::query::ScoredPath;
use crate::utils::basename;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn color_choice(color: bool) -> ColorChoice {
    if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Print matching paths, one per line, with the basename highlighted
pub fn print_paths(paths: &[String], color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    for path in paths {
        write_path(&mut stdout, path)?;
        writeln!(stdout)?;
    }
    Ok(())
}

/// Print matching paths prefixed with their score (lower is better)
pub fn print_scored(results: &[ScoredPath], color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    for result in results {
        write_scored(&mut stdout, result)?;
    }
    Ok(())
}

fn write_scored<W: WriteColor>(out: &mut W, result: &ScoredPath) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{:>6}", result.score)?;
    out.reset()?;
    write!(out, "  ")?;
    write_path(out, &result.path)?;
    writeln!(out)
}

/// Write `path` with a dimmed directory part and a bold basename
fn write_path<W: WriteColor>(out: &mut W, path: &str) -> io::Result<()> {
    let name = basename(path);
    let dir = &path[..path.len() - name.len()];

    if !dir.is_empty() {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(out, "{}", dir)?;
        out.reset()?;
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    write!(out, "{}", name)?;
    out.reset()
}

/// One-line summary of a rebuild
pub fn format_summary(summary: &ReindexSummary) -> String {
    let mut line = format!(
        "Indexed {} paths from {} root{} ({} trigrams) in {}ms",
        summary.paths,
        summary.roots,
        if summary.roots == 1 { "" } else { "s" },
        summary.trigrams,
        summary.duration_ms
    );
    if summary.skipped > 0 {
        line.push_str(&format!(", {} skipped", summary.skipped));
    }
    line
}

/// Print "no matches" on stderr so stdout stays pipeable
pub fn print_no_matches(word: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
    let _ = writeln!(stderr, "No matches for {:?}", word);
    let _ = stderr.reset();
}
