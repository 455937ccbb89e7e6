//! Reading-layout formatting for saved literature
//!
//! - `##` chapter headings stand on their own, set off by blank lines
//! - consecutive quoted dialogue lines stay together as one block
//! - narrative lines are indented by four spaces
//! - runs of blank lines collapse to one

const INDENT: &str = "    ";

/// Suffix of files written by [`format_file`]
pub const FORMATTED_SUFFIX: &str = "_formatted";

/// Reflows a story body into reading layout
///
/// # Example
///
/// ```
/// use forum_harvest::content::format_novel;
///
/// let text = "## One\nIt was late.\n\"Who?\"\n\"Me.\"";
/// assert_eq!(format_novel(text), "## One\n\n    It was late.\n\n\"Who?\"\n\"Me.\"");
/// ```
pub fn format_novel(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_dialogue = false;

    for raw in text.lines() {
        let line = raw.trim();

        if line.starts_with("##") {
            lines.push(String::new());
            lines.push(line.to_string());
            lines.push(String::new());
            in_dialogue = false;
        } else if is_dialogue(line) {
            if !in_dialogue {
                lines.push(String::new());
            }
            lines.push(line.to_string());
            in_dialogue = true;
        } else if !line.is_empty() {
            if in_dialogue {
                lines.push(String::new());
            }
            lines.push(format!("{}{}", INDENT, line));
            in_dialogue = false;
        } else {
            lines.push(String::new());
        }
    }

    join_collapsing_blanks(&lines)
}

/// A line wholly wrapped in straight or curly double quotes
fn is_dialogue(line: &str) -> bool {
    let straight = line.len() >= 2 && line.starts_with('"') && line.ends_with('"');
    let curly = line.starts_with('“') && line.ends_with('”') && line.chars().count() >= 2;
    straight || curly
}

/// Joins lines with `\n`, keeping at most one blank line in a row and none
/// at either end
fn join_collapsing_blanks(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    for line in lines {
        let blank = line.is_empty();
        if blank && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    out.join("\n")
}

/// Formats a saved text file, writing `<stem>_formatted.txt` beside it
///
/// Returns the path written.
pub fn format_file(path: &std::path::Path) -> std::io::Result<std::path::PathBuf> {
    let text = std::fs::read_to_string(path)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = path.with_file_name(format!("{}{}.txt", stem, FORMATTED_SUFFIX));

    std::fs::write(&output, format!("{}\n", format_novel(&text)))?;
    tracing::info!("Formatted {} -> {}", path.display(), output.display());
    Ok(output)
}

/// Formats one text file, or every `.txt` file below a directory
///
/// Files already carrying the formatted suffix are left alone. Files that
/// fail to format are logged and skipped. Returns the paths written.
pub fn format_path(path: &std::path::Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    if path.is_file() {
        return Ok(vec![format_file(path)?]);
    }

    if !path.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ));
    }

    let mut written = Vec::new();
    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_unformatted_text(e.path()))
    {
        match format_file(entry.path()) {
            Ok(output) => written.push(output),
            Err(e) => tracing::warn!("Failed to format {}: {}", entry.path().display(), e),
        }
    }

    Ok(written)
}

fn is_unformatted_text(path: &std::path::Path) -> bool {
    let is_txt = path.extension().is_some_and(|ext| ext == "txt");
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    is_txt && !stem.ends_with(FORMATTED_SUFFIX)
}
