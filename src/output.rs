use std::io;

const LIST_SPACING: usize = 2;
const FALLBACK_WIDTH: usize = 80;

/// Append-only text sink the editor echoes to.
pub trait Output {
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Terminal size as `(columns, rows)`.
    fn size(&self) -> io::Result<(usize, usize)>;

    fn println(&mut self, text: &str) -> io::Result<()> {
        self.print(text)?;
        self.print("\n")
    }
}

impl<O: Output + ?Sized> Output for &mut O {
    fn print(&mut self, text: &str) -> io::Result<()> {
        (**self).print(text)
    }

    fn size(&self) -> io::Result<(usize, usize)> {
        (**self).size()
    }
}

impl<O: Output + ?Sized> Output for Box<O> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        (**self).print(text)
    }

    fn size(&self) -> io::Result<(usize, usize)> {
        (**self).size()
    }
}

/// Prints `items` left-aligned in as many columns as fit into the output width.
///
/// Items are laid out row by row. Falls back to one item per line when a single item
/// is wider than the terminal, and to 80 columns when the size is unavailable.
pub fn print_list<S: AsRef<str>>(out: &mut dyn Output, items: &[S]) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let width = out.size().map(|(w, _)| w).unwrap_or(FALLBACK_WIDTH);
    out.print(&format_list(items, width))
}

fn format_list<S: AsRef<str>>(items: &[S], width: usize) -> String {
    let max_len = items
        .iter()
        .map(|i| i.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    let per_line = ((width + LIST_SPACING) / (max_len + LIST_SPACING)).max(1);

    let mut text = String::new();
    for row in items.chunks(per_line) {
        let cells: Vec<String> = row
            .iter()
            .map(|i| format!("{:<max_len$}", i.as_ref()))
            .collect();
        text.push_str(cells.join(&" ".repeat(LIST_SPACING)).trim_end());
        text.push('\n');
    }
    text
}
