//! Open → read → enumerate → print.

use std::io::Write;
use std::path::Path;

use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::model::CategoryMap;

/// Opens `path` with `open`, reads its problem database and prints one
/// `key value` line per category to `out`. Returns the number of lines.
///
/// Nothing is written unless the problem data was read successfully.
///
/// # Example
///
/// ```no_run
/// use rfa_inspector::extractor::RevitExtractor;
/// use rfa_inspector::invoker::run;
/// use std::path::Path;
///
/// let mut out = std::io::stdout().lock();
/// run(Path::new("planter.rfa"), |p| RevitExtractor::open(p), &mut out)?;
/// # Ok::<(), rfa_inspector::error::ExtractError>(())
/// ```
pub fn run<E, F, W>(path: &Path, open: F, out: &mut W) -> Result<usize, ExtractError>
where
    E: Extractor,
    F: FnOnce(&Path) -> Result<E, ExtractError>,
    W: Write,
{
    let extractor = open(path)?;
    let data = extractor.read_problem_data()?;
    print_categories(data.all_categories(), out)
}

pub fn print_categories<W: Write>(
    categories: &CategoryMap,
    out: &mut W,
) -> Result<usize, ExtractError> {
    for (key, value) in categories {
        writeln!(out, "{key} {value}")?;
    }
    out.flush()?;
    Ok(categories.len())
}
