//! Output formatting for CLI results

use std::io::Write;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod csv;
pub mod json;
pub mod markdown;
pub mod pretty;
pub mod report;
pub mod sessions;
pub mod table;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

/// Format data and write it to `path`, or stdout when `None`.
pub fn emit<T: Formattable>(data: &T, format: OutputFormat, path: Option<&Path>) -> Result<()> {
    match path {
        None => print(data, format),
        Some(path) => {
            let mut output = data.format(format)?;
            if !output.ends_with('\n') {
                output.push('\n');
            }
            let mut file = std::fs::File::create(path)?;
            file.write_all(output.as_bytes())?;
            log::info!("Report written to {}", path.display());
            Ok(())
        }
    }
}
