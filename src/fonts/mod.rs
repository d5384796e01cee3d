//! Font discovery for the report renderer.
//!
//! `genpdf` needs TrueType files for every font it embeds.  The search order is:
//!
//! 1. an explicitly configured directory,
//! 2. the `EXPENSE_REPORT_FONTS_DIR` environment variable,
//! 3. `assets/fonts` next to the running executable,
//! 4. `assets/fonts` inside the crate manifest directory,
//!
//! each of which must contain the `Roboto` family.  When none of them do, well known system
//! families (Liberation Sans, DejaVu Sans, Arial) are tried before giving up.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory holding the bundled font files.
pub const FONTS_DIR_ENV: &str = "EXPENSE_REPORT_FONTS_DIR";

/// Environment variable overriding the Windows font directory used by the Arial fallback.
pub const SYSTEM_FONTS_DIR_ENV: &str = "EXPENSE_REPORT_SYSTEM_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// File names of a font family installed outside the bundled directory.
struct SystemFamily {
    name: &'static str,
    directories: &'static [&'static str],
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const LIBERATION_SANS: SystemFamily = SystemFamily {
    name: "Liberation Sans",
    directories: &[
        "/usr/share/fonts/truetype/liberation",
        "/usr/share/fonts/truetype/liberation2",
        "/usr/share/fonts/liberation-sans",
        "/usr/share/fonts/liberation",
    ],
    regular: "LiberationSans-Regular.ttf",
    bold: "LiberationSans-Bold.ttf",
    italic: "LiberationSans-Italic.ttf",
    bold_italic: "LiberationSans-BoldItalic.ttf",
};

const DEJAVU_SANS: SystemFamily = SystemFamily {
    name: "DejaVu Sans",
    directories: &[
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/dejavu-sans-fonts",
        "/usr/share/fonts/TTF",
    ],
    regular: "DejaVuSans.ttf",
    bold: "DejaVuSans-Bold.ttf",
    italic: "DejaVuSans-Oblique.ttf",
    bold_italic: "DejaVuSans-BoldOblique.ttf",
};

const ARIAL: SystemFamily = SystemFamily {
    name: "Arial",
    directories: &[],
    regular: "arial.ttf",
    bold: "arialbd.ttf",
    italic: "ariali.ttf",
    bold_italic: "arialbi.ttf",
};

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn font_directory_candidates(preferred: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = preferred {
        push_unique(&mut candidates, path.to_path_buf());
    }

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push_unique(&mut candidates, path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(&mut candidates, bundled_fonts_source_dir());
    candidates
}

/// Directory inside the crate sources where the bundled fonts are expected.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn missing_font_files(path: &Path) -> Vec<PathBuf> {
    FONT_FILES
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory(preferred: Option<&Path>) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(preferred) {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            format!("directory missing at {}", candidate.display())
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };

        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(Error::new(
        format!(
            "Unable to locate the {} font directory. Checked: {}. Set {} to a directory holding {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV,
            FONT_FILES.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family(preferred: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory(preferred)?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn system_directories(family: &SystemFamily) -> Vec<PathBuf> {
    let mut directories: Vec<PathBuf> = family.directories.iter().map(PathBuf::from).collect();

    if family.directories.is_empty() {
        if let Some(path) = env_path(SYSTEM_FONTS_DIR_ENV) {
            directories.push(path);
        }
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                push_unique(&mut directories, root.join("Fonts"));
            }
        }
    }

    directories
}

fn load_font_file(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let io_kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!("Failed to load {} font at {}: {}", style, path.display(), err),
            io::Error::new(io_kind, err.to_string()),
        )
    })
}

fn load_system_family(family: &SystemFamily) -> Result<FontFamily<FontData>, Error> {
    let directory = system_directories(family)
        .into_iter()
        .find(|dir| dir.join(family.regular).is_file())
        .ok_or_else(|| {
            Error::new(
                format!("{} is not installed", family.name),
                io::Error::new(io::ErrorKind::NotFound, "system font family not found"),
            )
        })?;

    Ok(FontFamily {
        regular: load_font_file(&directory, family.regular, "regular")?,
        bold: load_font_file(&directory, family.bold, "bold")?,
        italic: load_font_file(&directory, family.italic, "italic")?,
        bold_italic: load_font_file(&directory, family.bold_italic, "bold italic")?,
    })
}

fn system_fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let mut failures = Vec::new();

    for family in [&LIBERATION_SANS, &DEJAVU_SANS, &ARIAL] {
        match load_system_family(family) {
            Ok(loaded) => {
                debug!("Using system font family '{}'", family.name);
                return Ok(loaded);
            }
            Err(err) => failures.push(err.to_string()),
        }
    }

    Err(Error::new(
        format!("No system font fallback available: {}", failures.join("; ")),
        io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
    ))
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Loads the font family used for reports.
///
/// `preferred` is checked before any other location.  When the bundled Roboto files cannot be
/// found anywhere, installed system families are used instead and a warning is logged.
pub fn load_font_family(preferred: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family(preferred) {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match system_fallback_font_family() {
            Ok(fallback) => {
                warn!("Bundled fonts unavailable ({}); falling back to a system family.", err);
                Ok(fallback)
            }
            Err(fallback_err) => {
                warn!(
                    "Bundled fonts unavailable ({}); system fallback failed: {}",
                    err, fallback_err
                );
                Err(Error::new(
                    format!(
                        "Bundled fonts unavailable and system fallback failed: {}",
                        fallback_err
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "report fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether any usable font family can be found without loading it into memory.
pub fn fonts_available(preferred: Option<&Path>) -> bool {
    resolve_font_directory(preferred).is_ok()
        || [&LIBERATION_SANS, &DEJAVU_SANS, &ARIAL].iter().any(|family| {
            system_directories(family)
                .iter()
                .any(|dir| dir.join(family.regular).is_file())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_directory_is_searched_first() {
        let preferred = Path::new("/opt/report-fonts");
        let candidates = font_directory_candidates(Some(preferred));
        assert_eq!(candidates.first().map(PathBuf::as_path), Some(preferred));
        assert!(candidates.contains(&bundled_fonts_source_dir()));
    }

    #[test]
    fn missing_directory_reports_not_found() {
        let err = resolve_font_directory(Some(Path::new("/__expense_report_missing_fonts__")));
        if let Err(err) = err {
            assert!(fonts_missing(&err));
            assert!(err.to_string().contains("/__expense_report_missing_fonts__"));
        }
    }

    #[test]
    fn every_bundled_file_is_reported_missing_for_empty_directory() {
        let missing = missing_font_files(Path::new("/__expense_report_missing_fonts__"));
        assert_eq!(missing.len(), FONT_FILES.len());
    }
}
