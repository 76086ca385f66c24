//! Configuration for the lanewm layout engine.
//!
//! The document is KDL. Every node is optional and falls back to its default, so an empty file
//! is a valid configuration.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use miette::{Context, IntoDiagnostic};
use tracing::debug;

#[derive(knuffel::Decode, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[knuffel(child, default)]
    pub layout: Layout,
}

#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Layout {
    #[knuffel(child, default)]
    pub gaps: Gaps,
    #[knuffel(child, default)]
    pub border: Border,
    /// Pixels moved by a single resize step.
    #[knuffel(child, unwrap(argument), default = 50)]
    pub resize_jump: u16,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            gaps: Gaps::default(),
            border: Border::default(),
            resize_jump: 50,
        }
    }
}

/// Spacing around tiled windows.
///
/// Inner gaps separate neighbouring siblings; each neighbour takes half of it. Outer gaps inset
/// the root lane from the output work area.
#[derive(knuffel::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gaps {
    #[knuffel(child, unwrap(argument), default = 10)]
    pub inner_x: u16,
    #[knuffel(child, unwrap(argument), default = 10)]
    pub inner_y: u16,
    #[knuffel(child, unwrap(argument), default)]
    pub outer_x: u16,
    #[knuffel(child, unwrap(argument), default)]
    pub outer_y: u16,
}

impl Default for Gaps {
    fn default() -> Self {
        Self {
            inner_x: 10,
            inner_y: 10,
            outer_x: 0,
            outer_y: 0,
        }
    }
}

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    #[knuffel(child, unwrap(argument), default)]
    pub size: u16,
}

impl Config {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("error reading {path:?}"))?;

        let config = Self::parse(
            path.file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("config.kdl"),
            &contents,
        )
        .context("error parsing")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }

    pub fn parse(filename: &str, text: &str) -> Result<Self, knuffel::Error> {
        knuffel::parse(filename, text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use pretty_assertions::assert_eq;

    use super::*;

    #[track_caller]
    fn do_parse(text: &str) -> Config {
        Config::parse("test.kdl", text)
            .map_err(miette::Report::new)
            .unwrap()
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(do_parse(""), Config::default());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.layout.gaps.inner_x, 10);
        assert_eq!(config.layout.gaps.inner_y, 10);
        assert_eq!(config.layout.gaps.outer_x, 0);
        assert_eq!(config.layout.gaps.outer_y, 0);
        assert_eq!(config.layout.border.size, 0);
        assert_eq!(config.layout.resize_jump, 50);
    }

    #[test]
    fn parse_full() {
        let parsed = do_parse(
            r#"
            layout {
                gaps {
                    inner-x 16
                    inner-y 8
                    outer-x 4
                    outer-y 2
                }

                border {
                    size 3
                }

                resize-jump 25
            }
            "#,
        );

        assert_eq!(
            parsed,
            Config {
                layout: Layout {
                    gaps: Gaps {
                        inner_x: 16,
                        inner_y: 8,
                        outer_x: 4,
                        outer_y: 2,
                    },
                    border: Border { size: 3 },
                    resize_jump: 25,
                },
            }
        );
    }

    #[test]
    fn partial_gaps_keep_other_defaults() {
        let parsed = do_parse(
            r#"
            layout {
                gaps {
                    outer-x 20
                }
            }
            "#,
        );

        assert_eq!(
            parsed.layout.gaps,
            Gaps {
                outer_x: 20,
                ..Gaps::default()
            }
        );
        assert_eq!(parsed.layout.resize_jump, 50);
    }

    #[test]
    fn negative_gap_is_rejected() {
        let res = Config::parse(
            "test.kdl",
            r#"
            layout {
                gaps {
                    inner-x -4
                }
            }
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn unknown_node_is_rejected() {
        let res = Config::parse("test.kdl", "layout { gap-size 10; }");
        assert!(res.is_err());
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("lanewm-config-{}.kdl", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "layout {{ border {{ size 2; }}; }}").unwrap();
        drop(file);

        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.layout.border.size, 2);
        assert_eq!(config.layout.gaps, Gaps::default());
    }

    #[test]
    fn load_missing_file_fails() {
        let path = Path::new("/nonexistent/lanewm/config.kdl");
        let err = Config::load(path).unwrap_err();
        assert!(format!("{err:?}").contains("error reading"));
    }
}
