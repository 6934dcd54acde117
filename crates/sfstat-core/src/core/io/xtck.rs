use crate::core::models::frame::{Frame, StateTable};
use crate::core::models::metadata::SimulationMetadata;
use crate::core::models::site::{InvalidSiteLabel, SITE_COUNT, SiteLabel};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A log at or below this many lines cannot be a complete xtck run and is
/// rejected outright rather than parsed as a shorter-but-valid one.
const MIN_LINE_COUNT: usize = 24;

const WATERS_MARKER: &str = "Nr. of waters in input";
const IONS_MARKER: &str = "Nr. of K ions in input";
const PERMEATION_MARKER: &str = "Nr. of K+ permeation up";

/// Inclusive time window applied while reading frames. Frames whose timestamp
/// falls outside `[start, end]` are discarded and not counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Unbounded start, inclusive end.
    pub fn until(end: f64) -> Self {
        Self {
            end,
            ..Self::default()
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

#[derive(Debug, Error)]
pub enum XtckError {
    #[error("xtck output not found: '{}'", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("xtck output ends after {lines} lines; a complete log has more than {MIN_LINE_COUNT}")]
    TooShort { lines: usize },
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: XtckParseErrorKind,
    },
    #[error("Missing required header marker: '{0}'")]
    MissingRecord(&'static str),
}

#[derive(Debug, Error)]
pub enum XtckParseErrorKind {
    #[error("frame row has {found} fields, at least 5 are required")]
    FrameRowTooShort { found: usize },
    #[error("invalid time value '{value}'")]
    InvalidTime { value: String },
    #[error("invalid count in header marker (value: '{value}')")]
    InvalidCount { value: String },
    #[error("state code '{value}' is not {SITE_COUNT} characters")]
    StateCodeLength { value: String },
    #[error("{0}")]
    InvalidLabel(#[from] InvalidSiteLabel),
}

/// Parses an xtck hybrid output file, retaining only frames inside `window`.
pub fn read_from_path<P: AsRef<Path>>(
    path: P,
    window: TimeWindow,
) -> Result<(SimulationMetadata, StateTable), XtckError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(XtckError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    read_from(&mut BufReader::new(file), window)
}

/// Parses xtck hybrid output from a buffered reader.
///
/// The log is scanned in two phases. Header lines are matched by substring:
/// seeing the water-count marker flips the parser into frame-reading mode, the
/// ion-count marker fills in `k_number`, and their relative order does not
/// matter. In frame mode every row is whitespace-tokenized (field 0 = time,
/// field 4 = six-character state code) until the permeation summary marker
/// terminates the frame region.
pub fn read_from(
    reader: &mut impl BufRead,
    window: TimeWindow,
) -> Result<(SimulationMetadata, StateTable), XtckError> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    if lines.len() <= MIN_LINE_COUNT {
        return Err(XtckError::TooShort { lines: lines.len() });
    }

    let mut wat_number: Option<usize> = None;
    let mut k_number: Option<usize> = None;
    let mut frames = Vec::new();
    let mut reading_frames = false;

    for (line_idx, line) in lines.iter().enumerate() {
        let line_num = line_idx + 1;

        if !reading_frames {
            if line.contains(WATERS_MARKER) {
                wat_number = Some(parse_marker_count(line, line_num)?);
                reading_frames = true;
            } else if line.contains(IONS_MARKER) {
                k_number = Some(parse_marker_count(line, line_num)?);
            }
            continue;
        }

        if line.contains(PERMEATION_MARKER) {
            break;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(XtckError::Parse {
                line: line_num,
                kind: XtckParseErrorKind::FrameRowTooShort {
                    found: fields.len(),
                },
            });
        }
        let time: f64 = fields[0].parse().map_err(|_| XtckError::Parse {
            line: line_num,
            kind: XtckParseErrorKind::InvalidTime {
                value: fields[0].to_string(),
            },
        })?;
        if !window.contains(time) {
            continue;
        }

        let code = fields[4];
        if code.chars().count() != SITE_COUNT {
            return Err(XtckError::Parse {
                line: line_num,
                kind: XtckParseErrorKind::StateCodeLength {
                    value: code.to_string(),
                },
            });
        }
        let mut sites = [SiteLabel::Empty; SITE_COUNT];
        for (slot, c) in sites.iter_mut().zip(code.chars()) {
            *slot = SiteLabel::from_char(c).map_err(|e| XtckError::Parse {
                line: line_num,
                kind: XtckParseErrorKind::InvalidLabel(e),
            })?;
        }
        frames.push(Frame { time, sites });
    }

    let wat_number = wat_number.ok_or(XtckError::MissingRecord(WATERS_MARKER))?;
    let k_number = k_number.ok_or(XtckError::MissingRecord(IONS_MARKER))?;

    let table = StateTable::from_frames(frames);
    let metadata = SimulationMetadata {
        wat_number,
        k_number,
        frame_number: table.len(),
    };
    Ok((metadata, table))
}

fn parse_marker_count(line: &str, line_num: usize) -> Result<usize, XtckError> {
    let token = line.split_whitespace().last().unwrap_or("");
    token.parse().map_err(|_| XtckError::Parse {
        line: line_num,
        kind: XtckParseErrorKind::InvalidCount {
            value: token.to_string(),
        },
    })
}
