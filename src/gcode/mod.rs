// src/gcode/mod.rs - Command front end: G-code lines to motion requests
pub mod parser;

pub use parser::{GCodeError, GCodeLine, GCodeParser, GCodeParserConfig, GCodeSpan, Word};

use thiserror::Error;

use crate::hardware::CoilDriver;
use crate::motion::{MotionError, MotionRequest, PenState, Plotter, Point, center_offset_from_radius};
use crate::scheduler::TimeInterface;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] GCodeError),
    #[error("line {line}: {source}")]
    Motion {
        line: usize,
        #[source]
        source: MotionError,
    },
}

/// Translate one parsed line into a motion request.
///
/// `current` and `destination` are the plotter's position and last requested
/// destination; they are needed to resolve radius-form arcs. Returns `None`
/// for commands the plotter does not act on.
pub fn translate(line: &GCodeLine, current: Point, destination: Point) -> Result<Option<MotionRequest>, MotionError> {
    let Some((letter, code)) = line.command() else {
        return Ok(None);
    };

    let request = match (letter, code) {
        ('G', 0) | ('G', 1) => MotionRequest::LinearMove {
            x: line.get('X'),
            y: line.get('Y'),
            z: line.get('Z'),
        },
        ('G', 2) | ('G', 3) => {
            let clockwise = code == 2;
            let x = line.get('X');
            let y = line.get('Y');
            let [i, j] = match line.get('R') {
                Some(radius) => {
                    let end = Point::new(x.unwrap_or(destination.x), y.unwrap_or(destination.y));
                    center_offset_from_radius(current, end, radius, clockwise)?
                }
                None => [line.get('I').unwrap_or(0.0), line.get('J').unwrap_or(0.0)],
            };
            MotionRequest::ArcMove { x, y, i, j, clockwise }
        }
        ('G', 4) => {
            let millis = match (line.get('P'), line.get('S')) {
                (Some(ms), _) => ms,
                (None, Some(s)) => s * 1000.0,
                (None, None) => 0.0,
            };
            MotionRequest::Dwell {
                millis: millis.max(0.0).round() as u64,
            }
        }
        ('M', 3) => MotionRequest::Pen(PenState::Down),
        ('M', 5) => MotionRequest::Pen(PenState::Up),
        _ => return Ok(None),
    };
    Ok(Some(request))
}

/// Counters for one program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramReport {
    pub executed: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Feeds a G-code program through a plotter, one command at a time.
///
/// Bad lines are logged and skipped; the program keeps running.
pub struct GCodeExecutor<'p, D, T> {
    plotter: &'p mut Plotter<D, T>,
    config: GCodeParserConfig,
}

impl<'p, D: CoilDriver, T: TimeInterface> GCodeExecutor<'p, D, T> {
    pub fn new(plotter: &'p mut Plotter<D, T>) -> Self {
        Self {
            plotter,
            config: GCodeParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GCodeParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute a single parsed line.
    pub fn execute_line(&mut self, line: &GCodeLine) -> Result<bool, CommandError> {
        let state = self.plotter.state();
        let request = translate(line, state.current_cartesian, state.destination_cartesian)
            .map_err(|source| CommandError::Motion { line: line.line, source })?;
        let Some(request) = request else {
            return Ok(false);
        };
        tracing::debug!(line = line.line, ?request, "execute");
        self.plotter
            .execute(request)
            .map_err(|source| CommandError::Motion { line: line.line, source })?;
        Ok(true)
    }

    pub fn run(&mut self, source: &str) -> ProgramReport {
        let mut report = ProgramReport::default();
        let mut parser = GCodeParser::new(source, self.config.clone());
        while let Some(parsed) = parser.next_command() {
            let outcome = parsed.map_err(CommandError::from).and_then(|line| {
                let handled = self.execute_line(&line)?;
                if !handled {
                    tracing::warn!(line = line.line, command = ?line.command(), "Unhandled G-code command");
                }
                Ok(handled)
            });
            match outcome {
                Ok(true) => report.executed += 1,
                Ok(false) => report.ignored += 1,
                Err(e) => {
                    tracing::error!("{}", e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}
