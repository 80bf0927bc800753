use std::io::{self, Write};

use cds_core::Observer;
use cds_solvers::transient::driver::Trajectory;

use crate::csv;
use crate::traits::{CanStopEarly, HasSample};

/// An observer that streams samples as CSV rows.
///
/// The header is written on construction. Each observed event becomes one
/// row. If a write fails, the error is kept, no further rows are written,
/// and the observer asks the driver to stop; [`finish`](Self::finish)
/// returns the error.
///
/// # Example
///
/// ```ignore
/// let mut observer = CsvObserver::new(io::stdout().lock(), &model.state_labels())?;
/// let solution = driver::solve(model, &config, &mut observer)?;
/// observer.finish()?;
/// ```
#[derive(Debug)]
pub struct CsvObserver<W: Write> {
    writer: W,
    line: String,
    rows: usize,
    error: Option<io::Error>,
}

impl<W: Write> CsvObserver<W> {
    /// Creates the observer and writes the header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new<S: AsRef<str>>(mut writer: W, labels: &[S]) -> io::Result<Self> {
        writeln!(writer, "{}", csv::header(labels))?;
        Ok(Self {
            writer,
            line: String::new(),
            rows: 0,
            error: None,
        })
    }

    /// Rows written so far, not counting the header.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes the writer and returns it.
    ///
    /// # Errors
    ///
    /// Returns the first write error seen while observing, or the flush error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_sample(&mut self, t: f64, x: &[f64]) -> io::Result<()> {
        csv::write_row(&mut self.line, t, x);
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())
    }
}

impl<W: Write, E: HasSample, A: CanStopEarly> Observer<E, A> for CsvObserver<W> {
    fn observe(&mut self, event: &E) -> Option<A> {
        if self.error.is_some() {
            return Some(A::stop_early());
        }
        match self.write_sample(event.time(), event.state()) {
            Ok(()) => {
                self.rows += 1;
                None
            }
            Err(err) => {
                self.error = Some(err);
                Some(A::stop_early())
            }
        }
    }
}

/// Lets a borrowed observer be passed to the driver and inspected afterwards.
impl<W: Write, E: HasSample, A: CanStopEarly> Observer<E, A> for &mut CsvObserver<W> {
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}

/// Writes a recorded trajectory as CSV: the header, then one row per sample.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_trajectory<W: Write, S: AsRef<str>>(
    writer: W,
    labels: &[S],
    trajectory: &Trajectory,
) -> io::Result<W> {
    let mut observer = CsvObserver::new(writer, labels)?;
    for (t, x) in trajectory.iter() {
        observer.write_sample(t, x)?;
        observer.rows += 1;
    }
    observer.finish()
}
