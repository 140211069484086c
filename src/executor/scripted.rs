//! In-memory tests that replay a fixed list of verdicts.
use super::{
    engine::{TestCase, Verdict},
    interrupt::Interrupt,
    results::TestId,
};
use crate::{capture::Capture, errors::SoakError};
use std::{cell::Cell, io::Write, rc::Rc};

pub struct Scripted {
    id: TestId,
    verdicts: Vec<Verdict>,
    output: Option<String>,
    /// Trip this interrupt during the attempt before reporting.
    interrupt: Option<Interrupt>,
    runs: Rc<Cell<usize>>,
}

impl Scripted {
    /// Attempt `n` reports `verdicts[n]`; the last verdict repeats forever.
    pub fn new(id: TestId, verdicts: Vec<Verdict>) -> (Self, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let test = Self {
            id,
            verdicts,
            output: None,
            interrupt: None,
            runs: Rc::clone(&runs),
        };
        (test, runs)
    }

    pub fn passing(group: &str, name: &str) -> (Self, Rc<Cell<usize>>) {
        Self::new(TestId::new(group, name), vec![Verdict::Pass])
    }

    pub fn printing(mut self, output: &str) -> Self {
        self.output = Some(output.to_string());
        self
    }

    pub fn interrupting(mut self, interrupt: &Interrupt) -> Self {
        self.interrupt = Some(interrupt.clone());
        self
    }
}

impl TestCase for Scripted {
    fn id(&self) -> &TestId {
        &self.id
    }

    fn run(&mut self, capture: &mut Capture) -> Result<Verdict, SoakError> {
        let attempt = self.runs.get();
        self.runs.set(attempt + 1);
        if let Some(output) = &self.output {
            write!(capture.stdout(), "{}", output)?;
        }
        if let Some(interrupt) = &self.interrupt {
            interrupt.trigger();
            return Ok(Verdict::Interrupted);
        }
        let idx = attempt.min(self.verdicts.len().saturating_sub(1));
        Ok(self.verdicts.get(idx).cloned().unwrap_or(Verdict::Pass))
    }
}
