//! Ordered input forms with a back/forward cursor.
//!
//! A [`StepSequence`] owns the answers given so far; the cursor is the number
//! of answers. Only the pending step is materialised, and it is derived from
//! the answers after every move so that forms whose shape depends on an
//! earlier answer (one rate per year) stay consistent.

use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StepKind {
    Amount { min: Option<f64> },
    Count { min: i64 },
}

const AN_AMOUNT: &str = "an amount";
const A_WHOLE_NUMBER: &str = "a whole number";

impl StepKind {
    fn expected(self) -> &'static str {
        match self {
            StepKind::Amount { .. } => AN_AMOUNT,
            StepKind::Count { .. } => A_WHOLE_NUMBER,
        }
    }

    fn accepts(self, answer: Answer) -> bool {
        matches!(
            (self, answer),
            (StepKind::Amount { .. }, Answer::Amount(_)) | (StepKind::Count { .. }, Answer::Count(_))
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepSpec {
    pub prompt: String,
    pub kind: StepKind,
}

impl StepSpec {
    fn amount(prompt: impl Into<String>, min: Option<f64>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: StepKind::Amount { min },
        }
    }

    fn count(prompt: impl Into<String>, min: i64) -> Self {
        Self {
            prompt: prompt.into(),
            kind: StepKind::Count { min },
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Answer {
    Amount(f64),
    Count(u32),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("this step expects {expected}")]
    WrongKind { expected: &'static str },
}

impl Answer {
    fn amount(self) -> Result<f64, StepError> {
        match self {
            Answer::Amount(v) => Ok(v),
            Answer::Count(_) => Err(StepError::WrongKind {
                expected: AN_AMOUNT,
            }),
        }
    }

    fn count(self) -> Result<u32, StepError> {
        match self {
            Answer::Count(n) => Ok(n),
            Answer::Amount(_) => Err(StepError::WrongKind {
                expected: A_WHOLE_NUMBER,
            }),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Form {
    FixedGrowth,
    VariableGrowth,
    Depletion,
    OptimalWithdrawal,
}

/// A completed form, ready to hand to the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    FixedGrowth {
        principal: f64,
        rate: f64,
        years: u32,
        contribution: f64,
    },
    VariableGrowth {
        principal: f64,
        rates: Vec<f64>,
        contribution: f64,
    },
    Depletion {
        rate: f64,
        withdrawal: f64,
    },
    OptimalWithdrawal {
        rate: f64,
        years: u32,
    },
}

const PRINCIPAL: &str = "Initial principal";
const GROWTH_RATE: &str = "Annual growth rate (e.g. 0.05 = 5%)";
const RETIREMENT_RATE: &str = "Post-retirement growth rate (e.g. 0.03)";
const CONTRIBUTION: &str = "Annual contribution";

impl Form {
    pub fn title(self) -> &'static str {
        match self {
            Form::FixedGrowth => "Fixed Growth Investment",
            Form::VariableGrowth => "Variable Growth Investment",
            Form::Depletion => "Years Until Depletion",
            Form::OptimalWithdrawal => "Optimal Withdrawal Calculator",
        }
    }

    /// The step at `index`, or `None` once the form is complete.
    fn step(self, index: usize, answers: &[Answer]) -> Option<StepSpec> {
        match (self, index) {
            (Form::FixedGrowth, 0) | (Form::VariableGrowth, 0) => {
                Some(StepSpec::amount(PRINCIPAL, Some(0.0)))
            }
            (Form::FixedGrowth, 1) => Some(StepSpec::amount(GROWTH_RATE, Some(0.0))),
            (Form::FixedGrowth, 2) => Some(StepSpec::count("Years until retirement", 1)),
            (Form::FixedGrowth, 3) => Some(StepSpec::amount(CONTRIBUTION, Some(0.0))),
            (Form::VariableGrowth, 1) => Some(StepSpec::count("Number of years", 1)),
            (Form::VariableGrowth, _) => {
                let years = answers.get(1)?.count().ok()? as usize;
                let year = index - 1;
                if year <= years {
                    Some(StepSpec::amount(
                        format!("Year {year} growth rate (e.g. 0.05 = 5%)"),
                        None,
                    ))
                } else if year == years + 1 {
                    Some(StepSpec::amount(CONTRIBUTION, Some(0.0)))
                } else {
                    None
                }
            }
            (Form::Depletion, 0) | (Form::OptimalWithdrawal, 0) => {
                Some(StepSpec::amount(RETIREMENT_RATE, Some(0.0)))
            }
            (Form::Depletion, 1) => Some(StepSpec::amount("Annual withdrawal amount", Some(0.0))),
            (Form::OptimalWithdrawal, 1) => Some(StepSpec::count(
                "Expected retirement duration (years)",
                1,
            )),
            _ => None,
        }
    }

    fn build(self, answers: &[Answer]) -> Result<Request, StepError> {
        let request = match self {
            Form::FixedGrowth => Request::FixedGrowth {
                principal: answers[0].amount()?,
                rate: answers[1].amount()?,
                years: answers[2].count()?,
                contribution: answers[3].amount()?,
            },
            Form::VariableGrowth => {
                let last = answers.len() - 1;
                Request::VariableGrowth {
                    principal: answers[0].amount()?,
                    rates: answers[2..last]
                        .iter()
                        .map(|a| a.amount())
                        .collect::<Result<_, _>>()?,
                    contribution: answers[last].amount()?,
                }
            }
            Form::Depletion => Request::Depletion {
                rate: answers[0].amount()?,
                withdrawal: answers[1].amount()?,
            },
            Form::OptimalWithdrawal => Request::OptimalWithdrawal {
                rate: answers[0].amount()?,
                years: answers[1].count()?,
            },
        };
        Ok(request)
    }
}

#[derive(Debug, Clone)]
pub struct StepSequence {
    form: Form,
    current: Option<StepSpec>,
    answers: Vec<Answer>,
}

impl StepSequence {
    pub fn new(form: Form) -> Self {
        Self {
            form,
            current: form.step(0, &[]),
            answers: Vec::new(),
        }
    }

    pub fn form(&self) -> Form {
        self.form
    }

    /// Index of the step awaiting an answer.
    pub fn position(&self) -> usize {
        self.answers.len()
    }

    pub fn current(&self) -> Option<&StepSpec> {
        self.current.as_ref()
    }

    /// Records an answer for the current step. Returns the completed request
    /// once the last step has been answered; an answer of the wrong kind is
    /// rejected and the cursor stays put.
    pub fn submit(&mut self, answer: Answer) -> Result<Option<Request>, StepError> {
        let Some(step) = &self.current else {
            return Ok(None);
        };
        if !step.kind.accepts(answer) {
            return Err(StepError::WrongKind {
                expected: step.kind.expected(),
            });
        }
        self.answers.push(answer);
        self.current = self.form.step(self.answers.len(), &self.answers);
        match self.current {
            Some(_) => Ok(None),
            None => self.form.build(&self.answers).map(Some),
        }
    }

    /// Moves the cursor back one step. Returns `false` at the first step.
    pub fn previous(&mut self) -> bool {
        if self.answers.pop().is_none() {
            return false;
        }
        self.current = self.form.step(self.answers.len(), &self.answers);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(sequence: &StepSequence) -> &str {
        &sequence.current().expect("step pending").prompt
    }

    fn submit(sequence: &mut StepSequence, answer: Answer) -> Option<Request> {
        sequence.submit(answer).expect("answer matches step kind")
    }

    #[test]
    fn fixed_growth_collects_four_answers_in_order() {
        let mut sequence = StepSequence::new(Form::FixedGrowth);
        assert_eq!(prompt(&sequence), PRINCIPAL);
        assert_eq!(submit(&mut sequence, Answer::Amount(1_000.0)), None);
        assert_eq!(prompt(&sequence), GROWTH_RATE);
        assert_eq!(submit(&mut sequence, Answer::Amount(0.05)), None);
        assert_eq!(submit(&mut sequence, Answer::Count(3)), None);
        let request = submit(&mut sequence, Answer::Amount(100.0));
        assert_eq!(
            request,
            Some(Request::FixedGrowth {
                principal: 1_000.0,
                rate: 0.05,
                years: 3,
                contribution: 100.0,
            })
        );
        assert!(sequence.current().is_none());
        assert_eq!(submit(&mut sequence, Answer::Amount(1.0)), None);
    }

    #[test]
    fn previous_discards_the_last_answer() {
        let mut sequence = StepSequence::new(Form::FixedGrowth);
        assert!(!sequence.previous());
        submit(&mut sequence, Answer::Amount(1_000.0));
        submit(&mut sequence, Answer::Amount(0.05));
        assert_eq!(sequence.position(), 2);

        assert!(sequence.previous());
        assert_eq!(sequence.position(), 1);
        assert_eq!(prompt(&sequence), GROWTH_RATE);

        submit(&mut sequence, Answer::Amount(0.07));
        submit(&mut sequence, Answer::Count(10));
        let request = submit(&mut sequence, Answer::Amount(0.0));
        assert!(matches!(
            request,
            Some(Request::FixedGrowth { rate, years: 10, .. }) if rate == 0.07
        ));
    }

    #[test]
    fn variable_growth_expands_one_rate_step_per_year() {
        let mut sequence = StepSequence::new(Form::VariableGrowth);
        submit(&mut sequence, Answer::Amount(500.0));
        submit(&mut sequence, Answer::Count(2));
        assert_eq!(prompt(&sequence), "Year 1 growth rate (e.g. 0.05 = 5%)");
        submit(&mut sequence, Answer::Amount(0.1));
        assert_eq!(prompt(&sequence), "Year 2 growth rate (e.g. 0.05 = 5%)");
        submit(&mut sequence, Answer::Amount(-0.05));
        assert_eq!(prompt(&sequence), CONTRIBUTION);
        let request = submit(&mut sequence, Answer::Amount(25.0));
        assert_eq!(
            request,
            Some(Request::VariableGrowth {
                principal: 500.0,
                rates: vec![0.1, -0.05],
                contribution: 25.0,
            })
        );
    }

    #[test]
    fn variable_growth_can_step_back_from_first_rate_to_year_count() {
        let mut sequence = StepSequence::new(Form::VariableGrowth);
        submit(&mut sequence, Answer::Amount(500.0));
        submit(&mut sequence, Answer::Count(3));
        submit(&mut sequence, Answer::Amount(0.02));

        assert!(sequence.previous());
        assert_eq!(prompt(&sequence), "Year 1 growth rate (e.g. 0.05 = 5%)");
        assert!(sequence.previous());
        assert_eq!(prompt(&sequence), "Number of years");

        submit(&mut sequence, Answer::Count(1));
        submit(&mut sequence, Answer::Amount(0.04));
        let request = submit(&mut sequence, Answer::Amount(0.0));
        assert_eq!(
            request,
            Some(Request::VariableGrowth {
                principal: 500.0,
                rates: vec![0.04],
                contribution: 0.0,
            })
        );
    }

    #[test]
    fn retirement_forms_have_two_steps() {
        let mut sequence = StepSequence::new(Form::Depletion);
        assert_eq!(sequence.form().title(), "Years Until Depletion");
        submit(&mut sequence, Answer::Amount(0.03));
        assert_eq!(
            submit(&mut sequence, Answer::Amount(40_000.0)),
            Some(Request::Depletion {
                rate: 0.03,
                withdrawal: 40_000.0,
            })
        );

        let mut sequence = StepSequence::new(Form::OptimalWithdrawal);
        assert_eq!(
            sequence.current().map(|s| s.kind),
            Some(StepKind::Amount { min: Some(0.0) })
        );
        submit(&mut sequence, Answer::Amount(0.04));
        assert_eq!(
            sequence.current().map(|s| s.kind),
            Some(StepKind::Count { min: 1 })
        );
        assert_eq!(
            submit(&mut sequence, Answer::Count(25)),
            Some(Request::OptimalWithdrawal {
                rate: 0.04,
                years: 25,
            })
        );
    }

    #[test]
    fn answers_of_the_wrong_kind_are_rejected_without_moving() {
        let mut sequence = StepSequence::new(Form::FixedGrowth);
        assert_eq!(
            sequence.submit(Answer::Count(1_000)),
            Err(StepError::WrongKind {
                expected: "an amount"
            })
        );
        assert_eq!(sequence.position(), 0);

        submit(&mut sequence, Answer::Amount(1_000.0));
        submit(&mut sequence, Answer::Amount(0.05));
        assert_eq!(
            sequence.submit(Answer::Amount(3.7)),
            Err(StepError::WrongKind {
                expected: "a whole number"
            })
        );
        assert_eq!(sequence.position(), 2);
        assert_eq!(prompt(&sequence), "Years until retirement");
    }

    #[test]
    fn long_variable_form_fills_quickly() {
        const YEARS: u32 = 100_000;
        let started = std::time::Instant::now();

        let mut sequence = StepSequence::new(Form::VariableGrowth);
        submit(&mut sequence, Answer::Amount(1_000.0));
        submit(&mut sequence, Answer::Count(YEARS));
        for _ in 0..YEARS {
            assert_eq!(submit(&mut sequence, Answer::Amount(0.01)), None);
        }
        assert_eq!(prompt(&sequence), CONTRIBUTION);
        assert!(sequence.previous());
        assert_eq!(prompt(&sequence), "Year 100000 growth rate (e.g. 0.05 = 5%)");
        submit(&mut sequence, Answer::Amount(0.02));

        let Some(Request::VariableGrowth { rates, .. }) =
            submit(&mut sequence, Answer::Amount(0.0))
        else {
            panic!("expected a completed variable growth form");
        };
        assert_eq!(rates.len(), YEARS as usize);
        assert_eq!(rates.last(), Some(&0.02));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }
}
