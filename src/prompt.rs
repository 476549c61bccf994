// Jackson Coxson
//! Interactive questions on the console

use std::{
    fmt::Display,
    io::{BufRead, Write},
    ops::RangeInclusive,
};

use crate::SpooferError;

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Asks questions on `output` and reads the answers from `input`
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Asks a yes/no question. An empty answer picks `default`.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool, SpooferError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{question} {hint}: "))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Error: invalid input")?,
            }
        }
    }

    /// Asks for a floating point number inside `range`, re-asking until one is
    /// given. An empty answer picks `default`.
    pub fn float_in(
        &mut self,
        question: &str,
        default: f64,
        range: RangeInclusive<f64>,
    ) -> Result<f64, SpooferError> {
        loop {
            let answer = self.ask(&format!("{question} [{}]: ", Shown(default)))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<f64>() {
                Ok(v) if range.contains(&v) => return Ok(v),
                Ok(v) => writeln!(
                    self.output,
                    "Error: {v} is not in the range {}<=x<={}.",
                    range.start(),
                    range.end()
                )?,
                Err(_) => writeln!(self.output, "Error: '{answer}' is not a valid float.")?,
            }
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String, SpooferError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            writeln!(self.output)?;
            return Err(SpooferError::Aborted);
        }
        Ok(buf.trim().to_string())
    }
}

/// Renders whole numbers with one decimal place
struct Shown(f64);

impl Display for Shown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.fract() == 0.0 && self.0.is_finite() {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(p: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.output).unwrap()
    }

    #[test]
    fn confirm_accepts_yes_and_no() {
        let mut p = prompter("y\nNO\nYes\n");
        assert!(p.confirm("Continue?", false).unwrap());
        assert!(!p.confirm("Continue?", true).unwrap());
        assert!(p.confirm("Continue?", false).unwrap());
    }

    #[test]
    fn confirm_empty_uses_default() {
        let mut p = prompter("\n\n");
        assert!(!p.confirm("Continue?", false).unwrap());
        assert!(p.confirm("Continue?", true).unwrap());

        let out = transcript(p);
        assert!(out.contains("Continue? [y/N]: "));
        assert!(out.contains("Continue? [Y/n]: "));
    }

    #[test]
    fn confirm_reasks_on_garbage() {
        let mut p = prompter("maybe\ny\n");
        assert!(p.confirm("Continue?", false).unwrap());
        assert_eq!(transcript(p).matches("Continue? [y/N]: ").count(), 2);
    }

    #[test]
    fn confirm_eof_aborts() {
        let mut p = prompter("");
        assert!(matches!(
            p.confirm("Continue?", false),
            Err(SpooferError::Aborted)
        ));
    }

    #[test]
    fn float_default_and_value() {
        let mut p = prompter("\n  48.8584 \n");
        assert_eq!(p.float_in("Enter latitude", 0.0, LATITUDE_RANGE).unwrap(), 0.0);
        assert_eq!(p.float_in("Enter latitude", 0.0, LATITUDE_RANGE).unwrap(), 48.8584);
        assert!(transcript(p).starts_with("Enter latitude [0.0]: "));
    }

    #[test]
    fn float_reasks_on_invalid() {
        let mut p = prompter("north\n-122.5\n");
        assert_eq!(p.float_in("Enter longitude", 0.0, LONGITUDE_RANGE).unwrap(), -122.5);
        assert!(transcript(p).contains("Error: 'north' is not a valid float."));
    }

    #[test]
    fn float_in_enforces_range() {
        let mut p = prompter("91\n-90\n");
        assert_eq!(
            p.float_in("Enter latitude", 0.0, LATITUDE_RANGE).unwrap(),
            -90.0
        );
        assert!(transcript(p).contains("Error: 91 is not in the range -90<=x<=90."));
    }

    #[test]
    fn float_eof_aborts() {
        let mut p = prompter("abc\n");
        assert!(matches!(
            p.float_in("Enter latitude", 0.0, LATITUDE_RANGE),
            Err(SpooferError::Aborted)
        ));
    }
}
