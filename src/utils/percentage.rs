use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;

/// Percentage in `0..=100`. Used to show and accept the overlay opacity the way people talk
/// about it ("80%") while it is stored as a `0.0..=1.0` fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0.round() as i64)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if (0. ..=100.).contains(&value) {
            Some(Percentage(value))
        } else {
            None
        }
    }

    pub fn from_fraction(fraction: f32) -> Percentage {
        Percentage((fraction as f64 * 100.).clamp(0., 100.))
    }

    pub fn as_fraction(&self) -> f32 {
        (self.0 / 100.) as f32
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // This means that 100%% also works, but I think I'm fine with that
        let s = s.trim().trim_end_matches("%");
        let v = s.parse::<f64>()?;
        Percentage::new_opt(v).ok_or_else(|| anyhow!("Can't parse {s} into percentage"))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
