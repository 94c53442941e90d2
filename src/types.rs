use std::fmt;

pub(crate) type Short = u16;
pub(crate) type Long = u32;

/// Two LONGs: a numerator and a denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct URational {
    pub numerator: u32,
    pub denominator: u32,
}

impl URational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Divides both terms by their greatest common divisor.
    pub fn reduced(self) -> Self {
        match gcd(self.numerator as u64, self.denominator as u64) {
            0 | 1 => self,
            divisor => Self::new(
                self.numerator / divisor as u32,
                self.denominator / divisor as u32,
            ),
        }
    }

    /// Infinite or NaN when the denominator is zero.
    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for URational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Two SLONGs: a numerator and a denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SRational {
    pub numerator: i32,
    pub denominator: i32,
}

impl SRational {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Divides both terms by their greatest common divisor and moves the
    /// sign onto the numerator.
    pub fn reduced(self) -> Self {
        let (mut numerator, mut denominator) = (self.numerator as i64, self.denominator as i64);
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }
        let divisor = match gcd(numerator.unsigned_abs(), denominator.unsigned_abs()) {
            0 => 1,
            divisor => divisor as i64,
        };
        // i32::MIN / -1 is the only quotient that leaves the i32 range
        match (
            i32::try_from(numerator / divisor),
            i32::try_from(denominator / divisor),
        ) {
            (Ok(numerator), Ok(denominator)) => Self::new(numerator, denominator),
            _ => self,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for SRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
