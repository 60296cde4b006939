use std::fmt;
use std::str::FromStr;

/// Vendor request code of the firmware load request, implemented by the EZ-USB boot ROM.
pub const FIRMWARE_LOAD_REQUEST: u8 = 0xa0;

/// Value written to the CPUCS register to hold the 8051 in reset.
pub const CPU_HALT: u8 = 1;

/// Value written to the CPUCS register to let the 8051 run.
pub const CPU_RUN: u8 = 0;

/// EZ-USB microcontroller families. They differ in where the CPU control and status register
/// (CPUCS) lives.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Chip {
    /// Original EZ-USB (AN21xx).
    An21,

    /// EZ-USB FX (CY7C646xx).
    Fx,

    /// EZ-USB FX2 and FX2LP (CY7C68013 and relatives).
    Fx2,
}

impl Chip {
    /// Address of the CPUCS register, the processor's run/halt latch.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fxload::Chip;
    ///
    /// assert_eq!(Chip::Fx2.cpucs(), 0xe600);
    /// assert_eq!(Chip::default().cpucs(), 0xe600);
    /// ```
    pub fn cpucs(self) -> u16 {
        match self {
            Chip::An21 | Chip::Fx => 0x7f92,
            Chip::Fx2 => 0xe600,
        }
    }
}

impl Default for Chip {
    fn default() -> Self {
        Chip::Fx2
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Chip::An21 => "an21",
            Chip::Fx => "fx",
            Chip::Fx2 => "fx2",
        })
    }
}

/// Returned when a chip name is not recognised.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownChip(pub String);

impl fmt::Display for UnknownChip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chip `{}` (expected an21, fx or fx2)", self.0)
    }
}

impl std::error::Error for UnknownChip {}

impl FromStr for Chip {
    type Err = UnknownChip;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "an21" => Ok(Chip::An21),
            "fx" => Ok(Chip::Fx),
            "fx2" | "fx2lp" => Ok(Chip::Fx2),
            _ => Err(UnknownChip(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("fx2".parse(), Ok(Chip::Fx2));
        assert_eq!("FX2LP".parse(), Ok(Chip::Fx2));
        assert_eq!("an21".parse(), Ok(Chip::An21));
        assert_eq!("fx".parse::<Chip>().map(Chip::cpucs), Ok(0x7f92));
        assert!("fx3".parse::<Chip>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for chip in &[Chip::An21, Chip::Fx, Chip::Fx2] {
            assert_eq!(chip.to_string().parse(), Ok(*chip));
        }
    }
}
