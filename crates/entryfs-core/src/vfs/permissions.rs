//! Permission bits.
//!
//! Modes are held as the numeric value (`0o755`) and shown as four octal
//! digits (`0755`). Transports that list entries the way `ls -l` does report
//! a symbolic string instead; [`Permissions::from_symbolic`] decodes it.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const SETUID: u32 = 0o4000;
const SETGID: u32 = 0o2000;
const STICKY: u32 = 0o1000;

/// Numeric permission mode, including setuid/setgid/sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions(u32);

impl Permissions {
    /// Mode from raw bits; anything above `0o7777` (file type bits) is dropped.
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    pub const fn mode(self) -> u32 {
        self.0
    }

    /// Decode a symbolic mode such as `-rwxr-xr-x` or `drwsr-xr-T`.
    ///
    /// The leading type character is ignored. Per triad `r` adds 4, `w` adds 2
    /// and `x`/`s`/`t` add 1; `s`/`t` in either case also set the matching
    /// special bit (setuid for owner, setgid for group, sticky for others).
    pub fn from_symbolic(mode: &str) -> Result<Self> {
        let chars: Vec<char> = mode.chars().collect();
        if chars.len() < 10 {
            return Err(Error::Mode(format!(
                "\"{}\" needs a type character and three triads",
                mode
            )));
        }

        let mut bits = 0;
        for (triad, special) in [(0, SETUID), (1, SETGID), (2, STICKY)] {
            let read = chars[1 + triad * 3];
            let write = chars[2 + triad * 3];
            let exec = chars[3 + triad * 3];

            let mut digit = 0;
            if read == 'r' {
                digit += 4;
            }
            if write == 'w' {
                digit += 2;
            }
            if matches!(exec, 'x' | 's' | 't') {
                digit += 1;
            }
            if matches!(exec, 's' | 'S' | 't' | 'T') {
                bits |= special;
            }
            bits |= digit << (3 * (2 - triad));
        }
        Ok(Self(bits))
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl FromStr for Permissions {
    type Err = Error;

    /// Parse an octal mode such as `755` or `0644`.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim();
        let digits = digits.strip_prefix("0o").unwrap_or(digits);
        if digits.is_empty() || digits.len() > 4 {
            return Err(Error::Mode(format!("\"{}\" is not a 1-4 digit octal mode", s)));
        }
        u32::from_str_radix(digits, 8)
            .map(Self::from_mode)
            .map_err(|e| Error::Mode(format!("\"{}\": {}", s, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_common_modes() {
        assert_eq!(Permissions::from_symbolic("-rwxr-xr-x").unwrap().mode(), 0o755);
        assert_eq!(Permissions::from_symbolic("-rw-r--r--").unwrap().mode(), 0o644);
        assert_eq!(Permissions::from_symbolic("dr--r--r--").unwrap().mode(), 0o444);
        assert_eq!(Permissions::from_symbolic("----------").unwrap().mode(), 0);
    }

    #[test]
    fn test_symbolic_special_bits() {
        assert_eq!(Permissions::from_symbolic("-rwsr-xr-x").unwrap().mode(), 0o4755);
        assert_eq!(Permissions::from_symbolic("-rwxr-sr-x").unwrap().mode(), 0o2755);
        assert_eq!(Permissions::from_symbolic("drwxrwxrwt").unwrap().mode(), 0o1777);
        // Upper case: special bit set, execute not.
        assert_eq!(Permissions::from_symbolic("drwxrwxrwT").unwrap().mode(), 0o1776);
        assert_eq!(Permissions::from_symbolic("-rwSr--r--").unwrap().mode(), 0o4644);
    }

    #[test]
    fn test_symbolic_too_short() {
        assert!(Permissions::from_symbolic("rwx").is_err());
    }

    #[test]
    fn test_display_is_four_octal_digits() {
        assert_eq!(Permissions::from_mode(0o755).to_string(), "0755");
        assert_eq!(Permissions::from_mode(0o4755).to_string(), "4755");
        assert_eq!(Permissions::from_mode(0o100644).to_string(), "0644");
    }

    #[test]
    fn test_parse_octal() {
        assert_eq!("0755".parse::<Permissions>().unwrap().mode(), 0o755);
        assert_eq!("644".parse::<Permissions>().unwrap().mode(), 0o644);
        assert_eq!("0o700".parse::<Permissions>().unwrap().mode(), 0o700);
        assert!("0799".parse::<Permissions>().is_err());
        assert!("".parse::<Permissions>().is_err());
        assert!("17777".parse::<Permissions>().is_err());
    }
}
