//! `clap`-derived argument surface, matching spec.md §6 exactly: `-d`/`-r`
//! as a mutually exclusive mode flag, plus the shared threshold/dimension/
//! seed/directory flags.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::error::{Result, ShadowShareError};

/// `-h` is claimed by `height` below, so clap's auto-generated help flag
/// (also `-h` by default) is disabled and re-added as a long-only flag.
#[derive(Parser, Debug)]
#[command(name = "shadowshare")]
#[command(about = "(k, n) threshold secret-image sharing over GF(257) with BMP steganography")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Distribute mode: split `--secret` into shadows hidden in `--dir`'s carriers.
    #[arg(short = 'd', long = "distribute")]
    pub distribute: bool,

    /// Print help (long form only; `-h` is reserved for the secret height).
    #[arg(long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Recover mode: reconstruct `--secret` from `--dir`'s stego carriers.
    #[arg(short = 'r', long = "recover")]
    pub recover: bool,

    /// Secret image: distribute input, or recover output.
    #[arg(long = "secret")]
    pub secret: PathBuf,

    /// Threshold: number of shadows required to reconstruct.
    #[arg(short = 'k')]
    pub k: u16,

    /// Total shadows to produce (distribute only); defaults to the count of
    /// regular files in `--dir`.
    #[arg(short = 'n')]
    pub n: Option<u16>,

    /// Secret width, required for `-r`, used to validate carriers for `-d`.
    #[arg(short = 'w')]
    pub width: Option<u32>,

    /// Secret height, required for `-r`, used to validate carriers for `-d`.
    #[arg(short = 'h')]
    pub height: Option<u32>,

    /// 16-bit PRNG seed.
    #[arg(short = 's', default_value_t = 691)]
    pub seed: u16,

    /// Directory holding carrier BMPs (distribute) or stego BMPs (recover).
    #[arg(long = "dir", default_value = "./")]
    pub dir: PathBuf,
}

/// The two mutually-exclusive run modes this CLI supports, resolved from the
/// `-d`/`-r` flags and their accompanying required fields.
pub enum Mode {
    Distribute { k: u16, n: u16, width: Option<u32>, height: Option<u32> },
    Recover { k: u16, width: u32, height: u32 },
}

impl Cli {
    /// Validates the flag combination and resolves the run mode, per
    /// spec.md §6 ("exactly one [of -d/-r] required").
    pub fn mode(&self) -> Result<Mode> {
        if self.distribute == self.recover {
            return Err(ShadowShareError::InvalidArguments(
                "exactly one of -d (distribute) or -r (recover) is required".into(),
            ));
        }
        if !(2..=65535).contains(&self.k) {
            return Err(ShadowShareError::InvalidArguments(format!(
                "k must satisfy 2 <= k <= 65535 (got {})",
                self.k
            )));
        }

        if self.distribute {
            let n = match self.n {
                Some(n) => n,
                None => count_regular_files(&self.dir)?,
            };
            if n < self.k {
                return Err(ShadowShareError::InvalidArguments(format!(
                    "n must be >= k (got n={n}, k={})",
                    self.k
                )));
            }
            Ok(Mode::Distribute { k: self.k, n, width: self.width, height: self.height })
        } else {
            let width = self.width.ok_or_else(|| {
                ShadowShareError::InvalidArguments("-w is required for -r".into())
            })?;
            let height = self.height.ok_or_else(|| {
                ShadowShareError::InvalidArguments("-h is required for -r".into())
            })?;
            Ok(Mode::Recover { k: self.k, width, height })
        }
    }
}

fn count_regular_files(dir: &std::path::Path) -> Result<u16> {
    let count = std::fs::read_dir(dir)
        .map_err(|e| ShadowShareError::io(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .count();
    u16::try_from(count).map_err(|_| {
        ShadowShareError::InvalidArguments(format!("{} holds more than 65535 files", dir.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec!["shadowshare"]
    }

    #[test]
    fn rejects_neither_mode_flag() {
        let mut args = base_args();
        args.extend(["--secret", "s.bmp", "-k", "2"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.mode().is_err());
    }

    #[test]
    fn rejects_both_mode_flags() {
        let mut args = base_args();
        args.extend(["-d", "-r", "--secret", "s.bmp", "-k", "2"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.mode().is_err());
    }

    #[test]
    fn recover_requires_width_and_height() {
        let mut args = base_args();
        args.extend(["-r", "--secret", "s.bmp", "-k", "2"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.mode().is_err());
    }

    #[test]
    fn distribute_with_explicit_n_resolves() {
        let mut args = base_args();
        args.extend(["-d", "--secret", "s.bmp", "-k", "2", "-n", "5"]);
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.mode().unwrap() {
            Mode::Distribute { k, n, width, height } => {
                assert_eq!(k, 2);
                assert_eq!(n, 5);
                assert_eq!(width, None);
                assert_eq!(height, None);
            }
            _ => panic!("expected Distribute"),
        }
    }

    #[test]
    fn distribute_carries_optional_width_and_height_for_carrier_validation() {
        let mut args = base_args();
        args.extend(["-d", "--secret", "s.bmp", "-k", "2", "-n", "5", "-w", "4", "-h", "1"]);
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.mode().unwrap() {
            Mode::Distribute { width, height, .. } => {
                assert_eq!(width, Some(4));
                assert_eq!(height, Some(1));
            }
            _ => panic!("expected Distribute"),
        }
    }

    #[test]
    fn long_help_flag_does_not_panic_on_the_reserved_short_h() {
        // Regression: `-h` is claimed by `height`; clap's auto-help short must
        // be disabled rather than colliding with it.
        let mut args = base_args();
        args.extend(["-r", "--secret", "s.bmp", "-k", "2", "-w", "4", "-h", "1"]);
        assert!(Cli::try_parse_from(args).is_ok());
    }

    #[test]
    fn seed_defaults_to_691() {
        let mut args = base_args();
        args.extend(["-r", "--secret", "s.bmp", "-k", "2", "-w", "4", "-h", "1"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.seed, 691);
    }
}
