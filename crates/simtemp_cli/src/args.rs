//! Parsing dos argumentos de linha de comando.

use simtemp_core::types::{InvalidMode, SensorMode};
use std::path::PathBuf;

pub const USAGE: &str = "\
Uso: simtemp [opções]

  --sampling-ms <ms>     Período de amostragem
  --threshold <°C>       Threshold de alerta (float)
  --mode <modo>          normal | noisy | ramp
  --monitor              Monitora leituras (padrão sem outras opções)
  --test                 Self-test do alerta THRS
  --config <arquivo>     Caminho do simtemp.toml
  -h, --help             Esta ajuda";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ArgsError {
    #[error("Opção desconhecida: {0}")]
    Unknown(String),

    #[error("Opção {0} precisa de um valor")]
    MissingValue(String),

    #[error("Valor inválido para {flag}: {value:?}")]
    InvalidValue { flag: String, value: String },

    #[error(transparent)]
    Mode(#[from] InvalidMode),
}

#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub sampling_ms: Option<u32>,
    pub threshold: Option<f64>,
    pub mode: Option<SensorMode>,
    pub monitor: bool,
    pub test: bool,
    pub help: bool,
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Aceita `--opção valor` e `--opção=valor`.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut out = CliArgs::default();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((f, v)) if f.starts_with("--") => (f.to_string(), Some(v.to_string())),
                _ => (arg.clone(), None),
            };

            let mut value = || {
                inline
                    .clone()
                    .or_else(|| iter.next())
                    .ok_or_else(|| ArgsError::MissingValue(flag.clone()))
            };

            match flag.as_str() {
                "--sampling-ms" => {
                    let v = value()?;
                    out.sampling_ms = Some(parse_value(&flag, &v)?);
                }
                "--threshold" => {
                    let v = value()?;
                    out.threshold = Some(parse_value(&flag, &v)?);
                }
                "--mode" => out.mode = Some(value()?.parse()?),
                "--config" => out.config = Some(PathBuf::from(value()?)),
                "--monitor" => out.monitor = true,
                "--test" => out.test = true,
                "-h" | "--help" => out.help = true,
                _ => return Err(ArgsError::Unknown(flag.clone())),
            }
        }

        Ok(out)
    }

    /// Alguma opção de configuração do sensor foi passada.
    pub fn has_settings(&self) -> bool {
        self.sampling_ms.is_some() || self.threshold.is_some() || self.mode.is_some()
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, ArgsError> {
    value.parse().map_err(|_| ArgsError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, ArgsError> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_means_monitor() {
        let args = parse(&[]).unwrap();
        assert!(!args.has_settings());
        assert!(!args.test);
    }

    #[test]
    fn settings_in_both_forms() {
        let args = parse(&["--sampling-ms", "200", "--threshold=30.5", "--mode", "ramp"]).unwrap();
        assert_eq!(args.sampling_ms, Some(200));
        assert_eq!(args.threshold, Some(30.5));
        assert_eq!(args.mode, Some(SensorMode::Ramp));
        assert!(args.has_settings());
    }

    #[test]
    fn zero_threshold_is_still_a_setting() {
        let args = parse(&["--threshold", "0"]).unwrap();
        assert_eq!(args.threshold, Some(0.0));
        assert!(args.has_settings());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse(&["--sampling-ms"]),
            Err(ArgsError::MissingValue("--sampling-ms".into()))
        );
        assert!(matches!(
            parse(&["--sampling-ms", "-5"]),
            Err(ArgsError::InvalidValue { .. })
        ));
        assert!(matches!(parse(&["--mode", "turbo"]), Err(ArgsError::Mode(_))));
        assert_eq!(parse(&["--verbose"]), Err(ArgsError::Unknown("--verbose".into())));
    }

    #[test]
    fn flags_and_config_path() {
        let args = parse(&["--test", "--config", "/tmp/x.toml", "--monitor"]).unwrap();
        assert!(args.test && args.monitor);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/x.toml")));
    }
}
