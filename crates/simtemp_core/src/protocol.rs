//! Decodificação do registro binário do `/dev/simtemp`.
//!
//! Formato do registro:
//!
//! ```text
//! ┌──────────────────┬─────────────┬───────────┐
//! │ timestamp_ns (8) │ temp_mC (4) │ flags (4) │
//! └──────────────────┴─────────────┴───────────┘
//! ```
//!
//! - Little-endian, sem padding (`__attribute__((packed))` no driver)
//! - `temp_mC` com sinal, em milésimos de °C
//! - `flags`: bit0 NEW, bit1 THRS

use crate::timestamp::format_timestamp;
use crate::types::{RawSample, SensorReading};

/// Tamanho exato de um registro.
pub const SAMPLE_SIZE: usize = 16;

/// Motivos pelos quais um buffer não vira leitura.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Nada lido (EOF ou buffer vazio). Transitório, sem diagnóstico.
    #[error("Nenhum dado disponível")]
    NoData,

    /// Tamanho diferente de [`SAMPLE_SIZE`]; a amostra é descartada inteira.
    #[error("Registro com {0} bytes (esperado {SAMPLE_SIZE})")]
    ShortRead(usize),

    #[error("Erro de deserialização: {0}")]
    Deserialize(String),
}

/// Interpreta exatamente 16 bytes como [`RawSample`].
pub fn decode_raw(data: &[u8]) -> Result<RawSample, DecodeError> {
    match data.len() {
        0 => Err(DecodeError::NoData),
        SAMPLE_SIZE => {
            bincode::deserialize(data).map_err(|e| DecodeError::Deserialize(e.to_string()))
        }
        n => Err(DecodeError::ShortRead(n)),
    }
}

/// Decodifica um registro em [`SensorReading`].
pub fn decode_sample(data: &[u8]) -> Result<SensorReading, DecodeError> {
    let raw = decode_raw(data)?;
    Ok(SensorReading {
        timestamp: format_timestamp(i128::from(raw.timestamp_ns)),
        temp_c: raw.temp_c(),
        is_alert: raw.is_alert(),
    })
}

/// Codifica um [`RawSample`] no layout do driver. Usado por simuladores e testes.
pub fn encode_raw(sample: &RawSample) -> [u8; SAMPLE_SIZE] {
    let mut frame = [0u8; SAMPLE_SIZE];
    frame[0..8].copy_from_slice(&sample.timestamp_ns.to_le_bytes());
    frame[8..12].copy_from_slice(&sample.temp_mc.to_le_bytes());
    frame[12..16].copy_from_slice(&sample.flags.to_le_bytes());
    frame
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EVT_NEW, EVT_THRS};

    fn frame(ts: u64, temp_mc: i32, flags: u32) -> [u8; SAMPLE_SIZE] {
        encode_raw(&RawSample {
            timestamp_ns: ts,
            temp_mc,
            flags,
        })
    }

    #[test]
    fn decodes_alert_record() {
        let reading = decode_sample(&frame(1_500_000_000_000, 24_500, EVT_THRS)).unwrap();
        assert_eq!(
            reading,
            SensorReading {
                timestamp: "1970-01-01T00:25:00.000Z".into(),
                temp_c: 24.5,
                is_alert: true,
            }
        );
    }

    #[test]
    fn alert_follows_thrs_bit_only() {
        assert!(!decode_sample(&frame(0, 0, EVT_NEW)).unwrap().is_alert);
        assert!(decode_sample(&frame(0, 0, EVT_NEW | EVT_THRS)).unwrap().is_alert);
        assert!(!decode_sample(&frame(0, 0, 0xFFFF_FFFD)).unwrap().is_alert);
    }

    #[test]
    fn negative_temperature() {
        let reading = decode_sample(&frame(0, -12_250, EVT_NEW)).unwrap();
        assert_eq!(reading.temp_c, -12.25);
    }

    #[test]
    fn encode_matches_bincode_layout() {
        let sample = RawSample {
            timestamp_ns: 0x0102_0304_0506_0708,
            temp_mc: 44_123,
            flags: EVT_NEW,
        };
        assert_eq!(encode_raw(&sample).to_vec(), bincode::serialize(&sample).unwrap());
        assert_eq!(decode_raw(&encode_raw(&sample)).unwrap(), sample);
    }

    #[test]
    fn short_read_is_rejected() {
        let full = frame(1, 2, 3);
        assert_eq!(decode_sample(&full[..10]), Err(DecodeError::ShortRead(10)));
        assert_eq!(decode_sample(&full[..1]), Err(DecodeError::ShortRead(1)));
    }

    #[test]
    fn empty_is_no_data() {
        assert_eq!(decode_sample(&[]), Err(DecodeError::NoData));
    }

    #[test]
    fn oversized_is_rejected() {
        let mut long = frame(1, 2, 3).to_vec();
        long.push(0);
        assert_eq!(decode_sample(&long), Err(DecodeError::ShortRead(17)));
    }
}
