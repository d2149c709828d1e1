//! Conversão de timestamps do driver para texto UTC.

use chrono::{DateTime, SecondsFormat};

/// Valor usado para instantes negativos ou fora do intervalo representável.
pub const EPOCH_SENTINEL: &str = "1970-01-01T00:00:00.000Z";

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Formata nanossegundos desde a época como `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Recebe `i128` para aceitar tanto o `u64` do registro quanto valores com
/// sinal sem perda. Dígitos abaixo do milissegundo são truncados.
pub fn format_timestamp(ts_ns: i128) -> String {
    if ts_ns < 0 {
        return EPOCH_SENTINEL.to_string();
    }

    let secs = ts_ns / NANOS_PER_SEC;
    let nanos = (ts_ns % NANOS_PER_SEC) as u32;

    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, nanos))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| EPOCH_SENTINEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_offset_in_minutes() {
        assert_eq!(
            format_timestamp(1_500_000_000_000),
            "1970-01-01T00:25:00.000Z"
        );
    }

    #[test]
    fn real_date_with_millis() {
        // 2025-09-22T20:15:04.123456789Z
        assert_eq!(
            format_timestamp(1_758_572_104_123_456_789),
            "2025-09-22T20:15:04.123Z"
        );
    }

    #[test]
    fn negative_clamps_to_sentinel() {
        assert_eq!(format_timestamp(-1), EPOCH_SENTINEL);
        assert_eq!(format_timestamp(-86_400 * NANOS_PER_SEC), EPOCH_SENTINEL);
    }

    #[test]
    fn zero_and_max_wire_value() {
        assert_eq!(format_timestamp(0), EPOCH_SENTINEL);
        // u64::MAX ns ~ ano 2554, ainda representável
        let max = format_timestamp(i128::from(u64::MAX));
        assert!(max.starts_with("2554-"), "{max}");
        assert!(max.ends_with('Z'));
    }

    #[test]
    fn out_of_range_clamps() {
        assert_eq!(format_timestamp(i128::MAX), EPOCH_SENTINEL);
    }
}
