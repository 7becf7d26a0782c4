/// 保留两位小数，按 f64 的精确十进制值舍入，恰好一半时取偶数
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// 相对 base 的百分比变化，base 为 0 时返回 None
pub fn pct_change(base: f64, value: f64) -> Option<f64> {
    if base == 0.0 {
        return None;
    }
    Some((value - base) / base * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(120.0), 120.0);
        assert_eq!(round2(12.345_678), 12.35);
        assert_eq!(round2(-3.14159), -3.14);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn round2_follows_exact_decimal_value() {
        // 2.675 / 1.115 实际存储值略小于字面量
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(1.115), 1.11);
        // 0.125 可精确表示，恰好一半取偶数
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn pct_change_basic() {
        assert_eq!(pct_change(100.0, 120.0), Some(20.0));
        assert_eq!(pct_change(100.0, 80.0), Some(-20.0));
        assert_eq!(pct_change(0.0, 5.0), None);
    }
}
