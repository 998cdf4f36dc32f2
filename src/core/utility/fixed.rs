//! 确定性定点运算 - 有符号 Q32.32 定点数
//! Deterministic fixed-point arithmetic - signed Q32.32 numbers
//!
//! 职责：
//! - 为效用计算提供跨平台可复现的算术
//! - 以 i128 中间值实现饱和乘除
//! - 提供确定性的指数函数
//!
//! Utility scores must reproduce bit-for-bit on every platform, which rules
//! out the platform-dependent `exp` in libm. All values here are `i64` with
//! 32 fractional bits; products and quotients widen to `i128` and saturate
//! back.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// Number of fractional bits in a [`Fixed`] value.
/// [`Fixed`] 值的小数位数。
pub(crate) const FRAC_BITS: u32 = 32;

/// ln(2) in Q32.32.
const LN_2: Fixed = Fixed(0xB17217F8);

/// Arguments above this saturate `exp` (e^21 already exceeds the integer
/// range of Q32.32), arguments below the negated bound underflow to zero.
const EXP_ARG_LIMIT: Fixed = Fixed((21i64) << FRAC_BITS);

/// Taylor terms for `exp` on `[0, ln 2)`; term 13 is already below the
/// representable quantum.
const EXP_TAYLOR_TERMS: i64 = 13;

/// A signed fixed-point number with 32 integer and 32 fractional bits.
///
/// 带符号定点数，32位整数部分与32位小数部分。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Fixed(i64);

impl Fixed {
    pub(crate) const ZERO: Fixed = Fixed(0);
    pub(crate) const ONE: Fixed = Fixed(1i64 << FRAC_BITS);
    pub(crate) const MAX: Fixed = Fixed(i64::MAX);
    pub(crate) const MIN: Fixed = Fixed(i64::MIN);

    /// Builds a value from its raw Q32.32 representation.
    /// 从原始的 Q32.32 表示构造值。
    pub(crate) const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// Returns the raw Q32.32 representation.
    /// 返回原始的 Q32.32 表示。
    pub(crate) const fn raw(self) -> i64 {
        self.0
    }

    /// Converts an integer, saturating at the Q32.32 integer range.
    /// 转换一个整数，超出 Q32.32 整数范围时饱和。
    pub(crate) fn from_int(value: i64) -> Self {
        let clamped = value.clamp(i32::MIN as i64, i32::MAX as i64);
        Fixed(clamped << FRAC_BITS)
    }

    /// Builds the exact ratio `numerator / denominator`.
    /// 构造精确的比值 `numerator / denominator`。
    pub(crate) fn from_ratio(numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            return if numerator > 0 {
                Fixed::MAX
            } else if numerator < 0 {
                Fixed::MIN
            } else {
                Fixed::ZERO
            };
        }
        let wide = ((numerator as i128) << FRAC_BITS) / denominator as i128;
        Fixed(saturate(wide))
    }

    /// Truncates toward negative infinity to an integer.
    /// 向负无穷截断为整数。
    pub(crate) fn to_int(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    /// The deterministic exponential function.
    ///
    /// Reduction: `x = k·ln2 + r` with `r ∈ [0, ln2)`, then a Taylor sum for
    /// `e^r` and a left shift by `k`. Arguments beyond the representable
    /// result range saturate to [`Fixed::MAX`] or flush to zero.
    ///
    /// 确定性指数函数。先做 `x = k·ln2 + r`（`r ∈ [0, ln2)`）的规约，
    /// 再对 `e^r` 求泰勒和并左移 `k` 位。超出可表示结果范围的参数
    /// 会饱和到 [`Fixed::MAX`] 或下溢为零。
    pub(crate) fn exp(self) -> Fixed {
        if self > EXP_ARG_LIMIT {
            return Fixed::MAX;
        }
        if self < -EXP_ARG_LIMIT {
            return Fixed::ZERO;
        }
        if self < Fixed::ZERO {
            return Fixed::ONE / (-self).exp();
        }

        let k = (self / LN_2).to_int();
        let r = self - Fixed::from_int(k) * LN_2;

        // e^r = sum r^n / n! over a fixed number of terms.
        let mut sum = Fixed::ONE;
        let mut term = Fixed::ONE;
        for n in 1..EXP_TAYLOR_TERMS {
            term = term * r / Fixed::from_int(n);
            sum = sum + term;
        }

        // sum ∈ [1, 2); shifting by k stays within i64 for k <= 30.
        if k >= 31 {
            return Fixed::MAX;
        }
        Fixed(saturate((sum.0 as i128) << k))
    }
}

fn saturate(wide: i128) -> i64 {
    if wide > i64::MAX as i128 {
        i64::MAX
    } else if wide < i64::MIN as i128 {
        i64::MIN
    } else {
        wide as i64
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(rhs.0))
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Fixed) -> Fixed {
        let wide = (self.0 as i128 * rhs.0 as i128) >> FRAC_BITS;
        Fixed(saturate(wide))
    }
}

impl Div for Fixed {
    type Output = Fixed;

    fn div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            return if self.0 > 0 {
                Fixed::MAX
            } else if self.0 < 0 {
                Fixed::MIN
            } else {
                Fixed::ZERO
            };
        }
        let wide = ((self.0 as i128) << FRAC_BITS) / rhs.0 as i128;
        Fixed(saturate(wide))
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(self.0.saturating_neg())
    }
}
