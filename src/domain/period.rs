// ==========================================
// 绩效评分引擎 - 财年期间键
// ==========================================
// 格式: 4 位年份 + 可选后缀
//   Q1/Q2/Q3/FINAL  季度与年终
//   M1..M12         自然月
//   S1/S2           半年
// 排序: 财年从 9 月开始 (自然月 9 -> 财年月 1, 自然月 8 -> 财年月 12)
//   季度 -> 财年月 3/6/9, 半年 -> 6/12, 无后缀或 FINAL -> 12
// ==========================================

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 财年起始自然月
pub const FISCAL_YEAR_START_MONTH: u32 = 9;

/// 期间键解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodKeyError {
    #[error("期间键为空")]
    Empty,

    #[error("期间键年份无效: {0}")]
    InvalidYear(String),

    #[error("期间键后缀无效: {0}")]
    InvalidSuffix(String),
}

/// 期间后缀
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodSuffix {
    /// 无后缀（全年）
    Annual,
    /// 季度 1..=3
    Quarter(u8),
    /// 年终
    Final,
    /// 自然月 1..=12
    Month(u8),
    /// 半年 1..=2
    Semester(u8),
}

/// 自然月 -> 财年月
pub fn fiscal_month_of(calendar_month: u32) -> u32 {
    (calendar_month + 12 - FISCAL_YEAR_START_MONTH) % 12 + 1
}

impl PeriodSuffix {
    /// 财年月序号 (1..=12)
    pub fn fiscal_month(&self) -> u32 {
        match self {
            PeriodSuffix::Annual | PeriodSuffix::Final => 12,
            PeriodSuffix::Quarter(q) => u32::from(*q) * 3,
            PeriodSuffix::Semester(s) => u32::from(*s) * 6,
            PeriodSuffix::Month(m) => fiscal_month_of(u32::from(*m)),
        }
    }

    fn parse(raw: &str) -> Result<Self, PeriodKeyError> {
        let upper = raw.to_uppercase();
        if upper.is_empty() {
            return Ok(PeriodSuffix::Annual);
        }
        if upper == "FINAL" {
            return Ok(PeriodSuffix::Final);
        }

        let invalid = || PeriodKeyError::InvalidSuffix(raw.to_string());
        if !upper.is_ascii() {
            return Err(invalid());
        }
        let (head, tail) = upper.split_at(1);
        if tail.is_empty() || !tail.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: u8 = tail.parse().map_err(|_| invalid())?;

        match head {
            "Q" if (1..=3).contains(&n) => Ok(PeriodSuffix::Quarter(n)),
            "M" if (1..=12).contains(&n) => Ok(PeriodSuffix::Month(n)),
            "S" if (1..=2).contains(&n) => Ok(PeriodSuffix::Semester(n)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for PeriodSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodSuffix::Annual => Ok(()),
            PeriodSuffix::Quarter(q) => write!(f, "Q{}", q),
            PeriodSuffix::Final => write!(f, "FINAL"),
            PeriodSuffix::Month(m) => write!(f, "M{}", m),
            PeriodSuffix::Semester(s) => write!(f, "S{}", s),
        }
    }
}

// ==========================================
// FiscalPeriodKey - 财年期间键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriodKey {
    pub year: i32,
    pub suffix: PeriodSuffix,
}

impl FiscalPeriodKey {
    pub fn parse(raw: &str) -> Result<Self, PeriodKeyError> {
        raw.parse()
    }

    /// 财年月序号 (1..=12)
    pub fn fiscal_month(&self) -> u32 {
        self.suffix.fiscal_month()
    }

    /// 按财年顺序比较
    ///
    /// 同一年份内只比较财年月；不同年份先比较年份。
    /// Q1 与 M11 映射到同一财年月时视为同一位置（Equal）。
    pub fn fiscal_cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then_with(|| self.fiscal_month().cmp(&other.fiscal_month()))
    }

    /// 是否严格早于 other
    pub fn is_before(&self, other: &Self) -> bool {
        self.fiscal_cmp(other) == Ordering::Less
    }

    /// 规范化字符串，例如 `2025Q1`
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl FromStr for FiscalPeriodKey {
    type Err = PeriodKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PeriodKeyError::Empty);
        }

        let year_part: String = trimmed.chars().take(4).collect();
        if year_part.len() != 4 || !year_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(PeriodKeyError::InvalidYear(trimmed.to_string()));
        }
        let year: i32 = year_part
            .parse()
            .map_err(|_| PeriodKeyError::InvalidYear(trimmed.to_string()))?;

        // 允许 "2025-Q1" / "2025_Q1" 这类分隔写法
        let rest = trimmed[year_part.len()..].trim_start_matches(['-', '_', ' ']);
        let suffix = PeriodSuffix::parse(rest)?;

        Ok(Self { year, suffix })
    }
}

impl fmt::Display for FiscalPeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.year, self.suffix)
    }
}
