//! 行情数据表
//!
//! 数据源返回的表格列名可能是单层（`Close`），也可能是按 ticker 分组的两层
//! （`("F", "Close")`）。底层是一张 polars `DataFrame`：`date` 列存交易日，
//! 两层列名以 `F|Close` 的形式存放。这里统一收敛成单层列名，再挑选价格列、
//! 剔除缺失值，输出固定结构的 [`PricePoint`] 序列。

use std::fmt;

use chrono::NaiveDate;
use polars::prelude::*;

/// 交易日列
const DATE_COLUMN: &str = "date";
/// 多层列名的分隔符
const LEVEL_SEPARATOR: char = '|';

/// 列名，可能有多层
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey(Vec<String>);

impl ColumnKey {
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn grouped(ticker: impl Into<String>, field: impl Into<String>) -> Self {
        Self(vec![ticker.into(), field.into()])
    }

    fn from_column_name(name: &str) -> Self {
        Self(name.split(LEVEL_SEPARATOR).map(str::to_string).collect())
    }

    fn column_name(&self) -> String {
        self.0.join(&LEVEL_SEPARATOR.to_string())
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    pub fn is_multi_level(&self) -> bool {
        self.0.len() > 1
    }

    /// 最后一层，即字段名
    pub fn last_level(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{}", single),
            levels => write!(f, "({})", levels.join(", ")),
        }
    }
}

/// 候选价格列，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    AdjClose,
    Close,
}

impl PriceField {
    pub const PREFERENCE: [PriceField; 2] = [PriceField::AdjClose, PriceField::Close];

    pub fn label(self) -> &'static str {
        match self {
            PriceField::AdjClose => "Adj Close",
            PriceField::Close => "Close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// 逐列拼装 [`PriceFrame`]
pub struct PriceFrameBuilder {
    dates: Vec<NaiveDate>,
    columns: Vec<Series>,
}

impl PriceFrameBuilder {
    /// 追加一列；长度不足的部分补 None，多余部分截断
    pub fn column(mut self, key: ColumnKey, mut values: Vec<Option<f64>>) -> Self {
        values.resize(self.dates.len(), None);
        self.columns.push(Series::new(&key.column_name(), values));
        self
    }

    pub fn build(self) -> PolarsResult<PriceFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(DateChunked::from_naive_date(DATE_COLUMN, self.dates).into_series());
        columns.extend(self.columns);
        Ok(PriceFrame {
            df: DataFrame::new(columns)?,
        })
    }
}

/// 按交易日排列的行情表，缺失值为 null
#[derive(Debug, Clone, Default)]
pub struct PriceFrame {
    df: DataFrame,
}

impl PriceFrame {
    pub fn builder(dates: Vec<NaiveDate>) -> PriceFrameBuilder {
        PriceFrameBuilder {
            dates,
            columns: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// 除 date 外的原始列名
    fn value_columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != DATE_COLUMN)
            .collect()
    }

    /// 列名的文本形式，用于日志和错误信息
    pub fn column_labels(&self) -> Vec<String> {
        self.value_columns()
            .iter()
            .map(|name| ColumnKey::from_column_name(name).to_string())
            .collect()
    }

    pub fn is_multi_level(&self) -> bool {
        self.value_columns()
            .iter()
            .any(|name| ColumnKey::from_column_name(name).is_multi_level())
    }

    /// 保留 date 与给定列，并按 (旧名, 新名) 改名
    fn project(&self, renames: Vec<(String, String)>) -> PolarsResult<PriceFrame> {
        let mut selection = vec![DATE_COLUMN.to_string()];
        selection.extend(renames.iter().map(|(old, _)| old.clone()));

        let mut df = self.df.select(selection)?;
        for (old, new) in &renames {
            if old != new {
                df.rename(old, new)?;
            }
        }
        Ok(PriceFrame { df })
    }

    /// 取出某个 ticker 分组下的子表，第一层匹配的列去掉第一层后保留
    pub fn select_ticker(&self, ticker: &str) -> PolarsResult<Option<PriceFrame>> {
        let renames: Vec<(String, String)> = self
            .value_columns()
            .into_iter()
            .filter_map(|name| {
                let key = ColumnKey::from_column_name(&name);
                match key.levels() {
                    [first, rest @ ..] if key.is_multi_level() && first == ticker => {
                        let new = rest.join(&LEVEL_SEPARATOR.to_string());
                        Some((name, new))
                    }
                    _ => None,
                }
            })
            .collect();

        if renames.is_empty() {
            return Ok(None);
        }
        self.project(renames).map(Some)
    }

    /// 每列只保留最后一层名字；同名列保留先出现的一列
    pub fn flatten_levels(self) -> PolarsResult<PriceFrame> {
        let mut seen: Vec<String> = Vec::new();
        let mut renames = Vec::new();
        for name in self.value_columns() {
            let last = ColumnKey::from_column_name(&name).last_level().to_string();
            if seen.contains(&last) {
                continue;
            }
            seen.push(last.clone());
            renames.push((name, last));
        }
        self.project(renames)
    }

    /// 单层列名原样返回；多层时优先取 ticker 子表，否则压平
    pub fn normalize_for(self, ticker: &str) -> PolarsResult<PriceFrame> {
        if !self.is_multi_level() {
            return Ok(self);
        }
        match self.select_ticker(ticker)? {
            Some(frame) => Ok(frame),
            None => self.flatten_levels(),
        }
    }

    /// Adj Close 优先，其次 Close
    pub fn price_field(&self) -> Option<PriceField> {
        let columns = self.value_columns();
        PriceField::PREFERENCE
            .into_iter()
            .find(|field| columns.iter().any(|name| name == field.label()))
    }

    /// 剔除缺失值后按日期升序输出
    pub fn price_series(&self, field: PriceField) -> PolarsResult<Vec<PricePoint>> {
        let name = field.label();
        let cleaned = self
            .df
            .select([DATE_COLUMN, name])?
            .drop_nulls(Some(&[name][..]))?
            .sort(vec![DATE_COLUMN], SortMultipleOptions::default())?;

        let dates = cleaned.column(DATE_COLUMN)?.date()?;
        let prices = cleaned.column(name)?.f64()?;

        // drop_nulls 不处理 NaN
        Ok(dates
            .as_date_iter()
            .zip(prices.into_iter())
            .filter_map(|(date, price)| match (date, price) {
                (Some(date), Some(price)) if price.is_finite() => Some(PricePoint { date, price }),
                _ => None,
            })
            .collect())
    }
}
