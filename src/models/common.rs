use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub last_page: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, page: usize, page_size: usize) -> Self {
        let last_page = if page_size == 0 {
            1
        } else {
            total.div_ceil(page_size).max(1)
        };
        Self {
            items,
            total,
            page,
            page_size,
            last_page,
        }
    }
}

/// Query for lists the backend paginates itself.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    pub page: usize,
    pub per_page: usize,
    pub search: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            search: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Whole(i64),
    Fraction(f64),
    Text(String),
}

/// Reads `80`, `80.0` or `"80"` as a whole number. Fractions round half away
/// from zero; `null` and blank strings read as missing.
pub fn loose_whole<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<LooseNumber>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(LooseNumber::Whole(value)) => return Ok(Some(value)),
        Some(LooseNumber::Fraction(value)) => value,
        Some(LooseNumber::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| de::Error::custom(format!("invalid number: {text}")))?
        }
    };

    let rounded = number.round();
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return Err(de::Error::custom(format!("number out of range: {number}")));
    }
    Ok(Some(rounded as i64))
}

pub fn loose_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    loose_whole(deserializer)?
        .map(|value| {
            u32::try_from(value)
                .map_err(|_| de::Error::custom(format!("expected a non-negative count, got {value}")))
        })
        .transpose()
}

pub fn loose_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LooseNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LooseNumber::Whole(value)) => Ok(Some(value as f64)),
        Some(LooseNumber::Fraction(value)) => Ok(Some(value)),
        Some(LooseNumber::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(LooseNumber::Text(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid number: {text}"))),
    }
}
