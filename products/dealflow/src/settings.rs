//! Display-currency preference and conversion.
//!
//! The preference lives behind a [`SettingsStore`] and exchange rates are
//! handed in as a [`RateTable`]; nothing here reads ambient storage or fetches
//! rates on construction.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ParseError, SettingsError};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Inr,
    Eur,
    Gbp,
    Aed,
    Jpy,
    Cad,
    Aud,
    Chf,
    Sgd,
    Cny,
}

impl Currency {
    pub const ALL: [Currency; 11] = [
        Currency::Usd,
        Currency::Inr,
        Currency::Eur,
        Currency::Gbp,
        Currency::Aed,
        Currency::Jpy,
        Currency::Cad,
        Currency::Aud,
        Currency::Chf,
        Currency::Sgd,
        Currency::Cny,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aed => "AED",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
            Currency::Sgd => "SGD",
            Currency::Cny => "CNY",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Aed => "د.إ",
            Currency::Jpy => "¥",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
            Currency::Chf => "Fr",
            Currency::Sgd => "S$",
            Currency::Cny => "¥",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Usd => "US Dollar",
            Currency::Inr => "Indian Rupee",
            Currency::Eur => "Euro",
            Currency::Gbp => "British Pound",
            Currency::Aed => "UAE Dirham",
            Currency::Jpy => "Japanese Yen",
            Currency::Cad => "Canadian Dollar",
            Currency::Aud => "Australian Dollar",
            Currency::Chf => "Swiss Franc",
            Currency::Sgd => "Singapore Dollar",
            Currency::Cny => "Chinese Yuan",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownCurrency(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub currency: Currency,
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Preferences, SettingsError>;
    fn save(&self, preferences: &Preferences) -> Result<(), SettingsError>;
}

/// Preferences persisted as a small JSON document.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Preferences, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file; using defaults");
                Ok(Preferences::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, preferences: &Preferences) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(preferences)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Units of each currency per one US dollar.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    rates: HashMap<Currency, Decimal>,
}

impl RateTable {
    pub fn new(rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Self {
        let mut rates: HashMap<_, _> = rates.into_iter().collect();
        rates.insert(Currency::Usd, Decimal::ONE);
        Self { rates }
    }

    /// Built-in rates used when no live table is available.
    pub fn fallback() -> Self {
        Self::new([
            (Currency::Inr, Decimal::new(830, 1)),
            (Currency::Eur, Decimal::new(92, 2)),
            (Currency::Gbp, Decimal::new(79, 2)),
            (Currency::Aed, Decimal::new(367, 2)),
            (Currency::Jpy, Decimal::new(1510, 1)),
            (Currency::Cad, Decimal::new(136, 2)),
            (Currency::Aud, Decimal::new(155, 2)),
            (Currency::Chf, Decimal::new(88, 2)),
            (Currency::Sgd, Decimal::new(134, 2)),
            (Currency::Cny, Decimal::new(724, 2)),
        ])
    }

    /// Missing or zero rates count as 1.
    pub fn rate(&self, currency: Currency) -> Decimal {
        self.rates
            .get(&currency)
            .copied()
            .filter(|r| !r.is_zero())
            .unwrap_or(Decimal::ONE)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::fallback()
    }
}

pub struct CurrencyService<S: SettingsStore> {
    store: S,
    rates: RateTable,
    currency: Currency,
}

impl<S: SettingsStore> CurrencyService<S> {
    /// Reads the saved preference once; later changes go through [`Self::set_currency`].
    pub fn new(store: S, rates: RateTable) -> Result<Self, SettingsError> {
        let preferences = store.load()?;
        Ok(Self {
            store,
            rates,
            currency: preferences.currency,
        })
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn set_currency(&mut self, currency: Currency) -> Result<(), SettingsError> {
        self.store.save(&Preferences { currency })?;
        info!(currency = currency.code(), "display currency changed");
        self.currency = currency;
        Ok(())
    }

    pub fn set_rates(&mut self, rates: RateTable) {
        self.rates = rates;
    }

    /// Converts `value` from `from` into the display currency through USD.
    ///
    /// Results beyond the `Decimal` range saturate at `Decimal::MAX` or `Decimal::MIN`.
    pub fn convert(&self, value: Decimal, from: Currency) -> Decimal {
        if from == self.currency {
            return value;
        }
        value
            .checked_div(self.rates.rate(from))
            .and_then(|usd| usd.checked_mul(self.rates.rate(self.currency)))
            .unwrap_or(if value.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            })
    }

    /// Whole units with thousands separators, e.g. `₹8,300,000`.
    pub fn format(&self, value: Decimal, from: Currency) -> String {
        let converted = round_whole(self.convert(value, from));
        let sign = if converted.is_sign_negative() && !converted.is_zero() {
            "-"
        } else {
            ""
        };
        format!(
            "{sign}{}{}",
            self.currency.symbol(),
            group_thousands(&converted.abs().to_string())
        )
    }

    /// Axis-style short form: `€9M`, `$1.5B`, `¥900`.
    pub fn format_compact(&self, value: Decimal, from: Currency) -> String {
        let converted = self.convert(value, from);
        let symbol = self.currency.symbol();
        let billion = Decimal::from(1_000_000_000);
        let million = Decimal::from(1_000_000);
        let thousand = Decimal::from(1_000);
        if converted >= billion {
            let v = (converted / billion).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            format!("{symbol}{v:.1}B")
        } else if converted >= million {
            format!("{symbol}{}M", round_whole(converted / million))
        } else if converted >= thousand {
            format!("{symbol}{}K", round_whole(converted / thousand))
        } else {
            format!("{symbol}{}", round_whole(converted))
        }
    }
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemoryStore(Mutex<Option<Preferences>>);

    impl SettingsStore for MemoryStore {
        fn load(&self) -> Result<Preferences, SettingsError> {
            Ok(self.0.lock().unwrap().clone().unwrap_or_default())
        }

        fn save(&self, preferences: &Preferences) -> Result<(), SettingsError> {
            *self.0.lock().unwrap() = Some(preferences.clone());
            Ok(())
        }
    }

    #[test]
    fn currency_codes_parse_case_insensitively() {
        assert_eq!("inr".parse::<Currency>(), Ok(Currency::Inr));
        assert!("XYZ".parse::<Currency>().is_err());
        assert_eq!(serde_json::to_string(&Currency::Chf).unwrap(), "\"CHF\"");
    }

    #[test]
    fn converts_through_usd() {
        let mut service = CurrencyService::new(MemoryStore::default(), RateTable::fallback()).unwrap();
        assert_eq!(service.convert(Decimal::from(100), Currency::Usd), Decimal::from(100));

        service.set_currency(Currency::Inr).unwrap();
        assert_eq!(service.convert(Decimal::from(100_000), Currency::Usd), Decimal::from(8_300_000));
        assert_eq!(service.format(Decimal::from(100_000), Currency::Usd), "₹8,300,000");
        assert_eq!(service.format_compact(Decimal::from(100_000), Currency::Usd), "₹8M");
        assert_eq!(service.store.load().unwrap().currency, Currency::Inr);
    }

    #[test]
    fn conversion_saturates_instead_of_overflowing() {
        let mut service = CurrencyService::new(MemoryStore::default(), RateTable::fallback()).unwrap();
        service.set_currency(Currency::Inr).unwrap();

        assert_eq!(service.convert(Decimal::MAX, Currency::Usd), Decimal::MAX);
        assert_eq!(service.convert(Decimal::MAX, Currency::Eur), Decimal::MAX);
        assert_eq!(service.convert(Decimal::MIN, Currency::Gbp), Decimal::MIN);
    }

    #[test]
    fn compact_uses_one_decimal_for_billions() {
        let service = CurrencyService::new(MemoryStore::default(), RateTable::fallback()).unwrap();
        assert_eq!(service.format_compact(Decimal::from(1_500_000_000), Currency::Usd), "$1.5B");
        assert_eq!(service.format_compact(Decimal::from(250_000), Currency::Usd), "$250K");
        assert_eq!(service.format_compact(Decimal::from(900), Currency::Usd), "$900");
    }

    #[test]
    fn groups_digits() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("123456789"), "123,456,789");
    }
}
